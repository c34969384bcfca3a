//! Atomic file writer with automatic cleanup on failure.
//!
//! Writes to a temporary file in the same directory as the destination,
//! then atomically replaces the destination on `finish()`. If dropped
//! before finishing, the temporary file is automatically cleaned up.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::AppError;

/// An atomic writer for chunk files.
///
/// Bytes go to a temporary file that is atomically persisted to the final
/// path on `finish()`. If dropped without calling `finish()`, the
/// temporary file is deleted, so a failed write never leaves a partial
/// final artifact behind.
pub struct AtomicFileWriter {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicFileWriter {
    /// Creates a new atomic writer targeting the specified path.
    ///
    /// The temporary file is created in the same directory as `final_path`
    /// to ensure atomic persistence (same filesystem requirement).
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();

        let parent_dir = final_path.parent().ok_or_else(|| {
            AppError::InvalidConfiguration(format!(
                "cannot determine parent directory for: {}",
                final_path.display()
            ))
        })?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;

        Ok(Self {
            writer: BufWriter::new(temp_file),
            final_path,
        })
    }

    /// Appends bytes to the pending file.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Flushes all buffers and atomically persists the file to the final
    /// path, returning it. On error the temporary file is cleaned up.
    pub fn finish(self) -> Result<PathBuf, AppError> {
        let named_temp = self
            .writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;

        named_temp
            .persist(&self.final_path)
            .map_err(|e| AppError::Io(e.error))?;

        Ok(self.final_path)
    }
}
