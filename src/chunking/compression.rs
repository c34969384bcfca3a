//! Optional output codecs for chunk files.
//!
//! All four codecs encode in memory and write deterministically (gzip with
//! a zero mtime, zip with a fixed entry timestamp), so re-running a
//! conversion produces byte-identical archives.

use std::io::{Cursor, Write};
use std::str::FromStr;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use xz2::write::XzEncoder;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::AppError;

/// Supported output codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Zip,
    Xz,
}

impl Compression {
    /// File-name suffix appended after `.json`.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::Bzip2 => "bz2",
            Compression::Zip => "zip",
            Compression::Xz => "xz",
        }
    }

    /// Encodes `bytes` with this codec. `entry_name` is used by archive
    /// formats that store named members (zip).
    pub(crate) fn encode(&self, bytes: &[u8], entry_name: &str) -> Result<Vec<u8>, AppError> {
        match self {
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            Compression::Bzip2 => {
                let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            Compression::Xz => {
                let mut encoder = XzEncoder::new(Vec::new(), 6);
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            Compression::Zip => {
                let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
                let options: FileOptions<'_, ()> = FileOptions::default();
                archive.start_file(entry_name, options).map_err(zip_io)?;
                archive.write_all(bytes)?;
                let cursor = archive.finish().map_err(zip_io)?;
                Ok(cursor.into_inner())
            }
        }
    }
}

fn zip_io(err: zip::result::ZipError) -> AppError {
    AppError::Io(std::io::Error::other(err))
}

impl FromStr for Compression {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gz" | "gzip" => Ok(Compression::Gzip),
            "bz2" | "bzip2" => Ok(Compression::Bzip2),
            "zip" => Ok(Compression::Zip),
            "xz" => Ok(Compression::Xz),
            other => Err(AppError::InvalidConfiguration(format!(
                "unknown compression codec: {other}"
            ))),
        }
    }
}
