use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error shape emitted by the CLI and suitable for any
/// serving layer that wants to forward failures as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Conversion ────────────────────────────────────────────────────────────
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("CSV engine error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    // ── Dataset ───────────────────────────────────────────────────────────────
    #[error("no data found for city: {0}")]
    UnknownCity(String),

    #[error("dataset contains no records")]
    EmptyDataset,
}

impl AppError {
    /// Stable machine code for each error class.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidConfiguration(_) => "invalid_configuration",
            AppError::Csv(_) => "csv",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io_failure",
            AppError::UnknownCity(_) => "unknown_city",
            AppError::EmptyDataset => "empty_dataset",
        }
    }

    /// Converts the error into the payload shape the CLI prints on failure.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

// Errors serialize as their payload, not as the raw enum.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_payload().serialize(serializer)
    }
}
