//! Error types.
//!
//! Two layers:
//!
//! - [`DataError`]: what the data layer reports (missing files, bad schema,
//!   empty selections). Library callers match on it.
//! - [`AppError`]: what the binary reports. It carries the process exit code
//!   and a human-readable message; every fatal `DataError` converts into it.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for missing inputs, bad configuration, or export failures.
pub const EXIT_DATA: u8 = 2;
/// Exit code for schema violations in an input file.
pub const EXIT_SCHEMA: u8 = 3;
/// Exit code for terminal/UI failures.
pub const EXIT_TERMINAL: u8 = 4;

/// Failures produced while loading, merging, or selecting data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: {}", path.display())]
    DataNotFound { path: PathBuf },
    #[error("schema error in {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },
    #[error("no data in range {lo}–{hi}")]
    NoDataInRange { lo: i32, hi: i32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DataError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            DataError::Schema { .. } => EXIT_SCHEMA,
            DataError::DataNotFound { .. } | DataError::NoDataInRange { .. } | DataError::Io(_) => EXIT_DATA,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
