//! Error type shared by every core operation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// DuckDB failures, flattened to their message
    #[error("Storage failure: {0}")]
    Database(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before touching storage
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid date/time '{0}': expected YYYY-MM-DD HH:MM")]
    InvalidDateTime(String),

    #[error("A product named '{0}' already exists")]
    DuplicateName(String),

    #[error("Malformed backup: {0}")]
    MalformedBackup(String),

    #[error("File access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Errors caused by the caller's input rather than the environment
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Validation(_)
                | Self::InvalidDateTime(_)
                | Self::DuplicateName(_)
                | Self::MalformedBackup(_)
        )
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
