//! Error types for the Bibliotheca core

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// A field failed validation (wrong type, missing required value,
    /// invalid date parts). The operation was aborted with no state change.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An identifier string could not be parsed. Distinct from `NotFound`:
    /// the id never named anything.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A business rule was violated by an operation that requires existence
    /// (e.g. returning an already-closed loan). Rejections that callers are
    /// expected to branch on (duplicate username, book unavailable, quota
    /// exceeded) are modelled as outcome enums instead, never as errors.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// A configured table is absent and creation was not requested.
    #[error("Missing collection: {0}")]
    MissingCollection(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
