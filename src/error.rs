//! Error types for gatekeep.

use thiserror::Error;

/// Common error type for gatekeep.
#[derive(Error, Debug)]
pub enum GatekeepError {
    /// Database error.
    ///
    /// Wraps any backend failure that is not a uniqueness conflict.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing or verification error.
    #[error("password error: {0}")]
    Password(#[from] crate::auth::PasswordError),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Message catalogue error.
    #[error("i18n error: {0}")]
    I18n(#[from] crate::i18n::I18nError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatekeepError {
    /// Whether this error came from a violated uniqueness constraint.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatekeepError::Conflict(_))
    }
}

impl From<sqlx::Error> for GatekeepError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                GatekeepError::Conflict(db_err.message().to_string())
            }
            _ => GatekeepError::Database(e.to_string()),
        }
    }
}

/// Result type alias for gatekeep operations.
pub type Result<T> = std::result::Result<T, GatekeepError>;
