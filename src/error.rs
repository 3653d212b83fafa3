//! Error types for the review store

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row was rejected by a NOT NULL or foreign-key constraint.
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Integrity(msg.clone().unwrap_or_else(|| code.to_string()))
            }
            _ => StoreError::Sqlite(err),
        }
    }
}
