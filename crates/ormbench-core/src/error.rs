//! Core error types.

use thiserror::Error;

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by every [`Orm`](crate::Orm) backend.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening or closing the storage handle failed, or the backend was
    /// used before `init`.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement failed to compile or execute.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A statement failed to compile or execute (sqlx backend).
    #[cfg(feature = "sqlx")]
    #[error("storage error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A lookup by id matched no row.
    #[error("user {0} not found")]
    NotFound(i64),

    /// The async runtime backing a blocking adapter could not be built.
    #[cfg(feature = "sqlx")]
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Error for an operation issued before `init` or after `close`.
    pub fn not_initialized() -> Self {
        Error::Connection("connection is not initialized".to_string())
    }

    /// Check whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        assert!(Error::NotFound(7).is_not_found());
        assert!(!Error::not_initialized().is_not_found());
        assert!(!Error::Storage(rusqlite::Error::QueryReturnedNoRows).is_not_found());
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::NotFound(42).to_string(), "user 42 not found");
        assert_eq!(
            Error::not_initialized().to_string(),
            "connection error: connection is not initialized"
        );
    }
}
