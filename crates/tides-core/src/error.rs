//! Error types for the TiDES classification core.

use thiserror::Error;

/// Result type alias using the TiDES core Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for registry, ledger, and taxonomy operations.
///
/// Soft outcomes are deliberately *not* errors: an unobserved ingestion row,
/// a taxonomy sub-class miss, or an empty classification history are all
/// typed absent values returned through `Ok`.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed input to an append or upsert operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target not found
    #[error("Target not found: {0}")]
    TargetNotFound(uuid::Uuid),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (stored data violating an invariant, broken state)
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("ra out of range".to_string());
        assert_eq!(err.to_string(), "Validation error: ra out of range");
    }

    #[test]
    fn test_error_display_target_not_found() {
        let id = Uuid::nil();
        let err = Error::TargetNotFound(id);
        assert_eq!(err.to_string(), format!("Target not found: {}", id));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("subclass".to_string());
        assert_eq!(err.to_string(), "Not found: subclass");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DATABASE_URL unset".to_string());
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL unset");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
