//! Domain error types
//!
//! Batch-fatal and caller-contract failures. Business-rule violations found
//! while validating records are never errors: they are reported as outcomes.

use thiserror::Error;

/// Main Intake error type
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Identifier scheme the preheat context cannot resolve
    #[error("Unsupported id scheme: {0}. Only 'uid' and 'code' are supported")]
    UnsupportedIdScheme(String),

    /// Query criteria that cannot be mapped to query parameters
    #[error("{0}")]
    IllegalQuery(String),

    /// Caller passed arguments that break the operation's contract
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Value validation errors raised before writing
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage collaborator errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Audit sink errors
    #[error("Audit error: {0}")]
    Audit(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Storage-specific errors
///
/// Raised by [`crate::adapters::store::TrackerStore`] implementations and
/// their transactions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Entity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failed to write entity
    #[error("Failed to write entity: {0}")]
    WriteFailed(String),

    /// Transaction could not be started, committed or rolled back
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        IntakeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for IntakeError {
    fn from(err: toml::de::Error) -> Self {
        IntakeError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intake_error_display() {
        let err = IntakeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_illegal_query_is_bare_message() {
        let err = IntakeError::IllegalQuery("Program does not exist: abc".to_string());
        assert_eq!(err.to_string(), "Program does not exist: abc");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::WriteFailed("disk full".to_string());
        let err: IntakeError = store_err.into();
        assert!(matches!(err, IntakeError::Storage(StoreError::WriteFailed(_))));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: IntakeError = io_err.into();
        assert!(matches!(err, IntakeError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: IntakeError = json_err.into();
        assert!(matches!(err, IntakeError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: IntakeError = toml_err.into();
        assert!(matches!(err, IntakeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = IntakeError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let err = StoreError::Conflict("evA".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
