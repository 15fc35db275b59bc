//! Error types for assay-core

use thiserror::Error;

/// Error type for assay operations
#[derive(Debug, Error)]
pub enum AssayError {
    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Tier outside the 1..=5 difficulty range
    #[error("Invalid tier: {0} (expected 1-5)")]
    InvalidTier(u8),

    /// A result for this exercise is already in the session history
    #[error("Duplicate exercise result: {0}")]
    DuplicateResult(String),

    /// Artifact fetch or profile persistence failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AssayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for assay operations
pub type Result<T> = std::result::Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssayError::Repository("connection reset".into());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AssayError = io_err.into();
        assert!(matches!(err, AssayError::Io(_)));
    }

    #[test]
    fn test_invalid_tier_message() {
        let err = AssayError::InvalidTier(7);
        assert_eq!(err.to_string(), "Invalid tier: 7 (expected 1-5)");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: AssayError = json_err.into();
        assert!(matches!(err, AssayError::Serialization(_)));
    }
}
