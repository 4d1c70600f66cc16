//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types. The
//! taxonomy mirrors the pipeline stages: input validation, detection,
//! validation-service transport/semantics, and rendering.

use thiserror::Error;

/// Main Veil error type
///
/// This is the primary error type used throughout the engine. A request
/// either produces a complete result or exactly one of these; there is no
/// partial/degraded success mode.
#[derive(Debug, Error)]
pub enum VeilError {
    /// Input rejected before pipeline entry (empty or oversized text)
    #[error("Input error: {0}")]
    Input(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Detection-stage errors (pattern library, entity model unavailable)
    #[error("Detection error: {0}")]
    Detection(String),

    /// Validation-service errors
    #[error("Validator error: {0}")]
    Validator(#[from] ValidatorError),

    /// Rendering errors (offset invariant violated after earlier stages)
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Validation-service specific errors
///
/// Transport failures are retryable; semantic failures (a response the
/// engine cannot interpret) are terminal. These errors don't expose the
/// underlying HTTP client types.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Failed to reach the validation service
    #[error("Failed to connect to validation service: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Validation request timeout: {0}")]
    Timeout(String),

    /// Rate limit exceeded (429)
    #[error("Validation service rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Validation service error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Validation request rejected: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response could not be interpreted; never retried
    #[error("Uninterpretable validation response: {0}")]
    MalformedResponse(String),

    /// Missing credentials for the validation service
    #[error("Validation service credentials missing: {0}")]
    MissingCredentials(String),

    /// Retries exhausted; wraps the final transport error message
    #[error("Validation failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: usize, message: String },
}

impl ValidatorError {
    /// Check whether the error is a transient transport failure worth
    /// retrying. Malformed responses and client errors are terminal.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::ServerError { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for VeilError {
    fn from(err: std::io::Error) -> Self {
        VeilError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for VeilError {
    fn from(err: serde_json::Error) -> Self {
        VeilError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for VeilError {
    fn from(err: toml::de::Error) -> Self {
        VeilError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veil_error_display() {
        let err = VeilError::Input("text is empty".to_string());
        assert_eq!(err.to_string(), "Input error: text is empty");
    }

    #[test]
    fn test_validator_error_conversion() {
        let validator_err = ValidatorError::Timeout("30s elapsed".to_string());
        let err: VeilError = validator_err.into();
        assert!(matches!(err, VeilError::Validator(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ValidatorError::ConnectionFailed("refused".into()).is_transient());
        assert!(ValidatorError::Timeout("30s".into()).is_transient());
        assert!(ValidatorError::RateLimited("quota".into()).is_transient());
        assert!(ValidatorError::ServerError {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());

        assert!(!ValidatorError::MalformedResponse("not json".into()).is_transient());
        assert!(!ValidatorError::ClientError {
            status: 401,
            message: "bad key".into()
        }
        .is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VeilError = io_err.into();
        assert!(matches!(err, VeilError::Io(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = VeilError::Rendering("stale offsets".to_string());
        let _: &dyn std::error::Error = &err;

        let err = ValidatorError::MalformedResponse("garbage".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
