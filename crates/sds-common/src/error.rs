//! SDS Error - Unified Error Types
//!
//! Error handling for every sequential data store operation. Categorizes
//! failures by what the caller can do about them (missing resources, schema
//! conflicts, malformed requests, transport trouble) and provides helpers
//! for retry decisions and cleanup tolerance.
//!
//! Key Features:
//! - Store-level taxonomy (not found, conflict, type mismatch, range errors)
//! - Retryable error detection for the client retry loop
//! - User vs system error classification
//! - Conversions from JSON and timestamp parsing failures
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Unified error type for all SDS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdsError {
    // Resource errors
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("schema conflict: {0}")]
    SchemaConflict(String),

    // Request errors
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Transport errors
    #[error("timeout: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Result type alias for SDS operations.
pub type Result<T> = std::result::Result<T, SdsError>;

// =============================================================================
// Error Classification
// =============================================================================

impl SdsError {
    /// Returns true if the operation can be safely retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdsError::Timeout(_) | SdsError::Transport(_))
    }

    /// Returns true if the target resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdsError::NotFound(_))
    }

    /// Returns true if this is a user error (vs system error).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SdsError::SchemaConflict(_)
                | SdsError::TypeMismatch(_)
                | SdsError::InvalidRange { .. }
                | SdsError::InvalidArgument(_)
                | SdsError::Configuration(_)
        )
    }

    /// Returns true if the store refused the request because of existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SdsError::Conflict(_) | SdsError::SchemaConflict(_))
    }
}

impl From<serde_json::Error> for SdsError {
    fn from(err: serde_json::Error) -> Self {
        SdsError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for SdsError {
    fn from(err: chrono::ParseError) -> Self {
        SdsError::InvalidArgument(format!("invalid timestamp: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdsError::NotFound("stream Tank1".to_string());
        assert_eq!(err.to_string(), "not found: stream Tank1");

        let start = DateTime::from_timestamp(100, 0).expect("valid timestamp");
        let end = DateTime::from_timestamp(50, 0).expect("valid timestamp");
        let err = SdsError::InvalidRange { start, end };
        assert!(err.to_string().starts_with("invalid range"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(SdsError::Timeout("get_window_values".to_string()).is_retryable());
        assert!(SdsError::Transport("reset".to_string()).is_retryable());
        assert!(!SdsError::NotFound("x".to_string()).is_retryable());
        assert!(!SdsError::Conflict("x".to_string()).is_retryable());
    }

    #[test]
    fn test_classification() {
        assert!(SdsError::TypeMismatch("x".to_string()).is_user_error());
        assert!(!SdsError::Timeout("x".to_string()).is_user_error());
        assert!(SdsError::SchemaConflict("x".to_string()).is_conflict());
        assert!(SdsError::NotFound("x".to_string()).is_not_found());
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse_err = "not-a-time"
            .parse::<DateTime<Utc>>()
            .expect_err("should fail to parse");
        let err: SdsError = parse_err.into();
        assert!(matches!(err, SdsError::InvalidArgument(_)));
    }
}
