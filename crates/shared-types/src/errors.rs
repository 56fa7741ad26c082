//! # Error Types
//!
//! Errors raised while encoding or decoding wire messages.

use thiserror::Error;

/// Errors related to wire message handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The bytes were not a well-formed message.
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// The payload `type` tag does not fit the message kind.
    #[error("Payload type mismatch: {message} carries '{found}', expected '{expected}'")]
    PayloadKindMismatch {
        message: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A field is outside its allowed domain.
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::Malformed(err.to_string())
    }
}
