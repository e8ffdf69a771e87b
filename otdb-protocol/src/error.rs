//! Protocol error types.

use crate::response::Payload;
use thiserror::Error;

/// Errors raised while decoding a reply line or one of its payload fields.
///
/// These are distinct from [`StoreError`]: a `ProtocolError` means the reply
/// could not be understood at all, while a `StoreError` is a well-formed
/// reply in which the daemon reported failure.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON reply: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("reply has no `err` field")]
    MissingErr,

    #[error("reply `err` field is not an integer")]
    InvalidErr,

    #[error("invalid device id {0:?}: expected 16 hex digits")]
    InvalidUid(String),

    #[error("unknown block {0:?}")]
    UnknownBlock(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A well-formed reply whose `err` field was non-zero.
#[derive(Debug, Clone, Error)]
#[error("store reported error {code}")]
pub struct StoreError {
    /// The daemon's error code (never zero).
    pub code: i64,
    /// Whatever else the reply carried, with housekeeping fields removed.
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidUid("xyz".to_string());
        assert!(err.to_string().contains("xyz"));

        let err = ProtocolError::MissingField("idlist");
        assert!(err.to_string().contains("idlist"));

        let err = ProtocolError::InvalidField {
            field: "mod",
            reason: "not an integer".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("mod"));
        assert!(msg.contains("not an integer"));

        assert!(ProtocolError::MissingErr.to_string().contains("err"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError {
            code: -519,
            payload: Payload::new(),
        };
        assert!(err.to_string().contains("-519"));
    }
}
