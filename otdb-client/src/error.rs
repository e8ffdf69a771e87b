//! Client error types.

use crate::config::ConfigError;
use otdb_protocol::{Payload, ProtocolError, StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {path:?}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("reply exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("store error {code}")]
    Store { code: i64, payload: Payload },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        ClientError::Store {
            code: err.code,
            payload: err.payload,
        }
    }
}

impl ClientError {
    /// Returns whether reconnecting and reissuing the command might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. }
                | ClientError::Io(_)
                | ClientError::Timeout
                | ClientError::ConnectionClosed
        )
    }

    /// Whether the daemon itself rejected the command.
    pub fn is_store_error(&self) -> bool {
        matches!(self, ClientError::Store { .. })
    }
}
