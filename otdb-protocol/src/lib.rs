//! # otdb-protocol
//!
//! Command codec for the OTDB daemon's line protocol.
//!
//! This crate provides:
//! - Device identifier and byte range wire forms
//! - One structured [`Command`] per daemon operation, rendered by a single
//!   canonical formatter
//! - Reply line decoding and `err` validation, with typed payload views
//!
//! Nothing here performs I/O.

pub mod command;
pub mod error;
pub mod range;
pub mod response;
pub mod uid;

pub use command::{Block, Command, FileRef, Perms, Verb, JSON_FLAG};
pub use error::{ProtocolError, StoreError};
pub use range::{encode_range, ByteRange};
pub use response::{device_list, perms, FileHeader, Payload, Reply};
pub use uid::{Uid, UID_LEN};

/// Conventional location of the daemon's socket.
pub const DEFAULT_SOCKET_PATH: &str = "/opt/otdb/otdb.sock";
