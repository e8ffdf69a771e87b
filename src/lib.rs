//! otdb - OTDB device database client
//!
//! Speaks the line-oriented OTDB command protocol over the daemon's Unix
//! domain socket. Commands are built and replies decoded by
//! [`otdb_protocol`]; the socket lifecycle and typed operations live in
//! [`otdb_client`].

pub use otdb_client::{Client, ClientConfig, ClientError, Connection, Transport};
pub use otdb_protocol::{Block, ByteRange, Command, FileHeader, FileRef, Payload, Perms, Uid, Verb};

pub use otdb_client as client;
pub use otdb_protocol as protocol;
