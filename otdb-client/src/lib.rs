//! # otdb-client
//!
//! Client library for the OTDB device database daemon.
//!
//! This crate provides:
//! - A persistent Unix domain socket [`Connection`] with a blocking
//!   send-then-read-one-line exchange
//! - A typed [`Client`] API for every daemon command
//! - [`ClientConfig`] loading from YAML and environment variables
//!
//! One connection carries one request at a time. Use several connections for
//! concurrent work.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use connection::{Connection, Transport};
pub use error::ClientError;
