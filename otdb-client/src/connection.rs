//! Connection management.
//!
//! A [`Connection`] owns one Unix domain stream socket to the daemon. The
//! protocol is strictly half-duplex: one command line out, one reply line
//! back, no request ids. `exchange` therefore takes `&mut self`, so a single
//! connection can never have two requests in flight. Callers needing
//! concurrency open more connections.

use crate::config::ClientConfig;
use crate::error::ClientError;
use otdb_protocol::Command;
use std::future::Future;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Something that can carry one command to the daemon and return its reply.
///
/// [`Connection`] is the real implementation; tests substitute stubs.
pub trait Transport {
    /// Sends `command` and returns the raw reply line.
    fn send_command(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// A connection to an OTDB daemon.
pub struct Connection {
    config: ClientConfig,
    stream: Option<BufReader<UnixStream>>,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens the socket. Does nothing if already connected.
    ///
    /// The configuration is validated first, so out-of-range fields set
    /// directly on [`ClientConfig`] fail here as [`ClientError::Config`].
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        if self.stream.is_some() {
            tracing::trace!("connect() called while connected");
            return Ok(());
        }
        self.config.validate()?;

        let path = &self.config.socket_path;
        tracing::debug!(path = %path.display(), "connecting to otdb");

        let stream = tokio::time::timeout(self.config.connect_timeout(), UnixStream::connect(path))
            .await
            .map_err(|_| {
                tracing::debug!(path = %path.display(), "connect timeout");
                ClientError::Timeout
            })?
            .map_err(|e| {
                tracing::debug!(path = %path.display(), error = %e, "connect failed");
                ClientError::Connect {
                    path: path.clone(),
                    source: e,
                }
            })?;

        self.stream = Some(BufReader::new(stream));
        tracing::debug!("connected");
        Ok(())
    }

    /// Closes the socket. Does nothing if not connected.
    ///
    /// The connection is always left disconnected, even when shutting the
    /// socket down reports an error.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        tracing::debug!("disconnecting");
        stream.shutdown().await.map_err(|e| {
            tracing::debug!(error = %e, "socket shutdown failed");
            ClientError::Io(e)
        })
    }

    /// Writes `command` in full, then waits for one newline-terminated reply.
    ///
    /// Failures leave the connection open; whether to reconnect is the
    /// caller's decision. A reply longer than `max_line_bytes` is read to its
    /// newline and dropped before [`ClientError::LineTooLong`] is returned,
    /// so the next exchange reads its own reply. After a timeout the reply
    /// may still arrive later and would be read as the answer to the next
    /// command, so a timed-out connection should be reconnected before reuse.
    pub async fn exchange(&mut self, command: &[u8]) -> Result<String, ClientError> {
        let max_line = self.config.max_line_bytes;
        let timeout = self.config.request_timeout();
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        tokio::time::timeout(timeout, exchange_on(stream, command, max_line))
            .await
            .map_err(|_| {
                tracing::debug!("exchange timed out");
                ClientError::Timeout
            })?
    }
}

async fn exchange_on(
    stream: &mut BufReader<UnixStream>,
    command: &[u8],
    max_line: usize,
) -> Result<String, ClientError> {
    // write_all retries short writes until the whole command is out.
    stream.write_all(command).await?;
    stream.flush().await?;
    tracing::trace!(bytes = command.len(), "command sent");

    let mut line = String::new();
    let n = (&mut *stream)
        .take(max_line as u64)
        .read_line(&mut line)
        .await?;

    if n == 0 {
        tracing::debug!("connection closed by daemon");
        return Err(ClientError::ConnectionClosed);
    }
    if !line.ends_with('\n') {
        if n >= max_line {
            tracing::debug!(max = max_line, "reply too long, discarding");
            discard_line(stream).await?;
            return Err(ClientError::LineTooLong { max: max_line });
        }
        tracing::debug!(bytes = n, "connection closed mid-reply");
        return Err(ClientError::ConnectionClosed);
    }

    tracing::trace!(bytes = n, "reply received");
    Ok(line)
}

/// Consumes input up to and including the next newline.
async fn discard_line(stream: &mut BufReader<UnixStream>) -> Result<(), ClientError> {
    loop {
        let buf = stream.fill_buf().await?;
        if buf.is_empty() {
            return Err(ClientError::ConnectionClosed);
        }
        let len = buf.len();
        match buf.iter().position(|&b| b == b'\n') {
            Some(end) => {
                stream.consume(end + 1);
                return Ok(());
            }
            None => stream.consume(len),
        }
    }
}

impl Transport for Connection {
    async fn send_command(&mut self, command: &Command) -> Result<String, ClientError> {
        tracing::debug!(verb = %command.verb(), "sending command");
        self.exchange(command.render().as_bytes()).await
    }
}
