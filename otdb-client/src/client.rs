//! High-level client API.

use crate::config::ClientConfig;
use crate::connection::{Connection, Transport};
use crate::error::ClientError;
use otdb_protocol::response::{device_list, perms};
use otdb_protocol::{ByteRange, Command, FileRef, Payload, Perms, Reply, Uid};
use std::path::Path;

/// High-level client for an OTDB daemon.
///
/// Every operation is a single command/reply exchange. A daemon-side
/// failure surfaces as [`ClientError::Store`]; argument problems detected
/// locally surface as [`ClientError::InvalidArgument`] before anything is
/// sent. Nothing is retried.
pub struct Client<T = Connection> {
    transport: T,
}

impl Client<Connection> {
    /// Creates a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: Connection::new(config),
        }
    }

    /// Connects to the daemon. Does nothing if already connected.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        self.transport.connect().await
    }

    /// Closes the connection. Does nothing if not connected.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.transport.disconnect().await
    }

    /// Returns whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

impl<T: Transport> Client<T> {
    /// Wraps an existing transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    async fn request(&mut self, command: Command) -> Result<Payload, ClientError> {
        let line = self.transport.send_command(&command).await?;
        let reply = Reply::decode(&line)?;
        if !reply.is_ok() {
            tracing::debug!(verb = %command.verb(), code = reply.code(), "store rejected command");
        }
        Ok(reply.into_result()?)
    }

    async fn execute(&mut self, command: Command) -> Result<(), ClientError> {
        self.request(command).await.map(|_| ())
    }

    // =========================================================================
    // Device operations
    // =========================================================================

    /// Creates a device, optionally seeding it from a template directory.
    pub async fn new_device(
        &mut self,
        uid: impl Into<Uid>,
        template: Option<&Path>,
    ) -> Result<(), ClientError> {
        if let Some(dir) = template {
            require_dir(dir).await?;
        }
        let command = Command::new_device(uid.into(), template).map_err(invalid_argument)?;
        self.execute(command).await
    }

    pub async fn delete_device(&mut self, uid: impl Into<Uid>) -> Result<(), ClientError> {
        self.execute(Command::delete_device(uid.into())).await
    }

    /// Sets the daemon's default device.
    ///
    /// This changes state shared by every client of the daemon.
    pub async fn set_device(&mut self, uid: impl Into<Uid>) -> Result<(), ClientError> {
        self.execute(Command::set_device(uid.into())).await
    }

    /// Lists the devices in the store.
    pub async fn list_devices(&mut self) -> Result<Vec<Uid>, ClientError> {
        let payload = self.request(Command::list_devices()).await?;
        Ok(device_list(&payload)?)
    }

    // =========================================================================
    // Archive operations
    // =========================================================================

    /// Loads an archive directory into the daemon.
    pub async fn load(&mut self, dir: impl AsRef<Path>) -> Result<(), ClientError> {
        let dir = dir.as_ref();
        require_dir(dir).await?;
        let command = Command::open(dir).map_err(invalid_argument)?;
        self.execute(command).await
    }

    /// Saves the store into an archive directory. An empty `uids` saves all
    /// devices.
    pub async fn save(
        &mut self,
        compress: bool,
        uids: &[Uid],
        dir: impl AsRef<Path>,
    ) -> Result<(), ClientError> {
        let dir = dir.as_ref();
        require_dir(dir).await?;
        let command = Command::save(compress, uids, dir).map_err(invalid_argument)?;
        self.execute(command).await
    }

    // =========================================================================
    // File operations
    // =========================================================================

    pub async fn delete_file(&mut self, target: &FileRef) -> Result<(), ClientError> {
        self.execute(Command::delete_file(target)).await
    }

    /// Creates a file. Fails on the daemon side if the file id is not part
    /// of the device template.
    pub async fn new_file(
        &mut self,
        target: &FileRef,
        perms: Perms,
        alloc: u32,
    ) -> Result<(), ClientError> {
        self.execute(Command::new_file(target, perms, alloc)).await
    }

    /// Restores a file to its template default.
    pub async fn restore_file(&mut self, target: &FileRef) -> Result<(), ClientError> {
        self.execute(Command::restore_file(target)).await
    }

    /// Reads a file's permission bits. `age` bounds how stale (in ms) the
    /// cached copy may be.
    pub async fn read_perms(
        &mut self,
        target: &FileRef,
        age: Option<u32>,
    ) -> Result<Perms, ClientError> {
        let payload = self.request(Command::read_perms(target, age)).await?;
        Ok(perms(&payload)?)
    }

    /// Reads a file header. See [`otdb_protocol::FileHeader`] for a typed view.
    pub async fn read_header(
        &mut self,
        target: &FileRef,
        age: Option<u32>,
    ) -> Result<Payload, ClientError> {
        self.request(Command::read_header(target, age)).await
    }

    /// Reads file data.
    pub async fn read(
        &mut self,
        target: &FileRef,
        range: ByteRange,
        age: Option<u32>,
    ) -> Result<Payload, ClientError> {
        self.request(Command::read(target, range, age)).await
    }

    /// Reads file header and data together.
    pub async fn read_all(
        &mut self,
        target: &FileRef,
        range: ByteRange,
        age: Option<u32>,
    ) -> Result<Payload, ClientError> {
        self.request(Command::read_all(target, range, age)).await
    }

    pub async fn write_perms(&mut self, target: &FileRef, perms: Perms) -> Result<(), ClientError> {
        self.execute(Command::write_perms(target, perms)).await
    }

    /// Writes `data` at `offset`.
    pub async fn write(
        &mut self,
        target: &FileRef,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ClientError> {
        require_data(data)?;
        self.execute(Command::write(target, offset, data)).await
    }

    /// Writes `data` at `offset` and has the daemon push it to the device.
    pub async fn publish(
        &mut self,
        target: &FileRef,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ClientError> {
        require_data(data)?;
        self.execute(Command::publish(target, offset, data)).await
    }
}

async fn require_dir(path: &Path) -> Result<(), ClientError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(ClientError::InvalidArgument(format!(
            "{} is not a directory",
            path.display()
        ))),
    }
}

fn require_data(data: &[u8]) -> Result<(), ClientError> {
    if data.is_empty() {
        return Err(ClientError::InvalidArgument(
            "write data must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn invalid_argument(err: otdb_protocol::ProtocolError) -> ClientError {
    ClientError::InvalidArgument(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use otdb_protocol::Block;
    use std::collections::VecDeque;

    /// Replays canned replies and records every rendered command.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: VecDeque<Result<String, ClientError>>,
        sent: Vec<String>,
    }

    impl ScriptedTransport {
        fn reply(mut self, line: &str) -> Self {
            self.replies.push_back(Ok(format!("{}\n", line)));
            self
        }

        fn fail(mut self, err: ClientError) -> Self {
            self.replies.push_back(Err(err));
            self
        }
    }

    impl Transport for ScriptedTransport {
        async fn send_command(&mut self, command: &Command) -> Result<String, ClientError> {
            self.sent.push(command.render());
            self.replies
                .pop_front()
                .unwrap_or(Err(ClientError::ConnectionClosed))
        }
    }

    fn client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
        Client::with_transport(transport)
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new(ClientConfig::default());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_list_devices() {
        let mut client = client(ScriptedTransport::default().reply(
            r#"{"err":0,"cmd":"dev-ls","idlist":["0000000000000001","0000000000000002"]}"#,
        ));
        let ids = client.list_devices().await.unwrap();
        assert_eq!(ids, vec![Uid::new(1), Uid::new(2)]);
        assert_eq!(client.transport().sent, vec!["dev-ls -j\n"]);
    }

    #[tokio::test]
    async fn test_read_perms() {
        let target = FileRef::new(5u64, 1);
        let mut client = client(
            ScriptedTransport::default()
                .reply(r#"{"err":0, "cmd":"rp", "mod":420}"#)
                .reply(r#"{"err":7}"#),
        );

        assert_eq!(
            client.read_perms(&target, Some(100)).await.unwrap(),
            Perms::new(420)
        );
        let err = client.read_perms(&target, None).await.unwrap_err();
        assert!(matches!(err, ClientError::Store { code: 7, .. }));

        assert_eq!(
            client.transport().sent,
            vec![
                "rp -j -a 100 -i 0000000000000005 -b isf 1\n",
                "rp -j -i 0000000000000005 -b isf 1\n",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_header_strips_cmd() {
        let target = FileRef::new(5u64, 1).with_block(Block::Iss);
        let mut client = client(
            ScriptedTransport::default()
                .reply(r#"{"err":0,"cmd":"rh","devid":"5","block":2,"id":1,"mod":36,"alloc":8,"length":8,"time":0}"#),
        );
        let payload = client.read_header(&target, None).await.unwrap();
        assert!(!payload.contains_key("cmd"));
        assert_eq!(payload.get("alloc"), Some(&serde_json::Value::from(8)));
    }

    #[tokio::test]
    async fn test_decode_failure_is_protocol_error() {
        let mut client = client(
            ScriptedTransport::default()
                .reply("not json")
                .reply(r#"{"idlist":[]}"#),
        );
        let target = FileRef::new(1u64, 0);

        let err = client.read(&target, ByteRange::all(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));

        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_passes_through() {
        let mut client = client(ScriptedTransport::default().fail(ClientError::Timeout));
        let err = client.delete_device(1u64).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }

    #[tokio::test]
    async fn test_save_missing_dir_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut client = client(ScriptedTransport::default().reply(r#"{"err":0}"#));

        let err = client.save(false, &[], &missing).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        let err = client.load(&missing).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(client.transport().sent.is_empty());
    }

    #[tokio::test]
    async fn test_save_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("archive.bin");
        std::fs::write(&file, b"x").unwrap();
        let mut client = client(ScriptedTransport::default());

        assert!(client.save(true, &[], &file).await.is_err());
        assert!(client.new_device(1u64, Some(file.as_path())).await.is_err());
        assert!(client.transport().sent.is_empty());
    }

    #[tokio::test]
    async fn test_save_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(ScriptedTransport::default().reply(r#"{"err":0,"cmd":"save"}"#));

        client
            .save(true, &[Uid::new(1)], dir.path())
            .await
            .unwrap();
        let sent = &client.transport().sent[0];
        assert!(sent.starts_with("save -j -c 0000000000000001 "));
        assert!(sent.ends_with(&format!("{}\n", dir.path().display())));
    }

    #[tokio::test]
    async fn test_write_empty_data_sends_nothing() {
        let mut client = client(ScriptedTransport::default());
        let target = FileRef::new(1u64, 2);

        let err = client.write(&target, 0, &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(client.publish(&target, 0, &[]).await.is_err());
        assert!(client.transport().sent.is_empty());
    }

    #[tokio::test]
    async fn test_file_writes() {
        let target = FileRef::new(0xabu64, 4);
        let mut client = client(
            ScriptedTransport::default()
                .reply(r#"{"err":0}"#)
                .reply(r#"{"err":0}"#)
                .reply(r#"{"err":-512}"#),
        );

        client.write(&target, 1, &[0x01, 0x02]).await.unwrap();
        client.write_perms(&target, Perms::new(0o60)).await.unwrap();
        let err = client.new_file(&target, Perms::new(0o44), 16).await.unwrap_err();
        assert!(err.is_store_error());

        assert_eq!(
            client.transport().sent,
            vec![
                "w -j -i 00000000000000ab -b isf -r 1:2 4 0102\n",
                "wp -j -i 00000000000000ab -b isf 4 60\n",
                "new -j -i 00000000000000ab -b isf 4 44 16\n",
            ]
        );
    }
}
