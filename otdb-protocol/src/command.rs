//! Command values and their canonical textual rendering.
//!
//! Every request is a single line:
//!
//! ```text
//! <verb> -j [-c] [-a <age>] [-i <uid>] [-b <block>] [-r <range>] [<arg> ...]\n
//! ```
//!
//! Each operation has one constructor that fills in the structured fields it
//! needs; [`Command::render`] is the only place that turns those fields into
//! text, so flag order is identical for every verb.

use crate::error::ProtocolError;
use crate::range::ByteRange;
use crate::uid::Uid;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Flag selecting machine-readable (JSON) output. Present on every command.
pub const JSON_FLAG: &str = "-j";

/// Command verbs understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    // Device management
    DevNew,
    DevDel,
    DevSet,
    DevList,

    // Archives
    Open,
    Save,

    // File management
    Delete,
    New,
    Restore,

    // Reads
    ReadPerms,
    ReadHeader,
    Read,
    ReadAll,

    // Writes
    WritePerms,
    Write,
    Publish,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::DevNew => "dev-new",
            Verb::DevDel => "dev-del",
            Verb::DevSet => "dev-set",
            Verb::DevList => "dev-ls",
            Verb::Open => "open",
            Verb::Save => "save",
            Verb::Delete => "del",
            Verb::New => "new",
            Verb::Restore => "z",
            Verb::ReadPerms => "rp",
            Verb::ReadHeader => "rh",
            Verb::Read => "r",
            Verb::ReadAll => "r*",
            Verb::WritePerms => "wp",
            Verb::Write => "w",
            Verb::Publish => "pub",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage block within a device's file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Block {
    Gfb,
    Iss,
    #[default]
    Isf,
}

impl Block {
    pub fn as_str(&self) -> &'static str {
        match self {
            Block::Gfb => "gfb",
            Block::Iss => "iss",
            Block::Isf => "isf",
        }
    }

    /// Numeric block id used in daemon replies.
    pub fn id(&self) -> u8 {
        match self {
            Block::Gfb => 1,
            Block::Iss => 2,
            Block::Isf => 3,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Block::Gfb),
            2 => Some(Block::Iss),
            3 => Some(Block::Isf),
            _ => None,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Block {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gfb" => Ok(Block::Gfb),
            "iss" => Ok(Block::Iss),
            "isf" => Ok(Block::Isf),
            _ => Err(ProtocolError::UnknownBlock(s.to_string())),
        }
    }
}

/// File permission bits, sent in octal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Perms(u32);

impl Perms {
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl From<u32> for Perms {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

/// A file on a device: the target of every file command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub uid: Uid,
    pub block: Block,
    pub file: u32,
}

impl FileRef {
    /// A file in the default (`isf`) block.
    pub fn new(uid: impl Into<Uid>, file: u32) -> Self {
        Self {
            uid: uid.into(),
            block: Block::default(),
            file,
        }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.block = block;
        self
    }
}

/// A fully specified request, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    compress: bool,
    age: Option<u32>,
    uid: Option<Uid>,
    block: Option<Block>,
    range: Option<ByteRange>,
    args: Vec<String>,
}

impl Command {
    fn new(verb: Verb) -> Self {
        Self {
            verb,
            compress: false,
            age: None,
            uid: None,
            block: None,
            range: None,
            args: Vec::new(),
        }
    }

    fn file(verb: Verb, target: &FileRef) -> Self {
        let mut cmd = Self::new(verb);
        cmd.uid = Some(target.uid);
        cmd.block = Some(target.block);
        cmd
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn file_arg(self, target: &FileRef) -> Self {
        self.arg(target.file.to_string())
    }

    // =========================================================================
    // Device operations
    // =========================================================================

    /// `dev-new`: create a device, optionally from a template directory.
    pub fn new_device(uid: Uid, template: Option<&Path>) -> Result<Self, ProtocolError> {
        let cmd = Self::new(Verb::DevNew).arg(uid.to_hex());
        match template {
            Some(path) => Ok(cmd.arg(path_token(path)?)),
            None => Ok(cmd),
        }
    }

    pub fn delete_device(uid: Uid) -> Self {
        Self::new(Verb::DevDel).arg(uid.to_hex())
    }

    pub fn set_device(uid: Uid) -> Self {
        Self::new(Verb::DevSet).arg(uid.to_hex())
    }

    pub fn list_devices() -> Self {
        Self::new(Verb::DevList)
    }

    // =========================================================================
    // Archive operations
    // =========================================================================

    pub fn open(path: &Path) -> Result<Self, ProtocolError> {
        Ok(Self::new(Verb::Open).arg(path_token(path)?))
    }

    /// `save`: write an archive. An empty `uids` saves every device.
    pub fn save(compress: bool, uids: &[Uid], path: &Path) -> Result<Self, ProtocolError> {
        let mut cmd = Self::new(Verb::Save);
        cmd.compress = compress;
        for uid in uids {
            cmd = cmd.arg(uid.to_hex());
        }
        Ok(cmd.arg(path_token(path)?))
    }

    // =========================================================================
    // File operations
    // =========================================================================

    pub fn delete_file(target: &FileRef) -> Self {
        Self::file(Verb::Delete, target).file_arg(target)
    }

    pub fn new_file(target: &FileRef, perms: Perms, alloc: u32) -> Self {
        Self::file(Verb::New, target)
            .file_arg(target)
            .arg(perms.to_string())
            .arg(alloc.to_string())
    }

    pub fn restore_file(target: &FileRef) -> Self {
        Self::file(Verb::Restore, target).file_arg(target)
    }

    pub fn read_perms(target: &FileRef, age: Option<u32>) -> Self {
        Self::file(Verb::ReadPerms, target)
            .with_age(age)
            .file_arg(target)
    }

    pub fn read_header(target: &FileRef, age: Option<u32>) -> Self {
        Self::file(Verb::ReadHeader, target)
            .with_age(age)
            .file_arg(target)
    }

    pub fn read(target: &FileRef, range: ByteRange, age: Option<u32>) -> Self {
        Self::file(Verb::Read, target)
            .with_age(age)
            .with_range(range)
            .file_arg(target)
    }

    pub fn read_all(target: &FileRef, range: ByteRange, age: Option<u32>) -> Self {
        Self::file(Verb::ReadAll, target)
            .with_age(age)
            .with_range(range)
            .file_arg(target)
    }

    pub fn write_perms(target: &FileRef, perms: Perms) -> Self {
        Self::file(Verb::WritePerms, target)
            .file_arg(target)
            .arg(perms.to_string())
    }

    /// `w`: the range covers exactly `data`, starting at `offset`.
    pub fn write(target: &FileRef, offset: u64, data: &[u8]) -> Self {
        Self::data(Verb::Write, target, offset, data)
    }

    /// `pub`: like `w`, but the daemon also pushes the data to the device.
    pub fn publish(target: &FileRef, offset: u64, data: &[u8]) -> Self {
        Self::data(Verb::Publish, target, offset, data)
    }

    fn data(verb: Verb, target: &FileRef, offset: u64, data: &[u8]) -> Self {
        Self::file(verb, target)
            .with_range(ByteRange::bounded(offset, data.len() as u64))
            .file_arg(target)
            .arg(hex::encode(data))
    }

    fn with_age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }

    fn with_range(mut self, range: ByteRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The command line, newline included.
    pub fn render(&self) -> String {
        let mut line = String::with_capacity(64);
        line.push_str(self.verb.as_str());
        line.push(' ');
        line.push_str(JSON_FLAG);

        if self.compress {
            line.push_str(" -c");
        }
        if let Some(age) = self.age {
            line.push_str(&format!(" -a {}", age));
        }
        if let Some(uid) = self.uid {
            line.push_str(" -i ");
            line.push_str(&uid.to_hex());
        }
        if let Some(block) = self.block {
            line.push_str(" -b ");
            line.push_str(block.as_str());
        }
        if let Some(range) = self.range {
            line.push_str(&format!(" -r {}", range));
        }
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }

        line.push('\n');
        line
    }
}

/// Paths travel as a single space-delimited token.
fn path_token(path: &Path) -> Result<String, ProtocolError> {
    let token = path.to_str().ok_or_else(|| ProtocolError::InvalidField {
        field: "path",
        reason: "not valid UTF-8".to_string(),
    })?;
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(ProtocolError::InvalidField {
            field: "path",
            reason: format!("{:?} cannot be sent as a single token", token),
        });
    }
    Ok(token.to_string())
}
