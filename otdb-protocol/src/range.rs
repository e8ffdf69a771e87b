//! Byte ranges for ranged file commands.

use std::fmt;

/// An `(offset, length)` window into a file.
///
/// Rendered as `offset:length`, or `offset:` when the range runs to the end
/// of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    offset: u64,
    length: Option<u64>,
}

impl ByteRange {
    /// Builds a range from signed caller input.
    ///
    /// Negative offsets clamp to zero. A negative length (conventionally -1)
    /// selects all remaining bytes.
    pub fn new(offset: i64, length: i64) -> Self {
        Self {
            offset: offset.max(0) as u64,
            length: u64::try_from(length).ok(),
        }
    }

    /// The whole file.
    pub const fn all() -> Self {
        Self {
            offset: 0,
            length: None,
        }
    }

    /// Everything from `offset` to the end of the file.
    pub const fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            length: None,
        }
    }

    pub const fn bounded(offset: u64, length: u64) -> Self {
        Self {
            offset,
            length: Some(length),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `None` means open-ended.
    pub fn length(&self) -> Option<u64> {
        self.length
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(len) => write!(f, "{}:{}", self.offset, len),
            None => write!(f, "{}:", self.offset),
        }
    }
}

/// Wire form of a range given as signed `(offset, length)`.
pub fn encode_range(offset: i64, length: i64) -> String {
    ByteRange::new(offset, length).to_string()
}
