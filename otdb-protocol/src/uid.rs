//! 64-bit device identifiers and their hex wire form.

use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in a device identifier.
pub const UID_LEN: usize = 8;

/// A device identifier.
///
/// On the wire a UID is always 16 lower-case hex digits, big-endian, with no
/// prefix. The all-zero value doubles as the sentinel for unusable input and
/// is interpreted by the daemon as "the last-used device".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uid(u64);

impl Uid {
    /// The all-zero identifier.
    pub const SENTINEL: Uid = Uid(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Builds a UID from a raw byte sequence.
    ///
    /// Anything other than exactly eight bytes degrades to [`Uid::SENTINEL`]
    /// instead of failing; use `Uid::try_from(&[u8])` to reject it instead.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match Self::try_from(bytes) {
            Ok(uid) => uid,
            Err(_) => {
                tracing::warn!(len = bytes.len(), "device id is not 8 bytes, using sentinel");
                Self::SENTINEL
            }
        }
    }

    /// Big-endian byte form.
    pub fn to_bytes(self) -> [u8; UID_LEN] {
        self.0.to_be_bytes()
    }

    /// Canonical wire form: exactly 16 lower-case hex digits.
    pub fn to_hex(self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses a hex device id as printed by the daemon.
    ///
    /// The daemon does not always zero-pad, so 1 to 16 digits of either case
    /// are accepted.
    pub fn from_hex(s: &str) -> Result<Self, ProtocolError> {
        let digits = s.trim();
        if digits.is_empty()
            || digits.len() > UID_LEN * 2
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(ProtocolError::InvalidUid(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ProtocolError::InvalidUid(s.to_string()))
    }

    pub fn is_sentinel(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Uid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Uid> for u64 {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl From<[u8; UID_LEN]> for Uid {
    fn from(bytes: [u8; UID_LEN]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; UID_LEN] = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidUid(hex::encode(bytes)))?;
        Ok(Self::from(raw))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Uid {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
