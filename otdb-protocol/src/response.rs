//! Reply decoding.
//!
//! The daemon answers every command with exactly one line holding a JSON
//! object. An integer `err` field is mandatory: zero is success, anything
//! else is a store-side failure. The remaining fields are the payload.

use crate::command::{Block, Perms};
use crate::error::{ProtocolError, StoreError};
use crate::uid::Uid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload fields of a reply, housekeeping removed.
pub type Payload = serde_json::Map<String, Value>;

/// Status field present in every reply.
pub const ERR_FIELD: &str = "err";

/// Fields the daemon echoes back that carry no payload.
pub const HOUSEKEEPING_FIELDS: &[&str] = &["cmd"];

/// A decoded reply line.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    code: i64,
    payload: Payload,
}

impl Reply {
    /// Parses and validates one reply line.
    ///
    /// Fails if the line is not a JSON object or has no integer `err`. A
    /// non-zero `err` is *not* a decode failure; see [`Reply::into_result`].
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(line.trim_end_matches(['\r', '\n']))?;
        let Value::Object(mut payload) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let code = payload
            .remove(ERR_FIELD)
            .ok_or(ProtocolError::MissingErr)?
            .as_i64()
            .ok_or(ProtocolError::InvalidErr)?;

        for field in HOUSEKEEPING_FIELDS {
            payload.remove(*field);
        }

        tracing::trace!(code, fields = payload.len(), "decoded reply");
        Ok(Self { code, payload })
    }

    /// The daemon's `err` value.
    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Splits into the payload on success or a [`StoreError`] otherwise.
    /// The payload rides along in the error for diagnostics.
    pub fn into_result(self) -> Result<Payload, StoreError> {
        if self.is_ok() {
            Ok(self.payload)
        } else {
            Err(StoreError {
                code: self.code,
                payload: self.payload,
            })
        }
    }
}

/// Decodes the `idlist` of a `dev-ls` reply.
pub fn device_list(payload: &Payload) -> Result<Vec<Uid>, ProtocolError> {
    let ids = payload
        .get("idlist")
        .ok_or(ProtocolError::MissingField("idlist"))?
        .as_array()
        .ok_or_else(|| ProtocolError::InvalidField {
            field: "idlist",
            reason: "not an array".to_string(),
        })?;

    ids.iter()
        .map(|id| match id.as_str() {
            Some(hex) => Uid::from_hex(hex),
            None => Err(ProtocolError::InvalidField {
                field: "idlist",
                reason: format!("entry {} is not a string", id),
            }),
        })
        .collect()
}

/// Decodes the `mod` field of an `rp` (or `rh`/`r*`) reply.
pub fn perms(payload: &Payload) -> Result<Perms, ProtocolError> {
    let bits = payload
        .get("mod")
        .ok_or(ProtocolError::MissingField("mod"))?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ProtocolError::InvalidField {
            field: "mod",
            reason: "not a non-negative integer".to_string(),
        })?;
    Ok(Perms::new(bits))
}

/// Typed view of a file header, as returned by `rh` and `r*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    /// Device the file belongs to.
    pub devid: Uid,
    /// Numeric block id.
    pub block: u8,
    /// File id within the block.
    pub id: u32,
    /// Permission bits.
    #[serde(rename = "mod")]
    pub perms: u32,
    /// Bytes allocated.
    pub alloc: u32,
    /// Bytes in use.
    pub length: u32,
    /// Modification time, seconds.
    pub time: u32,
}

impl FileHeader {
    pub fn from_payload(payload: &Payload) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_value(Value::Object(payload.clone()))?)
    }

    pub fn block(&self) -> Option<Block> {
        Block::from_id(self.block.into())
    }

    pub fn perms(&self) -> Perms {
        Perms::new(self.perms)
    }
}
