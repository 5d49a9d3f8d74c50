//! Opaque entity identifiers.
//!
//! Every stored record is keyed by a 12-byte token rendered as a fixed
//! 24-character lowercase hex string: a 4-byte unix-seconds prefix (ids sort
//! roughly by creation time) followed by 8 random bytes. Parsing a malformed
//! string fails with `AppError::InvalidId`, which callers must keep distinct
//! from "not found".

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

const ID_BYTES: usize = 12;
const ID_HEX_LEN: usize = ID_BYTES * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId([u8; ID_BYTES]);

impl EntityId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&rand::random::<[u8; 8]>());
        EntityId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Fixed-length lowercase hex rendering, the storage format.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EntityId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_HEX_LEN {
            return Err(AppError::InvalidId(format!(
                "expected {} hex characters, got {:?}",
                ID_HEX_LEN, s
            )));
        }
        let decoded =
            hex::decode(s).map_err(|_| AppError::InvalidId(format!("not valid hex: {:?}", s)))?;
        let mut bytes = [0u8; ID_BYTES];
        bytes.copy_from_slice(&decoded);
        Ok(EntityId(bytes))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
