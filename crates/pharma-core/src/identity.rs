//! # Identifier Newtypes
//!
//! Newtype wrappers for every identifier in PharmaChain. You cannot pass a
//! `BatchId` where an `ActorId` is expected.
//!
//! - [`ActorId`] is the 32-byte Ed25519 public key of a supply-chain
//!   participant. It serializes as 64 lowercase hex characters.
//! - [`BatchId`] is assigned by the ledger from a counter starting at 1 and is
//!   never reused.
//! - [`RequestId`] is a client-chosen UUID v4 that makes a signed submission
//!   single-use.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::PharmaError;
use crate::hex;

/// Public cryptographic identity of an actor (Ed25519 public key bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId([u8; 32]);

impl ActorId {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32 public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, PharmaError> {
        hex::decode_array::<32>(s)
            .map(Self)
            .map_err(|e| PharmaError::Parse(format!("actor id: {e}")))
    }
}

impl FromStr for ActorId {
    type Err = PharmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActorId({}...)", hex::prefix(&self.0))
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Ledger-assigned batch identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    /// The identifier given to the first batch ever registered.
    pub const FIRST: BatchId = BatchId(1);

    /// Wrap a raw batch number.
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    /// The raw batch number.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one.
    pub fn next(&self) -> BatchId {
        BatchId(self.0 + 1)
    }
}

impl FromStr for BatchId {
    type Err = PharmaError;

    /// Accepts `7` or `batch:7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let raw = raw.strip_prefix("batch:").unwrap_or(raw);
        raw.parse::<u64>()
            .map(BatchId)
            .map_err(|e| PharmaError::Parse(format!("batch id {s:?}: {e}")))
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

/// Single-use identifier carried by every submitted action request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate a new random request identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0)
    }
}
