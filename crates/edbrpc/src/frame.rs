//! # Protocol Frames
//!
//! Defines the structure of the RPC envelope (Call vs Reply).
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on unknown data.
//! - **Correlation**: A reply carries the `seq` of the call it answers.
//! - **Opaque Payloads**: Frames never interpret the message bytes they carry.

use crate::error::Result;
use crate::error::RpcError;
use crate::status::Status;

use serde::Deserialize;
use serde::Serialize;

/// Ordered string key/value pairs sent alongside a call or a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Keys may repeat; `get` returns the first.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An outbound request: which service method to run, with which payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    pub seq: u64,
    pub service: String,
    pub method: String,
    pub metadata: Metadata,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl CallFrame {
    pub fn new(seq: u64, service: &str, method: &str, payload: Vec<u8>) -> Self {
        Self {
            seq,
            service: service.to_string(),
            method: method.to_string(),
            metadata: Metadata::new(),
            payload,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let frame: Self = rmp_serde::from_slice(bytes)?;
        if frame.service.is_empty() || frame.method.is_empty() {
            return Err(RpcError::ProtocolViolation("call frame without a target".into()));
        }
        Ok(frame)
    }
}

/// An inbound response. The payload is only meaningful when the status is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub seq: u64,
    pub status: Status,
    pub trailing_metadata: Metadata,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl ReplyFrame {
    pub fn ok(seq: u64, payload: Vec<u8>) -> Self {
        Self { seq, status: Status::ok(), trailing_metadata: Metadata::new(), payload }
    }

    pub fn failure(seq: u64, status: Status) -> Self {
        Self { seq, status, trailing_metadata: Metadata::new(), payload: Vec::new() }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Splits the reply into its payload or the failing status.
    pub fn into_result(self) -> std::result::Result<Vec<u8>, Status> {
        if self.status.is_ok() {
            Ok(self.payload)
        } else {
            Err(self.status)
        }
    }
}
