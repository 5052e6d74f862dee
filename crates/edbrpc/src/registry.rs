//! # Message Registry
//!
//! Maps wire type names to the code that understands them. Used wherever the
//! client receives type-erased messages (`AnyMsg`) and must bring them into
//! canonical form without knowing their Rust type statically.
//!
//! ## Philosophy
//! The table is explicit and built once. A name that is not registered is a
//! hard error rather than a guess.

use std::collections::HashMap;

use crate::error::Result;
use crate::error::RpcError;
use crate::message::decode;
use crate::message::encode;
use crate::message::AnyMsg;
use crate::message::Message;

type CanonicalizeFn = fn(&[u8]) -> Result<Vec<u8>>;

/// Per-type handling registered under a wire name.
#[derive(Clone, Copy)]
pub struct MessageType {
    pub type_name: &'static str,
    canonicalize: CanonicalizeFn,
}

impl MessageType {
    /// Decodes the bytes as this type and re-encodes them.
    pub fn canonicalize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        (self.canonicalize)(bytes)
    }
}

impl std::fmt::Debug for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageType").field("type_name", &self.type_name).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    types: HashMap<&'static str, MessageType>,
}

fn canonicalize_as<M: Message>(bytes: &[u8]) -> Result<Vec<u8>> {
    let msg: M = decode(bytes)?;
    encode(&msg)
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M` under its wire name. Re-registering replaces the entry.
    pub fn register<M: Message>(mut self) -> Self {
        self.types.insert(
            M::TYPE_NAME,
            MessageType { type_name: M::TYPE_NAME, canonicalize: canonicalize_as::<M> },
        );
        self
    }

    pub fn resolve(&self, type_name: &str) -> Result<&MessageType> {
        self.types
            .get(type_name)
            .ok_or_else(|| RpcError::UnknownMessageType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// The canonical bytes of a type-erased message.
    pub fn canonicalize(&self, msg: &AnyMsg) -> Result<Vec<u8>> {
        self.resolve(&msg.type_name)?.canonicalize(&msg.value)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
