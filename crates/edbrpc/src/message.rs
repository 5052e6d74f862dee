//! # Messages
//!
//! Typed payloads carried inside frames, plus the handle, cache and buffer
//! messages shared by every service.
//!
//! ## Invariants
//! - **Determinism**: Encoding the same value twice yields identical bytes.
//!   Messages therefore never contain hash maps; the encoded form doubles as
//!   the canonical request key for response caching.
//! - **Self Description**: Every message names its wire type via `TYPE_NAME`,
//!   which is what `AnyMsg` envelopes and the registry key on.

use crate::error::Result;
use crate::error::RpcError;
use crate::status::Status;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

/// A payload type with a fully qualified wire name.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TYPE_NAME: &'static str;
}

/// Implements [`Message`] for a type.
///
/// ```ignore
/// edbrpc::message!(NetCreateMsg => "ansys.api.edb.v1.NetCreateMessage");
/// ```
#[macro_export]
macro_rules! message {
    ($ty:ty => $name:expr) => {
        impl $crate::Message for $ty {
            const TYPE_NAME: &'static str = $name;
        }
    };
}

pub fn encode<M: Serialize>(msg: &M) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(msg)?)
}

pub fn decode<M: DeserializeOwned>(bytes: &[u8]) -> Result<M> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// A type-erased message: the wire type name plus its encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyMsg {
    pub type_name: String,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

impl AnyMsg {
    pub fn pack<M: Message>(msg: &M) -> Result<Self> {
        Ok(Self { type_name: M::TYPE_NAME.to_string(), value: encode(msg)? })
    }

    pub fn unpack<M: Message>(&self) -> Result<M> {
        if self.type_name != M::TYPE_NAME {
            return Err(RpcError::TypeMismatch {
                expected: M::TYPE_NAME.to_string(),
                found: self.type_name.clone(),
            });
        }
        decode(&self.value)
    }

    pub fn is<M: Message>(&self) -> bool {
        self.type_name == M::TYPE_NAME
    }
}

// ============================================================================
// Core Messages
// ============================================================================

/// The wire form of a remote handle.
///
/// `id == 0` is the null sentinel. `is_future` marks a client-side placeholder
/// for an object that a buffered request will create. A server may attach a
/// `cache` of pre-answered requests when returning a handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdbObj {
    pub id: u64,
    pub is_future: bool,
    pub cache: Option<CacheMsg>,
}

impl EdbObj {
    pub fn new(id: u64) -> Self {
        Self { id, is_future: false, cache: None }
    }

    pub fn future(id: u64) -> Self {
        Self { id, is_future: true, cache: None }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn is_null(&self) -> bool {
        self.id == 0
    }

    pub fn with_cache(mut self, cache: CacheMsg) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// The empty payload, returned by calls without a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty;

/// Pre-answered requests piggybacked on a returned handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMsg {
    pub entries: Vec<CacheEntry>,
}

/// One pre-answered request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub service_name: String,
    pub rpc_method_name: String,
    pub request: AnyMsg,
    pub response: AnyMsg,
}

impl CacheEntry {
    pub fn new<Req: Message, Resp: Message>(
        service: &str,
        method: &str,
        request: &Req,
        response: &Resp,
    ) -> Result<Self> {
        Ok(Self {
            service_name: service.to_string(),
            rpc_method_name: method.to_string(),
            request: AnyMsg::pack(request)?,
            response: AnyMsg::pack(response)?,
        })
    }
}

/// One deferred write, in submission order within a `BufferMsg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferEntryMsg {
    pub service_name: String,
    pub rpc_method_name: String,
    #[serde(with = "serde_bytes")]
    pub request: Vec<u8>,
    /// Set when the request creates an object the client holds a future for.
    pub future_id: Option<u64>,
}

/// A batch of deferred writes sent in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferMsg {
    pub entries: Vec<BufferEntryMsg>,
}

/// The real handle behind a client future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFuture {
    pub future_id: u64,
    pub edb_obj: EdbObj,
}

/// The first entry of a batch that failed. Entries after it were not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferFailure {
    pub index: usize,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushBufferResponse {
    pub resolved_futures: Vec<ResolvedFuture>,
    pub failure: Option<BufferFailure>,
}

crate::message!(EdbObj => "ansys.api.edb.v1.EDBObjMessage");
crate::message!(Empty => "google.protobuf.Empty");
crate::message!(CacheMsg => "ansys.api.edb.v1.CacheMessage");
crate::message!(BufferMsg => "ansys.api.edb.v1.BufferMessage");
crate::message!(FlushBufferResponse => "ansys.api.edb.v1.FlushBufferResponse");
