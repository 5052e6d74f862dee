//! # edbrpc
//!
//! The wire protocol spoken between the EDB client core and the database
//! server: call/reply frames, status codes, typed messages and the registry
//! used to resolve type-erased payloads.
//!
//! ## Invariants
//! - **Opaque Transport**: Nothing here performs I/O. Frames become bytes and
//!   bytes become frames; moving them is the caller's concern.
//! - **Deterministic Encoding**: Equal messages encode to equal bytes.

pub mod error;
pub mod frame;
pub mod message;
pub mod registry;
pub mod status;

#[cfg(test)]
mod tests;

pub use error::Result;
pub use error::RpcError;
pub use frame::CallFrame;
pub use frame::Metadata;
pub use frame::ReplyFrame;
pub use message::decode;
pub use message::encode;
pub use message::AnyMsg;
pub use message::BufferEntryMsg;
pub use message::BufferFailure;
pub use message::BufferMsg;
pub use message::CacheEntry;
pub use message::CacheMsg;
pub use message::EdbObj;
pub use message::Empty;
pub use message::FlushBufferResponse;
pub use message::Message;
pub use message::ResolvedFuture;
pub use registry::MessageRegistry;
pub use status::Code;
pub use status::Status;
