//! # Error Definitions
//!
//! The central ledger of wire-level failures: encoding, decoding and framing.
//! Remote failures are not errors here; they travel inside a `Status`.

/// Operational failures within the wire protocol itself.
#[derive(Debug)]
pub enum RpcError {
    /// A value could not be serialized to MessagePack.
    Encode(rmp_serde::encode::Error),
    /// The bytes did not decode as the expected message.
    Decode(rmp_serde::decode::Error),
    /// A type name was not present in the message registry.
    UnknownMessageType(String),
    /// An `AnyMsg` envelope carried a different type than the one requested.
    TypeMismatch { expected: String, found: String },
    /// The structure of a frame was malformed.
    ProtocolViolation(String),
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode failed: {}", e),
            Self::Decode(e) => write!(f, "decode failed: {}", e),
            Self::UnknownMessageType(name) => write!(f, "unknown message type '{}'", name),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected '{}', found '{}'", expected, found)
            }
            Self::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rmp_serde::encode::Error> for RpcError {
    fn from(e: rmp_serde::encode::Error) -> Self { Self::Encode(e) }
}

impl From<rmp_serde::decode::Error> for RpcError {
    fn from(e: rmp_serde::decode::Error) -> Self { Self::Decode(e) }
}

/// A specialized Result type for wire operations.
pub type Result<T> = std::result::Result<T, RpcError>;
