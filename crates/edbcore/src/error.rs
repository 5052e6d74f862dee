//! # Client Errors
//!
//! Every failure a caller of the client core can observe. Server statuses that
//! the interceptor chain recognizes arrive here as dedicated variants; all
//! others are carried opaquely in `Status`.

use edbrpc::RpcError;
use edbrpc::Status;

use crate::rpc_info;

pub(crate) const UNAVAILABLE_HINT: &str =
    "EDB server is not accessible. Make sure an instance is listening on the specified port.";

/// How bad a failure is, in the server's own severity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

#[derive(Debug)]
pub enum Error {
    /// No session, or the server cannot be reached.
    Unavailable(String),
    /// The server rejected the request arguments.
    InvalidArgument { details: String },
    /// Any other non-OK status, unmodified.
    Status(Status),
    /// Encoding, decoding or framing failed.
    Rpc(RpcError),
    /// A registry was asked for a tag it does not contain.
    UnknownType { registry: &'static str, tag: i32 },
    /// A polymorphic object was not of the requested kind.
    UnexpectedType { expected: &'static str, found: &'static str },
    /// Caching or buffering was activated while a scope is already live.
    IoScopeActive,
    /// Entry `index` of a flushed batch failed; later entries were not run.
    FlushFailed { index: usize, source: Box<Error> },
    /// A reply answered a different call.
    SequenceMismatch { sent: u64, received: u64 },
    /// The RPC metadata table is inconsistent.
    Ledger(rpc_info::Error),
    /// A configuration value could not be parsed.
    Config(String),
    /// The tracing subscriber could not be installed.
    Logging(String),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Unavailable(_) => Severity::Fatal,
            Self::FlushFailed { source, .. } => source.severity(),
            _ => Severity::Error,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) if details.is_empty() => write!(f, "{}", UNAVAILABLE_HINT),
            Self::Unavailable(details) => write!(f, "{} ({})", UNAVAILABLE_HINT, details),
            Self::InvalidArgument { details } => write!(f, "Invalid argument: {}", details),
            Self::Status(status) => write!(f, "Server error: {}", status),
            Self::Rpc(e) => write!(f, "RPC error: {}", e),
            Self::UnknownType { registry, tag } => {
                write!(f, "No {} type is registered for tag {}", registry, tag)
            }
            Self::UnexpectedType { expected, found } => {
                write!(f, "Expected a {} object, found {}", expected, found)
            }
            Self::IoScopeActive => write!(f, "An IO scope is already active on this session"),
            Self::FlushFailed { index, source } => {
                write!(f, "Buffered request {} failed: {}", index, source)
            }
            Self::SequenceMismatch { sent, received } => {
                write!(f, "Sequence mismatch: sent {}, received {}", sent, received)
            }
            Self::Ledger(e) => write!(f, "RPC ledger error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Logging(msg) => write!(f, "Logging setup failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rpc(e) => Some(e),
            Self::Status(s) => Some(s),
            Self::FlushFailed { source, .. } => Some(source.as_ref()),
            Self::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Self::Rpc(e)
    }
}

impl From<rpc_info::Error> for Error {
    fn from(e: rpc_info::Error) -> Self {
        Self::Ledger(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
