//! # Transport
//!
//! The seam between the session and the network: one call, one reply, as
//! opaque bytes. Frames, statuses and caching all live above this layer, so
//! a transport can be a socket, an in-process server or a test double.

use std::fmt;

use edbrpc::Code;
use edbrpc::Status;

/// A call that never produced a reply.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// No server at the address, or the connection went away mid-call.
    ConnectionLost(String),
    Timeout,
    /// The frame is larger than the transport accepts.
    PayloadTooLarge,
    /// Any other socket failure.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(reason) => write!(f, "connection to the server lost: {}", reason),
            Self::Timeout => write!(f, "server did not answer in time"),
            Self::PayloadTooLarge => write!(f, "frame exceeds the transport limit"),
            Self::Io(reason) => write!(f, "socket error: {}", reason),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Self::ConnectionLost(e.to_string()),
            ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(e.to_string()),
        }
    }
}

/// The status a failed exchange is reported under, so that transport
/// failures and server failures take the same path through the interceptors.
impl From<&TransportError> for Status {
    fn from(e: &TransportError) -> Self {
        let code = match e {
            TransportError::ConnectionLost(_) | TransportError::Io(_) => Code::Unavailable,
            TransportError::Timeout => Code::DeadlineExceeded,
            TransportError::PayloadTooLarge => Code::ResourceExhausted,
        };
        Status::new(code, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Carries an encoded `CallFrame` to the server and brings back the encoded
/// `ReplyFrame`. Held by the session as `Arc<dyn Transport>`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// `Err` only when no reply arrived. A reply carrying a failure status
    /// is still `Ok`.
    async fn call(&self, payload: &[u8]) -> Result<Vec<u8>>;
}
