//! # TCP Transport
//!
//! Length-prefixed frames over a single TCP connection: a big-endian `u32`
//! byte count followed by the frame. One call is in flight at a time.
//!
//! A failed exchange can leave part of a reply on the socket, so the first
//! framing or socket error shuts the connection down and every later call
//! fails with [`TransportError::ConnectionLost`].

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::ToSocketAddrs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::transport::Result;
use crate::transport::Transport;
use crate::transport::TransportError;

pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::PayloadTooLarge);
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::PayloadTooLarge);
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

pub struct TcpTransport {
    stream: Mutex<TcpStream>,
    broken: AtomicBool,
}

impl TcpTransport {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionLost(e.to_string()))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream: Mutex::new(stream), broken: AtomicBool::new(false) })
    }

    /// Whether an earlier failure has closed the connection.
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn call(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(TransportError::PayloadTooLarge);
        }
        let mut stream = self.stream.lock().await;
        if self.is_broken() {
            return Err(TransportError::ConnectionLost("connection closed after a failed call".to_string()));
        }

        let result = match write_frame(&mut *stream, payload).await {
            Ok(()) => read_frame(&mut *stream).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            // The stream position is unknown now.
            warn!(error = %e, "closing connection after transport error");
            self.broken.store(true, Ordering::Release);
            let _ = stream.shutdown().await;
        }
        result
    }
}
