//! # Session
//!
//! The client's connection to one database server and the single path every
//! remote call takes.
//!
//! ## The Call Pipeline
//!
//! 1. A bufferable call with a live buffer is queued; the caller gets a synthetic
//!    reply (a future handle, or empty).
//! 2. Any other call first flushes a non-empty buffer, so it observes every write
//!    issued before it.
//! 3. A cacheable call with a live cache is answered from the cache on a hit.
//! 4. Otherwise the call goes over the wire through the interceptor chain.
//!
//! The request is built lazily, after step 2, so that handles it references
//! have already been resolved by the flush.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use edbrpc::BufferMsg;
use edbrpc::CallFrame;
use edbrpc::EdbObj;
use edbrpc::Empty;
use edbrpc::FlushBufferResponse;
use edbrpc::Message;
use edbrpc::MessageRegistry;
use edbrpc::ReplyFrame;
use edbrpc::Status;
use edbrpc::decode;
use edbrpc::encode;
use tracing::debug;
use tracing::trace;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::error::Result;
use crate::interceptor::ExceptionInterceptor;
use crate::interceptor::Interceptor;
use crate::interceptor::LoggingInterceptor;
use crate::interceptor::NotificationInterceptor;
use crate::interceptor::RpcCounter;
use crate::io::BufferSink;
use crate::io::IoManager;
use crate::io::IoMode;
use crate::io::IoScope;
use crate::io::RequestBuffer;
use crate::messages;
use crate::rpc_info::FLUSH_BUFFER;
use crate::rpc_info::RpcLedger;
use crate::rpc_info::default_ledger;
use crate::rpc_info::service;
use crate::tcp::TcpTransport;
use crate::transport::Transport;

struct Inner {
    transport: Arc<dyn Transport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    ledger: Arc<RpcLedger>,
    io: Arc<IoManager>,
    counter: Option<Arc<RpcCounter>>,
    seq: AtomicU64,
}

/// A handle to a live session. Clones share the same connection and IO state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("io_mode", &self.inner.io.mode())
            .field("interceptors", &self.inner.interceptors.len())
            .finish()
    }
}

impl Session {
    pub fn builder(transport: Arc<dyn Transport>) -> SessionBuilder {
        SessionBuilder::new(transport)
    }

    /// Connects over TCP to a server that is already running.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = TcpTransport::connect(config.address())
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        Self::builder(Arc::new(transport)).count_rpcs(config.count_rpcs).build()
    }

    pub fn io(&self) -> &IoManager {
        &self.inner.io
    }

    pub fn ledger(&self) -> &RpcLedger {
        &self.inner.ledger
    }

    /// Wire-call counts, when the session was built with `count_rpcs`.
    pub fn rpc_counter(&self) -> Option<&RpcCounter> {
        self.inner.counter.as_deref()
    }

    pub fn enable_caching(&self) -> Result<IoScope> {
        self.enable_io(IoMode::ReadOnly)
    }

    pub fn enable_buffering(&self) -> Result<IoScope> {
        self.enable_io(IoMode::WriteOnly)
    }

    pub fn enable_io(&self, mode: IoMode) -> Result<IoScope> {
        IoScope::begin(self, mode)
    }

    /// Sends the live buffer's queued writes, if any.
    pub async fn flush(&self) -> Result<()> {
        match self.inner.io.buffer() {
            Some(buffer) => self.flush_buffer(&buffer).await,
            None => Ok(()),
        }
    }

    async fn flush_buffer(&self, buffer: &RequestBuffer) -> Result<()> {
        let outcome = buffer.flush(self).await;
        // Flushed writes may have changed anything a cached read returned.
        if !matches!(outcome, Ok(0)) {
            self.inner.io.invalidate_cache();
        }
        outcome.map(|_| ())
    }

    /// Performs one logical call. `build` produces the request and is only
    /// invoked once it is known how the call will be served.
    pub async fn call<Req, Resp, F>(&self, service: &str, method: &str, build: F) -> Result<Resp>
    where
        Req: Message,
        Resp: Message,
        F: FnOnce() -> Req,
    {
        let info = self.inner.ledger.get_rpc_info(service, method).unwrap_or_default();

        if let Some(buffer) = self.inner.io.buffer() {
            if info.can_buffer {
                let request = encode(&build())?;
                let future = info.returns_future.then(|| buffer.reserve_future());
                let reply = match &future {
                    Some(future) => encode(&EdbObj::from(*future))?,
                    None => encode(&Empty)?,
                };
                // A reply the caller cannot accept must not leave a write behind.
                let resp = decode(&reply)?;
                buffer.push(service, method, request, future.as_ref());
                trace!(service, method, "buffered");
                return Ok(resp);
            }
            if !buffer.is_empty() {
                self.flush_buffer(&buffer).await?;
            }
        }

        let request = encode(&build())?;
        let cache = self.inner.io.cache().filter(|_| info.can_cache);
        if let Some(cache) = &cache {
            if let Some(hit) = cache.get(service, method, &request) {
                trace!(service, method, "cache hit");
                return Ok(decode(hit.result())?);
            }
        }

        let reply = self.invoke(service, method, &request).await?;
        if let Some(cache) = &cache {
            cache.add(service, method, &request, &reply);
        }
        Ok(decode(&reply)?)
    }

    /// Sends one frame across the wire through the interceptor chain and
    /// returns the reply payload.
    async fn invoke(&self, service: &str, method: &str, request: &[u8]) -> Result<Vec<u8>> {
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        let mut call = CallFrame::new(seq, service, method, request.to_vec());
        for interceptor in &self.inner.interceptors {
            interceptor.before_call(&mut call);
        }

        let reply = match self.inner.transport.call(&call.to_bytes()?).await {
            Ok(bytes) => ReplyFrame::from_bytes(&bytes)?,
            Err(e) => {
                debug!(service, method, error = %e, "transport failure");
                ReplyFrame::failure(seq, Status::from(&e))
            }
        };

        if reply.seq != seq {
            return Err(Error::SequenceMismatch { sent: seq, received: reply.seq });
        }

        for interceptor in &self.inner.interceptors {
            interceptor.after_reply(&call, &reply)?;
        }

        reply.into_result().map_err(Error::Status)
    }
}

#[async_trait::async_trait]
impl BufferSink for Session {
    async fn send_buffer(&self, batch: BufferMsg) -> Result<FlushBufferResponse> {
        let reply = self.invoke(service::CACHING, FLUSH_BUFFER, &encode(&batch)?).await?;
        Ok(decode(&reply)?)
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct SessionBuilder {
    transport: Arc<dyn Transport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    ledger: Arc<RpcLedger>,
    messages: Option<Arc<MessageRegistry>>,
    count_rpcs: bool,
}

impl SessionBuilder {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
            ledger: default_ledger(),
            messages: None,
            count_rpcs: false,
        }
    }

    /// Appends an interceptor after the built-in ones.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replaces the RPC metadata table.
    pub fn ledger(mut self, ledger: RpcLedger) -> Self {
        self.ledger = Arc::new(ledger);
        self
    }

    /// Replaces the message registry used to ingest piggybacked cache entries.
    pub fn messages(mut self, messages: MessageRegistry) -> Self {
        self.messages = Some(Arc::new(messages));
        self
    }

    pub fn count_rpcs(mut self, enabled: bool) -> Self {
        self.count_rpcs = enabled;
        self
    }

    pub fn build(self) -> Result<Session> {
        self.ledger.validate()?;

        let messages = self.messages.unwrap_or_else(messages::registry);
        let io = Arc::new(IoManager::new(messages, self.ledger.clone()));
        let counter = self.count_rpcs.then(|| Arc::new(RpcCounter::new()));

        let mut interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(NotificationInterceptor::new(io.clone())),
            Arc::new(LoggingInterceptor),
            Arc::new(ExceptionInterceptor),
        ];
        if let Some(counter) = &counter {
            interceptors.push(counter.clone());
        }
        interceptors.extend(self.interceptors);

        Ok(Session {
            inner: Arc::new(Inner {
                transport: self.transport,
                interceptors,
                ledger: self.ledger,
                io,
                counter,
                seq: AtomicU64::new(1),
            }),
        })
    }
}
