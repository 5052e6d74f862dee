//! # IO Management
//!
//! Per-session state for the two latency optimizations: the response cache
//! (reads) and the request buffer (writes). Both are off unless a scope is
//! active.
//!
//! ## Invariants
//! - **One Scope**: At most one scope is live per session. Activating another while
//!   one is live fails; scopes are not implicitly nested.
//! - **Scoped Lifetime**: The cache and buffer are created when a scope begins and
//!   dropped when it ends. Nothing survives to the next scope.
//! - **Notify the Server**: Scope transitions and cache invalidation are queued as
//!   notifications and ride along on the next outgoing call.

pub mod buffer;
pub mod cache;

use std::sync::Arc;
use std::sync::Mutex;

use edbrpc::MessageRegistry;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;
use crate::rpc_info::RpcLedger;
use crate::session::Session;
use crate::util::lock;

pub use buffer::BufferSink;
pub use buffer::RequestBuffer;
pub use cache::CacheOutcome;
pub use cache::ResponseCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    /// Cache reads only.
    ReadOnly,
    /// Buffer writes only.
    WriteOnly,
    /// Cache reads and buffer writes. Flushing invalidates the cache.
    ReadAndWrite,
}

impl IoMode {
    pub fn caches(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadAndWrite)
    }

    pub fn buffers(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadAndWrite)
    }
}

/// Events the server is told about so it can mirror the client's IO state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerNotification {
    BeginCaching,
    EndCaching,
    InvalidateCache,
}

impl ServerNotification {
    pub fn metadata_key(self) -> &'static str {
        match self {
            Self::BeginCaching => "begin-caching",
            Self::EndCaching => "end-caching",
            Self::InvalidateCache => "invalidate-cache",
        }
    }
}

#[derive(Default)]
struct IoState {
    mode: Option<IoMode>,
    cache: Option<Arc<ResponseCache>>,
    buffer: Option<Arc<RequestBuffer>>,
    notifications: Vec<ServerNotification>,
}

pub struct IoManager {
    state: Mutex<IoState>,
    messages: Arc<MessageRegistry>,
    ledger: Arc<RpcLedger>,
}

impl IoManager {
    pub fn new(messages: Arc<MessageRegistry>, ledger: Arc<RpcLedger>) -> Self {
        Self { state: Mutex::new(IoState::default()), messages, ledger }
    }

    pub fn mode(&self) -> Option<IoMode> {
        lock(&self.state).mode
    }

    pub fn cache(&self) -> Option<Arc<ResponseCache>> {
        lock(&self.state).cache.clone()
    }

    pub fn buffer(&self) -> Option<Arc<RequestBuffer>> {
        lock(&self.state).buffer.clone()
    }

    pub(crate) fn start(&self, mode: IoMode) -> Result<()> {
        let mut state = lock(&self.state);
        if state.mode.is_some() {
            return Err(Error::IoScopeActive);
        }
        state.mode = Some(mode);
        if mode.caches() {
            state.cache = Some(Arc::new(ResponseCache::new(self.messages.clone(), self.ledger.clone())));
            state.notifications.push(ServerNotification::BeginCaching);
        }
        if mode.buffers() {
            state.buffer = Some(Arc::new(RequestBuffer::new()));
        }
        Ok(())
    }

    /// Ends the live scope, handing back its buffer so the caller can dispose
    /// of anything still queued.
    pub(crate) fn end(&self) -> Option<Arc<RequestBuffer>> {
        let mut state = lock(&self.state);
        state.mode = None;
        if state.cache.take().is_some() {
            state.notifications.push(ServerNotification::EndCaching);
        }
        state.buffer.take()
    }

    /// Drops every cached response. The server is only told when something
    /// was actually dropped.
    pub(crate) fn invalidate_cache(&self) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if state.cache.as_ref().is_some_and(|cache| cache.invalidate()) {
            state.notifications.push(ServerNotification::InvalidateCache);
        }
    }

    pub(crate) fn take_notifications(&self) -> Vec<ServerNotification> {
        std::mem::take(&mut lock(&self.state).notifications)
    }
}

/// A live caching and/or buffering scope.
///
/// Call [`IoScope::finish`] to flush pending writes and end the scope.
/// Dropping the scope instead ends it without sending queued writes; their
/// future handles become null.
#[must_use = "the scope ends as soon as it is dropped"]
pub struct IoScope {
    session: Option<Session>,
}

impl IoScope {
    pub(crate) fn begin(session: &Session, mode: IoMode) -> Result<Self> {
        session.io().start(mode)?;
        Ok(Self { session: Some(session.clone()) })
    }

    pub fn mode(&self) -> Option<IoMode> {
        self.session.as_ref().and_then(|s| s.io().mode())
    }

    /// Sends queued writes without ending the scope.
    pub async fn flush(&self) -> Result<()> {
        match &self.session {
            Some(session) => session.flush().await,
            None => Ok(()),
        }
    }

    /// Flushes, then ends the scope. The scope ends even if the flush fails.
    pub async fn finish(mut self) -> Result<()> {
        let Some(session) = self.session.take() else { return Ok(()) };
        let result = session.flush().await;
        end_scope(&session);
        result
    }
}

impl Drop for IoScope {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            end_scope(&session);
        }
    }
}

fn end_scope(session: &Session) {
    if let Some(buffer) = session.io().end() {
        let dropped = buffer.discard();
        if dropped > 0 {
            warn!(dropped, "io scope ended with unsent buffered requests; they were discarded");
        }
    }
}
