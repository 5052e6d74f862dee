//! # Request Buffer
//!
//! Defers write calls so a batch of them costs one round trip.
//!
//! ## Invariants
//! - **FIFO**: Requests reach the server in submission order.
//! - **Futures**: A deferred call that creates an object hands back a future handle.
//!   Every proxy bound to that future is patched to the real handle when the
//!   batch resolves, and nulled if the creating request never ran.
//! - **Idempotent Flush**: Flushing an empty buffer sends nothing.
//! - **Always Reset**: After a flush, success or failure, the buffer is empty and no
//!   future references are retained.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use edbrpc::BufferEntryMsg;
use edbrpc::BufferMsg;
use edbrpc::FlushBufferResponse;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::handle::Handle;
use crate::handle::HandleSlot;
use crate::interceptor::translate_status;
use crate::util::lock;

/// Where a flushed batch is sent.
#[async_trait::async_trait]
pub trait BufferSink: Send + Sync {
    async fn send_buffer(&self, batch: BufferMsg) -> Result<FlushBufferResponse>;
}

#[derive(Debug)]
pub struct RequestBuffer {
    entries: Mutex<Vec<BufferEntryMsg>>,
    futures: Mutex<HashMap<u64, Vec<Weak<HandleSlot>>>>,
    next_future_id: AtomicU64,
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuffer {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            futures: Mutex::new(HashMap::new()),
            next_future_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Queues a request. Returns the future handle standing in for the object
    /// the request creates, if it creates one.
    pub fn add_request(&self, service: &str, method: &str, request: Vec<u8>, returns_future: bool) -> Option<Handle> {
        let future = returns_future.then(|| self.reserve_future());
        self.push(service, method, request, future.as_ref());
        future
    }

    /// Allocates a future id without queueing anything. An id that is never
    /// pushed is simply skipped.
    pub fn reserve_future(&self) -> Handle {
        Handle::future(self.next_future_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues a request whose future, if any, came from [`Self::reserve_future`].
    pub fn push(&self, service: &str, method: &str, request: Vec<u8>, future: Option<&Handle>) {
        lock(&self.entries).push(BufferEntryMsg {
            service_name: service.to_string(),
            rpc_method_name: method.to_string(),
            request,
            future_id: future.map(|f| f.id),
        });
    }

    /// Registers a proxy's slot for patching when its future resolves.
    /// Slots not currently holding a future are ignored.
    pub fn add_future_ref(&self, slot: &Arc<HandleSlot>) {
        let handle = slot.get();
        if !handle.is_future {
            return;
        }
        let mut futures = lock(&self.futures);
        let refs = futures.entry(handle.id).or_default();
        refs.retain(|r| r.strong_count() > 0);
        if !refs.iter().any(|r| std::ptr::eq(r.as_ptr(), Arc::as_ptr(slot))) {
            refs.push(Arc::downgrade(slot));
        }
    }

    /// Sends every queued request, in order, as one batch.
    ///
    /// Returns the number of requests sent. If the server reports entry `i`
    /// as failed, futures from entries before `i` are still resolved, later
    /// futures are nulled, and the failure is returned.
    pub async fn flush(&self, sink: &dyn BufferSink) -> Result<usize> {
        let entries = std::mem::take(&mut *lock(&self.entries));
        if entries.is_empty() {
            return Ok(0);
        }

        let count = entries.len();
        let pending: Vec<Option<u64>> = entries.iter().map(|e| e.future_id).collect();
        debug!(count, "flushing request buffer");

        let response = match sink.send_buffer(BufferMsg { entries }).await {
            Ok(response) => response,
            Err(e) => {
                self.abandon(pending.iter().flatten().copied());
                return Err(e);
            }
        };

        for resolved in &response.resolved_futures {
            self.resolve(resolved.future_id, Handle::from(&resolved.edb_obj));
        }

        if let Some(failure) = response.failure {
            let unrun = pending.get(failure.index..).unwrap_or_default();
            self.abandon(unrun.iter().flatten().copied());
            self.abandon_all();
            return Err(Error::FlushFailed { index: failure.index, source: Box::new(translate_status(failure.status)) });
        }

        // Anything left was never answered by the server.
        self.abandon_all();
        Ok(count)
    }

    /// Drops queued requests without sending them. Their futures become null.
    /// Returns how many requests were dropped.
    pub fn discard(&self) -> usize {
        let entries = std::mem::take(&mut *lock(&self.entries));
        self.abandon(entries.iter().filter_map(|e| e.future_id));
        self.abandon_all();
        entries.len()
    }

    fn resolve(&self, future_id: u64, handle: Handle) {
        let refs = lock(&self.futures).remove(&future_id).unwrap_or_default();
        for slot in refs.iter().filter_map(Weak::upgrade) {
            if slot.get() == Handle::future(future_id) {
                slot.set(handle);
            }
        }
    }

    fn abandon(&self, future_ids: impl IntoIterator<Item = u64>) {
        for future_id in future_ids {
            self.resolve(future_id, Handle::NULL);
        }
    }

    fn abandon_all(&self) {
        let future_ids: Vec<u64> = lock(&self.futures).keys().copied().collect();
        self.abandon(future_ids);
    }
}
