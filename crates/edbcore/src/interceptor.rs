//! # Interceptor Chain
//!
//! Hooks that see every wire call on its way out and every reply on its way
//! back, before the proxy layer does.
//!
//! ## Invariants
//! - **Ordered**: Interceptors run in registration order, both before the call and
//!   after the reply.
//! - **Short Circuit**: The first interceptor to return an error ends the chain; that
//!   error is what the caller sees.

use std::sync::Arc;

use dashmap::DashMap;
use edbrpc::CallFrame;
use edbrpc::Code;
use edbrpc::ReplyFrame;
use edbrpc::Status;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;
use crate::io::IoManager;

pub trait Interceptor: Send + Sync + 'static {
    fn before_call(&self, _call: &mut CallFrame) {}

    fn after_reply(&self, _call: &CallFrame, _reply: &ReplyFrame) -> Result<()> {
        Ok(())
    }
}

/// Maps a failing status to the error a caller should see.
pub(crate) fn translate_status(status: Status) -> Error {
    match status.code {
        Code::Unavailable => Error::Unavailable(status.details),
        Code::InvalidArgument => Error::InvalidArgument { details: status.details },
        _ => Error::Status(status),
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Re-emits log lines the server attached to a reply.
#[derive(Debug, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub const FATAL: &'static str = "log-fatal";
    pub const ERROR: &'static str = "log-error";
    pub const WARN: &'static str = "log-warn";
    pub const INFO: &'static str = "log-info";
}

impl Interceptor for LoggingInterceptor {
    fn after_reply(&self, call: &CallFrame, reply: &ReplyFrame) -> Result<()> {
        for (key, message) in reply.trailing_metadata.iter() {
            match key {
                Self::FATAL => error!(target: "edb_server", severity = "fatal", method = %call.method, "{}", message),
                Self::ERROR => error!(target: "edb_server", method = %call.method, "{}", message),
                Self::WARN => warn!(target: "edb_server", method = %call.method, "{}", message),
                Self::INFO => info!(target: "edb_server", method = %call.method, "{}", message),
                _ => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Exceptions
// ============================================================================

/// Turns recognized failure statuses into typed errors.
///
/// Unavailable becomes [`Error::Unavailable`], invalid argument becomes
/// [`Error::InvalidArgument`] with the server's details. Other statuses pass
/// through untouched.
#[derive(Debug, Default)]
pub struct ExceptionInterceptor;

impl Interceptor for ExceptionInterceptor {
    fn after_reply(&self, call: &CallFrame, reply: &ReplyFrame) -> Result<()> {
        match reply.status.code {
            Code::Unavailable | Code::InvalidArgument => {
                let err = translate_status(reply.status.clone());
                error!(service = %call.service, method = %call.method, "{}", err);
                Err(err)
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Attaches queued IO notifications to the next outgoing call.
pub struct NotificationInterceptor {
    io: Arc<IoManager>,
}

impl NotificationInterceptor {
    pub fn new(io: Arc<IoManager>) -> Self {
        Self { io }
    }
}

impl Interceptor for NotificationInterceptor {
    fn before_call(&self, call: &mut CallFrame) {
        for notification in self.io.take_notifications() {
            call.metadata.insert(notification.metadata_key(), "1");
        }
    }
}

// ============================================================================
// Counting
// ============================================================================

/// Counts wire calls per `service/method`.
#[derive(Debug, Default)]
pub struct RpcCounter {
    counts: DashMap<String, u64>,
}

impl RpcCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, service: &str, method: &str) -> u64 {
        self.counts.get(&format!("{}/{}", service, method)).map_or(0, |c| *c)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| *c.value()).sum()
    }

    /// All counts, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut counts: Vec<(String, u64)> = self.counts.iter().map(|c| (c.key().clone(), *c.value())).collect();
        counts.sort();
        counts
    }

    pub fn reset(&self) {
        self.counts.clear();
    }
}

impl Interceptor for RpcCounter {
    fn before_call(&self, call: &mut CallFrame) {
        *self.counts.entry(format!("{}/{}", call.service, call.method)).or_insert(0) += 1;
    }
}
