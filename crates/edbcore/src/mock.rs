//! # Mock Server
//!
//! An in-process transport that answers calls with registered handlers.
//! Used by the test suite to drive the client core end to end without a
//! database.
//!
//! `FlushBuffer` is implemented natively: the batch runs in order, future
//! handles in later requests are replaced by the real handles earlier
//! requests produced, and execution stops at the first failing entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;
use edbrpc::BufferFailure;
use edbrpc::BufferMsg;
use edbrpc::CallFrame;
use edbrpc::EdbObj;
use edbrpc::FlushBufferResponse;
use edbrpc::Message;
use edbrpc::Metadata;
use edbrpc::ReplyFrame;
use edbrpc::ResolvedFuture;
use edbrpc::Status;
use edbrpc::decode;
use edbrpc::encode;

use crate::rpc_info::FLUSH_BUFFER;
use crate::rpc_info::service;
use crate::transport;
use crate::transport::Transport;
use crate::transport::TransportError;
use crate::util::lock;

type Handler = Arc<dyn Fn(&mut MockContext, &[u8]) -> Result<Vec<u8>, Status> + Send + Sync>;

/// Per-call state handed to handlers.
#[derive(Default)]
pub struct MockContext {
    futures: HashMap<u64, EdbObj>,
    trailing: Metadata,
}

impl MockContext {
    /// The real handle behind `obj`, if it is a future resolved earlier in
    /// the same batch. Otherwise `obj` itself.
    pub fn resolve(&self, obj: &EdbObj) -> EdbObj {
        if obj.is_future {
            if let Some(real) = self.futures.get(&obj.id) {
                return real.clone();
            }
        }
        obj.clone()
    }

    /// Attaches trailing metadata to the reply (e.g. `log-warn`).
    pub fn trailing(&mut self, key: &str, value: &str) {
        self.trailing.insert(key, value);
    }
}

#[derive(Default)]
pub struct MockServer {
    handlers: DashMap<(String, String), Handler>,
    executed: Mutex<Vec<(String, String)>>,
    wire: Mutex<Vec<CallFrame>>,
    down: Mutex<bool>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed handler for `service/method`.
    pub fn on<Req, Resp, F>(&self, service: &str, method: &str, handler: F)
    where
        Req: Message,
        Resp: Message,
        F: Fn(&mut MockContext, Req) -> Result<Resp, Status> + Send + Sync + 'static,
    {
        let erased: Handler = Arc::new(move |ctx: &mut MockContext, bytes: &[u8]| -> Result<Vec<u8>, Status> {
            let request: Req = decode(bytes).map_err(|e| Status::internal(e.to_string()))?;
            let response = handler(ctx, request)?;
            encode(&response).map_err(|e| Status::internal(e.to_string()))
        });
        self.handlers.insert((service.to_string(), method.to_string()), erased);
    }

    /// Makes every subsequent call fail as if the connection dropped.
    pub fn set_down(&self, down: bool) {
        *lock(&self.down) = down;
    }

    /// How many times `service/method` ran, directly or inside a flush.
    pub fn calls(&self, service: &str, method: &str) -> usize {
        lock(&self.executed).iter().filter(|(s, m)| s == service && m == method).count()
    }

    /// Every executed method name, in order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).iter().map(|(_, m)| m.clone()).collect()
    }

    /// Every frame that crossed the wire, in order.
    pub fn wire_calls(&self) -> Vec<CallFrame> {
        lock(&self.wire).clone()
    }

    pub fn clear_log(&self) {
        lock(&self.executed).clear();
        lock(&self.wire).clear();
    }

    fn dispatch(&self, ctx: &mut MockContext, service: &str, method: &str, request: &[u8]) -> Result<Vec<u8>, Status> {
        let handler = self
            .handlers
            .get(&(service.to_string(), method.to_string()))
            .map(|h| h.value().clone())
            .ok_or_else(|| Status::new(edbrpc::Code::Unimplemented, format!("{}/{}", service, method)))?;
        lock(&self.executed).push((service.to_string(), method.to_string()));
        handler(ctx, request)
    }

    fn flush(&self, ctx: &mut MockContext, request: &[u8]) -> Result<Vec<u8>, Status> {
        let batch: BufferMsg = decode(request).map_err(|e| Status::internal(e.to_string()))?;
        let mut response = FlushBufferResponse::default();

        for (index, entry) in batch.entries.iter().enumerate() {
            match self.dispatch(ctx, &entry.service_name, &entry.rpc_method_name, &entry.request) {
                Ok(reply) => {
                    if let Some(future_id) = entry.future_id {
                        let edb_obj: EdbObj = decode(&reply).map_err(|e| Status::internal(e.to_string()))?;
                        ctx.futures.insert(future_id, edb_obj.clone());
                        response.resolved_futures.push(ResolvedFuture { future_id, edb_obj });
                    }
                }
                Err(status) => {
                    response.failure = Some(BufferFailure { index, status });
                    break;
                }
            }
        }

        encode(&response).map_err(|e| Status::internal(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Transport for MockServer {
    async fn call(&self, payload: &[u8]) -> transport::Result<Vec<u8>> {
        if *lock(&self.down) {
            return Err(TransportError::ConnectionLost("mock server is down".into()));
        }

        let call = CallFrame::from_bytes(payload).map_err(|e| TransportError::Io(e.to_string()))?;
        lock(&self.wire).push(call.clone());

        let mut ctx = MockContext::default();
        let outcome = if call.service == service::CACHING && call.method == FLUSH_BUFFER {
            self.flush(&mut ctx, &call.payload)
        } else {
            self.dispatch(&mut ctx, &call.service, &call.method, &call.payload)
        };

        let mut reply = match outcome {
            Ok(payload) => ReplyFrame::ok(call.seq, payload),
            Err(status) => ReplyFrame::failure(call.seq, status),
        };
        reply.trailing_metadata = ctx.trailing;
        reply.to_bytes().map_err(|e| TransportError::Io(e.to_string()))
    }
}
