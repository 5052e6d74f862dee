//! Tests for the session call pipeline with mock transports.

use std::sync::Arc;
use std::sync::Mutex;

use edbrpc::CallFrame;
use edbrpc::EdbObj;
use edbrpc::ReplyFrame;
use edbrpc::Status;
use edbrpc::encode;

use crate::error::Error;
use crate::interceptor::Interceptor;
use crate::messages::StringMsg;
use crate::mock::MockServer;
use crate::rpc_info::RpcInfo;
use crate::rpc_info::RpcLedger;
use crate::session::Session;
use crate::transport;
use crate::transport::Transport;

const SVC: &str = "test.Service";

fn ledger() -> RpcLedger {
    RpcLedger::new()
        .with(SVC, "GetName", RpcInfo::READ)
        .with(SVC, "SetName", RpcInfo::BUFFERED_WRITE)
}

fn named_server() -> Arc<MockServer> {
    let server = Arc::new(MockServer::new());
    server.on(SVC, "GetName", |_, _: EdbObj| Ok(StringMsg { value: "GND".into() }));
    server.on(SVC, "Missing", |_, _: EdbObj| -> Result<StringMsg, Status> { Err(Status::not_found("no such thing")) });
    server
}

fn session(server: &Arc<MockServer>) -> Session {
    Session::builder(server.clone()).ledger(ledger()).build().unwrap()
}

/// Mock transport that answers every call with the wrong sequence number.
struct WrongSeqTransport;

#[async_trait::async_trait]
impl Transport for WrongSeqTransport {
    async fn call(&self, payload: &[u8]) -> transport::Result<Vec<u8>> {
        let call = CallFrame::from_bytes(payload).unwrap();
        let reply = ReplyFrame::ok(call.seq + 100, encode(&StringMsg::default()).unwrap());
        Ok(reply.to_bytes().unwrap())
    }
}

/// Mock transport that answers with bytes that are not a frame.
struct MalformedTransport;

#[async_trait::async_trait]
impl Transport for MalformedTransport {
    async fn call(&self, _payload: &[u8]) -> transport::Result<Vec<u8>> {
        Ok(vec![0xc1, 0xc1, 0xc1])
    }
}

// --- Test 1: Plain call ---

#[tokio::test]
async fn test_plain_call_reaches_the_server() {
    let server = named_server();
    let session = session(&server);

    let reply: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();
    assert_eq!(reply.value, "GND");
    assert_eq!(server.calls(SVC, "GetName"), 1);
}

// --- Test 2: Correlation ---

#[tokio::test]
async fn test_sequence_mismatch_is_detected() {
    let session = Session::builder(Arc::new(WrongSeqTransport)).build().unwrap();
    let result = session.call::<_, StringMsg, _>(SVC, "GetName", || EdbObj::new(1)).await;
    assert!(matches!(result, Err(Error::SequenceMismatch { .. })), "got {:?}", result);
}

#[tokio::test]
async fn test_malformed_reply_is_an_rpc_error() {
    let session = Session::builder(Arc::new(MalformedTransport)).build().unwrap();
    let result = session.call::<_, StringMsg, _>(SVC, "GetName", || EdbObj::new(1)).await;
    assert!(matches!(result, Err(Error::Rpc(_))), "got {:?}", result);
}

// --- Test 3: Failure translation ---

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let server = named_server();
    server.set_down(true);
    let session = session(&server);

    let err = session.call::<_, StringMsg, _>(SVC, "GetName", || EdbObj::new(1)).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable(_)), "got {:?}", err);
    assert_eq!(err.severity(), crate::error::Severity::Fatal);
}

#[tokio::test]
async fn test_unrecognized_status_is_opaque() {
    let server = named_server();
    let session = session(&server);

    let err = session.call::<_, StringMsg, _>(SVC, "Missing", || EdbObj::new(1)).await.unwrap_err();
    match err {
        Error::Status(status) => assert_eq!(status.details, "no such thing"),
        other => panic!("expected opaque status, got {:?}", other),
    }
}

// --- Test 4: Notifications ---

#[tokio::test]
async fn test_scope_transitions_ride_on_the_next_call() {
    let server = named_server();
    let session = session(&server);

    let scope = session.enable_caching().unwrap();
    let _: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();
    drop(scope);
    let _: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();
    let _: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();

    let wire = server.wire_calls();
    assert_eq!(wire.len(), 3);
    assert_eq!(wire[0].metadata.get("begin-caching"), Some("1"));
    assert_eq!(wire[1].metadata.get("end-caching"), Some("1"));
    assert!(wire[2].metadata.is_empty());
}

// --- Test 5: Buffered calls ---

#[tokio::test]
async fn test_undecodable_buffered_reply_queues_nothing() {
    let server = named_server();
    server.on(SVC, "SetName", |_, _: StringMsg| Ok(edbrpc::Empty));
    let session = session(&server);

    let scope = session.enable_buffering().unwrap();
    // SetName answers with an empty reply, which is not a string.
    let result = session.call::<_, StringMsg, _>(SVC, "SetName", || StringMsg { value: "VCC".into() }).await;
    assert!(matches!(result, Err(Error::Rpc(_))), "got {:?}", result);
    assert!(session.io().buffer().unwrap().is_empty());

    let _: edbrpc::Empty = session.call(SVC, "SetName", || StringMsg { value: "GND".into() }).await.unwrap();
    assert_eq!(session.io().buffer().unwrap().len(), 1);
    scope.finish().await.unwrap();
    assert_eq!(server.calls(SVC, "SetName"), 1);
}

// --- Test 6: Builder ---

#[test]
fn test_inconsistent_ledger_is_rejected() {
    let server = named_server();
    let bad = RpcLedger::new().with(SVC, "SetName", RpcInfo { can_cache: true, ..RpcInfo::WRITE });
    let result = Session::builder(server).ledger(bad).build();
    assert!(matches!(result, Err(Error::Ledger(_))));
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Interceptor for Recorder {
    fn before_call(&self, call: &mut CallFrame) {
        self.seen.lock().unwrap().push(format!("before {}", call.method));
        call.metadata.insert("x-client", "tests");
    }

    fn after_reply(&self, call: &CallFrame, reply: &ReplyFrame) -> crate::error::Result<()> {
        self.seen.lock().unwrap().push(format!("after {} {}", call.method, reply.status.code));
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_interceptors_run_after_the_builtins() {
    let server = named_server();
    let recorder = Arc::new(Recorder::default());
    let session = Session::builder(server.clone()).ledger(ledger()).interceptor(recorder.clone()).build().unwrap();

    let _: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();
    let _ = session.call::<_, StringMsg, _>(SVC, "Missing", || EdbObj::new(1)).await;

    assert_eq!(
        *recorder.seen.lock().unwrap(),
        vec!["before GetName", "after GetName Ok", "before Missing", "after Missing NotFound"]
    );
    assert_eq!(server.wire_calls()[0].metadata.get("x-client"), Some("tests"));
}

// --- Test 7: Counting ---

#[tokio::test]
async fn test_counter_sees_wire_calls_only() {
    let server = named_server();
    let session = Session::builder(server.clone()).ledger(ledger()).count_rpcs(true).build().unwrap();

    let scope = session.enable_caching().unwrap();
    for _ in 0..3 {
        let _: StringMsg = session.call(SVC, "GetName", || EdbObj::new(1)).await.unwrap();
    }
    scope.finish().await.unwrap();

    let counter = session.rpc_counter().unwrap();
    assert_eq!(counter.count(SVC, "GetName"), 1);
    assert_eq!(counter.snapshot(), vec![(format!("{}/GetName", SVC), 1)]);
}
