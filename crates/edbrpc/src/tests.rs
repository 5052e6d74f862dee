use crate::*;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NameMsg {
    target: EdbObj,
    name: String,
}

crate::message!(NameMsg => "test.NameMessage");

#[test]
fn test_call_frame_survives_the_wire() -> anyhow::Result<()> {
    let mut call = CallFrame::new(7, "ansys.api.edb.v1.NetService", "GetName", vec![1, 2, 3]);
    call.metadata.insert("invalidate-cache", "1");

    let decoded = CallFrame::from_bytes(&call.to_bytes()?)?;
    assert_eq!(decoded, call);
    assert_eq!(decoded.metadata.get("invalidate-cache"), Some("1"));
    Ok(())
}

#[test]
fn test_call_frame_without_target_is_rejected() -> anyhow::Result<()> {
    let call = CallFrame::new(1, "", "GetName", Vec::new());
    let bytes = call.to_bytes()?;
    assert!(matches!(CallFrame::from_bytes(&bytes), Err(RpcError::ProtocolViolation(_))));
    Ok(())
}

#[test]
fn test_garbage_never_panics() {
    let garbage = [0xc1u8, 0xff, 0x00, 0x13];
    assert!(CallFrame::from_bytes(&garbage).is_err());
    assert!(ReplyFrame::from_bytes(&garbage).is_err());
    assert!(decode::<EdbObj>(&garbage).is_err());
}

#[test]
fn test_reply_into_result() {
    let ok = ReplyFrame::ok(3, vec![9]);
    assert_eq!(ok.into_result(), Ok(vec![9]));

    let failed = ReplyFrame::failure(3, Status::invalid_argument("bad net name"));
    let status = failed.into_result().unwrap_err();
    assert_eq!(status.code, Code::InvalidArgument);
    assert_eq!(status.details, "bad net name");
}

#[test]
fn test_metadata_keeps_order_and_first_wins() {
    let mut md = Metadata::new();
    md.insert("log-info", "first");
    md.insert("log-warn", "second");
    md.insert("log-info", "third");

    assert_eq!(md.get("log-info"), Some("first"));
    let keys: Vec<&str> = md.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["log-info", "log-warn", "log-info"]);
    assert!(!md.contains_key("log-error"));
}

#[test]
fn test_encoding_is_deterministic() -> anyhow::Result<()> {
    let a = NameMsg { target: EdbObj::new(42), name: "GND".into() };
    let b = a.clone();
    assert_eq!(encode(&a)?, encode(&b)?);

    let c = NameMsg { target: EdbObj::new(43), name: "GND".into() };
    assert_ne!(encode(&a)?, encode(&c)?);
    Ok(())
}

#[test]
fn test_any_msg_checks_type_name() -> anyhow::Result<()> {
    let any = AnyMsg::pack(&EdbObj::new(5))?;
    assert!(any.is::<EdbObj>());
    assert_eq!(any.unpack::<EdbObj>()?, EdbObj::new(5));

    match any.unpack::<NameMsg>() {
        Err(RpcError::TypeMismatch { expected, found }) => {
            assert_eq!(expected, "test.NameMessage");
            assert_eq!(found, "ansys.api.edb.v1.EDBObjMessage");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_registry_canonicalizes_known_types() -> anyhow::Result<()> {
    let registry = MessageRegistry::new().register::<EdbObj>().register::<NameMsg>();
    assert_eq!(registry.len(), 2);

    let msg = NameMsg { target: EdbObj::new(1), name: "VCC".into() };
    let any = AnyMsg::pack(&msg)?;
    assert_eq!(registry.canonicalize(&any)?, encode(&msg)?);
    Ok(())
}

#[test]
fn test_registry_rejects_unknown_types() -> anyhow::Result<()> {
    let registry = MessageRegistry::new().register::<EdbObj>();
    let any = AnyMsg::pack(&NameMsg { target: EdbObj::null(), name: String::new() })?;

    match registry.canonicalize(&any) {
        Err(RpcError::UnknownMessageType(name)) => assert_eq!(name, "test.NameMessage"),
        other => panic!("expected unknown type, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_registry_rejects_bytes_of_the_wrong_shape() -> anyhow::Result<()> {
    let registry = MessageRegistry::new().register::<NameMsg>();
    let forged = AnyMsg { type_name: "test.NameMessage".into(), value: encode(&EdbObj::new(1))? };
    assert!(matches!(registry.canonicalize(&forged), Err(RpcError::Decode(_))));
    Ok(())
}

#[test]
fn test_edb_obj_null_sentinel() {
    assert!(EdbObj::null().is_null());
    assert!(EdbObj::default().is_null());
    assert!(!EdbObj::new(1).is_null());
    assert!(EdbObj::future(1).is_future);
}

#[test]
fn test_byte_fields_are_packed_as_binary() -> anyhow::Result<()> {
    // As an integer array every 0xff byte would take two bytes on the wire.
    let call = CallFrame::new(1, "svc", "Put", vec![0xff; 1024]);
    let bytes = call.to_bytes()?;
    assert!(bytes.len() < 1100, "frame is {} bytes", bytes.len());
    assert!(bytes.windows(3).any(|w| w == [0xc5, 0x04, 0x00]));

    let batch = BufferMsg {
        entries: vec![BufferEntryMsg {
            service_name: "svc".into(),
            rpc_method_name: "Put".into(),
            request: vec![0xff; 512],
            future_id: None,
        }],
    };
    let nested = CallFrame::new(2, "svc", "FlushBuffer", encode(&batch)?);
    assert!(nested.to_bytes()?.len() < 600);
    assert_eq!(decode::<BufferMsg>(&CallFrame::from_bytes(&nested.to_bytes()?)?.payload)?, batch);

    let any = encode(&AnyMsg::pack(&EdbObj::new(3))?)?;
    assert!(any.windows(3).any(|w| w == [0xc4, 0x04, 0x93]), "{:x?}", any);
    Ok(())
}
