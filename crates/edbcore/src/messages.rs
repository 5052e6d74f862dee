//! # Domain Messages
//!
//! Request and response payloads for the entity services, and the registry
//! that lets the cache resolve any of them from a type name.

use std::sync::Arc;
use std::sync::OnceLock;

use edbrpc::CacheMsg;
use edbrpc::EdbObj;
use edbrpc::Empty;
use edbrpc::MessageRegistry;
use edbrpc::message;
use serde::Deserialize;
use serde::Serialize;

use crate::base::ObjBase;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdbObjCollection {
    pub items: Vec<EdbObj>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMsg {
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolMsg {
    pub value: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UInt64Msg {
    pub value: u64,
}

/// A type tag reported by the server (layout object, primitive, terminal or group type).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMsg {
    pub tag: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringPropertyMsg {
    pub target: EdbObj,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolPropertyMsg {
    pub target: EdbObj,
    pub value: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPropertyMsg {
    pub target: EdbObj,
    pub value: EdbObj,
}

/// Names an object within a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNameMsg {
    pub layout: EdbObj,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutObjTargetMsg {
    pub target: EdbObj,
    pub obj_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RectangleCreateMsg {
    pub layout: EdbObj,
    pub layer: String,
    pub net: EdbObj,
    pub representation: i32,
    pub params: [f64; 5],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleCreateMsg {
    pub layout: EdbObj,
    pub layer: String,
    pub net: EdbObj,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

message!(EdbObjCollection => "ansys.api.edb.v1.EDBObjCollectionMessage");
message!(StringMsg => "google.protobuf.StringValue");
message!(BoolMsg => "google.protobuf.BoolValue");
message!(UInt64Msg => "google.protobuf.UInt64Value");
message!(TypeMsg => "ansys.api.edb.v1.TypeMessage");
message!(StringPropertyMsg => "ansys.api.edb.v1.StringPropertyMessage");
message!(BoolPropertyMsg => "ansys.api.edb.v1.BoolPropertyMessage");
message!(PointerPropertyMsg => "ansys.api.edb.v1.PointerPropertyMessage");
message!(LayoutNameMsg => "ansys.api.edb.v1.LayoutNameMessage");
message!(LayoutObjTargetMsg => "ansys.api.edb.v1.LayoutObjTargetMessage");
message!(RectangleCreateMsg => "ansys.api.edb.v1.RectangleCreationMessage");
message!(CircleCreateMsg => "ansys.api.edb.v1.CircleCreationMessage");

/// Every message the client understands, keyed by wire name.
pub fn registry() -> Arc<MessageRegistry> {
    static REGISTRY: OnceLock<Arc<MessageRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            Arc::new(
                MessageRegistry::new()
                    .register::<EdbObj>()
                    .register::<Empty>()
                    .register::<CacheMsg>()
                    .register::<EdbObjCollection>()
                    .register::<StringMsg>()
                    .register::<BoolMsg>()
                    .register::<UInt64Msg>()
                    .register::<TypeMsg>()
                    .register::<StringPropertyMsg>()
                    .register::<BoolPropertyMsg>()
                    .register::<PointerPropertyMsg>()
                    .register::<LayoutNameMsg>()
                    .register::<LayoutObjTargetMsg>()
                    .register::<RectangleCreateMsg>()
                    .register::<CircleCreateMsg>(),
            )
        })
        .clone()
}

// ============================================================================
// Builders
// ============================================================================

pub fn string_property(target: &ObjBase, value: &str) -> StringPropertyMsg {
    StringPropertyMsg { target: target.msg(), value: value.to_string() }
}

pub fn bool_property(target: &ObjBase, value: bool) -> BoolPropertyMsg {
    BoolPropertyMsg { target: target.msg(), value }
}

/// A `None` value is sent as the null handle.
pub fn pointer_property(target: &ObjBase, value: Option<&ObjBase>) -> PointerPropertyMsg {
    PointerPropertyMsg { target: target.msg(), value: value.map_or_else(EdbObj::null, ObjBase::msg) }
}

pub fn layout_name(layout: &ObjBase, name: &str) -> LayoutNameMsg {
    LayoutNameMsg { layout: layout.msg(), name: name.to_string() }
}

pub fn layout_obj_target(target: &ObjBase, obj_type: i32) -> LayoutObjTargetMsg {
    LayoutObjTargetMsg { target: target.msg(), obj_type }
}
