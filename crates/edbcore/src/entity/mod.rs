//! # Entity Proxies
//!
//! Thin client-side stand-ins for database objects. Each method is one remote
//! call; all IO optimization happens below, in the session.
//!
//! Shared behavior lives in interface traits rather than a class hierarchy:
//! [`LayoutObj`] for anything owned by a layout, [`Connectable`] for objects
//! that can sit on a net, and the primitive, terminal and group traits in
//! their own modules.

pub mod conn_obj;
pub mod hierarchy;
pub mod layout;
pub mod net;
pub mod primitive;
pub mod terminal;

use edbrpc::EdbObj;
use edbrpc::Empty;

use crate::base::EdbObject;
use crate::base::ObjBase;
use crate::error::Error;
use crate::error::Result;
use crate::factory::LayoutObjType;
use crate::factory::LayoutObject;
use crate::factory::create_lyt_obj;
use crate::messages;
use crate::messages::TypeMsg;
use crate::messages::UInt64Msg;
use crate::rpc_info::service;

pub use conn_obj::*;
pub use hierarchy::*;
pub use layout::Layout;
pub use net::*;
pub use primitive::*;
pub use terminal::*;

/// An object owned by a layout.
#[async_trait::async_trait]
pub trait LayoutObj: EdbObject {
    const OBJ_TYPE: LayoutObjType;

    async fn layout(&self) -> Result<Layout> {
        let base = self.base();
        let msg: EdbObj = base
            .session()
            .call(service::LAYOUT_OBJ, "GetLayout", || messages::layout_obj_target(base, Self::OBJ_TYPE.tag()))
            .await?;
        Layout::new(base.session(), Some(msg))
    }

    /// Deletes the object on the server and nulls this proxy.
    async fn delete(&self) -> Result<()> {
        let base = self.base();
        let _: Empty = base
            .session()
            .call(service::LAYOUT_OBJ, "Delete", || messages::layout_obj_target(base, Self::OBJ_TYPE.tag()))
            .await?;
        base.set_msg(None)
    }
}

/// An object that can be connected to a net.
#[async_trait::async_trait]
pub trait Connectable: LayoutObj {
    /// The layout object type the server reports for this object.
    async fn obj_type(&self) -> Result<LayoutObjType> {
        let base = self.base();
        let reply: TypeMsg = base.session().call(service::CONNECTABLE, "GetObjType", || base.msg()).await?;
        LayoutObjType::from_tag(reply.tag).ok_or(Error::UnknownType { registry: "layout object", tag: reply.tag })
    }

    /// The object's unique id within its database.
    async fn edb_uid(&self) -> Result<u64> {
        let base = self.base();
        let reply: UInt64Msg = base.session().call(service::CONNECTABLE, "GetId", || base.msg()).await?;
        Ok(reply.value)
    }

    async fn net(&self) -> Result<Net> {
        let base = self.base();
        let msg: EdbObj = base.session().call(service::CONNECTABLE, "GetNet", || base.msg()).await?;
        Net::new(base.session(), Some(msg))
    }

    /// `None` disconnects the object.
    async fn set_net(&self, net: Option<&Net>) -> Result<()> {
        let base = self.base();
        let _: Empty = base
            .session()
            .call(service::CONNECTABLE, "SetNet", || messages::pointer_property(base, net.map(|n| n.base())))
            .await?;
        Ok(())
    }

    /// The group containing this object, cast to its concrete kind.
    async fn group(&self) -> Result<LayoutObject> {
        let base = self.base();
        let msg: EdbObj = base.session().call(service::CONNECTABLE, "GetGroup", || base.msg()).await?;
        create_lyt_obj(ObjBase::new(base.session(), Some(msg))?, LayoutObjType::Group.tag()).await
    }
}

/// Implements the layout-level traits for a list of proxy kinds.
macro_rules! layout_obj_kinds {
    ($obj_type:ident: $($name:ident),* $(,)?) => {
        $(
            impl $crate::entity::LayoutObj for $name {
                const OBJ_TYPE: $crate::factory::LayoutObjType = $crate::factory::LayoutObjType::$obj_type;
            }
        )*
    };
}

macro_rules! connectable_kinds {
    ($obj_type:ident: $($name:ident),* $(,)?) => {
        $crate::entity::layout_obj_kinds!($obj_type: $($name),*);
        $(
            impl $crate::entity::Connectable for $name {}
        )*
    };
}

pub(crate) use connectable_kinds;
pub(crate) use layout_obj_kinds;
