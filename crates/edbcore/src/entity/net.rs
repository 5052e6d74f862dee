//! # Nets
//!
//! Nets and the net groupings built from them.

use edbrpc::EdbObj;
use edbrpc::Empty;

use crate::base::EdbObject;
use crate::base::edb_obj;
use crate::entity::Layout;
use crate::error::Result;
use crate::messages;
use crate::messages::BoolMsg;
use crate::messages::StringMsg;
use crate::rpc_info::service;

edb_obj!(
    /// A named electrical connection.
    Net
);
edb_obj!(NetClass);
edb_obj!(ExtendedNet);
edb_obj!(DifferentialPair);

crate::entity::layout_obj_kinds!(Net: Net);
crate::entity::layout_obj_kinds!(NetClass: NetClass);
crate::entity::layout_obj_kinds!(ExtendedNet: ExtendedNet);
crate::entity::layout_obj_kinds!(DifferentialPair: DifferentialPair);

impl Net {
    /// Creates a net. While buffering, the returned net holds a future
    /// handle until the buffer is flushed.
    pub async fn create(layout: &Layout, name: &str) -> Result<Net> {
        let msg: EdbObj = layout
            .session()
            .call(service::NET, "Create", || messages::layout_name(layout, name))
            .await?;
        Net::new(layout.session(), Some(msg))
    }

    /// The net called `name`, or a null net if there is none.
    pub async fn find_by_name(layout: &Layout, name: &str) -> Result<Net> {
        let msg: EdbObj = layout
            .session()
            .call(service::NET, "FindByName", || messages::layout_name(layout, name))
            .await?;
        Net::new(layout.session(), Some(msg))
    }

    pub async fn name(&self) -> Result<String> {
        let reply: StringMsg = self.session().call(service::NET, "GetName", || self.msg()).await?;
        Ok(reply.value)
    }

    pub async fn set_name(&self, name: &str) -> Result<()> {
        let _: Empty = self
            .session()
            .call(service::NET, "SetName", || messages::string_property(self, name))
            .await?;
        Ok(())
    }

    pub async fn is_power_ground(&self) -> Result<bool> {
        let reply: BoolMsg = self.session().call(service::NET, "GetIsPowerGround", || self.msg()).await?;
        Ok(reply.value)
    }

    pub async fn set_is_power_ground(&self, value: bool) -> Result<()> {
        let _: Empty = self
            .session()
            .call(service::NET, "SetIsPowerGround", || messages::bool_property(self, value))
            .await?;
        Ok(())
    }
}
