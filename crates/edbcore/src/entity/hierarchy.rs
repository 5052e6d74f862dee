//! # Hierarchy
//!
//! Groups and the specialized group kinds.

use edbrpc::EdbObj;
use edbrpc::Empty;

use crate::base::EdbObject;
use crate::base::ObjBase;
use crate::base::edb_obj;
use crate::entity::Connectable;
use crate::entity::Layout;
use crate::error::Error;
use crate::error::Result;
use crate::factory::GroupType;
use crate::factory::LayoutObject;
use crate::factory::create_conn_obj;
use crate::messages;
use crate::messages::EdbObjCollection;
use crate::messages::TypeMsg;
use crate::rpc_info::service;

#[async_trait::async_trait]
pub trait GroupObj: Connectable {
    async fn group_type(&self) -> Result<GroupType> {
        let base = self.base();
        let reply: TypeMsg = base.session().call(service::GROUP, "GetGroupType", || base.msg()).await?;
        GroupType::from_tag(reply.tag).ok_or(Error::UnknownType { registry: "group", tag: reply.tag })
    }

    /// The group's members, each resolved to its concrete kind.
    async fn members(&self) -> Result<Vec<LayoutObject>> {
        let base = self.base();
        let reply: EdbObjCollection = base.session().call(service::GROUP, "GetMembers", || base.msg()).await?;
        let mut members = Vec::with_capacity(reply.items.len());
        for msg in reply.items {
            members.push(create_conn_obj(ObjBase::new(base.session(), Some(msg))?).await?);
        }
        Ok(members)
    }

    async fn add_member(&self, member: &ObjBase) -> Result<()> {
        let base = self.base();
        let _: Empty = base
            .session()
            .call(service::GROUP, "AddMember", || messages::pointer_property(base, Some(member)))
            .await?;
        Ok(())
    }
}

edb_obj!(
    /// A group of not yet known kind, or a plain group.
    Group
);
edb_obj!(ComponentGroup);
edb_obj!(Structure3D);
edb_obj!(ViaGroup);

crate::entity::connectable_kinds!(Group: Group, ComponentGroup, Structure3D, ViaGroup);

impl GroupObj for Group {}
impl GroupObj for ComponentGroup {}
impl GroupObj for Structure3D {}
impl GroupObj for ViaGroup {}

impl Group {
    pub async fn create(layout: &Layout, name: &str) -> Result<Group> {
        let msg: EdbObj = layout
            .session()
            .call(service::GROUP, "Create", || messages::layout_name(layout, name))
            .await?;
        Group::new(layout.session(), Some(msg))
    }

    pub async fn cast(self) -> Result<LayoutObject> {
        LayoutObject::Group(self).cast().await
    }
}
