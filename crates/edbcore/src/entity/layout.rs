//! # Layout
//!
//! The container every layout object belongs to.

use edbrpc::EdbObj;

use crate::base::EdbObject;
use crate::base::ObjBase;
use crate::base::edb_obj;
use crate::entity::Net;
use crate::error::Result;
use crate::factory::LayoutObjType;
use crate::factory::LayoutObject;
use crate::factory::create_lyt_obj;
use crate::messages::EdbObjCollection;
use crate::rpc_info::service;

edb_obj!(
    /// A layout within a cell.
    Layout
);

impl Layout {
    async fn collection(&self, method: &str) -> Result<Vec<EdbObj>> {
        let reply: EdbObjCollection = self.session().call(service::LAYOUT, method, || self.msg()).await?;
        Ok(reply.items)
    }

    async fn typed_collection(&self, method: &str, ty: LayoutObjType) -> Result<Vec<LayoutObject>> {
        let mut objs = Vec::new();
        for msg in self.collection(method).await? {
            objs.push(create_lyt_obj(ObjBase::new(self.session(), Some(msg))?, ty.tag()).await?);
        }
        Ok(objs)
    }

    pub async fn nets(&self) -> Result<Vec<Net>> {
        self.collection("GetNetCollection")
            .await?
            .into_iter()
            .map(|msg| Net::new(self.session(), Some(msg)))
            .collect()
    }

    /// Every primitive in the layout, each cast to its concrete kind.
    pub async fn primitives(&self) -> Result<Vec<LayoutObject>> {
        self.typed_collection("GetPrimitiveCollection", LayoutObjType::Primitive).await
    }

    /// Every group in the layout, each cast to its concrete kind.
    pub async fn groups(&self) -> Result<Vec<LayoutObject>> {
        self.typed_collection("GetGroupCollection", LayoutObjType::Group).await
    }
}
