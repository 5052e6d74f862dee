//! # Terminals

use edbrpc::EdbObj;

use crate::base::ObjBase;
use crate::base::edb_obj;
use crate::entity::Connectable;
use crate::entity::Layout;
use crate::error::Error;
use crate::error::Result;
use crate::factory::LayoutObjType;
use crate::factory::LayoutObject;
use crate::factory::TerminalType;
use crate::factory::create_lyt_obj;
use crate::messages;
use crate::messages::StringMsg;
use crate::messages::TypeMsg;
use crate::rpc_info::service;

#[async_trait::async_trait]
pub trait TerminalObj: Connectable {
    async fn terminal_type(&self) -> Result<TerminalType> {
        let base = self.base();
        let reply: TypeMsg = base.session().call(service::TERMINAL, "GetTerminalType", || base.msg()).await?;
        TerminalType::from_tag(reply.tag).ok_or(Error::UnknownType { registry: "terminal", tag: reply.tag })
    }

    async fn name(&self) -> Result<String> {
        let base = self.base();
        let reply: StringMsg = base.session().call(service::TERMINAL, "GetName", || base.msg()).await?;
        Ok(reply.value)
    }
}

edb_obj!(
    /// A terminal of not yet known kind.
    Terminal
);
edb_obj!(BundleTerminal);
edb_obj!(EdgeTerminal);
edb_obj!(PadstackInstanceTerminal);
edb_obj!(PinGroupTerminal);
edb_obj!(PointTerminal);
edb_obj!(TerminalInstanceTerminal);

crate::entity::connectable_kinds!(
    Terminal: Terminal,
    BundleTerminal,
    EdgeTerminal,
    PadstackInstanceTerminal,
    PinGroupTerminal,
    PointTerminal,
    TerminalInstanceTerminal,
);

impl TerminalObj for Terminal {}
impl TerminalObj for BundleTerminal {}
impl TerminalObj for EdgeTerminal {}
impl TerminalObj for PadstackInstanceTerminal {}
impl TerminalObj for PinGroupTerminal {}
impl TerminalObj for PointTerminal {}
impl TerminalObj for TerminalInstanceTerminal {}

impl Terminal {
    /// The terminal called `name`, cast to its concrete kind. Null if there
    /// is none.
    pub async fn find(layout: &Layout, name: &str) -> Result<LayoutObject> {
        let msg: EdbObj = layout
            .session()
            .call(service::TERMINAL, "FindByName", || messages::layout_name(layout, name))
            .await?;
        create_lyt_obj(ObjBase::new(layout.session(), Some(msg))?, LayoutObjType::Terminal.tag()).await
    }

    pub async fn cast(self) -> Result<LayoutObject> {
        LayoutObject::Terminal(self).cast().await
    }
}
