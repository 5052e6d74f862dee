//! # Connectable Objects
//!
//! The generic connectable proxy, used when the concrete kind is not yet
//! known, and the connectable kinds that need no behavior of their own.

use crate::base::edb_obj;
use crate::error::Result;
use crate::factory::LayoutObject;

edb_obj!(
    /// A connectable object of unknown kind. Cast it to learn what it is.
    ConnObj
);
edb_obj!(PadstackInstance);
edb_obj!(TerminalInstance);
edb_obj!(CellInstance);
edb_obj!(PinGroup);
edb_obj!(VoltageRegulator);

crate::entity::connectable_kinds!(InvalidLayoutObj: ConnObj);
crate::entity::connectable_kinds!(PadstackInstance: PadstackInstance);
crate::entity::connectable_kinds!(TerminalInstance: TerminalInstance);
crate::entity::connectable_kinds!(CellInstance: CellInstance);
crate::entity::connectable_kinds!(PinGroup: PinGroup);
crate::entity::connectable_kinds!(VoltageRegulator: VoltageRegulator);

impl ConnObj {
    pub async fn cast(self) -> Result<LayoutObject> {
        LayoutObject::ConnObj(self).cast().await
    }
}
