//! # Type Registry & Factory
//!
//! Turns a bare handle plus a type tag into the right proxy kind.
//!
//! ## Invariants
//! - **Closed Registries**: Each registry maps every tag it knows to exactly one proxy
//!   constructor. A tag that is unknown, or known but not registered, is an error.
//! - **Cast on Demand**: Abstract kinds (primitive, terminal, group, generic
//!   connectable) are registered with `do_cast`; creating one asks the server for
//!   the concrete subtype and constructs that instead.
//! - **Lazy Tables**: Registries are built on first use, so entity modules can refer to
//!   one another without initialization order concerns.

use std::collections::HashMap;
use std::sync::OnceLock;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::base::EdbObject;
use crate::base::ObjBase;
use crate::entity::*;
use crate::error::Error;
use crate::error::Result;

macro_rules! tag_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident = $tag:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $tag),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn tag(self) -> i32 {
                self as i32
            }

            pub fn from_tag(tag: i32) -> Option<Self> {
                Self::ALL.iter().copied().find(|t| t.tag() == tag)
            }
        }
    };
}

tag_enum! {
    pub enum LayoutObjType {
        InvalidLayoutObj = -1,
        Primitive = 0,
        PadstackInstance = 1,
        Terminal = 2,
        TerminalInstance = 3,
        CellInstance = 4,
        Layer = 5,
        Net = 6,
        Padstack = 7,
        Group = 8,
        NetClass = 9,
        Cell = 10,
        DifferentialPair = 11,
        PinGroup = 12,
        VoltageRegulator = 13,
        ExtendedNet = 14,
    }
}

tag_enum! {
    pub enum PrimitiveType {
        Rectangle = 0,
        Circle = 1,
        Polygon = 2,
        Path = 3,
        Bondwire = 4,
        Text = 5,
        PrimitiveInstanceCollection = 6,
        BoardBend = 7,
    }
}

tag_enum! {
    pub enum TerminalType {
        Edge = 0,
        Point = 1,
        TerminalInstance = 2,
        PadstackInstance = 3,
        Bundle = 4,
        PinGroup = 5,
    }
}

tag_enum! {
    pub enum GroupType {
        Group = 0,
        Component = 1,
        Structure3D = 2,
        ViaGroup = 3,
    }
}

macro_rules! layout_objects {
    ($($variant:ident),* $(,)?) => {
        /// Any entity proxy a heterogeneous query can return.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum LayoutObject {
            $($variant($variant)),*
        }

        impl LayoutObject {
            pub fn base(&self) -> &ObjBase {
                match self {
                    $(Self::$variant(obj) => obj.base()),*
                }
            }

            pub fn into_base(self) -> ObjBase {
                match self {
                    $(Self::$variant(obj) => obj.into_base()),*
                }
            }

            /// The proxy kind's type name, e.g. `"Rectangle"`.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$variant as EdbObject>::KIND),*
                }
            }
        }

        $(
            impl From<$variant> for LayoutObject {
                fn from(obj: $variant) -> Self {
                    Self::$variant(obj)
                }
            }

            impl TryFrom<LayoutObject> for $variant {
                type Error = Error;

                fn try_from(obj: LayoutObject) -> Result<Self> {
                    match obj {
                        LayoutObject::$variant(inner) => Ok(inner),
                        other => Err(Error::UnexpectedType { expected: <$variant as EdbObject>::KIND, found: other.kind() }),
                    }
                }
            }
        )*
    };
}

layout_objects! {
    ConnObj,
    Net,
    NetClass,
    ExtendedNet,
    DifferentialPair,
    Primitive,
    Rectangle,
    Circle,
    Polygon,
    Path,
    Bondwire,
    Text,
    BoardBendDef,
    PrimitiveInstanceCollection,
    PadstackInstance,
    TerminalInstance,
    CellInstance,
    PinGroup,
    VoltageRegulator,
    Terminal,
    BundleTerminal,
    EdgeTerminal,
    PadstackInstanceTerminal,
    PinGroupTerminal,
    PointTerminal,
    TerminalInstanceTerminal,
    Group,
    ComponentGroup,
    Structure3D,
    ViaGroup,
}

impl LayoutObject {
    pub fn id(&self) -> u64 {
        self.base().id()
    }

    /// Resolves an abstract kind to its concrete kind by asking the server.
    /// Concrete kinds and null objects are returned unchanged.
    pub fn cast(self) -> BoxFuture<'static, Result<LayoutObject>> {
        async move {
            if self.base().handle().is_null() {
                return Ok(self);
            }
            match self {
                LayoutObject::Primitive(obj) => {
                    let ty = obj.primitive_type().await?;
                    create_primitive(obj.into_base(), ty).await
                }
                LayoutObject::Terminal(obj) => {
                    let ty = obj.terminal_type().await?;
                    create_terminal(obj.into_base(), ty).await
                }
                LayoutObject::Group(obj) => {
                    let ty = obj.group_type().await?;
                    create_group(obj.into_base(), ty).await
                }
                LayoutObject::ConnObj(obj) => {
                    let ty = obj.obj_type().await?;
                    if ty == LayoutObjType::InvalidLayoutObj {
                        return Err(Error::UnknownType { registry: "layout object", tag: ty.tag() });
                    }
                    create_lyt_obj(obj.into_base(), ty.tag()).await
                }
                other => Ok(other),
            }
        }
        .boxed()
    }
}

// ============================================================================
// Registries
// ============================================================================

/// How to build one proxy kind.
#[derive(Debug, Clone, Copy)]
pub struct Creator {
    pub kind: &'static str,
    pub do_cast: bool,
    ctor: fn(ObjBase) -> LayoutObject,
}

fn creator<T: EdbObject + Into<LayoutObject>>(do_cast: bool) -> Creator {
    Creator { kind: T::KIND, do_cast, ctor: |base| T::from_base(base).into() }
}

pub fn layout_obj_creators() -> &'static HashMap<LayoutObjType, Creator> {
    static TABLE: OnceLock<HashMap<LayoutObjType, Creator>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (LayoutObjType::Primitive, creator::<Primitive>(true)),
            (LayoutObjType::PadstackInstance, creator::<PadstackInstance>(false)),
            (LayoutObjType::Terminal, creator::<Terminal>(true)),
            (LayoutObjType::TerminalInstance, creator::<TerminalInstance>(false)),
            (LayoutObjType::CellInstance, creator::<CellInstance>(false)),
            (LayoutObjType::Group, creator::<Group>(true)),
            (LayoutObjType::PinGroup, creator::<PinGroup>(false)),
            (LayoutObjType::VoltageRegulator, creator::<VoltageRegulator>(false)),
            (LayoutObjType::NetClass, creator::<NetClass>(false)),
            (LayoutObjType::ExtendedNet, creator::<ExtendedNet>(false)),
            (LayoutObjType::DifferentialPair, creator::<DifferentialPair>(false)),
            (LayoutObjType::Net, creator::<Net>(false)),
            (LayoutObjType::InvalidLayoutObj, creator::<ConnObj>(true)),
        ])
    })
}

pub fn primitive_creators() -> &'static HashMap<PrimitiveType, Creator> {
    static TABLE: OnceLock<HashMap<PrimitiveType, Creator>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (PrimitiveType::Rectangle, creator::<Rectangle>(false)),
            (PrimitiveType::Circle, creator::<Circle>(false)),
            (PrimitiveType::Polygon, creator::<Polygon>(false)),
            (PrimitiveType::Path, creator::<Path>(false)),
            (PrimitiveType::Bondwire, creator::<Bondwire>(false)),
            (PrimitiveType::Text, creator::<Text>(false)),
            (PrimitiveType::PrimitiveInstanceCollection, creator::<PrimitiveInstanceCollection>(false)),
            (PrimitiveType::BoardBend, creator::<BoardBendDef>(false)),
        ])
    })
}

pub fn terminal_creators() -> &'static HashMap<TerminalType, Creator> {
    static TABLE: OnceLock<HashMap<TerminalType, Creator>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (TerminalType::Edge, creator::<EdgeTerminal>(false)),
            (TerminalType::Point, creator::<PointTerminal>(false)),
            (TerminalType::TerminalInstance, creator::<TerminalInstanceTerminal>(false)),
            (TerminalType::PadstackInstance, creator::<PadstackInstanceTerminal>(false)),
            (TerminalType::Bundle, creator::<BundleTerminal>(false)),
            (TerminalType::PinGroup, creator::<PinGroupTerminal>(false)),
        ])
    })
}

pub fn group_creators() -> &'static HashMap<GroupType, Creator> {
    static TABLE: OnceLock<HashMap<GroupType, Creator>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (GroupType::Group, creator::<Group>(false)),
            (GroupType::Component, creator::<ComponentGroup>(false)),
            (GroupType::Structure3D, creator::<Structure3D>(false)),
            (GroupType::ViaGroup, creator::<ViaGroup>(false)),
        ])
    })
}

// ============================================================================
// Factory
// ============================================================================

/// Builds the proxy `creator` describes, casting it if required.
pub async fn create_obj(base: ObjBase, creator: &Creator) -> Result<LayoutObject> {
    let obj = (creator.ctor)(base);
    if creator.do_cast { obj.cast().await } else { Ok(obj) }
}

/// Builds the proxy for a layout object type tag.
pub async fn create_lyt_obj(base: ObjBase, tag: i32) -> Result<LayoutObject> {
    let creator = LayoutObjType::from_tag(tag)
        .and_then(|ty| layout_obj_creators().get(&ty))
        .ok_or(Error::UnknownType { registry: "layout object", tag })?;
    create_obj(base, creator).await
}

pub async fn create_primitive(base: ObjBase, ty: PrimitiveType) -> Result<LayoutObject> {
    let creator = primitive_creators()
        .get(&ty)
        .ok_or(Error::UnknownType { registry: "primitive", tag: ty.tag() })?;
    create_obj(base, creator).await
}

pub async fn create_terminal(base: ObjBase, ty: TerminalType) -> Result<LayoutObject> {
    let creator = terminal_creators()
        .get(&ty)
        .ok_or(Error::UnknownType { registry: "terminal", tag: ty.tag() })?;
    create_obj(base, creator).await
}

pub async fn create_group(base: ObjBase, ty: GroupType) -> Result<LayoutObject> {
    let creator = group_creators()
        .get(&ty)
        .ok_or(Error::UnknownType { registry: "group", tag: ty.tag() })?;
    create_obj(base, creator).await
}

/// Builds the proxy for a connectable object of unknown kind, asking the
/// server what it is.
pub async fn create_conn_obj(base: ObjBase) -> Result<LayoutObject> {
    create_lyt_obj(base, LayoutObjType::InvalidLayoutObj.tag()).await
}
