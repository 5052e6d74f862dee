//! # Primitives
//!
//! Geometric layout objects. `Primitive` is the abstract kind; the server
//! says which concrete kind an object is.

use edbrpc::EdbObj;
use edbrpc::Empty;

use crate::base::EdbObject;
use crate::base::edb_obj;
use crate::entity::Connectable;
use crate::entity::Layout;
use crate::entity::Net;
use crate::error::Error;
use crate::error::Result;
use crate::factory::LayoutObject;
use crate::factory::PrimitiveType;
use crate::messages;
use crate::messages::BoolMsg;
use crate::messages::CircleCreateMsg;
use crate::messages::RectangleCreateMsg;
use crate::messages::TypeMsg;
use crate::rpc_info::service;

#[async_trait::async_trait]
pub trait PrimitiveObj: Connectable {
    async fn primitive_type(&self) -> Result<PrimitiveType> {
        let base = self.base();
        let reply: TypeMsg = base.session().call(service::PRIMITIVE, "GetPrimitiveType", || base.msg()).await?;
        PrimitiveType::from_tag(reply.tag).ok_or(Error::UnknownType { registry: "primitive", tag: reply.tag })
    }

    /// Whether the primitive is a void.
    async fn is_negative(&self) -> Result<bool> {
        let base = self.base();
        let reply: BoolMsg = base.session().call(service::PRIMITIVE, "GetIsNegative", || base.msg()).await?;
        Ok(reply.value)
    }

    async fn set_is_negative(&self, value: bool) -> Result<()> {
        let base = self.base();
        let _: Empty = base
            .session()
            .call(service::PRIMITIVE, "SetIsNegative", || messages::bool_property(base, value))
            .await?;
        Ok(())
    }
}

edb_obj!(
    /// A primitive of not yet known kind.
    Primitive
);
edb_obj!(Rectangle);
edb_obj!(Circle);
edb_obj!(Polygon);
edb_obj!(Path);
edb_obj!(Bondwire);
edb_obj!(Text);
edb_obj!(BoardBendDef);
edb_obj!(PrimitiveInstanceCollection);

crate::entity::connectable_kinds!(
    Primitive: Primitive,
    Rectangle,
    Circle,
    Polygon,
    Path,
    Bondwire,
    Text,
    BoardBendDef,
    PrimitiveInstanceCollection,
);

impl PrimitiveObj for Primitive {}
impl PrimitiveObj for Rectangle {}
impl PrimitiveObj for Circle {}
impl PrimitiveObj for Polygon {}
impl PrimitiveObj for Path {}
impl PrimitiveObj for Bondwire {}
impl PrimitiveObj for Text {}
impl PrimitiveObj for BoardBendDef {}
impl PrimitiveObj for PrimitiveInstanceCollection {}

impl Primitive {
    pub async fn cast(self) -> Result<LayoutObject> {
        LayoutObject::Primitive(self).cast().await
    }
}

/// How a rectangle's five parameters are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectangleRepresentation {
    /// Lower-left x, lower-left y, upper-right x, upper-right y.
    LowerLeftUpperRight = 0,
    /// Center x, center y, width, height.
    CenterWidthHeight = 1,
}

impl Rectangle {
    /// Creates a rectangle. `params` are read per `representation`; the last
    /// one is the corner radius.
    pub async fn create(
        layout: &Layout,
        layer: &str,
        net: Option<&Net>,
        representation: RectangleRepresentation,
        params: [f64; 5],
    ) -> Result<Rectangle> {
        let msg: EdbObj = layout
            .session()
            .call(service::RECTANGLE, "Create", || RectangleCreateMsg {
                layout: layout.msg(),
                layer: layer.to_string(),
                net: net.map_or_else(EdbObj::null, |n| n.msg()),
                representation: representation as i32,
                params,
            })
            .await?;
        Rectangle::new(layout.session(), Some(msg))
    }
}

impl Circle {
    pub async fn create(
        layout: &Layout,
        layer: &str,
        net: Option<&Net>,
        center: (f64, f64),
        radius: f64,
    ) -> Result<Circle> {
        let msg: EdbObj = layout
            .session()
            .call(service::CIRCLE, "Create", || CircleCreateMsg {
                layout: layout.msg(),
                layer: layer.to_string(),
                net: net.map_or_else(EdbObj::null, |n| n.msg()),
                center_x: center.0,
                center_y: center.1,
                radius,
            })
            .await?;
        Circle::new(layout.session(), Some(msg))
    }
}
