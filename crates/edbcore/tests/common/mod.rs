//! A fake EDB server over [`MockServer`]: an in-memory object store plus
//! handlers for every service the default ledger names.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use edbcore::EdbObject;
use edbcore::Session;
use edbcore::entity::Layout;
use edbcore::factory::LayoutObjType;
use edbcore::factory::PrimitiveType;
use edbcore::messages::BoolMsg;
use edbcore::messages::BoolPropertyMsg;
use edbcore::messages::CircleCreateMsg;
use edbcore::messages::EdbObjCollection;
use edbcore::messages::LayoutNameMsg;
use edbcore::messages::LayoutObjTargetMsg;
use edbcore::messages::PointerPropertyMsg;
use edbcore::messages::RectangleCreateMsg;
use edbcore::messages::StringMsg;
use edbcore::messages::StringPropertyMsg;
use edbcore::messages::TypeMsg;
use edbcore::messages::UInt64Msg;
use edbcore::mock::MockContext;
use edbcore::mock::MockServer;
use edbcore::rpc_info::service;
use edbrpc::CacheEntry;
use edbrpc::CacheMsg;
use edbrpc::EdbObj;
use edbrpc::Empty;
use edbrpc::Status;

pub const LAYOUT_ID: u64 = 1;

/// One stored object.
#[derive(Debug, Clone, Default)]
pub struct Obj {
    /// Layout object type tag.
    pub obj_type: i32,
    /// Primitive, terminal or group type tag, where the kind has one.
    pub subtype: i32,
    pub name: String,
    pub negative: bool,
    pub power_ground: bool,
    pub net: u64,
    pub group: u64,
    pub members: Vec<u64>,
}

impl Obj {
    pub fn of(obj_type: LayoutObjType) -> Self {
        Self { obj_type: obj_type.tag(), ..Self::default() }
    }

    pub fn subtype(mut self, tag: i32) -> Self {
        self.subtype = tag;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

#[derive(Default)]
struct Store {
    next_id: u64,
    objects: BTreeMap<u64, Obj>,
}

impl Store {
    fn insert(&mut self, obj: Obj) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.objects.insert(id, obj);
        id
    }

    fn get(&self, obj: &EdbObj) -> Result<&Obj, Status> {
        self.objects.get(&obj.id).ok_or_else(|| Status::not_found(format!("no object #{}", obj.id)))
    }

    fn get_mut(&mut self, obj: &EdbObj) -> Result<&mut Obj, Status> {
        self.objects.get_mut(&obj.id).ok_or_else(|| Status::not_found(format!("no object #{}", obj.id)))
    }

    fn of_type(&self, obj_type: LayoutObjType) -> Vec<u64> {
        self.objects.iter().filter(|(_, o)| o.obj_type == obj_type.tag()).map(|(id, _)| *id).collect()
    }

    fn find(&self, obj_type: LayoutObjType, name: &str) -> EdbObj {
        self.objects
            .iter()
            .find(|(_, o)| o.obj_type == obj_type.tag() && o.name == name)
            .map_or_else(EdbObj::null, |(id, _)| EdbObj::new(*id))
    }
}

fn handle(id: u64) -> EdbObj {
    if id == 0 { EdbObj::null() } else { EdbObj::new(id) }
}

fn check_name(name: &str) -> Result<(), Status> {
    if name.is_empty() {
        return Err(Status::invalid_argument("bad net name"));
    }
    Ok(())
}

pub struct FakeEdb {
    pub server: Arc<MockServer>,
    store: Arc<Mutex<Store>>,
    prefill: Arc<AtomicBool>,
}

impl FakeEdb {
    pub fn new() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let layout = store.lock().unwrap().insert(Obj::default());
        assert_eq!(layout, LAYOUT_ID);

        let edb = Self { server: Arc::new(MockServer::new()), store, prefill: Arc::new(AtomicBool::new(false)) };
        edb.register_layout();
        edb.register_connectable();
        edb.register_net();
        edb.register_primitive();
        edb.register_terminal();
        edb.register_group();
        edb
    }

    pub fn session(&self) -> Session {
        Session::builder(self.server.clone()).build().unwrap()
    }

    pub fn layout(&self, session: &Session) -> Layout {
        Layout::new(session, Some(EdbObj::new(LAYOUT_ID))).unwrap()
    }

    pub fn insert(&self, obj: Obj) -> u64 {
        self.store.lock().unwrap().insert(obj)
    }

    pub fn obj(&self, id: u64) -> Option<Obj> {
        self.store.lock().unwrap().objects.get(&id).cloned()
    }

    pub fn update(&self, id: u64, f: impl FnOnce(&mut Obj)) {
        f(self.store.lock().unwrap().objects.get_mut(&id).unwrap());
    }

    /// Makes collection replies carry each item's type, pre-answered.
    pub fn set_prefill(&self, prefill: bool) {
        self.prefill.store(prefill, Ordering::SeqCst);
    }

    /// Registers a read handler: `f` maps the stored object to the reply.
    fn read<Resp, F>(&self, service: &str, method: &str, f: F)
    where
        Resp: edbrpc::Message,
        F: Fn(&Obj) -> Resp + Send + Sync + 'static,
    {
        let store = self.store.clone();
        self.server.on(service, method, move |ctx: &mut MockContext, target: EdbObj| {
            let store = store.lock().unwrap();
            store.get(&ctx.resolve(&target)).map(&f)
        });
    }

    fn register_layout(&self) {
        for (method, obj_type) in [
            ("GetNetCollection", LayoutObjType::Net),
            ("GetPrimitiveCollection", LayoutObjType::Primitive),
            ("GetGroupCollection", LayoutObjType::Group),
        ] {
            let store = self.store.clone();
            let prefill = self.prefill.clone();
            self.server.on(service::LAYOUT, method, move |_, _: EdbObj| {
                let store = store.lock().unwrap();
                let mut items = Vec::new();
                for id in store.of_type(obj_type) {
                    let mut item = EdbObj::new(id);
                    if prefill.load(Ordering::SeqCst) && obj_type == LayoutObjType::Primitive {
                        let tag = TypeMsg { tag: store.objects[&id].subtype };
                        let entry = CacheEntry::new(service::PRIMITIVE, "GetPrimitiveType", &EdbObj::new(id), &tag)
                            .map_err(|e| Status::internal(e.to_string()))?;
                        item = item.with_cache(CacheMsg { entries: vec![entry] });
                    }
                    items.push(item);
                }
                Ok(EdbObjCollection { items })
            });
        }

        let store = self.store.clone();
        self.server.on(service::LAYOUT_OBJ, "GetLayout", move |ctx, target: LayoutObjTargetMsg| {
            store.lock().unwrap().get(&ctx.resolve(&target.target))?;
            Ok(EdbObj::new(LAYOUT_ID))
        });

        let store = self.store.clone();
        self.server.on(service::LAYOUT_OBJ, "Delete", move |ctx, target: LayoutObjTargetMsg| {
            let target = ctx.resolve(&target.target);
            match store.lock().unwrap().objects.remove(&target.id) {
                Some(_) => Ok(Empty),
                None => Err(Status::not_found(format!("no object #{}", target.id))),
            }
        });
    }

    fn register_connectable(&self) {
        self.read(service::CONNECTABLE, "GetObjType", |o| TypeMsg { tag: o.obj_type });
        self.read(service::CONNECTABLE, "GetNet", |o| handle(o.net));
        self.read(service::CONNECTABLE, "GetGroup", |o| handle(o.group));

        let store = self.store.clone();
        self.server.on(service::CONNECTABLE, "GetId", move |ctx, target: EdbObj| {
            let target = ctx.resolve(&target);
            store.lock().unwrap().get(&target)?;
            Ok(UInt64Msg { value: target.id })
        });

        let store = self.store.clone();
        self.server.on(service::CONNECTABLE, "SetNet", move |ctx, msg: PointerPropertyMsg| {
            let net = ctx.resolve(&msg.value).id;
            store.lock().unwrap().get_mut(&ctx.resolve(&msg.target))?.net = net;
            Ok(Empty)
        });
    }

    fn register_net(&self) {
        self.read(service::NET, "GetName", |o| StringMsg { value: o.name.clone() });
        self.read(service::NET, "GetIsPowerGround", |o| BoolMsg { value: o.power_ground });

        let store = self.store.clone();
        self.server.on(service::NET, "Create", move |_, msg: LayoutNameMsg| {
            check_name(&msg.name)?;
            Ok(EdbObj::new(store.lock().unwrap().insert(Obj::of(LayoutObjType::Net).named(&msg.name))))
        });

        let store = self.store.clone();
        self.server.on(service::NET, "FindByName", move |_, msg: LayoutNameMsg| {
            Ok(store.lock().unwrap().find(LayoutObjType::Net, &msg.name))
        });

        let store = self.store.clone();
        self.server.on(service::NET, "SetName", move |ctx, msg: StringPropertyMsg| {
            check_name(&msg.value)?;
            store.lock().unwrap().get_mut(&ctx.resolve(&msg.target))?.name = msg.value;
            Ok(Empty)
        });

        let store = self.store.clone();
        self.server.on(service::NET, "SetIsPowerGround", move |ctx, msg: BoolPropertyMsg| {
            store.lock().unwrap().get_mut(&ctx.resolve(&msg.target))?.power_ground = msg.value;
            Ok(Empty)
        });
    }

    fn register_primitive(&self) {
        self.read(service::PRIMITIVE, "GetPrimitiveType", |o| TypeMsg { tag: o.subtype });
        self.read(service::PRIMITIVE, "GetIsNegative", |o| BoolMsg { value: o.negative });

        let store = self.store.clone();
        self.server.on(service::PRIMITIVE, "SetIsNegative", move |ctx, msg: BoolPropertyMsg| {
            store.lock().unwrap().get_mut(&ctx.resolve(&msg.target))?.negative = msg.value;
            Ok(Empty)
        });

        let store = self.store.clone();
        self.server.on(service::RECTANGLE, "Create", move |ctx, msg: RectangleCreateMsg| {
            let mut obj = Obj::of(LayoutObjType::Primitive).subtype(PrimitiveType::Rectangle.tag()).named(&msg.layer);
            obj.net = ctx.resolve(&msg.net).id;
            Ok(EdbObj::new(store.lock().unwrap().insert(obj)))
        });

        let store = self.store.clone();
        self.server.on(service::CIRCLE, "Create", move |ctx, msg: CircleCreateMsg| {
            if msg.radius <= 0.0 {
                return Err(Status::invalid_argument("radius must be positive"));
            }
            let mut obj = Obj::of(LayoutObjType::Primitive).subtype(PrimitiveType::Circle.tag()).named(&msg.layer);
            obj.net = ctx.resolve(&msg.net).id;
            Ok(EdbObj::new(store.lock().unwrap().insert(obj)))
        });
    }

    fn register_terminal(&self) {
        self.read(service::TERMINAL, "GetTerminalType", |o| TypeMsg { tag: o.subtype });
        self.read(service::TERMINAL, "GetName", |o| StringMsg { value: o.name.clone() });

        let store = self.store.clone();
        self.server.on(service::TERMINAL, "FindByName", move |_, msg: LayoutNameMsg| {
            Ok(store.lock().unwrap().find(LayoutObjType::Terminal, &msg.name))
        });
    }

    fn register_group(&self) {
        self.read(service::GROUP, "GetGroupType", |o| TypeMsg { tag: o.subtype });
        self.read(service::GROUP, "GetMembers", |o| EdbObjCollection {
            items: o.members.iter().map(|id| EdbObj::new(*id)).collect(),
        });

        let store = self.store.clone();
        self.server.on(service::GROUP, "Create", move |_, msg: LayoutNameMsg| {
            Ok(EdbObj::new(store.lock().unwrap().insert(Obj::of(LayoutObjType::Group).named(&msg.name))))
        });

        let store = self.store.clone();
        self.server.on(service::GROUP, "AddMember", move |ctx, msg: PointerPropertyMsg| {
            let member = ctx.resolve(&msg.value);
            let mut store = store.lock().unwrap();
            store.get(&member)?;
            let group = ctx.resolve(&msg.target);
            store.get_mut(&member)?.group = group.id;
            store.get_mut(&group)?.members.push(member.id);
            Ok(Empty)
        });
    }
}
