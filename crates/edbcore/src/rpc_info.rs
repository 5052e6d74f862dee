//! # RPC Ledger
//!
//! The source of truth for how each remote method may be treated by the IO
//! layer: whether its replies may be cached, whether it may be deferred into
//! the request buffer, and whether deferring it yields a future handle.
//!
//! ## Philosophy
//!
//! - **Data, not Code**: The cache and buffer never special-case a method. They consult
//!   this table and nothing else.
//! - **Closed by Default**: A method that is not listed is neither cacheable nor
//!   bufferable, and is treated as a write for ordering purposes.
//! - **Checked at Build Time**: `validate` rejects contradictory entries before a session
//!   ever uses them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

/// Fully qualified service names.
pub mod service {
    pub const CACHING: &str = "ansys.api.edb.v1.CachingService";
    pub const LAYOUT: &str = "ansys.api.edb.v1.LayoutService";
    pub const LAYOUT_OBJ: &str = "ansys.api.edb.v1.LayoutObjService";
    pub const CONNECTABLE: &str = "ansys.api.edb.v1.ConnectableService";
    pub const NET: &str = "ansys.api.edb.v1.NetService";
    pub const PRIMITIVE: &str = "ansys.api.edb.v1.PrimitiveService";
    pub const RECTANGLE: &str = "ansys.api.edb.v1.RectangleService";
    pub const CIRCLE: &str = "ansys.api.edb.v1.CircleService";
    pub const TERMINAL: &str = "ansys.api.edb.v1.TerminalService";
    pub const GROUP: &str = "ansys.api.edb.v1.GroupService";
}

/// The method that sends the request buffer.
pub const FLUSH_BUFFER: &str = "FlushBuffer";

/// Ledger errors.
#[derive(Debug, Clone)]
pub enum Error {
    /// An entry's flags contradict each other.
    Inconsistent { rpc: String, details: &'static str },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Inconsistent { rpc, details } => write!(f, "rpc '{}' is inconsistent: {}", rpc, details),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcInfo {
    pub can_cache: bool,
    pub can_buffer: bool,
    pub is_read: bool,
    pub is_write: bool,
    /// Deferring the call hands the caller a future handle.
    pub returns_future: bool,
}

impl RpcInfo {
    pub const READ: RpcInfo = RpcInfo {
        can_cache: true,
        can_buffer: false,
        is_read: true,
        is_write: false,
        returns_future: false,
    };

    pub const UNCACHED_READ: RpcInfo = RpcInfo { can_cache: false, ..Self::READ };

    pub const WRITE: RpcInfo = RpcInfo {
        can_cache: false,
        can_buffer: false,
        is_read: false,
        is_write: true,
        returns_future: false,
    };

    pub const BUFFERED_WRITE: RpcInfo = RpcInfo { can_buffer: true, ..Self::WRITE };

    pub const BUFFERED_CREATE: RpcInfo = RpcInfo { returns_future: true, ..Self::BUFFERED_WRITE };

    fn check(&self) -> std::result::Result<(), &'static str> {
        if self.is_read == self.is_write {
            return Err("must be exactly one of read or write");
        }
        if self.can_cache && !self.is_read {
            return Err("only reads may be cached");
        }
        if self.can_buffer && !self.is_write {
            return Err("only writes may be buffered");
        }
        if self.returns_future && !self.can_buffer {
            return Err("only buffered writes return futures");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ServiceSchema {
    pub methods: HashMap<String, RpcInfo>,
}

/// Service -> method -> treatment.
#[derive(Clone, Debug, Default)]
pub struct RpcLedger {
    pub services: HashMap<String, ServiceSchema>,
}

impl RpcLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: &str, method: &str, info: RpcInfo) {
        self.services
            .entry(service.to_string())
            .or_default()
            .methods
            .insert(method.to_string(), info);
    }

    pub fn with(mut self, service: &str, method: &str, info: RpcInfo) -> Self {
        self.insert(service, method, info);
        self
    }

    pub fn get_rpc_info(&self, service: &str, method: &str) -> Option<RpcInfo> {
        self.services.get(service).and_then(|s| s.methods.get(method)).copied()
    }

    pub fn can_cache(&self, service: &str, method: &str) -> bool {
        self.get_rpc_info(service, method).is_some_and(|i| i.can_cache)
    }

    pub fn can_buffer(&self, service: &str, method: &str) -> bool {
        self.get_rpc_info(service, method).is_some_and(|i| i.can_buffer)
    }

    pub fn is_read(&self, service: &str, method: &str) -> bool {
        self.get_rpc_info(service, method).is_some_and(|i| i.is_read)
    }

    pub fn is_write(&self, service: &str, method: &str) -> bool {
        self.get_rpc_info(service, method).is_some_and(|i| i.is_write)
    }

    pub fn validate(&self) -> Result<()> {
        for (service, schema) in &self.services {
            for (method, info) in &schema.methods {
                info.check().map_err(|details| Error::Inconsistent {
                    rpc: format!("{}/{}", service, method),
                    details,
                })?;
            }
        }
        Ok(())
    }
}

/// The ledger covering every method the built-in proxies call.
pub fn default_ledger() -> Arc<RpcLedger> {
    static LEDGER: OnceLock<Arc<RpcLedger>> = OnceLock::new();
    LEDGER.get_or_init(|| Arc::new(build_default_ledger())).clone()
}

fn build_default_ledger() -> RpcLedger {
    use service::*;

    RpcLedger::new()
        .with(CACHING, FLUSH_BUFFER, RpcInfo::WRITE)
        .with(LAYOUT, "GetNetCollection", RpcInfo::READ)
        .with(LAYOUT, "GetPrimitiveCollection", RpcInfo::READ)
        .with(LAYOUT, "GetGroupCollection", RpcInfo::READ)
        .with(LAYOUT_OBJ, "GetLayout", RpcInfo::READ)
        .with(LAYOUT_OBJ, "Delete", RpcInfo::WRITE)
        .with(CONNECTABLE, "GetObjType", RpcInfo::READ)
        .with(CONNECTABLE, "GetId", RpcInfo::READ)
        .with(CONNECTABLE, "GetNet", RpcInfo::READ)
        .with(CONNECTABLE, "SetNet", RpcInfo::BUFFERED_WRITE)
        .with(CONNECTABLE, "GetGroup", RpcInfo::READ)
        .with(NET, "Create", RpcInfo::BUFFERED_CREATE)
        .with(NET, "FindByName", RpcInfo::READ)
        .with(NET, "GetName", RpcInfo::READ)
        .with(NET, "SetName", RpcInfo::BUFFERED_WRITE)
        .with(NET, "GetIsPowerGround", RpcInfo::READ)
        .with(NET, "SetIsPowerGround", RpcInfo::BUFFERED_WRITE)
        .with(PRIMITIVE, "GetPrimitiveType", RpcInfo::READ)
        .with(PRIMITIVE, "GetIsNegative", RpcInfo::READ)
        .with(PRIMITIVE, "SetIsNegative", RpcInfo::BUFFERED_WRITE)
        .with(RECTANGLE, "Create", RpcInfo::BUFFERED_CREATE)
        .with(CIRCLE, "Create", RpcInfo::BUFFERED_CREATE)
        .with(TERMINAL, "GetTerminalType", RpcInfo::READ)
        .with(TERMINAL, "GetName", RpcInfo::READ)
        .with(TERMINAL, "FindByName", RpcInfo::READ)
        .with(GROUP, "GetGroupType", RpcInfo::READ)
        .with(GROUP, "Create", RpcInfo::WRITE)
        .with(GROUP, "GetMembers", RpcInfo::READ)
        .with(GROUP, "AddMember", RpcInfo::WRITE)
}
