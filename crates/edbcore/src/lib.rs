//! # edbcore
//!
//! The client core of the EDB remote database API: proxies for remote
//! objects, and the session machinery that makes talking to them cheap.
//!
//! ## Philosophy
//!
//! - **Proxies Are Thin**: An entity proxy is a handle plus one remote call per
//!   method. Caching, buffering and error translation happen in the session,
//!   uniformly, driven by the RPC ledger.
//! - **Opt-In IO**: Response caching and request buffering are off by default and
//!   scoped (`Session::enable_caching`, `Session::enable_buffering`).
//! - **Typed Failures**: Every failure surfaces as an [`Error`] variant; nothing in the
//!   library panics on remote input.

pub mod base;
pub mod config;
pub mod entity;
pub mod error;
pub mod factory;
pub mod handle;
pub mod interceptor;
pub mod io;
pub mod logging;
pub mod messages;
pub mod mock;
pub mod rpc_info;
pub mod session;
pub mod tcp;
pub mod transport;

mod util;

#[cfg(test)]
mod tests;

pub use base::EdbObject;
pub use base::ObjBase;
pub use config::ClientConfig;
pub use error::Error;
pub use error::Result;
pub use factory::LayoutObject;
pub use handle::Handle;
pub use io::IoMode;
pub use io::IoScope;
pub use session::Session;
pub use session::SessionBuilder;

/// Everything needed to work with entity proxies.
pub mod prelude {
    pub use crate::base::EdbObject;
    pub use crate::entity::*;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::factory::GroupType;
    pub use crate::factory::LayoutObjType;
    pub use crate::factory::LayoutObject;
    pub use crate::factory::PrimitiveType;
    pub use crate::factory::TerminalType;
    pub use crate::io::IoMode;
    pub use crate::session::Session;
}
