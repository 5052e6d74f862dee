//! # Proxy Base
//!
//! State and behavior shared by every entity proxy: the session it talks
//! through and the slot holding its current handle.
//!
//! ## Invariants
//! - **Binding Runs the Setter**: Constructing a proxy from a wire handle goes through
//!   `set_msg`, so futures are registered with the live buffer and piggybacked
//!   cache entries are ingested by the live cache.
//! - **Reading Registers**: Handing out a future handle (`msg`) registers the proxy with
//!   the live buffer, so it is patched when the future resolves.

use std::sync::Arc;

use edbrpc::EdbObj;

use crate::error::Result;
use crate::handle::Handle;
use crate::handle::HandleSlot;
use crate::session::Session;

#[derive(Clone)]
pub struct ObjBase {
    session: Session,
    slot: Arc<HandleSlot>,
}

impl ObjBase {
    pub fn new(session: &Session, msg: Option<EdbObj>) -> Result<Self> {
        let base = Self::null(session);
        base.set_msg(msg)?;
        Ok(base)
    }

    pub fn null(session: &Session) -> Self {
        Self { session: session.clone(), slot: Arc::new(HandleSlot::new(Handle::NULL)) }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&self) -> Handle {
        self.slot.get()
    }

    pub fn id(&self) -> u64 {
        self.handle().id
    }

    pub fn is_future(&self) -> bool {
        self.handle().is_future
    }

    /// Whether this proxy refers to no object.
    ///
    /// Flushes pending buffered writes first, so an object created by a
    /// buffered request reads as non-null once the server has created it.
    pub async fn is_null(&self) -> Result<bool> {
        self.session.flush().await?;
        Ok(self.handle().is_null())
    }

    /// The wire form of the current handle.
    pub fn msg(&self) -> EdbObj {
        let handle = self.handle();
        if handle.is_future {
            if let Some(buffer) = self.session.io().buffer() {
                buffer.add_future_ref(&self.slot);
            }
        }
        EdbObj::from(handle)
    }

    /// Rebinds this proxy. `None` binds the null handle.
    pub fn set_msg(&self, msg: Option<EdbObj>) -> Result<()> {
        let Some(mut msg) = msg else {
            self.slot.set(Handle::NULL);
            return Ok(());
        };

        if msg.is_future {
            self.slot.set(Handle::from(&msg));
            if let Some(buffer) = self.session.io().buffer() {
                buffer.add_future_ref(&self.slot);
            }
            return Ok(());
        }

        if let Some(cache) = self.session.io().cache() {
            cache.add_from_cache_msg(&mut msg)?;
        }
        self.slot.set(Handle::from(&msg));
        Ok(())
    }
}

impl std::fmt::Debug for ObjBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handle = self.handle();
        if handle.is_future {
            write!(f, "future#{}", handle.id)
        } else {
            write!(f, "#{}", handle.id)
        }
    }
}

/// Implemented by every entity proxy.
pub trait EdbObject: Sized + Send + Sync + 'static {
    const KIND: &'static str;

    fn from_base(base: ObjBase) -> Self;
    fn base(&self) -> &ObjBase;
    fn into_base(self) -> ObjBase;

    fn new(session: &Session, msg: Option<EdbObj>) -> Result<Self> {
        ObjBase::new(session, msg).map(Self::from_base)
    }

    fn null(session: &Session) -> Self {
        Self::from_base(ObjBase::null(session))
    }
}

/// Declares an entity proxy type.
///
/// Proxies compare equal when they hold the same handle; two proxies of
/// different kinds are different types and never compare.
macro_rules! edb_obj {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            base: $crate::base::ObjBase,
        }

        impl $crate::base::EdbObject for $name {
            const KIND: &'static str = stringify!($name);

            fn from_base(base: $crate::base::ObjBase) -> Self {
                Self { base }
            }

            fn base(&self) -> &$crate::base::ObjBase {
                &self.base
            }

            fn into_base(self) -> $crate::base::ObjBase {
                self.base
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::base::ObjBase;

            fn deref(&self) -> &Self::Target {
                &self.base
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.base.handle() == other.base.handle()
            }
        }

        impl Eq for $name {}

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.base)
            }
        }
    };
}

pub(crate) use edb_obj;
