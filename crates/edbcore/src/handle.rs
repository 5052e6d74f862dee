//! # Remote Handles
//!
//! A `Handle` is the client's reference to a server object. It is a plain
//! value; proxies rebind to a new handle rather than mutating one.
//!
//! ## Invariants
//! - **Null Sentinel**: `id == 0` means "no object". A null handle is never a future.
//! - **Futures**: A future handle stands in for an object a buffered request will
//!   create. Its id is client-assigned and meaningless to the server until the
//!   buffer resolves it.

use std::sync::Mutex;

use edbrpc::EdbObj;

use crate::util::lock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handle {
    pub id: u64,
    pub is_future: bool,
}

impl Handle {
    pub const NULL: Handle = Handle { id: 0, is_future: false };

    pub fn new(id: u64) -> Self {
        Self { id, is_future: false }
    }

    pub fn future(id: u64) -> Self {
        Self { id, is_future: true }
    }

    pub fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl From<&EdbObj> for Handle {
    fn from(msg: &EdbObj) -> Self {
        if msg.id == 0 {
            return Self::NULL;
        }
        Self { id: msg.id, is_future: msg.is_future }
    }
}

impl From<Handle> for EdbObj {
    fn from(handle: Handle) -> Self {
        EdbObj { id: handle.id, is_future: handle.is_future, cache: None }
    }
}

/// The mutable cell a proxy keeps its current handle in.
///
/// Shared with the request buffer, which holds it weakly and patches futures
/// to real handles when a flush resolves them.
#[derive(Debug, Default)]
pub struct HandleSlot(Mutex<Handle>);

impl HandleSlot {
    pub fn new(handle: Handle) -> Self {
        Self(Mutex::new(handle))
    }

    pub fn get(&self) -> Handle {
        *lock(&self.0)
    }

    pub fn set(&self, handle: Handle) {
        *lock(&self.0) = handle;
    }
}
