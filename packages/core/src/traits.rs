//! Object traits: generic attribute access and slot storage.
//!
//! Attribute handlers only ever see an object through these two traits. The
//! host decides how objects are laid out; handlers decide what each access
//! means.
//!
//! # Threading
//!
//! Methods take `&self` because access is reentrant: a delete on one object
//! may read attributes of the same object before it returns. Implementations
//! use interior mutability (`Cell`/`RefCell`) and are expected to be `!Sync`.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{ChangeRecord, Error, Name, Observer, Value};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an object.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generic attribute access on any object.
///
/// Delegate and alias handling use this to reach attributes of *other*
/// objects, whatever those objects are made of.
pub trait AttributeAccess {
    /// Identity of this object.
    fn object_id(&self) -> ObjectId;

    /// Name of the object's type, used in error messages.
    fn type_name(&self) -> &str;

    /// Read an attribute.
    fn get_attribute(&self, name: &Name) -> Result<Value, Error>;

    /// Write an attribute.
    fn set_attribute(&self, name: &Name, value: Value) -> Result<(), Error>;

    /// Delete an attribute.
    fn delete_attribute(&self, name: &Name) -> Result<(), Error>;

    /// Register `observer` for changes to `name`. Returns false if this
    /// object does not support observers.
    fn observe_attribute(&self, _name: &Name, _observer: Observer) -> bool {
        false
    }

    /// Remove an observer by identity. Returns true if it was registered.
    fn unobserve_attribute(&self, _name: &Name, _observer: &Observer) -> bool {
        false
    }
}

/// Per-object slot storage, observer registry and alias marker.
pub trait SlotStorage: AttributeAccess {
    /// Number of slots in this object.
    fn slot_count(&self) -> usize;

    /// Read a slot. `None` means the slot is empty.
    fn get_slot(&self, index: usize) -> Option<Value>;

    /// Write a slot; `None` empties it. Indices past `slot_count` are ignored.
    fn set_slot(&self, index: usize, value: Option<Value>);

    /// Whether change notifications are currently enabled on this object.
    fn notifications_enabled(&self) -> bool;

    /// Whether any observer is registered under `name` on this object.
    fn has_observers(&self, name: &Name) -> bool;

    /// Deliver a change to the observers registered under `name`.
    fn notify(&self, name: &Name, change: &ChangeRecord) -> Result<(), Error>;

    /// Whether an alias operation is currently in progress on this object.
    fn alias_guard(&self) -> bool;

    /// Set or clear the in-progress alias marker.
    fn set_alias_guard(&self, active: bool);
}

/// A shared reference to an object, stored inside `Value::Object`.
///
/// Equality is identity: two refs are equal when they point at the same
/// allocation.
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn AttributeAccess>);

impl ObjectRef {
    /// Wrap a shared object.
    pub fn new<T: AttributeAccess + 'static>(object: Rc<T>) -> Self {
        ObjectRef(object)
    }

    /// Wrap an already type-erased object.
    pub fn from_dyn(object: Rc<dyn AttributeAccess>) -> Self {
        ObjectRef(object)
    }

    /// Borrow the object.
    pub fn get(&self) -> &dyn AttributeAccess {
        &*self.0
    }
}

impl std::ops::Deref for ObjectRef {
    type Target = dyn AttributeAccess;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.object_id() == other.0.object_id()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.0.type_name(), self.0.object_id())
    }
}
