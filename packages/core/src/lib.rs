//! attrkit core: the vocabulary shared by attribute handlers and hosts.
//!
//! - `Name`: interned attribute names, compared by identity
//! - `Value`: dynamically-typed attribute values, including object references
//! - `AttributeAccess` / `SlotStorage`: what a handler may ask of an object
//! - `ChangeRecord`: immutable description of a mutation, delivered to observers
//! - `Error`: the failure kinds every handler reports through
//!
//! # Example
//!
//! ```rust
//! use attrkit_core::{name, ChangeKind, ChangeRecord, ObjectId, Value};
//!
//! let record = ChangeRecord::deleted(ObjectId::next(), &name!("x"), Value::from(42));
//! assert_eq!(record.kind(), ChangeKind::Deleted);
//! assert_eq!(record.old_value(), Some(&Value::from(42)));
//! ```

mod change;
mod error;
mod name;
mod observer;
mod traits;
mod value;

pub use change::{Change, ChangeKind, ChangeRecord};
pub use error::Error;
pub use name::{Name, NameError};
pub use observer::{observer, Observer, ObserverList, ObserverRegistry};
pub use traits::{AttributeAccess, ObjectId, ObjectRef, SlotStorage};
pub use value::Value;
