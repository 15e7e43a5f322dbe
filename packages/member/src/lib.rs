//! attrkit members: behavior-tagged attribute descriptors.
//!
//! A `Member` decides what reading, writing and deleting one attribute means:
//! plain slot storage, a constant, a read-only slot, an event or signal, a
//! delegate to another member, or an alias onto an attribute of a
//! sub-object. An `AliasDescriptor` is the storage-free variant of an alias,
//! attached to a type.
//!
//! Cyclic alias graphs fail with a recursion error instead of looping:
//! alias modes hold an `AliasGuard` over the (member, object) pair, and alias
//! descriptors hold a `FlagGuard` over their own markers.
//!
//! Everything here is single-threaded. Guard markers live in `Cell`s on
//! shared members, objects and descriptors, so none of these types is `Sync`.
//!
//! # Example
//!
//! ```rust
//! use attrkit_core::{name, AttributeAccess, Value};
//! use attrkit_member::{Instance, Member, ObjectTypeBuilder};
//!
//! let ty = ObjectTypeBuilder::new("Point")
//!     .member(Member::slot(name!("x")))
//!     .build();
//! let point = Instance::new(&ty);
//!
//! point.set_attribute(&name!("x"), Value::from(42)).unwrap();
//! point.delete_attribute(&name!("x")).unwrap();
//! ```

mod alias;
mod guard;
mod member;
mod mode;
mod object;

pub use alias::{AliasConfig, AliasDescriptor, AliasHops, AliasRead};
pub use guard::{AliasFlags, AliasGuard, FlagGuard, FlagTable, GuardScope};
pub use member::Member;
pub use mode::{AliasTarget, DelAttr, GetAttr, ModeContext, ModeKind, SetAttr};
pub use object::{Attribute, Instance, ObjectType, ObjectTypeBuilder};
