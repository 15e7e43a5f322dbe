//! attrkit: a pluggable attribute-access engine.
//!
//! Attributes are not plain fields here. Each one is governed by a member
//! that decides, per operation, whether it is slot storage, a constant, a
//! read-only slot, an event, a signal, a delegate or an alias onto another
//! object. Deletions of populated slots are reported to observers, and
//! cyclic alias graphs fail with a recursion error rather than looping.
//!
//! See `attrkit_core` for the shared vocabulary and `attrkit_member` for the
//! behaviors.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use attrkit::{name, observer, AttributeAccess, Instance, Member, ObjectTypeBuilder, Value};
//!
//! let ty = ObjectTypeBuilder::new("O")
//!     .member(Member::slot(name!("x")))
//!     .build();
//! let o = Instance::new(&ty);
//! o.set_attribute(&name!("x"), Value::from(42)).unwrap();
//!
//! let deletions = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&deletions);
//! o.observe(&name!("x"), observer(move |change| {
//!     assert_eq!(change.old_value(), Some(&Value::from(42)));
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! }));
//!
//! o.delete_attribute(&name!("x")).unwrap();
//! assert_eq!(deletions.get(), 1);
//! ```

pub use attrkit_core::*;
pub use attrkit_member::*;
