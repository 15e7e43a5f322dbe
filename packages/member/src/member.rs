//! Attribute members and their get/set/delete dispatch.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use attrkit_core::{
    ChangeRecord, Error, Name, ObjectRef, Observer, ObserverList, SlotStorage, Value,
};

use crate::guard::AliasGuard;
use crate::mode::{AliasTarget, DelAttr, GetAttr, ModeContext, ModeKind, SetAttr};

/// Descriptor governing how one named attribute is read, written and deleted.
///
/// Members are built once when a type is assembled and shared by every
/// instance of that type. The slot index is assigned before the member is
/// shared; afterwards only the transient alias marker changes.
///
/// A delegate never owns a slot of its own: operations forwarded to it run
/// against the delegator's slot, so one target member can be delegated from
/// any number of types.
pub struct Member {
    name: Name,
    index: usize,
    getattr: GetAttr,
    setattr: SetAttr,
    delattr: DelAttr,
    default: Value,
    observable: bool,
    observers: ObserverList,
    alias_guard: Cell<bool>,
}

impl Member {
    /// A plain slot-backed member.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            index: 0,
            getattr: GetAttr::Slot,
            setattr: SetAttr::Slot,
            delattr: DelAttr::Slot,
            default: Value::Null,
            observable: false,
            observers: ObserverList::new(),
            alias_guard: Cell::new(false),
        }
    }

    /// Alias for [`Member::new`].
    pub fn slot(name: Name) -> Self {
        Self::new(name)
    }

    /// A member that always reads as `value` and can be neither set nor deleted.
    pub fn constant(name: Name, value: Value) -> Self {
        Self::new(name)
            .with_getattr(GetAttr::Constant(value))
            .with_setattr(SetAttr::Constant)
            .with_delattr(DelAttr::Constant)
    }

    /// A slot that can be written once and never deleted.
    pub fn read_only(name: Name) -> Self {
        Self::new(name)
            .with_setattr(SetAttr::ReadOnly)
            .with_delattr(DelAttr::ReadOnly)
    }

    /// A member whose writes fire a notification and store nothing.
    pub fn event(name: Name) -> Self {
        Self::new(name)
            .with_getattr(GetAttr::Event)
            .with_setattr(SetAttr::Event)
            .with_delattr(DelAttr::Event)
    }

    /// A member that can only be emitted, never stored, set or deleted.
    pub fn signal(name: Name) -> Self {
        Self::new(name)
            .with_getattr(GetAttr::Signal)
            .with_setattr(SetAttr::Signal)
            .with_delattr(DelAttr::Signal)
    }

    /// A member that forwards every operation to `delegate` on the same object.
    pub fn delegate(name: Name, delegate: Rc<Member>) -> Self {
        Self::new(name)
            .with_getattr(GetAttr::Delegate(Rc::clone(&delegate)))
            .with_setattr(SetAttr::Delegate(Rc::clone(&delegate)))
            .with_delattr(DelAttr::Delegate(delegate))
    }

    /// A member that aliases `attr` on the object held in `target`.
    ///
    /// An observable alias re-publishes changes of `attr` on whichever object
    /// `target` currently holds, to its own observers and to the owner's
    /// observers under the alias name.
    pub fn alias(name: Name, target: Name, attr: Name, observable: bool) -> Self {
        let context = AliasTarget::new(target, attr);
        let mut member = Self::new(name)
            .with_getattr(GetAttr::Alias(context.clone()))
            .with_setattr(SetAttr::Alias(context.clone()))
            .with_delattr(DelAttr::Alias(context));
        member.observable = observable;
        member
    }

    /// Replace the get mode.
    #[must_use]
    pub fn with_getattr(mut self, mode: GetAttr) -> Self {
        self.getattr = mode;
        self
    }

    /// Replace the set mode.
    #[must_use]
    pub fn with_setattr(mut self, mode: SetAttr) -> Self {
        self.setattr = mode;
        self
    }

    /// Replace the delete mode.
    #[must_use]
    pub fn with_delattr(mut self, mode: DelAttr) -> Self {
        self.delattr = mode;
        self
    }

    /// Value stored into an empty slot the first time it is read.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    /// Pin the slot index, for members used outside a built type.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.set_index(index);
        self
    }

    /// Configure the delete mode from an ordinal and an untyped context.
    pub fn set_delattr_mode(&mut self, kind: ModeKind, context: ModeContext) -> Result<(), Error> {
        self.delattr = DelAttr::from_parts(kind, context)?;
        Ok(())
    }

    /// Configure the set mode from an ordinal and an untyped context.
    pub fn set_setattr_mode(&mut self, kind: ModeKind, context: ModeContext) -> Result<(), Error> {
        self.setattr = SetAttr::from_parts(kind, context)?;
        Ok(())
    }

    /// Configure the get mode from an ordinal and an untyped context.
    pub fn set_getattr_mode(&mut self, kind: ModeKind, context: ModeContext) -> Result<(), Error> {
        self.getattr = GetAttr::from_parts(kind, context)?;
        Ok(())
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Slot index within the owning type.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Assign the slot index. Only possible while the member is unshared.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Whether this alias re-publishes changes of the aliased attribute.
    pub fn is_observable(&self) -> bool {
        self.observable
    }

    pub fn getattr_mode(&self) -> &GetAttr {
        &self.getattr
    }

    pub fn setattr_mode(&self) -> &SetAttr {
        &self.setattr
    }

    pub fn delattr_mode(&self) -> &DelAttr {
        &self.delattr
    }

    /// Value stored into an empty slot on first read.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The `(target, attr)` pair if this member reads through an alias.
    pub fn alias_target(&self) -> Option<&AliasTarget> {
        match &self.getattr {
            GetAttr::Alias(target) => Some(target),
            _ => None,
        }
    }

    // === Observers ===

    /// Attach an observer that sees this member's changes on every object.
    pub fn observe(&self, observer: Observer) {
        self.observers.add(observer);
    }

    pub fn unobserve(&self, observer: &Observer) -> bool {
        self.observers.remove(observer)
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    /// Deliver a change to the observers attached to this member.
    pub fn notify(&self, change: &ChangeRecord) -> Result<(), Error> {
        self.observers.notify(change)
    }

    // === Alias marker ===

    pub fn alias_guard(&self) -> bool {
        self.alias_guard.get()
    }

    pub fn set_alias_guard(&self, active: bool) {
        self.alias_guard.set(active);
    }

    // === Dispatch ===

    /// Read this attribute on `object`.
    pub fn get(&self, object: &dyn SlotStorage) -> Result<Value, Error> {
        self.get_at(object, self.index)
    }

    /// Write this attribute on `object`.
    pub fn set(&self, object: &dyn SlotStorage, value: Value) -> Result<(), Error> {
        self.set_at(object, self.index, value)
    }

    /// Delete this attribute on `object`.
    pub fn delete(&self, object: &dyn SlotStorage) -> Result<(), Error> {
        self.delete_at(object, self.index)
    }

    fn get_at(&self, object: &dyn SlotStorage, index: usize) -> Result<Value, Error> {
        log::trace!(
            "get '{}' ({}) on {}",
            self.name,
            self.getattr.kind(),
            object.object_id()
        );
        match &self.getattr {
            GetAttr::NoOp => Ok(Value::Null),
            GetAttr::Slot | GetAttr::ReadOnly => self.get_slot(object, index),
            GetAttr::Constant(value) => Ok(value.clone()),
            GetAttr::Event | GetAttr::Signal => Ok(Value::Null),
            GetAttr::Delegate(delegate) => delegate.get_at(object, index),
            GetAttr::Alias(target) => self.get_alias(target, object),
        }
    }

    fn set_at(&self, object: &dyn SlotStorage, index: usize, value: Value) -> Result<(), Error> {
        log::trace!(
            "set '{}' ({}) on {}",
            self.name,
            self.setattr.kind(),
            object.object_id()
        );
        match &self.setattr {
            SetAttr::NoOp => Ok(()),
            SetAttr::Slot => self.set_slot(object, index, value),
            SetAttr::Constant => {
                Err(self.immutable("cannot set the value of a constant member"))
            }
            SetAttr::ReadOnly => {
                let index = self.checked_index(object, index)?;
                if object.get_slot(index).is_some() {
                    return Err(self.immutable("cannot change the value of a read only member"));
                }
                self.set_slot(object, index, value)
            }
            SetAttr::Event => self.notify_change(object, || {
                ChangeRecord::event(object.object_id(), &self.name, value.clone())
            }),
            SetAttr::Signal => Err(self.immutable("cannot set the value of a signal")),
            SetAttr::Delegate(delegate) => delegate.set_at(object, index, value),
            SetAttr::Alias(target) => self.set_alias(target, object, value),
        }
    }

    fn delete_at(&self, object: &dyn SlotStorage, index: usize) -> Result<(), Error> {
        log::trace!(
            "delete '{}' ({}) on {}",
            self.name,
            self.delattr.kind(),
            object.object_id()
        );
        match &self.delattr {
            DelAttr::NoOp => Ok(()),
            DelAttr::Slot => self.delete_slot(object, index),
            DelAttr::Constant => {
                Err(self.immutable("cannot delete the value of a constant member"))
            }
            DelAttr::ReadOnly => {
                Err(self.immutable("cannot delete the value of a read only member"))
            }
            DelAttr::Event => Err(self.immutable("cannot delete the value of an event")),
            DelAttr::Signal => Err(self.immutable("cannot delete the value of a signal")),
            DelAttr::Delegate(delegate) => delegate.delete_at(object, index),
            DelAttr::Alias(target) => self.delete_alias(target, object),
        }
    }

    // === Handlers ===

    fn immutable(&self, message: &str) -> Error {
        log::debug!("'{}': {}", self.name, message);
        Error::immutable(&self.name, message)
    }

    /// `index`, or `AttributeNotFound` if the object has fewer slots than the
    /// index implies (a stale index after the type changed).
    fn checked_index(&self, object: &dyn SlotStorage, index: usize) -> Result<usize, Error> {
        if index >= object.slot_count() {
            return Err(Error::not_found(object.type_name(), self.name.as_str()));
        }
        Ok(index)
    }

    fn get_slot(&self, object: &dyn SlotStorage, index: usize) -> Result<Value, Error> {
        let index = self.checked_index(object, index)?;
        if let Some(value) = object.get_slot(index) {
            return Ok(value);
        }
        let value = self.default.clone();
        object.set_slot(index, Some(value.clone()));
        self.notify_change(object, || {
            ChangeRecord::created(object.object_id(), &self.name, value.clone())
        })?;
        Ok(value)
    }

    fn set_slot(&self, object: &dyn SlotStorage, index: usize, value: Value) -> Result<(), Error> {
        let index = self.checked_index(object, index)?;
        let old = object.get_slot(index);
        object.set_slot(index, Some(value.clone()));
        match old {
            None => self.notify_change(object, || {
                ChangeRecord::created(object.object_id(), &self.name, value.clone())
            }),
            Some(old) if old != value => self.notify_change(object, || {
                ChangeRecord::updated(object.object_id(), &self.name, old.clone(), value.clone())
            }),
            Some(_) => Ok(()),
        }
    }

    fn delete_slot(&self, object: &dyn SlotStorage, index: usize) -> Result<(), Error> {
        let index = self.checked_index(object, index)?;
        let old = match object.get_slot(index) {
            Some(old) => old,
            None => return Ok(()),
        };
        object.set_slot(index, None);
        self.notify_change(object, || {
            ChangeRecord::deleted(object.object_id(), &self.name, old.clone())
        })
    }

    /// Fan a change out to member observers, then to the object's observers
    /// under this member's name. The record is built at most once, and only
    /// if some audience is listening.
    fn notify_change<F>(&self, object: &dyn SlotStorage, build: F) -> Result<(), Error>
    where
        F: Fn() -> ChangeRecord,
    {
        if !object.notifications_enabled() {
            return Ok(());
        }
        let mut record: Option<ChangeRecord> = None;
        if self.has_observers() {
            let change = record.get_or_insert_with(&build);
            log::trace!("notify member observers of '{}'", self.name);
            self.notify(change)?;
        }
        if object.has_observers(&self.name) {
            let change = record.get_or_insert_with(&build);
            log::trace!("notify object observers of '{}'", self.name);
            object.notify(&self.name, change)?;
        }
        Ok(())
    }

    fn get_alias(&self, target: &AliasTarget, object: &dyn SlotStorage) -> Result<Value, Error> {
        let _guard = AliasGuard::acquire(self, object)?;
        let other = object.get_attribute(target.target())?;
        sub_object(&other, target.attr())?.get_attribute(target.attr())
    }

    fn set_alias(
        &self,
        target: &AliasTarget,
        object: &dyn SlotStorage,
        value: Value,
    ) -> Result<(), Error> {
        let _guard = AliasGuard::acquire(self, object)?;
        let other = object.get_attribute(target.target())?;
        sub_object(&other, target.attr())?.set_attribute(target.attr(), value)
    }

    fn delete_alias(&self, target: &AliasTarget, object: &dyn SlotStorage) -> Result<(), Error> {
        let _guard = AliasGuard::acquire(self, object)?;
        let other = object.get_attribute(target.target())?;
        sub_object(&other, target.attr())?.delete_attribute(target.attr())
    }
}

/// The object held in `value`, or `AttributeNotFound` for `attr` when the
/// value is plain data.
pub(crate) fn sub_object<'v>(value: &'v Value, attr: &Name) -> Result<&'v ObjectRef, Error> {
    value
        .as_object()
        .ok_or_else(|| Error::not_found(value.type_name(), attr.as_str()))
}

impl Clone for Member {
    /// A fresh copy with the same modes, default and observers. The alias
    /// marker starts cleared.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index,
            getattr: self.getattr.clone(),
            setattr: self.setattr.clone(),
            delattr: self.delattr.clone(),
            default: self.default.clone(),
            observable: self.observable,
            observers: self.observers.clone(),
            alias_guard: Cell::new(false),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("index", &self.index())
            .field("getattr", &self.getattr.kind())
            .field("setattr", &self.setattr.kind())
            .field("delattr", &self.delattr.kind())
            .field("observable", &self.observable)
            .finish()
    }
}
