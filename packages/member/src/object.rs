//! In-memory object host: types assembled from members, and their instances.
//!
//! `ObjectType` resolves attribute names to members or alias descriptors.
//! `Instance` owns the per-object state those handlers act on: a fixed slot
//! array, observers keyed by name, the notification switch and the alias
//! marker.
//!
//! Observable alias members are wired per instance. A hook on the alias's
//! target attribute follows whatever object that attribute holds, and keeps
//! one forwarding observer registered on the aliased attribute of that object.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use attrkit_core::{
    observer, AttributeAccess, ChangeKind, ChangeRecord, Error, Name, ObjectId, ObjectRef,
    Observer, ObserverRegistry, SlotStorage, Value,
};

use crate::{AliasDescriptor, AliasRead, Member};

/// What an attribute name resolves to on a type.
#[derive(Clone, Debug)]
pub enum Attribute {
    Member(Rc<Member>),
    Alias(Rc<AliasDescriptor>),
}

/// Builder for `ObjectType`.
///
/// Members get slot indices in declaration order. A later definition of a
/// name shadows an earlier one.
pub struct ObjectTypeBuilder {
    name: String,
    members: Vec<Member>,
    aliases: Vec<(Name, AliasDescriptor)>,
}

impl ObjectTypeBuilder {
    /// Start a type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Add a member; it takes the next slot.
    #[must_use]
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Attach a class-level alias descriptor under `name`.
    #[must_use]
    pub fn alias(mut self, name: Name, alias: AliasDescriptor) -> Self {
        self.aliases.push((name, alias));
        self
    }

    /// Assign slot indices and freeze the type.
    pub fn build(self) -> Rc<ObjectType> {
        let mut attributes = HashMap::new();
        let mut members = Vec::with_capacity(self.members.len());

        for (index, mut member) in self.members.into_iter().enumerate() {
            member.set_index(index);
            let member = Rc::new(member);
            attributes.insert(member.name().clone(), Attribute::Member(Rc::clone(&member)));
            members.push(member);
        }
        for (name, alias) in self.aliases {
            attributes.insert(name, Attribute::Alias(Rc::new(alias)));
        }

        log::debug!(
            "assembled type {} with {} slots",
            self.name,
            members.len()
        );

        Rc::new(ObjectType {
            name: self.name,
            slot_count: members.len(),
            members,
            attributes,
        })
    }
}

/// An assembled type: its members, aliases and slot layout.
pub struct ObjectType {
    name: String,
    members: Vec<Rc<Member>>,
    attributes: HashMap<Name, Attribute>,
    slot_count: usize,
}

impl ObjectType {
    /// The type name, as shown in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots each instance carries.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Members in slot order.
    pub fn members(&self) -> impl Iterator<Item = &Rc<Member>> {
        self.members.iter()
    }

    /// Resolve `name` to a member or an alias descriptor.
    pub fn lookup(&self, name: &Name) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// The member called `name`, if `name` is a member.
    pub fn member(&self, name: &Name) -> Option<&Rc<Member>> {
        match self.attributes.get(name) {
            Some(Attribute::Member(member)) => Some(member),
            _ => None,
        }
    }

    /// The descriptor called `name`, if `name` is an alias descriptor.
    pub fn alias(&self, name: &Name) -> Option<&Rc<AliasDescriptor>> {
        match self.attributes.get(name) {
            Some(Attribute::Alias(alias)) => Some(alias),
            _ => None,
        }
    }

    /// Type-level access to an alias: yields the descriptor itself.
    pub fn get_alias(&self, name: &Name) -> Result<AliasRead<'_>, Error> {
        match self.alias(name) {
            Some(alias) => alias.get(None),
            None => Err(Error::not_found(self.name.as_str(), name.as_str())),
        }
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("slot_count", &self.slot_count)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}

/// The forwarding observer an observable alias currently has registered.
struct AliasLink {
    target: ObjectRef,
    attr: Name,
    observer: Observer,
}

/// An object of some `ObjectType`.
pub struct Instance {
    id: ObjectId,
    ty: Rc<ObjectType>,
    slots: RefCell<Vec<Option<Value>>>,
    observers: ObserverRegistry,
    alias_hooks: ObserverRegistry,
    alias_links: RefCell<HashMap<Name, AliasLink>>,
    notifications: Cell<bool>,
    alias_guard: Cell<bool>,
}

impl Instance {
    /// Create an instance with every slot empty.
    pub fn new(ty: &Rc<ObjectType>) -> Rc<Self> {
        let instance = Rc::new(Self {
            id: ObjectId::next(),
            ty: Rc::clone(ty),
            slots: RefCell::new(vec![None; ty.slot_count()]),
            observers: ObserverRegistry::new(),
            alias_hooks: ObserverRegistry::new(),
            alias_links: RefCell::new(HashMap::new()),
            notifications: Cell::new(true),
            alias_guard: Cell::new(false),
        });
        for member in ty.members().filter(|m| m.is_observable()) {
            if let Some(target) = member.alias_target() {
                let hook = relink_hook(
                    Rc::downgrade(&instance),
                    member.name().clone(),
                    target.attr().clone(),
                );
                instance.alias_hooks.observe(target.target(), hook);
            }
        }
        instance
    }

    /// A shareable reference, for storing this object in another's attribute.
    pub fn to_ref(self: &Rc<Self>) -> ObjectRef {
        ObjectRef::new(Rc::clone(self))
    }

    /// The type this object was created from.
    pub fn object_type(&self) -> &Rc<ObjectType> {
        &self.ty
    }

    /// This object's identity.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Register an observer for changes to `name` on this object.
    pub fn observe(&self, name: &Name, observer: Observer) {
        self.observers.observe(name, observer);
    }

    /// Remove an observer by identity. Returns true if it was registered.
    pub fn unobserve(&self, name: &Name, observer: &Observer) -> bool {
        self.observers.unobserve(name, observer)
    }

    /// Drop every observer registered under `name`.
    pub fn unobserve_all(&self, name: &Name) {
        self.observers.unobserve_all(name);
    }

    /// Enable or disable change notifications. Returns the previous setting.
    pub fn set_notifications_enabled(&self, enabled: bool) -> bool {
        self.notifications.replace(enabled)
    }

    /// The object an observable alias is currently forwarding changes from.
    pub fn alias_source(&self, alias: &Name) -> Option<ObjectRef> {
        self.alias_links
            .borrow()
            .get(alias)
            .map(|link| link.target.clone())
    }

    /// Move the forwarding observer of `alias` to `attr` on `holder`.
    ///
    /// The previous registration is removed first. Nothing is registered when
    /// `holder` is not an object or does not accept observers.
    fn relink_alias(self: &Rc<Self>, alias: &Name, attr: &Name, holder: Option<&Value>) {
        let previous = self.alias_links.borrow_mut().remove(alias);
        if let Some(link) = previous {
            link.target.unobserve_attribute(&link.attr, &link.observer);
        }

        let Some(target) = holder.and_then(Value::as_object) else {
            return;
        };
        let forward = alias_forwarder(Rc::downgrade(self), alias.clone());
        if !target.observe_attribute(attr, Rc::clone(&forward)) {
            return;
        }
        log::debug!(
            "alias '{}' of {} now follows '{}' on {}",
            alias,
            self.id,
            attr,
            target.object_id()
        );
        self.alias_links.borrow_mut().insert(
            alias.clone(),
            AliasLink {
                target: target.clone(),
                attr: attr.clone(),
                observer: forward,
            },
        );
    }
}

/// Hook on an alias's target attribute: relink whenever it changes.
fn relink_hook(owner: Weak<Instance>, alias: Name, attr: Name) -> Observer {
    observer(move |change: &ChangeRecord| {
        if let Some(owner) = owner.upgrade() {
            let holder = match change.kind() {
                ChangeKind::Created | ChangeKind::Updated => change.new_value(),
                ChangeKind::Deleted | ChangeKind::Event => None,
            };
            owner.relink_alias(&alias, &attr, holder);
        }
        Ok(())
    })
}

/// Re-publish a change of the aliased attribute to the alias member's
/// observers, then to the owner's observers under the alias name.
fn alias_forwarder(owner: Weak<Instance>, alias: Name) -> Observer {
    observer(move |change: &ChangeRecord| {
        let Some(owner) = owner.upgrade() else {
            return Ok(());
        };
        if !owner.notifications_enabled() {
            return Ok(());
        }
        if let Some(member) = owner.ty.member(&alias) {
            member.notify(change)?;
        }
        owner.observers.notify(&alias, change)
    })
}

impl AttributeAccess for Instance {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn type_name(&self) -> &str {
        self.ty.name()
    }

    fn get_attribute(&self, name: &Name) -> Result<Value, Error> {
        match self.ty.lookup(name) {
            Some(Attribute::Member(member)) => member.get(self),
            Some(Attribute::Alias(alias)) => alias.get_value(self),
            None => Err(Error::not_found(self.type_name(), name.as_str())),
        }
    }

    fn set_attribute(&self, name: &Name, value: Value) -> Result<(), Error> {
        match self.ty.lookup(name) {
            Some(Attribute::Member(member)) => member.set(self, value),
            Some(Attribute::Alias(alias)) => alias.set(self, value),
            None => Err(Error::not_found(self.type_name(), name.as_str())),
        }
    }

    fn delete_attribute(&self, name: &Name) -> Result<(), Error> {
        match self.ty.lookup(name) {
            Some(Attribute::Member(member)) => member.delete(self),
            Some(Attribute::Alias(_)) => Err(Error::immutable(name, "cannot delete an alias")),
            None => Err(Error::not_found(self.type_name(), name.as_str())),
        }
    }

    fn observe_attribute(&self, name: &Name, observer: Observer) -> bool {
        self.observers.observe(name, observer);
        true
    }

    fn unobserve_attribute(&self, name: &Name, observer: &Observer) -> bool {
        self.observers.unobserve(name, observer)
    }
}

impl SlotStorage for Instance {
    fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    fn get_slot(&self, index: usize) -> Option<Value> {
        self.slots.borrow().get(index).cloned().flatten()
    }

    fn set_slot(&self, index: usize, value: Option<Value>) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    fn notifications_enabled(&self) -> bool {
        self.notifications.get()
    }

    fn has_observers(&self, name: &Name) -> bool {
        self.alias_hooks.has_observers(name) || self.observers.has_observers(name)
    }

    fn notify(&self, name: &Name, change: &ChangeRecord) -> Result<(), Error> {
        self.alias_hooks.notify(name, change)?;
        self.observers.notify(name, change)
    }

    fn alias_guard(&self) -> bool {
        self.alias_guard.get()
    }

    fn set_alias_guard(&self, active: bool) {
        self.alias_guard.set(active);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.ty.name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrkit_core::name;

    fn point() -> Rc<ObjectType> {
        ObjectTypeBuilder::new("Point")
            .member(Member::slot(name!("x")))
            .member(Member::slot(name!("y")))
            .alias(
                name!("horizontal"),
                AliasDescriptor::new(name!("x"), None, false),
            )
            .build()
    }

    #[test]
    fn builder_assigns_indices_in_order() {
        let ty = point();
        assert_eq!(ty.slot_count(), 2);
        let indices: Vec<usize> = ty.members().map(|m| m.index()).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(ty.alias(&name!("horizontal")).is_some());
        assert!(ty.member(&name!("horizontal")).is_none());
    }

    #[test]
    fn instances_start_empty() {
        let obj = Instance::new(&point());
        assert_eq!(obj.slot_count(), 2);
        assert_eq!(obj.get_slot(0), None);
        assert!(obj.notifications_enabled());
        assert!(!obj.alias_guard());
    }

    #[test]
    fn attribute_access_dispatches_to_members() {
        let obj = Instance::new(&point());
        obj.set_attribute(&name!("x"), Value::from(3)).unwrap();
        assert_eq!(obj.get_attribute(&name!("x")).unwrap(), Value::from(3));
        obj.delete_attribute(&name!("x")).unwrap();
        assert_eq!(obj.get_slot(0), None);
    }

    #[test]
    fn attribute_access_dispatches_to_aliases() {
        let obj = Instance::new(&point());
        obj.set_attribute(&name!("horizontal"), Value::from(9))
            .unwrap();
        assert_eq!(obj.get_slot(0), Some(Value::from(9)));
        assert_eq!(
            obj.get_attribute(&name!("horizontal")).unwrap(),
            Value::from(9)
        );
        assert!(obj
            .delete_attribute(&name!("horizontal"))
            .unwrap_err()
            .is_immutable());
    }

    #[test]
    fn unknown_attribute_is_not_found() {
        let obj = Instance::new(&point());
        let err = obj.get_attribute(&name!("z")).unwrap_err();
        assert_eq!(format!("{}", err), "'Point' object has no attribute 'z'");
        assert!(obj.set_attribute(&name!("z"), Value::Null).is_err());
        assert!(obj.delete_attribute(&name!("z")).is_err());
    }

    #[test]
    fn type_level_alias_access() {
        let ty = point();
        match ty.get_alias(&name!("horizontal")).unwrap() {
            AliasRead::Descriptor(d) => assert_eq!(d.name(), &name!("x")),
            AliasRead::Value(_) => panic!("expected descriptor"),
        }
        assert!(ty.get_alias(&name!("x")).is_err());
    }

    #[test]
    fn set_slot_past_end_is_ignored() {
        let obj = Instance::new(&point());
        obj.set_slot(10, Some(Value::from(1)));
        assert_eq!(obj.get_slot(10), None);
        assert_eq!(obj.slot_count(), 2);
    }

    #[test]
    fn notification_toggle_returns_previous() {
        let obj = Instance::new(&point());
        assert!(obj.set_notifications_enabled(false));
        assert!(!obj.notifications_enabled());
        assert!(!obj.set_notifications_enabled(true));
    }

    #[test]
    fn object_ref_identity() {
        let ty = point();
        let a = Instance::new(&ty);
        let b = Instance::new(&ty);
        assert_eq!(a.to_ref(), a.to_ref());
        assert_ne!(a.to_ref(), b.to_ref());
        assert_eq!(Value::from(a.to_ref()).as_object().unwrap().object_id(), a.id());
    }
}
