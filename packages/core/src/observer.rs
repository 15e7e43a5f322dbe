//! Observer lists.
//!
//! Two audiences receive change records: observers attached to a member
//! (they see the change on every object) and observers attached to one
//! object under an attribute name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{ChangeRecord, Error, Name};

/// A change callback.
pub type Observer = Rc<dyn Fn(&ChangeRecord) -> Result<(), Error>>;

/// Wrap a closure as an `Observer`.
pub fn observer<F>(f: F) -> Observer
where
    F: Fn(&ChangeRecord) -> Result<(), Error> + 'static,
{
    Rc::new(f)
}

/// An ordered list of observers.
///
/// Cloning copies the registrations; the observers themselves are shared.
#[derive(Default)]
pub struct ObserverList {
    observers: RefCell<Vec<Observer>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Observer) {
        self.observers.borrow_mut().push(observer);
    }

    /// Remove an observer by identity. Returns true if it was registered.
    pub fn remove(&self, observer: &Observer) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| !Rc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn clear(&self) {
        self.observers.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.observers.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Call every observer in registration order, stopping at the first failure.
    ///
    /// Observers run against a snapshot, so they may add or remove observers
    /// while being notified.
    pub fn notify(&self, change: &ChangeRecord) -> Result<(), Error> {
        let snapshot: Vec<Observer> = self.observers.borrow().clone();
        for observer in snapshot {
            observer(change)?;
        }
        Ok(())
    }
}

impl Clone for ObserverList {
    fn clone(&self) -> Self {
        Self {
            observers: RefCell::new(self.observers.borrow().clone()),
        }
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}

/// Observers keyed by attribute name, owned by one object.
#[derive(Default)]
pub struct ObserverRegistry {
    by_name: RefCell<HashMap<Name, Rc<ObserverList>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` under `name`.
    pub fn observe(&self, name: &Name, observer: Observer) {
        self.by_name
            .borrow_mut()
            .entry(name.clone())
            .or_default()
            .add(observer);
    }

    pub fn unobserve(&self, name: &Name, observer: &Observer) -> bool {
        match self.by_name.borrow().get(name) {
            Some(list) => list.remove(observer),
            None => false,
        }
    }

    pub fn unobserve_all(&self, name: &Name) {
        self.by_name.borrow_mut().remove(name);
    }

    pub fn has_observers(&self, name: &Name) -> bool {
        self.by_name
            .borrow()
            .get(name)
            .is_some_and(|list| !list.is_empty())
    }

    /// Deliver `change` to the observers under `name`.
    pub fn notify(&self, name: &Name, change: &ChangeRecord) -> Result<(), Error> {
        // Release the map borrow before calling out.
        let list = self.by_name.borrow().get(name).cloned();
        match list {
            Some(list) => list.notify(change),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("names", &self.by_name.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{name, ObjectId, Value};
    use std::cell::Cell;

    fn record() -> ChangeRecord {
        ChangeRecord::deleted(ObjectId::next(), &name!("x"), Value::from(1))
    }

    #[test]
    fn notifies_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list = ObserverList::new();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            list.add(observer(move |_| {
                log.borrow_mut().push(tag);
                Ok(())
            }));
        }

        list.notify(&record()).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn failure_stops_delivery() {
        let calls = Rc::new(Cell::new(0));
        let list = ObserverList::new();
        list.add(observer(|_| Err(Error::observer("boom"))));
        let counted = Rc::clone(&calls);
        list.add(observer(move |_| {
            counted.set(counted.get() + 1);
            Ok(())
        }));

        let err = list.notify(&record()).unwrap_err();
        assert!(format!("{}", err).contains("boom"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn cloned_list_is_independent() {
        let list = ObserverList::new();
        let ob = observer(|_| Ok(()));
        list.add(Rc::clone(&ob));

        let copy = list.clone();
        assert_eq!(copy.len(), 1);
        assert!(copy.remove(&ob));
        assert!(copy.is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_by_identity() {
        let list = ObserverList::new();
        let ob = observer(|_| Ok(()));
        list.add(Rc::clone(&ob));
        assert_eq!(list.len(), 1);
        assert!(list.remove(&ob));
        assert!(!list.remove(&ob));
        assert!(list.is_empty());
    }

    #[test]
    fn observer_may_register_during_notify() {
        let list = Rc::new(ObserverList::new());
        let inner = Rc::clone(&list);
        list.add(observer(move |_| {
            inner.add(observer(|_| Ok(())));
            Ok(())
        }));

        list.notify(&record()).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn registry_tracks_names() {
        let registry = ObserverRegistry::new();
        let x = name!("x");
        assert!(!registry.has_observers(&x));

        let ob = observer(|_| Ok(()));
        registry.observe(&x, Rc::clone(&ob));
        assert!(registry.has_observers(&x));
        assert!(!registry.has_observers(&name!("y")));

        assert!(registry.unobserve(&x, &ob));
        assert!(!registry.has_observers(&x));

        registry.observe(&x, ob);
        registry.unobserve_all(&x);
        assert!(!registry.has_observers(&x));
    }

    #[test]
    fn registry_notify_without_observers_is_ok() {
        let registry = ObserverRegistry::new();
        registry.notify(&name!("x"), &record()).unwrap();
    }
}
