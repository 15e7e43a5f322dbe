//! Change records delivered to observers.

use crate::{Name, ObjectId, Value};

/// What kind of mutation a record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Event,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Created => "create",
            ChangeKind::Updated => "update",
            ChangeKind::Deleted => "delete",
            ChangeKind::Event => "event",
        }
    }
}

/// The payload of a change.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// A slot went from empty to `value`.
    Created { value: Value },
    /// A slot went from `old` to `new`.
    Updated { old: Value, new: Value },
    /// A populated slot was cleared.
    Deleted { old: Value },
    /// An event fired with `value`; nothing was stored.
    Event { value: Value },
}

/// An immutable description of a completed mutation.
///
/// One record is built per mutation and the same instance is handed to every
/// observer that receives it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    object: ObjectId,
    name: Name,
    change: Change,
}

impl ChangeRecord {
    pub fn new(object: ObjectId, name: Name, change: Change) -> Self {
        Self {
            object,
            name,
            change,
        }
    }

    /// Record for a deletion, carrying the value that was removed.
    pub fn deleted(object: ObjectId, name: &Name, old: Value) -> Self {
        Self::new(object, name.clone(), Change::Deleted { old })
    }

    pub fn created(object: ObjectId, name: &Name, value: Value) -> Self {
        Self::new(object, name.clone(), Change::Created { value })
    }

    pub fn updated(object: ObjectId, name: &Name, old: Value, new: Value) -> Self {
        Self::new(object, name.clone(), Change::Updated { old, new })
    }

    pub fn event(object: ObjectId, name: &Name, value: Value) -> Self {
        Self::new(object, name.clone(), Change::Event { value })
    }

    /// The object that changed.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// The name of the member that changed.
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn change(&self) -> &Change {
        &self.change
    }

    pub fn kind(&self) -> ChangeKind {
        match self.change {
            Change::Created { .. } => ChangeKind::Created,
            Change::Updated { .. } => ChangeKind::Updated,
            Change::Deleted { .. } => ChangeKind::Deleted,
            Change::Event { .. } => ChangeKind::Event,
        }
    }

    /// The value before the change, for updates and deletions.
    pub fn old_value(&self) -> Option<&Value> {
        match &self.change {
            Change::Updated { old, .. } | Change::Deleted { old } => Some(old),
            _ => None,
        }
    }

    /// The value after the change, for creations, updates and events.
    pub fn new_value(&self) -> Option<&Value> {
        match &self.change {
            Change::Created { value } | Change::Event { value } => Some(value),
            Change::Updated { new, .. } => Some(new),
            Change::Deleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;

    #[test]
    fn deleted_record_carries_old_value() {
        let id = ObjectId::next();
        let record = ChangeRecord::deleted(id, &name!("x"), Value::from(42));
        assert_eq!(record.kind(), ChangeKind::Deleted);
        assert_eq!(record.object(), id);
        assert_eq!(record.name(), &name!("x"));
        assert_eq!(record.old_value(), Some(&Value::from(42)));
        assert_eq!(record.new_value(), None);
    }

    #[test]
    fn updated_record_has_both_values() {
        let record =
            ChangeRecord::updated(ObjectId::next(), &name!("y"), Value::from(1), Value::from(2));
        assert_eq!(record.kind(), ChangeKind::Updated);
        assert_eq!(record.old_value(), Some(&Value::from(1)));
        assert_eq!(record.new_value(), Some(&Value::from(2)));
    }

    #[test]
    fn kind_strings() {
        assert_eq!(ChangeKind::Created.as_str(), "create");
        assert_eq!(ChangeKind::Deleted.as_str(), "delete");
    }
}
