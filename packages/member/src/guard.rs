//! Reentrancy guards.
//!
//! Both guards mark an operation as in progress for as long as they live and
//! clear, on drop, only the markers they set themselves. A marker found
//! already set belongs to an outer call and survives the inner guard.
//!
//! The markers live on long-lived shared values (members, objects,
//! descriptors) in `Cell`/`RefCell`s, so none of this is `Sync`.

use std::cell::RefCell;
use std::collections::HashMap;

use attrkit_core::{Error, ObjectId, SlotStorage};
use serde::Deserialize;

use crate::Member;

/// Pair-scoped guard over a (member, object) pair, used by alias modes.
pub struct AliasGuard<'a> {
    member: &'a Member,
    object: &'a dyn SlotStorage,
    owns_member: bool,
    owns_object: bool,
}

impl<'a> AliasGuard<'a> {
    /// True when both the member and the object already carry an active
    /// marker, i.e. this exact pair is being resolved further up the stack.
    pub fn guarded(member: &Member, object: &dyn SlotStorage) -> bool {
        member.alias_guard() && object.alias_guard()
    }

    /// Mark whichever participants are not already marked.
    pub fn new(member: &'a Member, object: &'a dyn SlotStorage) -> Self {
        let owns_member = !member.alias_guard();
        if owns_member {
            member.set_alias_guard(true);
        }
        let owns_object = !object.alias_guard();
        if owns_object {
            object.set_alias_guard(true);
        }
        Self {
            member,
            object,
            owns_member,
            owns_object,
        }
    }

    /// Check for recursion, then acquire.
    pub fn acquire(member: &'a Member, object: &'a dyn SlotStorage) -> Result<Self, Error> {
        if Self::guarded(member, object) {
            log::debug!(
                "alias recursion detected on '{}' of {}",
                member.name(),
                object.object_id()
            );
            return Err(Error::recursion("alias recursion detected"));
        }
        Ok(Self::new(member, object))
    }

    /// Whether this guard set the member's marker.
    pub fn owns_member(&self) -> bool {
        self.owns_member
    }

    /// Whether this guard set the object's marker.
    pub fn owns_object(&self) -> bool {
        self.owns_object
    }
}

impl Drop for AliasGuard<'_> {
    fn drop(&mut self) {
        if self.owns_member {
            self.member.set_alias_guard(false);
        }
        if self.owns_object {
            self.object.set_alias_guard(false);
        }
    }
}

bitflags::bitflags! {
    /// Reentrancy markers of an alias descriptor.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AliasFlags: u8 {
        /// A read through the descriptor is in progress.
        const GET_ACTIVE = 0x1;
        /// A write through the descriptor is in progress.
        const SET_ACTIVE = 0x2;
    }
}

/// What an alias descriptor's reentrancy markers are keyed by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardScope {
    /// One set of markers per target object. Unrelated objects resolving the
    /// same descriptor in nested calls do not trip each other.
    #[default]
    PerTarget,
    /// One set of markers for the whole descriptor, shared by every target.
    PerDescriptor,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
enum GuardKey {
    Descriptor,
    Target(ObjectId),
}

/// Self-scoped reentrancy markers owned by a descriptor.
#[derive(Debug, Default)]
pub struct FlagTable {
    scope: GuardScope,
    flags: RefCell<HashMap<GuardKey, AliasFlags>>,
}

impl FlagTable {
    /// An empty table keyed according to `scope`.
    pub fn new(scope: GuardScope) -> Self {
        Self {
            scope,
            flags: RefCell::new(HashMap::new()),
        }
    }

    /// How markers are keyed.
    pub fn scope(&self) -> GuardScope {
        self.scope
    }

    fn key(&self, target: ObjectId) -> GuardKey {
        match self.scope {
            GuardScope::PerTarget => GuardKey::Target(target),
            GuardScope::PerDescriptor => GuardKey::Descriptor,
        }
    }

    /// Markers currently active for `target`.
    pub fn active(&self, target: ObjectId) -> AliasFlags {
        self.flags
            .borrow()
            .get(&self.key(target))
            .copied()
            .unwrap_or_default()
    }

    /// Set `flag` for `target` for the lifetime of the returned guard.
    ///
    /// Returns `None` if the flag is already set.
    pub fn enter(&self, target: ObjectId, flag: AliasFlags) -> Option<FlagGuard<'_>> {
        let key = self.key(target);
        let mut flags = self.flags.borrow_mut();
        let entry = flags.entry(key).or_default();
        if entry.contains(flag) {
            return None;
        }
        entry.insert(flag);
        Some(FlagGuard {
            table: self,
            key,
            flag,
        })
    }
}

/// Clears one descriptor marker on drop, removing the entry once empty.
pub struct FlagGuard<'a> {
    table: &'a FlagTable,
    key: GuardKey,
    flag: AliasFlags,
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let mut flags = self.table.flags.borrow_mut();
        if let Some(entry) = flags.get_mut(&self.key) {
            entry.remove(self.flag);
            if entry.is_empty() {
                flags.remove(&self.key);
            }
        }
    }
}
