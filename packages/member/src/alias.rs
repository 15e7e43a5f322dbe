//! Standalone alias descriptors.
//!
//! An `AliasDescriptor` lives on a type rather than in an object's slots. It
//! forwards reads and writes to `name` on the target object, or one level
//! deeper to `name.attr`, and needs no storage of its own.

use std::fmt;

use attrkit_core::{AttributeAccess, Error, Name, Value};
use serde::Deserialize;

use crate::guard::{AliasFlags, FlagTable, GuardScope};
use crate::member::sub_object;

const GET_CONTEXT: &str = "error while getting alias";
const SET_CONTEXT: &str = "error while setting alias";

/// One or two attribute hops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AliasHops {
    /// Forward to `target.name`.
    Single(Name),
    /// Forward to `target.name.attr`.
    Double(Name, Name),
}

impl AliasHops {
    pub fn new(name: Name, attr: Option<Name>) -> Self {
        match attr {
            Some(attr) => AliasHops::Double(name, attr),
            None => AliasHops::Single(name),
        }
    }

    pub fn name(&self) -> &Name {
        match self {
            AliasHops::Single(name) | AliasHops::Double(name, _) => name,
        }
    }

    pub fn attr(&self) -> Option<&Name> {
        match self {
            AliasHops::Single(_) => None,
            AliasHops::Double(_, attr) => Some(attr),
        }
    }
}

/// Construction parameters for an alias descriptor.
///
/// # Example
///
/// ```rust
/// use attrkit_member::AliasConfig;
///
/// let config = AliasConfig::from_json(r#"{"name": "size", "attr": "width"}"#).unwrap();
/// assert_eq!(config.name.as_str(), "size");
/// assert!(!config.observable);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AliasConfig {
    /// Attribute to forward to on the target object.
    pub name: Name,
    /// Optional second hop.
    #[serde(default)]
    pub attr: Option<Name>,
    #[serde(default)]
    pub observable: bool,
    #[serde(default)]
    pub guard_scope: GuardScope,
}

impl AliasConfig {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            attr: None,
            observable: false,
            guard_scope: GuardScope::default(),
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }
}

/// Result of reading an alias descriptor.
pub enum AliasRead<'a> {
    /// Accessed on the type itself: the descriptor, for introspection.
    Descriptor(&'a AliasDescriptor),
    /// Accessed on an instance: the forwarded value.
    Value(Value),
}

impl AliasRead<'_> {
    pub fn into_value(self) -> Option<Value> {
        match self {
            AliasRead::Value(value) => Some(value),
            AliasRead::Descriptor(_) => None,
        }
    }
}

/// A class-level forwarding descriptor.
///
/// One instance is shared by every object of the owning type. Its only
/// mutable state is the reentrancy markers, held for the duration of a single
/// get or set.
pub struct AliasDescriptor {
    hops: AliasHops,
    observable: bool,
    flags: FlagTable,
}

impl AliasDescriptor {
    pub fn new(name: Name, attr: Option<Name>, observable: bool) -> Self {
        Self::with_scope(name, attr, observable, GuardScope::default())
    }

    pub fn with_scope(name: Name, attr: Option<Name>, observable: bool, scope: GuardScope) -> Self {
        Self {
            hops: AliasHops::new(name, attr),
            observable,
            flags: FlagTable::new(scope),
        }
    }

    pub fn from_config(config: AliasConfig) -> Self {
        Self::with_scope(
            config.name,
            config.attr,
            config.observable,
            config.guard_scope,
        )
    }

    pub fn name(&self) -> &Name {
        self.hops.name()
    }

    pub fn attr(&self) -> Option<&Name> {
        self.hops.attr()
    }

    pub fn hops(&self) -> &AliasHops {
        &self.hops
    }

    /// Whether observing the alias should observe the target. Informational.
    pub fn observable(&self) -> bool {
        self.observable
    }

    pub fn guard_scope(&self) -> GuardScope {
        self.flags.scope()
    }

    /// Markers currently active for `target`.
    pub fn active_flags(&self, target: &dyn AttributeAccess) -> AliasFlags {
        self.flags.active(target.object_id())
    }

    /// Read through the alias.
    ///
    /// With no target (type-level access) this returns the descriptor itself.
    pub fn get(&self, target: Option<&dyn AttributeAccess>) -> Result<AliasRead<'_>, Error> {
        match target {
            None => Ok(AliasRead::Descriptor(self)),
            Some(target) => self.get_value(target).map(AliasRead::Value),
        }
    }

    /// Read `target.name`, or `target.name.attr` for a two-hop alias.
    pub fn get_value(&self, target: &dyn AttributeAccess) -> Result<Value, Error> {
        let _guard = self
            .flags
            .enter(target.object_id(), AliasFlags::GET_ACTIVE)
            .ok_or_else(|| self.recursion(target))?;
        let other = target
            .get_attribute(self.name())
            .map_err(|e| e.context(GET_CONTEXT))?;
        match self.attr() {
            None => Ok(other),
            Some(attr) => sub_object(&other, attr)
                .and_then(|obj| obj.get_attribute(attr))
                .map_err(|e| e.context(GET_CONTEXT)),
        }
    }

    /// Write `value` to `target.name`, or to `target.name.attr`.
    pub fn set(&self, target: &dyn AttributeAccess, value: Value) -> Result<(), Error> {
        let _guard = self
            .flags
            .enter(target.object_id(), AliasFlags::SET_ACTIVE)
            .ok_or_else(|| self.recursion(target))?;
        match self.attr() {
            None => target
                .set_attribute(self.name(), value)
                .map_err(|e| e.context(SET_CONTEXT)),
            Some(attr) => {
                let other = target
                    .get_attribute(self.name())
                    .map_err(|e| e.context(SET_CONTEXT))?;
                sub_object(&other, attr)
                    .and_then(|obj| obj.set_attribute(attr, value))
                    .map_err(|e| e.context(SET_CONTEXT))
            }
        }
    }

    fn recursion(&self, target: &dyn AttributeAccess) -> Error {
        log::debug!(
            "alias descriptor for '{}' re-entered on {}",
            self.name(),
            target.object_id()
        );
        Error::recursion("recursion detected")
    }
}

impl fmt::Debug for AliasDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasDescriptor")
            .field("name", self.name())
            .field("attr", &self.attr())
            .field("observable", &self.observable)
            .field("scope", &self.guard_scope())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrkit_core::name;

    #[test]
    fn hops_from_optional_attr() {
        assert_eq!(
            AliasHops::new(name!("a"), None),
            AliasHops::Single(name!("a"))
        );
        let double = AliasHops::new(name!("a"), Some(name!("b")));
        assert_eq!(double.name(), &name!("a"));
        assert_eq!(double.attr(), Some(&name!("b")));
    }

    #[test]
    fn defaults() {
        let alias = AliasDescriptor::new(name!("inner"), None, false);
        assert_eq!(alias.name(), &name!("inner"));
        assert_eq!(alias.attr(), None);
        assert!(!alias.observable());
        assert_eq!(alias.guard_scope(), GuardScope::PerTarget);
    }

    #[test]
    fn type_level_access_returns_descriptor() {
        let alias = AliasDescriptor::new(name!("inner"), Some(name!("x")), true);
        match alias.get(None).unwrap() {
            AliasRead::Descriptor(d) => {
                assert!(std::ptr::eq(d, &alias));
                assert!(d.observable());
            }
            AliasRead::Value(_) => panic!("expected the descriptor"),
        }
        assert!(alias.get(None).unwrap().into_value().is_none());
    }

    #[test]
    fn config_parses_all_fields() {
        let config = AliasConfig::from_json(
            r#"{"name": "size", "attr": "w", "observable": true, "guard_scope": "per_descriptor"}"#,
        )
        .unwrap();
        assert_eq!(config.attr, Some(name!("w")));
        assert!(config.observable);

        let alias = AliasDescriptor::from_config(config);
        assert_eq!(alias.guard_scope(), GuardScope::PerDescriptor);
        assert_eq!(alias.attr(), Some(&name!("w")));
    }

    #[test]
    fn config_requires_valid_name() {
        assert!(matches!(
            AliasConfig::from_json(r#"{"attr": "w"}"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            AliasConfig::from_json(r#"{"name": ""}"#),
            Err(Error::Config { .. })
        ));
        assert!(AliasConfig::from_json(r#"{"name": "ok", "attr": null}"#).is_ok());
    }

    #[test]
    fn config_new_matches_defaults() {
        let parsed = AliasConfig::from_json(r#"{"name": "size"}"#).unwrap();
        assert_eq!(parsed, AliasConfig::new(name!("size")));
    }
}
