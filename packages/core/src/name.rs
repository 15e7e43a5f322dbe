//! Interned attribute names.
//!
//! Every attribute name in attrkit is interned: two `Name`s built from the
//! same text share one allocation, and equality is a pointer comparison.
//! Dispatch code relies on that identity to compare names without touching
//! their bytes.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer};

lazy_static! {
    static ref INTERNER: Mutex<HashSet<Arc<str>>> = Mutex::new(HashSet::new());
}

/// Errors related to name validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name is the empty string.
    Empty,
    /// The name is not a valid Unicode identifier.
    InvalidIdentifier { name: String, message: String },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::Empty => write!(f, "attribute name must not be empty"),
            NameError::InvalidIdentifier { name, message } => {
                write!(f, "invalid attribute name '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for NameError {}

/// An interned, validated attribute name.
///
/// Names must be Unicode identifiers (per UAX#31), optionally starting with
/// an underscore. The interner never releases an entry, so every distinct
/// name lives until the process exits.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
    /// Intern a name, validating it first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use attrkit_core::Name;
    ///
    /// let a = Name::new("width").unwrap();
    /// let b = Name::new("width").unwrap();
    /// assert!(a.same(&b));
    ///
    /// assert!(Name::new("not valid").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, NameError> {
        Self::validate(s)?;
        Ok(Self::intern(s))
    }

    fn intern(s: &str) -> Self {
        // A poisoned interner still holds a consistent set.
        let mut table = INTERNER.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = table.get(s) {
            return Name(Arc::clone(existing));
        }
        let interned: Arc<str> = Arc::from(s);
        table.insert(Arc::clone(&interned));
        Name(interned)
    }

    fn validate(s: &str) -> Result<(), NameError> {
        let mut chars = s.chars();
        let first = chars.next().ok_or(NameError::Empty)?;

        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .map_or(true, unicode_ident::is_xid_continue));

        if !valid_start {
            return Err(NameError::InvalidIdentifier {
                name: s.to_string(),
                message: "must start with a letter or underscore".to_string(),
            });
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(NameError::InvalidIdentifier {
                    name: s.to_string(),
                    message: format!("invalid character '{}' in identifier", c),
                });
            }
        }

        Ok(())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity comparison: true when both names share one interned allocation.
    pub fn same(&self, other: &Name) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Name::new(s)
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Name::new(&s)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro for interning a literal name.
///
/// # Example
///
/// ```rust
/// use attrkit_core::name;
///
/// let n = name!("height");
/// assert_eq!(n.as_str(), "height");
/// ```
#[macro_export]
macro_rules! name {
    ($s:expr) => {
        $crate::Name::new($s).expect("invalid name literal")
    };
}
