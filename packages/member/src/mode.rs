//! Behavior modes for get, set and delete.
//!
//! Each operation of a member is tagged independently with one of eight
//! behaviors. The tag carries its own context, so an `Alias` delete always
//! has its pair of names and a `Delegate` always has its target member.

use std::fmt;
use std::rc::Rc;

use attrkit_core::{Error, Name, Value};

use crate::Member;

/// The eight behaviors, in handler-table order.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum ModeKind {
    NoOp = 0,
    Slot = 1,
    Constant = 2,
    ReadOnly = 3,
    Event = 4,
    Signal = 5,
    Delegate = 6,
    Alias = 7,
}

impl ModeKind {
    pub const ALL: [ModeKind; 8] = [
        ModeKind::NoOp,
        ModeKind::Slot,
        ModeKind::Constant,
        ModeKind::ReadOnly,
        ModeKind::Event,
        ModeKind::Signal,
        ModeKind::Delegate,
        ModeKind::Alias,
    ];

    /// Position in [`ModeKind::ALL`].
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up a mode by ordinal. Ordinals past the table behave as `NoOp`.
    pub fn from_ordinal(ordinal: u8) -> ModeKind {
        match Self::ALL.get(ordinal as usize) {
            Some(kind) => *kind,
            None => {
                log::warn!("unknown mode ordinal {}, using NoOp", ordinal);
                ModeKind::NoOp
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModeKind::NoOp => "NoOp",
            ModeKind::Slot => "Slot",
            ModeKind::Constant => "Constant",
            ModeKind::ReadOnly => "ReadOnly",
            ModeKind::Event => "Event",
            ModeKind::Signal => "Signal",
            ModeKind::Delegate => "Delegate",
            ModeKind::Alias => "Alias",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-hop redirection used by `Alias` modes: read `target` on the object,
/// then access `attr` on the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasTarget {
    target: Name,
    attr: Name,
}

impl AliasTarget {
    /// Redirect through `target`, then to `attr`.
    pub fn new(target: Name, attr: Name) -> Self {
        Self { target, attr }
    }

    /// Attribute on the owning object that holds the sub-object.
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Attribute of interest on the sub-object.
    pub fn attr(&self) -> &Name {
        &self.attr
    }
}

/// Untyped mode context, as supplied when a mode is configured by ordinal.
pub enum ModeContext {
    /// No context, for modes that take none.
    None,
    /// The value of a `Constant` read.
    Value(Value),
    /// The target of a `Delegate`.
    Member(Rc<Member>),
    /// `[target, attr]` for an `Alias`.
    Names(Vec<String>),
}

impl ModeContext {
    fn into_member(self, mode: ModeKind) -> Result<Rc<Member>, Error> {
        match self {
            ModeContext::Member(member) => Ok(member),
            _ => Err(Error::InvalidContext {
                mode: mode.as_str(),
                expected: "a member",
            }),
        }
    }

    fn into_value(self, mode: ModeKind) -> Result<Value, Error> {
        match self {
            ModeContext::Value(value) => Ok(value),
            _ => Err(Error::InvalidContext {
                mode: mode.as_str(),
                expected: "a value",
            }),
        }
    }

    fn into_alias_target(self, mode: ModeKind) -> Result<AliasTarget, Error> {
        let invalid = || Error::InvalidContext {
            mode: mode.as_str(),
            expected: "a pair of attribute names",
        };
        match self {
            ModeContext::Names(names) if names.len() == 2 => {
                let target = Name::new(&names[0]).map_err(|_| invalid())?;
                let attr = Name::new(&names[1]).map_err(|_| invalid())?;
                Ok(AliasTarget::new(target, attr))
            }
            _ => Err(invalid()),
        }
    }
}

/// Read behavior.
#[derive(Clone, Debug)]
pub enum GetAttr {
    NoOp,
    Slot,
    Constant(Value),
    ReadOnly,
    Event,
    Signal,
    Delegate(Rc<Member>),
    Alias(AliasTarget),
}

/// Write behavior.
#[derive(Clone, Debug)]
pub enum SetAttr {
    NoOp,
    Slot,
    Constant,
    ReadOnly,
    Event,
    Signal,
    Delegate(Rc<Member>),
    Alias(AliasTarget),
}

/// Delete behavior.
#[derive(Clone, Debug)]
pub enum DelAttr {
    NoOp,
    Slot,
    Constant,
    ReadOnly,
    Event,
    Signal,
    Delegate(Rc<Member>),
    Alias(AliasTarget),
}

impl GetAttr {
    /// The ordinal tag of this mode.
    pub fn kind(&self) -> ModeKind {
        match self {
            GetAttr::NoOp => ModeKind::NoOp,
            GetAttr::Slot => ModeKind::Slot,
            GetAttr::Constant(_) => ModeKind::Constant,
            GetAttr::ReadOnly => ModeKind::ReadOnly,
            GetAttr::Event => ModeKind::Event,
            GetAttr::Signal => ModeKind::Signal,
            GetAttr::Delegate(_) => ModeKind::Delegate,
            GetAttr::Alias(_) => ModeKind::Alias,
        }
    }

    /// Build a read mode from a kind and an untyped context, validating the
    /// context's shape.
    pub fn from_parts(kind: ModeKind, context: ModeContext) -> Result<Self, Error> {
        Ok(match kind {
            ModeKind::NoOp => GetAttr::NoOp,
            ModeKind::Slot => GetAttr::Slot,
            ModeKind::Constant => GetAttr::Constant(context.into_value(kind)?),
            ModeKind::ReadOnly => GetAttr::ReadOnly,
            ModeKind::Event => GetAttr::Event,
            ModeKind::Signal => GetAttr::Signal,
            ModeKind::Delegate => GetAttr::Delegate(context.into_member(kind)?),
            ModeKind::Alias => GetAttr::Alias(context.into_alias_target(kind)?),
        })
    }
}

impl SetAttr {
    /// The ordinal tag of this mode.
    pub fn kind(&self) -> ModeKind {
        match self {
            SetAttr::NoOp => ModeKind::NoOp,
            SetAttr::Slot => ModeKind::Slot,
            SetAttr::Constant => ModeKind::Constant,
            SetAttr::ReadOnly => ModeKind::ReadOnly,
            SetAttr::Event => ModeKind::Event,
            SetAttr::Signal => ModeKind::Signal,
            SetAttr::Delegate(_) => ModeKind::Delegate,
            SetAttr::Alias(_) => ModeKind::Alias,
        }
    }

    /// Build a write mode from a kind and an untyped context.
    pub fn from_parts(kind: ModeKind, context: ModeContext) -> Result<Self, Error> {
        Ok(match kind {
            ModeKind::NoOp => SetAttr::NoOp,
            ModeKind::Slot => SetAttr::Slot,
            ModeKind::Constant => SetAttr::Constant,
            ModeKind::ReadOnly => SetAttr::ReadOnly,
            ModeKind::Event => SetAttr::Event,
            ModeKind::Signal => SetAttr::Signal,
            ModeKind::Delegate => SetAttr::Delegate(context.into_member(kind)?),
            ModeKind::Alias => SetAttr::Alias(context.into_alias_target(kind)?),
        })
    }
}

impl DelAttr {
    /// The ordinal tag of this mode.
    pub fn kind(&self) -> ModeKind {
        match self {
            DelAttr::NoOp => ModeKind::NoOp,
            DelAttr::Slot => ModeKind::Slot,
            DelAttr::Constant => ModeKind::Constant,
            DelAttr::ReadOnly => ModeKind::ReadOnly,
            DelAttr::Event => ModeKind::Event,
            DelAttr::Signal => ModeKind::Signal,
            DelAttr::Delegate(_) => ModeKind::Delegate,
            DelAttr::Alias(_) => ModeKind::Alias,
        }
    }

    /// Build a delete mode from a kind and an untyped context.
    ///
    /// `Alias` requires exactly two valid attribute names and `Delegate`
    /// requires a member; this is the only place those shapes are checked.
    pub fn from_parts(kind: ModeKind, context: ModeContext) -> Result<Self, Error> {
        Ok(match kind {
            ModeKind::NoOp => DelAttr::NoOp,
            ModeKind::Slot => DelAttr::Slot,
            ModeKind::Constant => DelAttr::Constant,
            ModeKind::ReadOnly => DelAttr::ReadOnly,
            ModeKind::Event => DelAttr::Event,
            ModeKind::Signal => DelAttr::Signal,
            ModeKind::Delegate => DelAttr::Delegate(context.into_member(kind)?),
            ModeKind::Alias => DelAttr::Alias(context.into_alias_target(kind)?),
        })
    }
}
