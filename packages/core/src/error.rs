//! Error types for attribute access.

use crate::name::{Name, NameError};

/// Errors raised while reading, writing or deleting attributes.
///
/// Handlers never swallow errors: every failure surfaces at the call site
/// that started the access. Side effects that already happened (a cleared
/// slot, a notification already delivered) are not rolled back.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The attribute's mode forbids the operation.
    #[error("'{name}': {message}")]
    Immutable { name: Name, message: String },

    /// A reentrancy guard found the operation already in progress.
    #[error("{message}")]
    Recursion { message: String },

    /// The object has no such attribute, or the slot index is stale.
    #[error("'{object}' object has no attribute '{name}'")]
    AttributeNotFound { object: String, name: String },

    /// A collaborator failure wrapped with context.
    #[error("{context} - {source}")]
    Propagated {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// A mode was configured with a context of the wrong shape.
    #[error("invalid context for {mode} mode: expected {expected}")]
    InvalidContext {
        mode: &'static str,
        expected: &'static str,
    },

    /// An attribute name failed validation.
    #[error("name error: {0}")]
    Name(#[from] NameError),

    /// An observer callback failed.
    #[error("observer error: {message}")]
    Observer { message: String },

    /// Configuration could not be parsed.
    #[error("config error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create an immutability error for the named attribute.
    pub fn immutable(name: &Name, message: impl Into<String>) -> Self {
        Error::Immutable {
            name: name.clone(),
            message: message.into(),
        }
    }

    /// Create a recursion error.
    pub fn recursion(message: impl Into<String>) -> Self {
        Error::Recursion {
            message: message.into(),
        }
    }

    /// Create a missing-attribute error.
    pub fn not_found(object: impl Into<String>, name: impl Into<String>) -> Self {
        Error::AttributeNotFound {
            object: object.into(),
            name: name.into(),
        }
    }

    /// Create an observer failure.
    pub fn observer(message: impl Into<String>) -> Self {
        Error::Observer {
            message: message.into(),
        }
    }

    /// Wrap this error with a short context prefix.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Propagated {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any `Propagated` wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Propagated { source, .. } => source.root(),
            other => other,
        }
    }

    /// True if the root cause is a recursion error.
    pub fn is_recursion(&self) -> bool {
        matches!(self.root(), Error::Recursion { .. })
    }

    /// True if the root cause is an immutability error.
    pub fn is_immutable(&self) -> bool {
        matches!(self.root(), Error::Immutable { .. })
    }

    /// True if the root cause is a missing attribute.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::AttributeNotFound { .. })
    }
}
