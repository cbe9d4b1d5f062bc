//! Errors from value operations and virtualization.

use std::fmt;

use crate::value::{Key, Path, PathError};

/// The operation that failed, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Has,
    Delete,
    OwnKeys,
    GetPrototype,
    IsExtensible,
    PreventExtensions,
    Call,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Get => "read a property of",
            Self::Set => "write a property of",
            Self::Has => "check a property of",
            Self::Delete => "delete a property of",
            Self::OwnKeys => "enumerate the keys of",
            Self::GetPrototype => "get the prototype of",
            Self::IsExtensible => "query the extensibility of",
            Self::PreventExtensions => "prevent extensions of",
            Self::Call => "call",
        };
        f.write_str(verb)
    }
}

/// Errors from value operations, handle delegation and virtualization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VirtualError {
    /// The value (or the handle's current target) is null or undefined.
    /// Raised uniformly by every delegated operation.
    #[error("cannot {operation} {kind}")]
    Empty {
        operation: Operation,
        kind: &'static str,
    },
    #[error("cannot {operation} a {kind}: not a record or sequence")]
    NotAContainer {
        operation: Operation,
        kind: &'static str,
    },
    #[error("value of type {kind} is not callable")]
    NotCallable { kind: &'static str },
    #[error("cannot add property `{key}`: object is not extensible")]
    NotExtensible { key: Key },
    #[error("`{key}` is not a valid sequence index")]
    InvalidKey { key: Key },
    /// The walk went deeper than the configured limit, which in practice
    /// means the graph references one of its own ancestors.
    #[error("virtualization depth {max} exceeded at `{path}`")]
    DepthExceeded { path: Path, max: usize },
    #[error(transparent)]
    Path(#[from] PathError),
}
