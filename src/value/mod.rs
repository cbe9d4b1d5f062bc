//! Dynamic value model: the datums the virtualization layer wraps.
//!
//! - [`Value`] — tagged variant over scalars, records, sequences, callables
//!   and handles.
//! - [`Kind`] — classification of the *unwrapped* value, decided once and
//!   matched at every decision branch.
//! - [`Key`] / [`Path`] — property addressing, with a textual form parsed by
//!   [`parse_path`].

pub mod callable;
pub mod container;
pub mod key;
pub mod path;

use std::fmt;
use std::rc::Rc;

pub use callable::{Callable, NativeFn};
pub use container::{Record, Sequence};
pub use key::{Key, Path};
pub use path::{parse_path, PathError};

use crate::error::{Operation, VirtualError};
use crate::proxy::Handle;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A unique symbol. Two symbols are equal only if they are the same symbol,
/// regardless of description.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    /// Create a fresh symbol.
    pub fn new(description: impl AsRef<str>) -> Self {
        Self(Rc::from(description.as_ref()))
    }

    /// The description given at creation.
    pub fn description(&self) -> &str {
        &self.0
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// What a value currently is, after peeling indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Null,
    /// Bool, number, bigint, string or symbol.
    Scalar,
    Callable,
    Record,
    Sequence,
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Any datum the layer can hold.
///
/// Records, sequences, callables, symbols and handles are reference types:
/// cloning shares identity, and equality (`==`) compares identity. Scalars
/// compare by value, with `NaN != NaN`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    Str(Rc<str>),
    Symbol(Symbol),
    Callable(Callable),
    Record(Record),
    Sequence(Sequence),
    Handle(Handle),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(s.as_ref()))
    }

    /// Kind of the unwrapped value.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Undefined => Kind::Undefined,
            Self::Null => Kind::Null,
            Self::Bool(_) | Self::Number(_) | Self::BigInt(_) | Self::Str(_) | Self::Symbol(_) => {
                Kind::Scalar
            }
            Self::Callable(_) => Kind::Callable,
            Self::Record(_) => Kind::Record,
            Self::Sequence(_) => Kind::Sequence,
            // A handle target is never itself a handle.
            Self::Handle(handle) => handle.get().kind(),
        }
    }

    /// Name of this value's own variant (handles report `"handle"`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Callable(_) => "function",
            Self::Record(_) => "record",
            Self::Sequence(_) => "sequence",
            Self::Handle(_) => "handle",
        }
    }

    /// Scalars cannot be virtualized.
    pub fn is_scalar(&self) -> bool {
        self.kind() == Kind::Scalar
    }

    /// Everything that is not a scalar, including null and undefined.
    pub fn is_virtualizable(&self) -> bool {
        !self.is_scalar()
    }

    /// Null or undefined.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind(), Kind::Null | Kind::Undefined)
    }

    /// Plain records and sequences: the kinds whose own properties are
    /// virtualized one by one.
    pub fn is_recursible(&self) -> bool {
        match self {
            Self::Record(record) => record.is_plain(),
            Self::Sequence(_) => true,
            Self::Handle(handle) => handle.get().is_recursible(),
            _ => false,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Self::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Loose equality: null and undefined equal each other, mixed scalars
    /// are compared numerically, references by identity.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), Number(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (BigInt(a), BigInt(b)) => a == b,
            (Number(n), Str(s)) | (Str(s), Number(n)) => string_to_number(s) == *n,
            (BigInt(b), Number(n)) | (Number(n), BigInt(b)) => *b as f64 == *n,
            (BigInt(b), Str(s)) | (Str(s), BigInt(b)) => {
                s.trim().parse::<i128>().is_ok_and(|parsed| parsed == *b)
            }
            (Bool(b), other) | (other, Bool(b)) => {
                Number(if *b { 1.0 } else { 0.0 }).loosely_equals(other)
            }
            _ => self == other,
        }
    }

    fn empty_error(&self, operation: Operation) -> VirtualError {
        VirtualError::Empty {
            operation,
            kind: self.type_name(),
        }
    }

    fn not_a_container(&self, operation: Operation) -> VirtualError {
        VirtualError::NotAContainer {
            operation,
            kind: self.type_name(),
        }
    }

    // -- property operations ------------------------------------------------
    //
    // Handles forward to their target; everything else behaves like an
    // ordinary value. Null and undefined fail every operation.

    /// Read a property. Absent properties read as `undefined`; a virtual
    /// slot reads as its slot proxy.
    pub fn get(&self, key: impl Into<Key>) -> Result<Value, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::Get)),
            Self::Handle(handle) => handle.get_property(key),
            Self::Record(record) => Ok(record.get(key)),
            Self::Sequence(sequence) => Ok(sequence.get(key)),
            _ => Ok(Value::Undefined),
        }
    }

    /// Write a property. Writing a virtual slot runs its update protocol.
    pub fn set(&self, key: impl Into<Key>, value: Value) -> Result<(), VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::Set)),
            Self::Handle(handle) => handle.set_property(key, value),
            Self::Record(record) => record.set(key, value),
            Self::Sequence(sequence) => sequence.set(key, value),
            _ => Err(self.not_a_container(Operation::Set)),
        }
    }

    /// Own-property existence check.
    pub fn has(&self, key: impl Into<Key>) -> Result<bool, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::Has)),
            Self::Handle(handle) => handle.has_property(key),
            Self::Record(record) => Ok(record.contains_key(key)),
            Self::Sequence(sequence) => Ok(sequence.contains_key(key)),
            Self::Callable(_) => Ok(false),
            _ => Err(self.not_a_container(Operation::Has)),
        }
    }

    /// Remove an own property. Returns whether the property is gone.
    pub fn delete(&self, key: impl Into<Key>) -> Result<bool, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::Delete)),
            Self::Handle(handle) => handle.delete_property(key),
            Self::Record(record) => Ok(record.delete(key)),
            Self::Sequence(sequence) => Ok(sequence.delete(key)),
            _ => Ok(true),
        }
    }

    /// Own enumerable keys in order.
    pub fn own_keys(&self) -> Result<Vec<Key>, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::OwnKeys)),
            Self::Handle(handle) => handle.own_keys(),
            Self::Record(record) => Ok(record.keys()),
            Self::Sequence(sequence) => Ok(sequence.keys()),
            _ => Ok(Vec::new()),
        }
    }

    /// The prototype record, if any.
    pub fn prototype(&self) -> Result<Option<Record>, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::GetPrototype)),
            Self::Handle(handle) => handle.prototype(),
            Self::Record(record) => Ok(record.prototype()),
            _ => Ok(None),
        }
    }

    /// Whether new properties may be added.
    pub fn is_extensible(&self) -> Result<bool, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::IsExtensible)),
            Self::Handle(handle) => handle.is_extensible(),
            Self::Record(record) => Ok(record.is_extensible()),
            Self::Sequence(sequence) => Ok(sequence.is_extensible()),
            _ => Ok(false),
        }
    }

    /// Forbid adding new properties.
    pub fn prevent_extensions(&self) -> Result<(), VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::PreventExtensions)),
            Self::Handle(handle) => handle.prevent_extensions(),
            Self::Record(record) => {
                record.prevent_extensions();
                Ok(())
            }
            Self::Sequence(sequence) => {
                sequence.prevent_extensions();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Follow `path` one `get` at a time. The root path yields `self`.
    pub fn lookup(&self, path: &Path) -> Result<Value, VirtualError> {
        path.keys()
            .iter()
            .try_fold(self.clone(), |current, key| current.get(key))
    }

    /// Invoke a callable.
    pub fn call(&self, args: &[Value]) -> Result<Value, VirtualError> {
        match self {
            Self::Undefined | Self::Null => Err(self.empty_error(Operation::Call)),
            Self::Handle(handle) => handle.call(args),
            Self::Callable(callable) => callable.call(args),
            _ => Err(VirtualError::NotCallable {
                kind: self.type_name(),
            }),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Format a number the way style values print: integers without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Strict equality: identity for references, value for scalars.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a.ptr_eq(b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Record(a), Self::Record(b)) => a.ptr_eq(b),
            (Self::Sequence(a), Self::Sequence(b)) => a.ptr_eq(b),
            (Self::Handle(a), Self::Handle(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "{s:?}"),
            Self::Callable(c) => write!(f, "{c:?}"),
            Self::Record(r) => write!(f, "{r:?}"),
            Self::Sequence(s) => write!(f, "{s:?}"),
            Self::Handle(h) => write!(f, "{h:?}"),
        }
    }
}

/// Short human-readable form used in log output.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Callable(c) => match c.name() {
                Some(name) => write!(f, "[function {name}]"),
                None => write!(f, "[function]"),
            },
            Self::Record(_) => write!(f, "[record]"),
            Self::Sequence(s) => write!(f, "[sequence; {}]", s.len()),
            Self::Handle(h) => write!(f, "~{}", h.get()),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Self::Sequence(s)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Self::Handle(h)
    }
}
