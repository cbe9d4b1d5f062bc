//! Peel indirection, push new targets into handles, and classify values by
//! what they currently target.
//!
//! Every predicate except [`is_handle`] looks through handles, so it reports
//! the kind of the value at the end of the chain regardless of wrap depth.

use crate::value::{Kind, Value};

/// Follow handles to the concrete value. Idempotent.
pub fn unwrap(value: &Value) -> Value {
    let mut current = value.clone();
    while let Value::Handle(handle) = &current {
        let next = handle.get();
        current = next;
    }
    current
}

/// If `handle` is a handle and `value` unwraps to something virtualizable,
/// make that its new target. The new value's own properties are not
/// virtualized. No-op otherwise.
pub fn rebind(handle: &Value, value: &Value) {
    let Value::Handle(handle) = handle else {
        return;
    };
    let value = unwrap(value);
    if value.is_virtualizable() {
        handle.set(value);
    }
}

/// The value itself (not its target) is a handle.
pub fn is_handle(value: &Value) -> bool {
    matches!(value, Value::Handle(_))
}

pub fn is_undefined_value(value: &Value) -> bool {
    value.kind() == Kind::Undefined
}

pub fn is_null_value(value: &Value) -> bool {
    value.kind() == Kind::Null
}

/// Null or undefined.
pub fn is_empty_value(value: &Value) -> bool {
    value.is_empty()
}

/// A record, a sequence, or null.
pub fn is_record_or_null(value: &Value) -> bool {
    matches!(value.kind(), Kind::Null | Kind::Record | Kind::Sequence)
}

/// A record or a sequence (callables excluded).
pub fn is_record(value: &Value) -> bool {
    matches!(value.kind(), Kind::Record | Kind::Sequence)
}

/// A record with no prototype.
pub fn is_plain_record(value: &Value) -> bool {
    match unwrap(value) {
        Value::Record(record) => record.is_plain(),
        _ => false,
    }
}

pub fn is_sequence(value: &Value) -> bool {
    value.kind() == Kind::Sequence
}

pub fn is_callable(value: &Value) -> bool {
    value.kind() == Kind::Callable
}
