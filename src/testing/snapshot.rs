//! Snapshot rendering helpers.
//!
//! [`describe`] turns a value graph into a compact single-line string
//! suitable for snapshot assertions. Virtual slots and other handles are
//! prefixed with `~`, so a snapshot shows both the data and which members
//! are virtualized.

use crate::value::key::is_identifier;
use crate::value::{format_number, Key, Value};

/// Nesting beyond this prints as `…`.
const MAX_DESCRIBE_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Describe a value graph on one line.
///
/// ```ignore
/// let graph = virtualize(&record, true)?;
/// assert_eq!(describe(&graph), "~{color: \"red\", hover: ~fn}");
/// ```
///
/// A container that contains itself prints as `<cycle>` the second time it
/// is reached.
pub fn describe(value: &Value) -> String {
    let mut out = String::new();
    let mut ancestors = Vec::new();
    write_value(&mut out, value, &mut ancestors);
    out
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn write_value(out: &mut String, value: &Value, ancestors: &mut Vec<Value>) {
    if ancestors.len() >= MAX_DESCRIBE_DEPTH {
        out.push('…');
        return;
    }
    match value {
        Value::Undefined => out.push_str("undefined"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::BigInt(n) => out.push_str(&format!("{n}n")),
        Value::Str(s) => out.push_str(&format!("{s:?}")),
        Value::Symbol(s) => out.push_str(&format!("@{}", s.description())),
        Value::Callable(c) => match c.name() {
            Some(name) => out.push_str(&format!("fn {name}")),
            None => out.push_str("fn"),
        },
        Value::Handle(h) => {
            out.push('~');
            write_value(out, &h.get(), ancestors);
        }
        Value::Record(_) | Value::Sequence(_) => {
            if ancestors.contains(value) {
                out.push_str("<cycle>");
                return;
            }
            ancestors.push(value.clone());
            write_container(out, value, ancestors);
            ancestors.pop();
        }
    }
}

fn write_container(out: &mut String, value: &Value, ancestors: &mut Vec<Value>) {
    let (open, close, members): (&str, &str, Vec<(Option<Key>, Value)>) = match value {
        Value::Record(record) => {
            if !record.is_plain() {
                out.push('^');
            }
            let members = record
                .keys()
                .into_iter()
                .map(|key| {
                    let member = record.get(&key);
                    (Some(key), member)
                })
                .collect();
            ("{", "}", members)
        }
        Value::Sequence(sequence) => {
            let members = sequence.values().into_iter().map(|v| (None, v)).collect();
            ("[", "]", members)
        }
        _ => return,
    };

    out.push_str(open);
    for (i, (key, member)) in members.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if let Some(key) = key {
            let name = key.to_name();
            if is_identifier(&name) {
                out.push_str(&name);
            } else {
                out.push_str(&format!("{name:?}"));
            }
            out.push_str(": ");
        }
        write_value(out, member, ancestors);
    }
    out.push_str(close);
}

// ===========================================================================
// Tests
// ===========================================================================
