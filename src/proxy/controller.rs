//! Controller: hooks observing structural changes inside a virtualized graph.

use crate::value::{Path, Value};

/// Caller-supplied hooks invoked synchronously by the virtualizer.
///
/// Every hook has a default, so implementors override only what they need.
/// Hooks take `&self`; controllers keep their state behind `Cell`/`RefCell`.
/// The virtualizer holds no borrow while a hook runs, so hooks may read or
/// write the graph.
pub trait Controller {
    /// Whether a non-recursible value at `path` gets its own slot proxy.
    /// Records and sequences are virtualized regardless.
    fn should_virtualize(&self, _value: &Value, _path: &Path) -> bool {
        true
    }

    /// A leaf (non-recursible, non-empty) value became live at `path`.
    fn on_add(&self, _value: &Value, _path: &Path) {}

    /// A live leaf at `path` was replaced or torn down.
    fn on_delete(&self, _value: &Value, _path: &Path) {}

    /// A virtual slot at `path` is being reassigned. Return `true` to claim
    /// the update; the slot is then left untouched.
    fn on_update(&self, _old: &Value, _new: &Value, _path: &Path) -> bool {
        false
    }
}

/// Controller with every hook at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopController;

impl Controller for NoopController {}
