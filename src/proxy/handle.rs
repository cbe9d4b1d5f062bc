//! Handle: an identity-stable façade over a mutable target.
//!
//! A [`Handle`] owns exactly one mutable field, its target. Cloning a handle
//! shares identity; retargeting never changes it. Every delegated operation
//! is forwarded to whatever the handle targets at the time of the call.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::unwrap::unwrap;
use crate::error::VirtualError;
use crate::value::{Key, Record, Value};

struct Indirection {
    /// Never a handle: every store unwraps first.
    target: RefCell<Value>,
}

/// Identity-stable indirection over a value.
#[derive(Clone)]
pub struct Handle(Rc<Indirection>);

impl Handle {
    /// Create a handle targeting `target` (unwrapped).
    pub fn new(target: Value) -> Self {
        Self(Rc::new(Indirection {
            target: RefCell::new(unwrap(&target)),
        }))
    }

    /// The current target.
    pub fn get(&self) -> Value {
        self.0.target.borrow().clone()
    }

    /// Replace the target (unwrapped). This is the primitive retarget: no
    /// kind check, no controller notification.
    pub fn set(&self, target: Value) {
        let target = unwrap(&target);
        *self.0.target.borrow_mut() = target;
    }

    /// Run `f` against the current target.
    ///
    /// `f` sees a snapshot of the target reference, so it may retarget this
    /// handle without conflicting borrows.
    pub fn with_target<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let target = self.get();
        f(&target)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -- delegated operations -----------------------------------------------

    /// Read a property of the target. The result is unwrapped, and a
    /// callable result is bound to the target so it observes the target's
    /// real state rather than the façade.
    pub fn get_property(&self, key: impl Into<Key>) -> Result<Value, VirtualError> {
        let target = self.get();
        let value = unwrap(&target.get(key)?);
        Ok(match value {
            Value::Callable(callable) => Value::Callable(callable.bind(target)),
            other => other,
        })
    }

    /// Write a property through to the target.
    pub fn set_property(&self, key: impl Into<Key>, value: Value) -> Result<(), VirtualError> {
        self.get().set(key, value)
    }

    pub fn has_property(&self, key: impl Into<Key>) -> Result<bool, VirtualError> {
        self.get().has(key)
    }

    pub fn delete_property(&self, key: impl Into<Key>) -> Result<bool, VirtualError> {
        self.get().delete(key)
    }

    pub fn own_keys(&self) -> Result<Vec<Key>, VirtualError> {
        self.get().own_keys()
    }

    pub fn prototype(&self) -> Result<Option<Record>, VirtualError> {
        self.get().prototype()
    }

    pub fn is_extensible(&self) -> Result<bool, VirtualError> {
        self.get().is_extensible()
    }

    pub fn prevent_extensions(&self) -> Result<(), VirtualError> {
        self.get().prevent_extensions()
    }

    /// Call the target, if it is callable.
    pub fn call(&self, args: &[Value]) -> Result<Value, VirtualError> {
        self.get().call(args)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&*self.0.target.borrow()).finish()
    }
}
