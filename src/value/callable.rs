//! Callable values: native closures with an optional bound receiver.

use std::fmt;
use std::rc::Rc;

use super::Value;
use crate::error::VirtualError;

/// Signature of a native callable: `(receiver, arguments) -> result`.
pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, VirtualError>;

struct CallableInner {
    name: Option<Rc<str>>,
    func: Rc<NativeFn>,
    /// Receiver fixed by [`Callable::bind`]. Unbound callables receive
    /// [`Value::Undefined`].
    receiver: Option<Value>,
}

/// A callable value. Cloning shares identity; [`bind`](Callable::bind)
/// creates a new identity around the same function.
#[derive(Clone)]
pub struct Callable(Rc<CallableInner>);

impl Callable {
    /// Wrap a closure that ignores its receiver.
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self::native(move |_, args| Ok(f(args)))
    }

    /// Wrap a closure that receives the bound receiver and may fail.
    pub fn native(f: impl Fn(&Value, &[Value]) -> Result<Value, VirtualError> + 'static) -> Self {
        Self(Rc::new(CallableInner {
            name: None,
            func: Rc::new(f),
            receiver: None,
        }))
    }

    /// Attach a diagnostic name (builder). Returns a new identity.
    pub fn named(self, name: impl AsRef<str>) -> Self {
        Self(Rc::new(CallableInner {
            name: Some(Rc::from(name.as_ref())),
            func: Rc::clone(&self.0.func),
            receiver: self.0.receiver.clone(),
        }))
    }

    /// The diagnostic name, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// A new callable sharing this function with `receiver` fixed.
    ///
    /// Binding an already bound callable keeps the original receiver.
    pub fn bind(&self, receiver: Value) -> Self {
        Self(Rc::new(CallableInner {
            name: self.0.name.clone(),
            func: Rc::clone(&self.0.func),
            receiver: Some(self.0.receiver.clone().unwrap_or(receiver)),
        }))
    }

    /// The bound receiver, if any.
    pub fn receiver(&self) -> Option<&Value> {
        self.0.receiver.as_ref()
    }

    /// Invoke with the bound receiver (or `undefined`).
    pub fn call(&self, args: &[Value]) -> Result<Value, VirtualError> {
        let receiver = self.0.receiver.clone().unwrap_or(Value::Undefined);
        (self.0.func)(&receiver, args)
    }

    /// Whether both handles refer to the same callable identity.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether both callables wrap the same underlying function, ignoring
    /// binding.
    pub fn same_function(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.0.func, &other.0.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Callable({name})"),
            None => write!(f, "Callable(<anonymous>)"),
        }
    }
}
