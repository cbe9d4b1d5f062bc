//! Recursive graph virtualizer and the update protocol.
//!
//! Virtualizing a property replaces it with an accessor pair backed by its
//! own [`Handle`]: the getter always returns that slot proxy, the setter
//! runs [`Virtualizer::update`]. Plain records and sequences are walked
//! recursively; other virtualizable leaves are announced to the
//! [`Controller`].
//!
//! Reassigning a virtual slot:
//!
//! 1. loosely equal to the current target: nothing happens;
//! 2. the controller may claim the update via `on_update`;
//! 3. scalars are dropped, the slot keeps its value;
//! 4. same-shaped containers merge in place (see [`MergePolicy`]);
//!    anything else retargets the slot proxy, tears down or announces the
//!    removal of the old value, then walks or announces the new one.
//!
//! Slots are installed before their subtree is walked, so a walk that
//! reaches a container a second time finds its members already virtualized
//! and stops there. The depth limit bounds everything else: it applies both
//! to path length and to how many `virtualize_property` calls are nested,
//! which catches merges that re-enter themselves through a cycle.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::controller::{Controller, NoopController};
use super::handle::Handle;
use super::unwrap::{is_handle, unwrap};
use crate::config::{MergePolicy, VirtualizeConfig};
use crate::error::{Operation, VirtualError};
use crate::value::container::Slot;
use crate::value::{Key, Path, Value};

// ---------------------------------------------------------------------------
// VirtualSlot
// ---------------------------------------------------------------------------

/// The accessor pair installed in place of a virtualized property.
pub(crate) struct VirtualSlot {
    proxy: Handle,
    path: Path,
    binding: SlotBinding,
}

impl VirtualSlot {
    /// Getter: the stable slot proxy.
    pub(crate) fn proxy(&self) -> &Handle {
        &self.proxy
    }

    /// Setter: run the update protocol.
    pub(crate) fn assign(&self, value: &Value) -> Result<(), VirtualError> {
        self.binding
            .virtualizer(&self.path)
            .update(&self.proxy, value, &self.path)
    }
}

/// What a slot keeps of the virtualizer that installed it. The controller is
/// held weakly: a controller that owns the graph it watches must not be kept
/// alive by that graph.
struct SlotBinding {
    controller: Weak<dyn Controller>,
    config: VirtualizeConfig,
    nesting: Rc<Cell<usize>>,
}

impl SlotBinding {
    /// Rebuild the virtualizer. Once the controller is gone, slots fall back
    /// to the default hooks.
    fn virtualizer(&self, path: &Path) -> Virtualizer {
        let controller: Rc<dyn Controller> = match self.controller.upgrade() {
            Some(controller) => controller,
            None => {
                trace!(path = %path, "controller dropped, using default hooks");
                Rc::new(NoopController)
            }
        };
        Virtualizer {
            controller,
            config: self.config,
            nesting: Rc::clone(&self.nesting),
        }
    }
}

// ---------------------------------------------------------------------------
// Virtualizer
// ---------------------------------------------------------------------------

/// A controller plus configuration.
///
/// Slots installed by a virtualizer keep its configuration and a weak
/// reference to its controller, so the controller hears about updates only
/// while something else keeps it alive (the caller's `Rc`, or this
/// virtualizer). Clones share one nesting counter.
#[derive(Clone)]
pub struct Virtualizer {
    controller: Rc<dyn Controller>,
    config: VirtualizeConfig,
    nesting: Rc<Cell<usize>>,
}

/// Holds one level of `virtualize_property` nesting until dropped.
struct NestingGuard(Rc<Cell<usize>>);

impl NestingGuard {
    fn enter(counter: &Rc<Cell<usize>>) -> (Self, usize) {
        let depth = counter.get() + 1;
        counter.set(depth);
        (Self(Rc::clone(counter)), depth)
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new(NoopController)
    }
}

impl Virtualizer {
    /// Create a virtualizer owning `controller`. Its slots reach the
    /// controller only while this virtualizer or one of its clones is alive.
    pub fn new(controller: impl Controller + 'static) -> Self {
        Self::with_controller(Rc::new(controller))
    }

    /// Create a virtualizer sharing `controller` with the caller.
    pub fn with_controller(controller: Rc<dyn Controller>) -> Self {
        Self {
            controller,
            config: VirtualizeConfig::default(),
            nesting: Rc::new(Cell::new(0)),
        }
    }

    /// Replace the configuration (builder).
    pub fn with_config(mut self, config: VirtualizeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn controller(&self) -> &Rc<dyn Controller> {
        &self.controller
    }

    pub fn config(&self) -> &VirtualizeConfig {
        &self.config
    }

    /// Wrap a virtualizable value in a root handle; scalars come back
    /// unchanged. With `recursive`, a record or sequence also has all of its
    /// current members virtualized. Members added to it later are not.
    pub fn virtualize(&self, value: &Value, recursive: bool) -> Result<Value, VirtualError> {
        if value.is_scalar() {
            return Ok(value.clone());
        }
        let target = unwrap(value);
        let root = Handle::new(target.clone());
        if recursive && target.is_recursible() {
            self.virtualize_all(&target, &Path::root())?;
        }
        Ok(Value::Handle(root))
    }

    /// Virtualize every own key of `container`, located at `path`.
    pub fn virtualize_all(&self, container: &Value, path: &Path) -> Result<(), VirtualError> {
        let container = unwrap(container);
        for key in container.own_keys()? {
            let value = container.get(&key)?;
            self.virtualize_property(&container, &key, &value, &path.child(&key))?;
        }
        Ok(())
    }

    /// Decide and install virtualization for `owner[key] = value`, where
    /// `path` is the full path to the property.
    pub fn virtualize_property(
        &self,
        owner: &Value,
        key: &Key,
        value: &Value,
        path: &Path,
    ) -> Result<(), VirtualError> {
        let (_guard, nesting) = NestingGuard::enter(&self.nesting);
        if path.len() > self.config.max_depth || nesting > self.config.max_depth {
            return Err(VirtualError::DepthExceeded {
                path: path.clone(),
                max: self.config.max_depth,
            });
        }

        let owner = unwrap(owner);
        let target = unwrap(value);

        if target.is_scalar() {
            return owner.set(key, value.clone());
        }

        // Already behind a handle: assign through it, never double-wrap.
        if owner.has(key)? && is_handle(&owner.get(key)?) {
            return owner.set(key, value.clone());
        }

        let recursible = target.is_recursible();
        if !recursible && !self.controller.should_virtualize(&target, path) {
            return owner.set(key, value.clone());
        }

        let slot = Rc::new(VirtualSlot {
            proxy: Handle::new(target.clone()),
            path: path.clone(),
            binding: self.binding(),
        });
        install(&owner, key, Slot::Virtual(slot))?;
        trace!(path = %path, kind = ?target.kind(), "installed virtual slot");

        self.activate(&target, path)
    }

    fn binding(&self) -> SlotBinding {
        SlotBinding {
            controller: Rc::downgrade(&self.controller),
            config: self.config,
            nesting: Rc::clone(&self.nesting),
        }
    }

    /// The update protocol run by a virtual slot's setter.
    ///
    /// Only same-kind containers merge: a record assigned over a sequence (or
    /// the reverse) rebinds, since a sequence cannot hold named keys.
    fn update(&self, proxy: &Handle, value: &Value, path: &Path) -> Result<(), VirtualError> {
        let new = unwrap(value);
        let old = proxy.get();

        if old.loosely_equals(&new) {
            return Ok(());
        }
        if self.controller.on_update(&old, &new, path) {
            trace!(path = %path, "update claimed by controller");
            return Ok(());
        }
        if new.is_scalar() {
            trace!(path = %path, value = %new, "dropped scalar assignment to virtual slot");
            return Ok(());
        }

        if old.is_recursible() && new.is_recursible() && old.kind() == new.kind() {
            return self.merge(&old, &new, path);
        }

        debug!(path = %path, from = ?old.kind(), to = ?new.kind(), "rebinding virtual slot");
        proxy.set(new.clone());
        self.deactivate(&old, path)?;
        self.activate(&new, path)
    }

    /// Bring a value that just became the target at `path` to life.
    fn activate(&self, value: &Value, path: &Path) -> Result<(), VirtualError> {
        if value.is_recursible() {
            return self.virtualize_all(value, path);
        }
        if !value.is_empty() {
            self.controller.on_add(value, path);
        }
        Ok(())
    }

    /// Retire a value that stopped being the target at `path`.
    fn deactivate(&self, value: &Value, path: &Path) -> Result<(), VirtualError> {
        if value.is_recursible() {
            debug!(path = %path, "tearing down replaced subtree");
            for key in value.own_keys()? {
                self.virtualize_property(value, &key, &Value::Null, &path.child(&key))?;
            }
            return Ok(());
        }
        if !value.is_empty() {
            self.controller.on_delete(value, path);
        }
        Ok(())
    }

    /// Merge `new` into `old` in place; both are same-shaped containers.
    fn merge(&self, old: &Value, new: &Value, path: &Path) -> Result<(), VirtualError> {
        debug!(path = %path, policy = ?self.config.merge, "merging into existing container");
        let incoming = new.own_keys()?;

        match self.config.merge {
            MergePolicy::Shallow => {
                for key in &incoming {
                    old.set(key, new.get(key)?)?;
                }
            }
            MergePolicy::Protocol => {
                for key in &incoming {
                    let value = new.get(key)?;
                    self.virtualize_property(old, key, &value, &path.child(key))?;
                }
                for key in old.own_keys()? {
                    if !incoming.iter().any(|k| k.same_member(&key)) {
                        self.retire(old, &key, &path.child(&key))?;
                    }
                }
                if let (Value::Sequence(old), Value::Sequence(new)) = (old, new) {
                    old.truncate(new.len());
                }
            }
        }
        Ok(())
    }

    /// Assign null through a virtual slot (announcing the removal), then
    /// drop the key.
    fn retire(&self, container: &Value, key: &Key, path: &Path) -> Result<(), VirtualError> {
        let slot = match container {
            Value::Record(record) => record.slot(key),
            Value::Sequence(sequence) => sequence.slot(key),
            _ => None,
        };
        if let Some(Slot::Virtual(slot)) = slot {
            slot.assign(&Value::Null)?;
        }
        container.delete(key)?;
        trace!(path = %path, "retired key missing from merged value");
        Ok(())
    }
}

fn install(owner: &Value, key: &Key, slot: Slot) -> Result<(), VirtualError> {
    match owner {
        Value::Record(record) => record.install(key, slot),
        Value::Sequence(sequence) => sequence.install(key, slot),
        other => Err(VirtualError::NotAContainer {
            operation: Operation::Set,
            kind: other.type_name(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// [`Virtualizer::virtualize`] with the default controller and config.
pub fn virtualize(value: &Value, recursive: bool) -> Result<Value, VirtualError> {
    Virtualizer::default().virtualize(value, recursive)
}

/// [`Virtualizer::virtualize_property`] with an optional controller
/// (default: [`NoopController`]) and the default config.
pub fn virtualize_property(
    owner: &Value,
    key: impl Into<Key>,
    value: &Value,
    path: &Path,
    controller: Option<Rc<dyn Controller>>,
) -> Result<(), VirtualError> {
    let virtualizer = controller.map_or_else(Virtualizer::default, Virtualizer::with_controller);
    virtualizer.virtualize_property(owner, &key.into(), value, path)
}
