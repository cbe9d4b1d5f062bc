//! A controller that records every hook call, for asserting on the exact
//! sequence of notifications a mutation produces.

use std::cell::{Cell, RefCell};

use crate::proxy::Controller;
use crate::value::{Path, Value};

/// One controller notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Add { path: Path, value: Value },
    Delete { path: Path, value: Value },
    Update { path: Path, old: Value, new: Value },
}

impl Event {
    pub fn path(&self) -> &Path {
        match self {
            Self::Add { path, .. } | Self::Delete { path, .. } | Self::Update { path, .. } => path,
        }
    }

    /// Add or delete, as opposed to an update attempt.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Update { .. })
    }
}

type Filter = Box<dyn Fn(&Value, &Path) -> bool>;

/// Recording [`Controller`].
///
/// Share it with a virtualizer through an `Rc` and inspect it afterwards:
///
/// ```ignore
/// let recorder = Rc::new(Recorder::new());
/// let virtualizer = Virtualizer::with_controller(recorder.clone());
/// virtualizer.virtualize(&graph, true)?;
/// assert_eq!(recorder.changes().len(), 2);
/// ```
#[derive(Default)]
pub struct Recorder {
    events: RefCell<Vec<Event>>,
    filter: Option<Filter>,
    claim_updates: Cell<bool>,
}

impl Recorder {
    /// Record everything, virtualize everything, claim nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide `should_virtualize` with `filter` (builder).
    pub fn with_filter(mut self, filter: impl Fn(&Value, &Path) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Claim every update (builder).
    pub fn claiming_updates(self) -> Self {
        self.claim_updates.set(true);
        self
    }

    /// Toggle update claiming after construction.
    pub fn set_claim_updates(&self, claim: bool) {
        self.claim_updates.set(claim);
    }

    /// All recorded events in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Adds and deletes only.
    pub fn changes(&self) -> Vec<Event> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.is_structural())
            .cloned()
            .collect()
    }

    /// Paths of the leaves currently live, in the order they were added.
    pub fn live_paths(&self) -> Vec<Path> {
        let mut live: Vec<Path> = Vec::new();
        for event in self.events.borrow().iter() {
            match event {
                Event::Add { path, .. } => live.push(path.clone()),
                Event::Delete { path, .. } => {
                    if let Some(i) = live.iter().position(|p| p == path) {
                        live.remove(i);
                    }
                }
                Event::Update { .. } => {}
            }
        }
        live
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl Controller for Recorder {
    fn should_virtualize(&self, value: &Value, path: &Path) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(value, path))
    }

    fn on_add(&self, value: &Value, path: &Path) {
        self.record(Event::Add {
            path: path.clone(),
            value: value.clone(),
        });
    }

    fn on_delete(&self, value: &Value, path: &Path) {
        self.record(Event::Delete {
            path: path.clone(),
            value: value.clone(),
        });
    }

    fn on_update(&self, old: &Value, new: &Value, path: &Path) -> bool {
        self.record(Event::Update {
            path: path.clone(),
            old: old.clone(),
            new: new.clone(),
        });
        self.claim_updates.get()
    }
}
