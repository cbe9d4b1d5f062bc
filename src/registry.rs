//! Slot registry: a controller that keeps the set of live leaves.
//!
//! [`SlotRegistry`] stores every value announced through `on_add` in a
//! slotmap arena, indexed by path. `on_delete` removes the entry again. The
//! registry therefore mirrors exactly which leaves of a virtualized graph are
//! active at any moment.

use std::cell::RefCell;
use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::proxy::Controller;
use crate::value::{Path, Value};

new_key_type! {
    /// Identifier of a registry entry. Stale after the entry is removed.
    pub struct EntryId;
}

/// A live leaf.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: Path,
    pub value: Value,
    /// Registry revision at which this entry was (re)activated.
    pub activated_at: u64,
}

struct Inner {
    entries: SlotMap<EntryId, Entry>,
    by_path: HashMap<Path, EntryId>,
    revision: u64,
}

type Filter = Box<dyn Fn(&Value, &Path) -> bool>;

/// Registry of active leaves, keyed by path.
pub struct SlotRegistry {
    inner: RefCell<Inner>,
    filter: Option<Filter>,
}

impl SlotRegistry {
    /// Create an empty registry that accepts every leaf.
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner {
                entries: SlotMap::with_key(),
                by_path: HashMap::new(),
                revision: 0,
            }),
            filter: None,
        }
    }

    /// Only leaves accepted by `filter` get slot proxies (and are tracked).
    pub fn with_filter(mut self, filter: impl Fn(&Value, &Path) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// The live value at `path`.
    pub fn get(&self, path: &Path) -> Option<Value> {
        let inner = self.inner.borrow();
        let id = inner.by_path.get(path)?;
        inner.entries.get(*id).map(|entry| entry.value.clone())
    }

    /// The entry id currently registered for `path`.
    pub fn id(&self, path: &Path) -> Option<EntryId> {
        self.inner.borrow().by_path.get(path).copied()
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: EntryId) -> Option<Entry> {
        self.inner.borrow().entries.get(id).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.borrow().by_path.contains_key(path)
    }

    /// Number of live leaves.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Paths of all live leaves, sorted.
    pub fn paths(&self) -> Vec<Path> {
        let mut paths: Vec<Path> = self.inner.borrow().by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Bumped on every activation and deactivation.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Live entries under `prefix` (inclusive), sorted by path.
    pub fn under(&self, prefix: &Path) -> Vec<Entry> {
        let inner = self.inner.borrow();
        let mut found: Vec<Entry> = inner
            .entries
            .values()
            .filter(|entry| entry.path.starts_with(prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    fn activate(&self, value: &Value, path: &Path) {
        let mut inner = self.inner.borrow_mut();
        inner.revision += 1;
        let entry = Entry {
            path: path.clone(),
            value: value.clone(),
            activated_at: inner.revision,
        };
        match inner.by_path.get(path).copied() {
            Some(id) if inner.entries.contains_key(id) => {
                inner.entries[id] = entry;
            }
            _ => {
                let id = inner.entries.insert(entry);
                inner.by_path.insert(path.clone(), id);
            }
        }
        debug!(path = %path, value = %value, "activated leaf");
    }

    fn deactivate(&self, value: &Value, path: &Path) {
        let mut inner = self.inner.borrow_mut();
        let Some(id) = inner.by_path.get(path).copied() else {
            return;
        };
        // A later activation at the same path already replaced this value.
        if inner.entries.get(id).is_some_and(|entry| entry.value != *value) {
            return;
        }
        inner.entries.remove(id);
        inner.by_path.remove(path);
        inner.revision += 1;
        debug!(path = %path, value = %value, "deactivated leaf");
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SlotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotRegistry")
            .field("live", &self.len())
            .field("revision", &self.revision())
            .finish()
    }
}

impl Controller for SlotRegistry {
    fn should_virtualize(&self, value: &Value, path: &Path) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(value, path))
    }

    fn on_add(&self, value: &Value, path: &Path) {
        self.activate(value, path);
    }

    fn on_delete(&self, value: &Value, path: &Path) {
        self.deactivate(value, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::Virtualizer;
    use crate::value::{Callable, Record, Sequence};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn rule(name: &str) -> Value {
        Value::from(Callable::new(|_| Value::Null).named(name))
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn attach(graph: &Value) -> Rc<SlotRegistry> {
        let registry = Rc::new(SlotRegistry::new());
        Virtualizer::with_controller(registry.clone())
            .virtualize(graph, true)
            .unwrap();
        registry
    }

    #[test]
    fn tracks_initial_leaves() {
        let hover = rule("hover");
        let graph = Value::from(Record::from_entries([
            ("hover", hover.clone()),
            ("color", Value::from("red")),
            (
                "states",
                Value::from(Sequence::from_values([rule("a"), rule("b")])),
            ),
        ]));
        let registry = attach(&graph);

        assert_eq!(
            registry.paths(),
            vec![path("hover"), path("states[0]"), path("states[1]")]
        );
        assert_eq!(registry.get(&path("hover")), Some(hover));
        assert_eq!(registry.get(&path("color")), None);
        assert_eq!(registry.revision(), 3);
    }

    #[test]
    fn numeric_names_find_indexed_entries() {
        let first = rule("first");
        let graph = Value::from(Record::from_entries([(
            "states",
            Value::from(Sequence::from_values([first.clone()])),
        )]));
        let registry = attach(&graph);

        let spelled = Path::from(["states", "0"]);
        assert!(registry.contains(&spelled));
        assert_eq!(registry.get(&spelled), Some(first));
        assert_eq!(registry.id(&spelled), registry.id(&path("states[0]")));
    }

    #[test]
    fn replacement_swaps_entry() {
        let (old, new) = (rule("old"), rule("new"));
        let graph = Value::from(Record::from_entries([("hover", old)]));
        let registry = attach(&graph);
        let id = registry.id(&path("hover"));

        graph.set("hover", new.clone()).unwrap();
        assert_eq!(registry.get(&path("hover")), Some(new));
        assert_eq!(registry.len(), 1);
        assert_ne!(registry.id(&path("hover")), id);
        assert!(id.and_then(|id| registry.entry(id)).is_none());
    }

    #[test]
    fn null_assignment_deactivates() {
        let graph = Value::from(Record::from_entries([("hover", rule("h"))]));
        let registry = attach(&graph);
        graph.set("hover", Value::Null).unwrap();
        assert!(registry.is_empty());
        assert!(!registry.contains(&path("hover")));
    }

    #[test]
    fn subtree_teardown_deactivates_everything_below() {
        let graph = Value::from(Record::from_entries([
            (
                "theme",
                Value::from(Record::from_entries([("a", rule("a")), ("b", rule("b"))])),
            ),
            ("other", rule("o")),
        ]));
        let registry = attach(&graph);
        assert_eq!(registry.under(&path("theme")).len(), 2);

        graph.set("theme", rule("flat")).unwrap();
        assert_eq!(registry.paths(), vec![path("other"), path("theme")]);
        assert!(registry.under(&path("theme.a")).is_empty());
    }

    #[test]
    fn stale_delete_is_ignored() {
        let registry = SlotRegistry::new();
        let (a, b) = (rule("a"), rule("b"));
        registry.on_add(&a, &path("x"));
        registry.on_add(&b, &path("x"));
        registry.on_delete(&a, &path("x"));
        assert_eq!(registry.get(&path("x")), Some(b));
    }

    #[test]
    fn filter_limits_tracking() {
        let graph = Value::from(Record::from_entries([
            ("keep", rule("k")),
            ("skip", rule("s")),
        ]));
        let registry = Rc::new(SlotRegistry::new().with_filter(|_, path| {
            path.last().is_some_and(|key| &*key.to_name() != "skip")
        }));
        Virtualizer::with_controller(registry.clone())
            .virtualize(&graph, true)
            .unwrap();
        assert_eq!(registry.paths(), vec![path("keep")]);
    }
}
