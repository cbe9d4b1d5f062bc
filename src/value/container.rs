//! Records and sequences: the mutable, identity-bearing containers.
//!
//! Each property lives in a [`Slot`]. A data slot stores a value; a virtual
//! slot is an accessor pair installed by the virtualizer, whose getter
//! returns the slot proxy and whose setter runs the update protocol.
//!
//! No `RefCell` borrow is held while a virtual slot's setter runs, so the
//! protocol (and any controller it calls) may freely re-enter the container.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::key::Key;
use super::Value;
use crate::error::VirtualError;
use crate::proxy::virtualize::VirtualSlot;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub(crate) enum Slot {
    Data(Value),
    Virtual(Rc<VirtualSlot>),
}

impl Slot {
    /// What a property read observes.
    fn read(&self) -> Value {
        match self {
            Self::Data(value) => value.clone(),
            Self::Virtual(slot) => Value::Handle(slot.proxy().clone()),
        }
    }
}

/// Write `value` into `slot`, or hand back the virtual slot whose setter
/// must run once the container borrow is released.
fn write_slot(slot: &mut Slot, value: Value) -> Option<(Rc<VirtualSlot>, Value)> {
    match slot {
        Slot::Data(existing) => {
            *existing = value;
            None
        }
        Slot::Virtual(virtual_slot) => Some((Rc::clone(virtual_slot), value)),
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

struct RecordData {
    prototype: Option<Record>,
    extensible: bool,
    entries: Vec<(Rc<str>, Slot)>,
}

impl RecordData {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| &**n == name)
    }
}

/// A string-keyed record with insertion-ordered members.
///
/// A record without a prototype is *plain*; only plain records are walked
/// recursively by the virtualizer.
#[derive(Clone)]
pub struct Record(Rc<RefCell<RecordData>>);

impl Record {
    /// Create an empty plain record.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(RecordData {
            prototype: None,
            extensible: true,
            entries: Vec::new(),
        })))
    }

    /// Create an empty record deriving from `prototype` (not plain).
    pub fn with_prototype(prototype: Record) -> Self {
        let record = Self::new();
        record.0.borrow_mut().prototype = Some(prototype);
        record
    }

    /// Build a plain record from key/value pairs.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        let record = Self::new();
        {
            let mut data = record.0.borrow_mut();
            for (key, value) in entries {
                let name = key.into().to_name();
                let slot = Slot::Data(value.into());
                match data.position(&name) {
                    Some(i) => data.entries[i].1 = slot,
                    None => data.entries.push((name, slot)),
                }
            }
        }
        record
    }

    pub fn prototype(&self) -> Option<Record> {
        self.0.borrow().prototype.clone()
    }

    /// No prototype.
    pub fn is_plain(&self) -> bool {
        self.0.borrow().prototype.is_none()
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().entries.is_empty()
    }

    /// Own keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|(name, _)| Key::Name(Rc::clone(name)))
            .collect()
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let name = key.into().to_name();
        self.0.borrow().position(&name).is_some()
    }

    /// Read a member. Absent members read as `undefined`; virtual slots
    /// read as their slot proxy.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let name = key.into().to_name();
        let data = self.0.borrow();
        data.position(&name)
            .map_or(Value::Undefined, |i| data.entries[i].1.read())
    }

    /// Write a member. Writing a virtual slot runs its update protocol.
    pub fn set(&self, key: impl Into<Key>, value: Value) -> Result<(), VirtualError> {
        let key = key.into();
        let name = key.to_name();
        let pending = {
            let mut data = self.0.borrow_mut();
            match data.position(&name) {
                Some(i) => write_slot(&mut data.entries[i].1, value),
                None if data.extensible => {
                    data.entries.push((name, Slot::Data(value)));
                    None
                }
                None => return Err(VirtualError::NotExtensible { key }),
            }
        };
        match pending {
            Some((slot, value)) => slot.assign(&value),
            None => Ok(()),
        }
    }

    /// Remove a member, virtual or not. Always succeeds.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        let name = key.into().to_name();
        let mut data = self.0.borrow_mut();
        if let Some(i) = data.position(&name) {
            data.entries.remove(i);
        }
        true
    }

    pub(crate) fn slot(&self, key: &Key) -> Option<Slot> {
        let data = self.0.borrow();
        data.position(&key.to_name()).map(|i| data.entries[i].1.clone())
    }

    /// Replace (in place) or add a slot, bypassing any existing setter.
    pub(crate) fn install(&self, key: &Key, slot: Slot) -> Result<(), VirtualError> {
        let name = key.to_name();
        let mut data = self.0.borrow_mut();
        match data.position(&name) {
            Some(i) => data.entries[i].1 = slot,
            None if data.extensible => data.entries.push((name, slot)),
            None => return Err(VirtualError::NotExtensible { key: key.clone() }),
        }
        Ok(())
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow: lists keys only, so cyclic graphs print fine.
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Record")
            .field(
                "keys",
                &data.entries.iter().map(|(n, _)| &**n).collect::<Vec<_>>(),
            )
            .field("plain", &data.prototype.is_none())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

struct SequenceData {
    extensible: bool,
    items: Vec<Slot>,
}

/// An ordered, index-addressed sequence.
#[derive(Clone)]
pub struct Sequence(Rc<RefCell<SequenceData>>);

impl Sequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SequenceData {
            extensible: true,
            items: Vec::new(),
        })))
    }

    /// Build a sequence from values.
    pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        let items = values.into_iter().map(|v| Slot::Data(v.into())).collect();
        Self(Rc::new(RefCell::new(SequenceData {
            extensible: true,
            items,
        })))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    /// Indices `0..len`.
    pub fn keys(&self) -> Vec<Key> {
        (0..self.len()).map(Key::Index).collect()
    }

    /// Current values as read (virtual slots yield their proxies).
    pub fn values(&self) -> Vec<Value> {
        self.0.borrow().items.iter().map(Slot::read).collect()
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        key.into().as_index().is_some_and(|i| i < self.len())
    }

    /// Read an element. Out-of-range and non-index keys read as `undefined`.
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let Some(index) = key.into().as_index() else {
            return Value::Undefined;
        };
        self.0
            .borrow()
            .items
            .get(index)
            .map_or(Value::Undefined, Slot::read)
    }

    /// Write an element, growing the sequence with `undefined` as needed.
    pub fn set(&self, key: impl Into<Key>, value: Value) -> Result<(), VirtualError> {
        let key = key.into();
        let Some(index) = key.as_index() else {
            return Err(VirtualError::InvalidKey { key });
        };
        let pending = {
            let mut data = self.0.borrow_mut();
            if index < data.items.len() {
                write_slot(&mut data.items[index], value)
            } else if data.extensible {
                data.items.resize(index, Slot::Data(Value::Undefined));
                data.items.push(Slot::Data(value));
                None
            } else {
                return Err(VirtualError::NotExtensible { key });
            }
        };
        match pending {
            Some((slot, value)) => slot.assign(&value),
            None => Ok(()),
        }
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), VirtualError> {
        let index = self.len();
        self.set(index, value.into())
    }

    /// Clear an element to `undefined`, dropping any virtual slot. The length
    /// is unchanged.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        if let Some(index) = key.into().as_index() {
            let mut data = self.0.borrow_mut();
            if let Some(item) = data.items.get_mut(index) {
                *item = Slot::Data(Value::Undefined);
            }
        }
        true
    }

    /// Shorten to `len` elements. No-op if already shorter.
    pub fn truncate(&self, len: usize) {
        self.0.borrow_mut().items.truncate(len);
    }

    pub(crate) fn slot(&self, key: &Key) -> Option<Slot> {
        let index = key.as_index()?;
        self.0.borrow().items.get(index).cloned()
    }

    pub(crate) fn install(&self, key: &Key, slot: Slot) -> Result<(), VirtualError> {
        let Some(index) = key.as_index() else {
            return Err(VirtualError::InvalidKey { key: key.clone() });
        };
        let mut data = self.0.borrow_mut();
        if index < data.items.len() {
            data.items[index] = slot;
        } else if data.extensible {
            data.items.resize(index, Slot::Data(Value::Undefined));
            data.items.push(slot);
        } else {
            return Err(VirtualError::NotExtensible { key: key.clone() });
        }
        Ok(())
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence(len = {})", self.len())
    }
}
