//! Property keys and root-relative paths.

use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A property key: a record member name or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Named member, e.g. `color`.
    Name(Rc<str>),
    /// Positional index, e.g. `[2]`.
    Index(usize),
}

impl Key {
    /// Create a named key.
    pub fn name(name: impl AsRef<str>) -> Self {
        Self::Name(Rc::from(name.as_ref()))
    }

    /// The key as an index, if it is one or if its name is a canonical
    /// decimal integer (`"3"` yes, `"03"` no).
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(name) => {
                let index: usize = name.parse().ok()?;
                (index.to_string() == **name).then_some(index)
            }
        }
    }

    /// The key as a record member name. Indices become their decimal form.
    pub fn to_name(&self) -> Rc<str> {
        match self {
            Self::Name(name) => Rc::clone(name),
            Self::Index(i) => Rc::from(i.to_string()),
        }
    }

    /// Canonical form: a name that is a canonical decimal integer becomes an
    /// index. Two keys address the same member iff their canonical forms are
    /// equal.
    pub fn canonical(self) -> Self {
        match self.as_index() {
            Some(index) => Self::Index(index),
            None => self,
        }
    }

    /// Whether two keys address the same member once normalized.
    pub fn same_member(&self, other: &Key) -> bool {
        match (self.as_index(), other.as_index()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_name() == other.to_name(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::name(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Name(Rc::from(s))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// Ordered keys from the virtualization root to a value.
///
/// Keys are stored in [canonical](Key::canonical) form, so `["items", "0"]`
/// and `items[0]` are the same path for equality, hashing and ordering.
///
/// Paths are threaded through every [`Controller`](crate::proxy::Controller)
/// callback. The root path is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<Key>);

impl Path {
    /// The empty root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path extended by one key.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend(self.0.iter().cloned());
        keys.push(key.into().canonical());
        Self(keys)
    }

    /// The keys, root first.
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// The last key, if any.
    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    /// The path one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &Path) -> bool {
        self.0.len() >= other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.same_member(b))
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys.into_iter().map(Key::canonical).collect())
    }
}

impl<K: Into<Key>, const N: usize> From<[K; N]> for Path {
    fn from(keys: [K; N]) -> Self {
        Self(keys.into_iter().map(|key| key.into().canonical()).collect())
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().map(Key::canonical).collect())
    }
}

/// Renders `child.items[0]`. Names that are not plain identifiers are
/// bracket-quoted with escapes: `["font-size"]`. `parse_path` reads the
/// output back.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            match key {
                Key::Index(index) => write!(f, "[{index}]")?,
                Key::Name(name) if is_identifier(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Key::Name(name) => write!(f, "[{name:?}]")?,
            }
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
