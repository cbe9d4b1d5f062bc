//! Virtualizer configuration.

/// Default limit on path length during a walk.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How an assignment merges a record into a record (or a sequence into a
/// sequence) already held by a virtual slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Run every incoming key through the full virtualization protocol, so
    /// new leaves are virtualized and announced. Keys missing from the
    /// incoming value are retired: their slots are assigned null (announcing
    /// the removal) and the key is dropped. Sequences shrink to the incoming
    /// length.
    #[default]
    Protocol,
    /// Assign incoming keys onto the existing container one by one. Existing
    /// virtual slots still run their own update; new keys stay plain and
    /// unannounced; nothing is removed.
    Shallow,
}

/// Configuration for a [`Virtualizer`](crate::proxy::Virtualizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualizeConfig {
    /// Merge behaviour for same-shaped container assignment.
    pub merge: MergePolicy,
    /// Deepest path a walk may reach before failing with
    /// [`VirtualError::DepthExceeded`](crate::error::VirtualError::DepthExceeded).
    pub max_depth: usize,
}

impl Default for VirtualizeConfig {
    fn default() -> Self {
        Self {
            merge: MergePolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl VirtualizeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the merge policy (builder).
    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Set the depth limit (builder).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
