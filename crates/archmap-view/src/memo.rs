//! Explicit, caller-owned projection cache.
//!
//! Keyed by (node id, structural rule fingerprint), so entries from a
//! superseded rule set simply stop being hit -- no invalidation hook needed,
//! though [`ProjectionMemo::clear`] bounds memory across long interactive
//! sessions. The memo is purely an optimization: projecting with or without
//! one yields identical output.
//!
//! There is no process-global cache. A memo belongs to whoever drives
//! projections, and sharing one across threads is a decision that caller
//! makes explicitly (e.g. behind a mutex), never something the engine does
//! behind their back.

use std::collections::HashMap;

use archmap_core::NodeId;

use crate::project::SubProjection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemoKey {
    pub node: NodeId,
    pub rules: u64,
}

/// Cache of per-subtree projection results.
#[derive(Debug, Default)]
pub struct ProjectionMemo {
    entries: HashMap<MemoKey, SubProjection>,
}

impl ProjectionMemo {
    pub fn new() -> Self {
        ProjectionMemo::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn get(&self, key: &MemoKey) -> Option<SubProjection> {
        self.entries.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, key: MemoKey, sub: SubProjection) {
        self.entries.insert(key, sub);
    }
}
