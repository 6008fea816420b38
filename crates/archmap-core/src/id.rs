//! Stable ID newtype for tree nodes.
//!
//! A [`NodeId`] is process-unique and never reused: ids are handed out by a
//! process-wide atomic counter, so a node keeps its identity across arbitrary
//! tree surgery and two nodes can never collide. `Ord` follows creation order,
//! which is what makes projected arc lists deterministically sortable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Stable node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocates a fresh, process-unique id. Ids are never reused.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
