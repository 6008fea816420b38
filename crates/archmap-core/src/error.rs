//! Core error types for archmap-core.
//!
//! Uses `thiserror` for structured, matchable error variants. The projection
//! side of the engine is total and produces no errors; everything fallible
//! lives here, at the tree-building and rule-document seams.

use thiserror::Error;

use crate::id::NodeId;

/// Core errors produced by the archmap-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An arc was addressed at a source node that does not exist in the tree.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A rule document could not be parsed.
    #[error("malformed rule document: {0}")]
    MalformedRules(#[from] serde_json::Error),
}
