//! Id-stable alignment of a fresh visible forest against the previous one.
//!
//! Purely cosmetic: after an incremental recomputation, nodes that already
//! existed keep their old positions in the sibling order so the animation
//! layer does not shuffle them, while every attribute (radius, weights,
//! scope, name) comes from the new projection. Alignment never changes which
//! nodes are present.

use indexmap::IndexMap;

use archmap_core::NodeId;

use crate::visible::VisibleNode;

/// Reorders `new` to follow `old`'s sibling order wherever ids match,
/// recursively. Nodes absent from `old` are appended in their `new` order.
pub fn align(new: Vec<VisibleNode>, old: &[VisibleNode]) -> Vec<VisibleNode> {
    let mut remaining: IndexMap<NodeId, VisibleNode> =
        new.into_iter().map(|node| (node.id, node)).collect();
    let mut aligned = Vec::with_capacity(remaining.len());
    for old_node in old {
        if let Some(mut node) = remaining.shift_remove(&old_node.id) {
            node.children = align(std::mem::take(&mut node.children), &old_node.children);
            aligned.push(node);
        }
    }
    aligned.extend(remaining.into_values());
    aligned
}
