//! The source node tree.
//!
//! A [`Node`] owns its children exclusively, so the parent/child relation is a
//! tree by construction. Cross-cutting dependency edges ("arcs") are stored as
//! target-id sets on their source node and may point anywhere in the tree
//! except the source itself or one of its ancestors.
//!
//! There are no parent back-pointers. Arc insertion goes through the tree
//! root ([`Node::add_arc`]), which walks down to the source with the ancestor
//! path in hand and validates the arc once, at insertion time. An arc that
//! violates an invariant is silently rejected (`Ok(false)`), not an error --
//! only an unknown source id is.
//!
//! The tree is produced once per document by an external ingestion layer and
//! treated as immutable for the duration of a projection.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;

/// A single element of the source tree: a scope tag, an optional qualified
/// name, exclusively owned children, and a set of outgoing arcs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    scope: String,
    name: Option<String>,
    children: Vec<Node>,
    arcs: IndexSet<NodeId>,
    tags: IndexSet<String>,
    is_root: bool,
}

impl Node {
    /// Creates a non-root node with the given scope and a fresh id.
    pub fn new(scope: impl Into<String>) -> Self {
        Node {
            id: NodeId::fresh(),
            scope: scope.into(),
            name: None,
            children: Vec::new(),
            arcs: IndexSet::new(),
            tags: IndexSet::new(),
            is_root: false,
        }
    }

    /// Creates the tree root. Each document has exactly one root node.
    pub fn root(scope: impl Into<String>) -> Self {
        let mut node = Node::new(scope);
        node.is_root = true;
        node
    }

    /// Creates a non-root node with a qualified name.
    pub fn named(scope: impl Into<String>, name: impl Into<String>) -> Self {
        let mut node = Node::new(scope);
        node.name = Some(name.into());
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn arcs(&self) -> &IndexSet<NodeId> {
        &self.arcs
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn tags(&self) -> &IndexSet<String> {
        &self.tags
    }

    pub fn set_scope(&mut self, scope: impl Into<String>) {
        self.scope = scope.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Appends `child` to this node's ordered child list, taking ownership.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// The string name-pattern rules match against: the trailing `.`-separated
    /// segment of the qualified name, or the scope when the node is unnamed.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) => name.rsplit('.').next().unwrap_or(name),
            None => &self.scope,
        }
    }

    /// Inserts a directed arc `source -> target` somewhere in this subtree.
    ///
    /// Must be called on the tree root (or any ancestor of the source) so the
    /// full ancestor path is available for validation. Returns `Ok(true)` when
    /// the arc was inserted and `Ok(false)` when it was rejected: a node may
    /// not arc to itself, to any of its ancestors, or twice to the same
    /// target. Returns [`CoreError::NodeNotFound`] when `source` is not in
    /// this subtree.
    pub fn add_arc(&mut self, source: NodeId, target: NodeId) -> Result<bool, CoreError> {
        let mut ancestors = Vec::new();
        self.insert_arc(source, target, &mut ancestors)
            .ok_or(CoreError::NodeNotFound { id: source })
    }

    fn insert_arc(
        &mut self,
        source: NodeId,
        target: NodeId,
        ancestors: &mut Vec<NodeId>,
    ) -> Option<bool> {
        if self.id == source {
            if target == source || ancestors.contains(&target) {
                return Some(false);
            }
            return Some(self.arcs.insert(target));
        }
        ancestors.push(self.id);
        for child in &mut self.children {
            if let Some(inserted) = child.insert_arc(source, target, ancestors) {
                return Some(inserted);
            }
        }
        ancestors.pop();
        None
    }

    /// Finds a node in this subtree by id, including this node itself.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Depth-first iterator over all descendants, excluding this node itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Depth-first (document order) traversal over a subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (Node, NodeId, NodeId, NodeId) {
        let mut root = Node::root("module");
        let mut mid = Node::named("class", "app.Mid");
        let leaf = Node::named("function", "app.Mid.leaf");
        let leaf_id = leaf.id();
        let mid_id = mid.id();
        mid.add_child(leaf);
        let root_id = root.id();
        root.add_child(mid);
        (root, root_id, mid_id, leaf_id)
    }

    #[test]
    fn arc_insertion_and_duplicates() {
        let (mut root, _, mid_id, leaf_id) = sample_tree();
        let other = Node::new("class");
        let other_id = other.id();
        root.add_child(other);

        assert!(root.add_arc(leaf_id, other_id).unwrap());
        // duplicate arcs are rejected, not doubled
        assert!(!root.add_arc(leaf_id, other_id).unwrap());
        assert_eq!(root.find(leaf_id).unwrap().arcs().len(), 1);
        let _ = mid_id;
    }

    #[test]
    fn self_and_ancestor_arcs_are_silently_rejected() {
        let (mut root, root_id, mid_id, leaf_id) = sample_tree();
        assert!(!root.add_arc(leaf_id, leaf_id).unwrap());
        assert!(!root.add_arc(leaf_id, mid_id).unwrap());
        assert!(!root.add_arc(leaf_id, root_id).unwrap());
        assert!(root.find(leaf_id).unwrap().arcs().is_empty());
    }

    #[test]
    fn descendant_arcs_are_allowed() {
        let (mut root, root_id, _, leaf_id) = sample_tree();
        assert!(root.add_arc(root_id, leaf_id).unwrap());
    }

    #[test]
    fn unknown_source_is_an_error() {
        let (mut root, _, _, leaf_id) = sample_tree();
        let stranger = NodeId::fresh();
        let err = root.add_arc(stranger, leaf_id).unwrap_err();
        assert!(matches!(err, CoreError::NodeNotFound { id } if id == stranger));
    }

    #[test]
    fn descendants_in_document_order() {
        let (root, _, mid_id, leaf_id) = sample_tree();
        let ids: Vec<NodeId> = root.descendants().map(Node::id).collect();
        assert_eq!(ids, vec![mid_id, leaf_id]);
    }

    #[test]
    fn display_name_trailing_segment_and_scope_fallback() {
        let named = Node::named("function", "app.Mid.leaf");
        assert_eq!(named.display_name(), "leaf");
        let unnamed = Node::new("function");
        assert_eq!(unnamed.display_name(), "function");
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let (mut root, root_id, _, leaf_id) = sample_tree();
        root.add_arc(root_id, leaf_id).unwrap();
        let json = serde_json::to_string(&root).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), root_id);
        assert_eq!(back.descendants().count(), root.descendants().count());
        assert!(back.arcs().contains(&leaf_id));
    }
}
