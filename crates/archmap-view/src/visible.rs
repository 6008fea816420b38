//! Visible-graph output types and their read-only views.
//!
//! [`VisibleGraph`] is the single canonical projection result: a visible node
//! forest plus the aggregated arc list. Narrower shapes the renderer may want
//! (arc-only, node-only, per-node weights) are views over this one result,
//! never separately re-derived.
//!
//! Everything here is ephemeral: rebuilt on every projection, disposable
//! afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use archmap_core::NodeId;

use crate::align;

/// A node of the visible tree, annotated with the physics parameters the
/// layout layer uses: an area-derived radius, aggregated in/out arc weights,
/// and the fixed-position flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleNode {
    pub id: NodeId,
    pub scope: String,
    pub name: Option<String>,
    pub children: Vec<VisibleNode>,
    pub radius: f64,
    pub in_arc_weight: u64,
    pub out_arc_weight: u64,
    pub is_fixed: bool,
}

impl VisibleNode {
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let indent = "\t".repeat(level);
        writeln!(f, "{indent}id: {}", self.id)?;
        writeln!(f, "{indent}scope: {}", self.scope)?;
        if let Some(name) = &self.name {
            writeln!(f, "{indent}name: {name}")?;
        }
        writeln!(f, "{indent}radius: {}", self.radius)?;
        for child in &self.children {
            child.fmt_nested(f, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for VisibleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, 0)
    }
}

/// An aggregated directed edge between two visible nodes. `weight` counts the
/// original arcs absorbed into this edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleArc {
    pub source: NodeId,
    pub destination: NodeId,
    pub weight: u64,
}

/// The canonical projection result: visible node forest + aggregated arcs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisibleGraph {
    roots: Vec<VisibleNode>,
    arcs: Vec<VisibleArc>,
}

impl VisibleGraph {
    pub(crate) fn new(roots: Vec<VisibleNode>, arcs: Vec<VisibleArc>) -> Self {
        VisibleGraph { roots, arcs }
    }

    /// Top-level visible nodes. A forest rather than a single tree: a
    /// flattened root splices its children to the top level.
    pub fn roots(&self) -> &[VisibleNode] {
        &self.roots
    }

    /// Aggregated arcs, sorted by (source, destination).
    pub fn arcs(&self) -> &[VisibleArc] {
        &self.arcs
    }

    /// Depth-first iterator over every visible node, containers included.
    pub fn nodes(&self) -> VisibleNodes<'_> {
        VisibleNodes {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&VisibleNode> {
        self.nodes().find(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Sum of all visible arc weights.
    pub fn total_arc_weight(&self) -> u64 {
        self.arcs.iter().map(|arc| arc.weight).sum()
    }

    /// Reorders this graph's node forest to match `previous` by id, keeping
    /// unchanged nodes at stable positions for incremental re-rendering. Arcs
    /// and node attributes are untouched.
    pub fn aligned_with(mut self, previous: &VisibleGraph) -> VisibleGraph {
        self.roots = align::align(std::mem::take(&mut self.roots), &previous.roots);
        self
    }

    pub fn into_parts(self) -> (Vec<VisibleNode>, Vec<VisibleArc>) {
        (self.roots, self.arcs)
    }
}

/// Depth-first traversal over the visible forest.
pub struct VisibleNodes<'a> {
    stack: Vec<&'a VisibleNode>,
}

impl<'a> Iterator for VisibleNodes<'a> {
    type Item = &'a VisibleNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u64) -> VisibleNode {
        VisibleNode {
            id: NodeId(id),
            scope: "leaf".into(),
            name: None,
            children: Vec::new(),
            radius: 1.0,
            in_arc_weight: 0,
            out_arc_weight: 0,
            is_fixed: false,
        }
    }

    #[test]
    fn nodes_iterates_depth_first() {
        let mut container = leaf(0);
        container.children = vec![leaf(1), leaf(2)];
        let graph = VisibleGraph::new(vec![container, leaf(3)], Vec::new());
        let order: Vec<u64> = graph.nodes().map(|n| n.id.0).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn find_reaches_nested_nodes() {
        let mut container = leaf(0);
        container.children = vec![leaf(7)];
        let graph = VisibleGraph::new(vec![container], Vec::new());
        assert!(graph.find(NodeId(7)).is_some());
        assert!(graph.find(NodeId(8)).is_none());
    }

    #[test]
    fn total_arc_weight_sums() {
        let arcs = vec![
            VisibleArc {
                source: NodeId(0),
                destination: NodeId(1),
                weight: 2,
            },
            VisibleArc {
                source: NodeId(1),
                destination: NodeId(0),
                weight: 3,
            },
        ];
        let graph = VisibleGraph::new(Vec::new(), arcs);
        assert_eq!(graph.total_arc_weight(), 5);
    }
}
