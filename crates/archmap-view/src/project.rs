//! The canonical projector.
//!
//! One depth-first recursion classifies every node into exactly one of four
//! states (hidden, flattened, unfolded, folded -- see
//! [`archmap_core::NodeState`]) and produces, per subtree, a composable
//! [`SubProjection`]: the visible nodes it contributes, a weighted raw-arc
//! map keyed by (source, destination), a destination-remap table, and the
//! folded/hidden id sets. Child sub-results are merged before the current
//! node's own state is applied.
//!
//! After the recursion, one final pass over the raw arc map:
//! 1. rewrite both endpoints through the remap table,
//! 2. drop arcs whose rewritten destination is hidden,
//! 3. drop arcs that collapsed onto themselves,
//! 4. merge weights colliding on the same rewritten pair,
//! 5. sort by (source, destination) for determinism.
//!
//! Total weight is conserved: every original arc whose endpoints survive
//! hiding (and whose flatten landings exist) is counted exactly once in the
//! output, merely reassigned and merged.
//!
//! The projector is a pure function of (tree, rule set); it is total -- every
//! valid input pair has a well-defined output and there is nothing to cancel
//! or abort.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use archmap_core::{Node, NodeId, NodeState, RuleSet};

use crate::geometry::GeometryConfig;
use crate::memo::{MemoKey, ProjectionMemo};
use crate::visible::{VisibleArc, VisibleGraph, VisibleNode};

/// Projects a source tree and a resolved rule set into a [`VisibleGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    geometry: GeometryConfig,
}

/// Composable per-subtree projection result.
#[derive(Debug, Clone, Default)]
pub(crate) struct SubProjection {
    /// Visible nodes contributed at this level (a flattened node contributes
    /// its risen children here instead of itself).
    visible: Vec<VisibleNode>,
    /// Raw weighted arcs keyed by (source, destination), pre-rewrite.
    weights: HashMap<(NodeId, NodeId), u64>,
    /// Final destination mapping for ids absorbed by a fold or flatten.
    remap: HashMap<NodeId, NodeId>,
    /// Ids absorbed into a folded boundary below this point.
    folded: HashSet<NodeId>,
    /// Ids inside hidden subtrees. Never remapped; arcs ending here drop.
    hidden: HashSet<NodeId>,
    /// Flattened ids still waiting for a landing ancestor.
    pending: Vec<NodeId>,
}

impl SubProjection {
    fn absorb(&mut self, other: SubProjection) {
        self.visible.extend(other.visible);
        for (pair, weight) in other.weights {
            *self.weights.entry(pair).or_insert(0) += weight;
        }
        self.remap.extend(other.remap);
        self.folded.extend(other.folded);
        self.hidden.extend(other.hidden);
        self.pending.extend(other.pending);
    }

    fn add_own_arcs(&mut self, node: &Node) {
        for &target in node.arcs() {
            *self.weights.entry((node.id(), target)).or_insert(0) += 1;
        }
    }

    fn hide_subtree(&mut self, node: &Node) {
        self.hidden.insert(node.id());
        for descendant in node.descendants() {
            self.hidden.insert(descendant.id());
        }
    }
}

impl Projector {
    pub fn new(geometry: GeometryConfig) -> Self {
        Projector { geometry }
    }

    pub fn geometry(&self) -> GeometryConfig {
        self.geometry
    }

    /// Projects with a fresh memo, dropped on return.
    pub fn project(&self, root: &Node, rules: &RuleSet) -> VisibleGraph {
        let mut memo = ProjectionMemo::new();
        self.project_with_memo(root, rules, &mut memo)
    }

    /// Projects reusing a caller-owned memo across recomputations of the same
    /// tree under changing rule sets. Output is identical to [`Self::project`].
    pub fn project_with_memo(
        &self,
        root: &Node,
        rules: &RuleSet,
        memo: &mut ProjectionMemo,
    ) -> VisibleGraph {
        let fingerprint = rules.structural_fingerprint();
        let mut sub = self.project_node(root, rules, fingerprint, memo);

        // Flattened ids that never found a landing ancestor (a flattened
        // root) have no visible counterpart; arcs touching them drop.
        let unlanded: HashSet<NodeId> = sub.pending.iter().copied().collect();

        let mut merged: BTreeMap<(NodeId, NodeId), u64> = BTreeMap::new();
        for (&(source, destination), &weight) in &sub.weights {
            let source = sub.remap.get(&source).copied().unwrap_or(source);
            let destination = sub
                .remap
                .get(&destination)
                .copied()
                .unwrap_or(destination);
            if sub.hidden.contains(&destination) {
                continue;
            }
            if unlanded.contains(&source) || unlanded.contains(&destination) {
                continue;
            }
            if source == destination {
                continue;
            }
            *merged.entry((source, destination)).or_insert(0) += weight;
        }
        let arcs: Vec<VisibleArc> = merged
            .into_iter()
            .map(|((source, destination), weight)| VisibleArc {
                source,
                destination,
                weight,
            })
            .collect();

        let mut incoming: HashMap<NodeId, u64> = HashMap::new();
        let mut outgoing: HashMap<NodeId, u64> = HashMap::new();
        for arc in &arcs {
            *outgoing.entry(arc.source).or_insert(0) += arc.weight;
            *incoming.entry(arc.destination).or_insert(0) += arc.weight;
        }
        let mut roots = std::mem::take(&mut sub.visible);
        annotate_arc_weights(&mut roots, &incoming, &outgoing);

        debug!(
            nodes = roots.len(),
            arcs = arcs.len(),
            memo_entries = memo.len(),
            "projected visible graph"
        );
        VisibleGraph::new(roots, arcs)
    }

    fn project_node(
        &self,
        node: &Node,
        rules: &RuleSet,
        fingerprint: u64,
        memo: &mut ProjectionMemo,
    ) -> SubProjection {
        let key = MemoKey {
            node: node.id(),
            rules: fingerprint,
        };
        if let Some(hit) = memo.get(&key) {
            return hit;
        }
        let sub = match rules.state_of(node.id()) {
            NodeState::Hidden => {
                let mut sub = SubProjection::default();
                sub.hide_subtree(node);
                sub
            }
            NodeState::Flattened => {
                let mut sub = self.project_children(node, rules, fingerprint, memo);
                sub.add_own_arcs(node);
                sub.pending.push(node.id());
                sub
            }
            NodeState::Unfolded => {
                let mut sub = self.project_children(node, rules, fingerprint, memo);
                sub.add_own_arcs(node);
                // risen children of flattened descendants land here, and so
                // do arcs addressed at those flattened ids
                for flattened in std::mem::take(&mut sub.pending) {
                    sub.remap.insert(flattened, node.id());
                }
                let children = std::mem::take(&mut sub.visible);
                let radius = self.geometry.enclosing_radius(&children);
                sub.visible.push(VisibleNode {
                    id: node.id(),
                    scope: node.scope().to_string(),
                    name: node.name().map(str::to_string),
                    children,
                    radius,
                    in_arc_weight: 0,
                    out_arc_weight: 0,
                    is_fixed: rules.is_fixed(node.id()),
                });
                sub
            }
            NodeState::Folded => self.fold_subtree(node, rules),
        };
        memo.insert(key, sub.clone());
        sub
    }

    fn project_children(
        &self,
        node: &Node,
        rules: &RuleSet,
        fingerprint: u64,
        memo: &mut ProjectionMemo,
    ) -> SubProjection {
        let mut sub = SubProjection::default();
        for child in node.children() {
            sub.absorb(self.project_node(child, rules, fingerprint, memo));
        }
        sub
    }

    /// Default state: the node becomes a visible leaf and every non-hidden
    /// descendant, at arbitrary depth, is mapped onto its id. Only hiding
    /// still applies inside the boundary; unfold and flatten rules on fold
    /// descendants are inert.
    fn fold_subtree(&self, node: &Node, rules: &RuleSet) -> SubProjection {
        let mut sub = SubProjection::default();
        sub.add_own_arcs(node);
        Self::fold_children(node, node.id(), rules, &mut sub);
        // arcs staying wholly inside this fold would collapse to self-arcs
        let folded = std::mem::take(&mut sub.folded);
        sub.weights
            .retain(|&(_, destination), _| !folded.contains(&destination));
        sub.folded = folded;
        sub.visible.push(VisibleNode {
            id: node.id(),
            scope: node.scope().to_string(),
            name: node.name().map(str::to_string),
            children: Vec::new(),
            radius: self.geometry.leaf_radius(),
            in_arc_weight: 0,
            out_arc_weight: 0,
            is_fixed: rules.is_fixed(node.id()),
        });
        sub
    }

    fn fold_children(parent: &Node, boundary: NodeId, rules: &RuleSet, sub: &mut SubProjection) {
        for child in parent.children() {
            if rules.is_hidden(child.id()) {
                sub.hide_subtree(child);
                continue;
            }
            sub.folded.insert(child.id());
            sub.remap.insert(child.id(), boundary);
            sub.add_own_arcs(child);
            Self::fold_children(child, boundary, rules, sub);
        }
    }
}

fn annotate_arc_weights(
    nodes: &mut [VisibleNode],
    incoming: &HashMap<NodeId, u64>,
    outgoing: &HashMap<NodeId, u64>,
) {
    for node in nodes {
        node.in_arc_weight = incoming.get(&node.id).copied().unwrap_or(0);
        node.out_arc_weight = outgoing.get(&node.id).copied().unwrap_or(0);
        annotate_arc_weights(&mut node.children, incoming, outgoing);
    }
}
