//! The two-tier transformation rule vocabulary.
//!
//! - **First-order rules** ([`FirstOrderRule`]) are concrete: they address one
//!   node by id and are what the projector acts on.
//! - **Second-order rules** ([`SecondOrderRule`]) are declarative and
//!   author-facing: scope-exact and pattern-based variants that the resolver
//!   expands into first-order rules with one full tree walk (see
//!   [`crate::resolve`]).
//!
//! A resolved rule set is held as a [`RuleSet`], which answers per-kind
//! membership in O(1) and classifies every node into exactly one
//! [`NodeState`] under the fixed precedence Hidden > Flattened > Unfolded >
//! Folded. More than one rule targeting the same id is not an error; the
//! precedence decides.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::CoreError;
use crate::id::NodeId;

/// A concrete rule addressed at one node id. `Fix` and `Color` are carried
/// through to the output unchanged; they never affect structure or arcs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirstOrderRule {
    Unfold { id: NodeId },
    Hide { id: NodeId },
    Flatten { id: NodeId },
    Fix { id: NodeId },
    Color { id: NodeId, color: Color },
}

/// A declarative, author-facing rule.
///
/// Concrete variants pass through resolution untouched. Scope variants
/// compare the scope string for equality. `*Nodes` patterns match against the
/// node's display name (the trailing segment of the qualified name, falling
/// back to the scope); `*Scopes` patterns match against the scope. A malformed
/// pattern never matches -- it does not abort resolution.
///
/// `Fix` has no second-order form; fixing comes from the interaction layer as
/// a first-order rule directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondOrderRule {
    Unfold { id: NodeId },
    Hide { id: NodeId },
    Flatten { id: NodeId },
    Color { id: NodeId, color: Color },
    UnfoldScope { scope: String },
    HideScope { scope: String },
    FlattenScope { scope: String },
    ColorScope { scope: String, color: Color },
    UnfoldNodes { pattern: String },
    HideNodes { pattern: String },
    FlattenNodes { pattern: String },
    ColorNodes { pattern: String, color: Color },
    UnfoldScopes { pattern: String },
    HideScopes { pattern: String },
    FlattenScopes { pattern: String },
    ColorScopes { pattern: String, color: Color },
}

/// The projection state a node is classified into. Exactly one per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Excluded from both outputs together with its whole subtree.
    Hidden,
    /// Omitted from the visible tree; children rise to its position.
    Flattened,
    /// A visible container; projection recurses into its children.
    Unfolded,
    /// The default: a visible leaf absorbing all descendant structure.
    Folded,
}

/// A resolved set of first-order rules with per-kind O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    unfolded: IndexSet<NodeId>,
    hidden: IndexSet<NodeId>,
    flattened: IndexSet<NodeId>,
    fixed: IndexSet<NodeId>,
    colors: IndexMap<NodeId, Color>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    pub fn insert(&mut self, rule: FirstOrderRule) {
        match rule {
            FirstOrderRule::Unfold { id } => {
                self.unfolded.insert(id);
            }
            FirstOrderRule::Hide { id } => {
                self.hidden.insert(id);
            }
            FirstOrderRule::Flatten { id } => {
                self.flattened.insert(id);
            }
            FirstOrderRule::Fix { id } => {
                self.fixed.insert(id);
            }
            FirstOrderRule::Color { id, color } => {
                self.colors.insert(id, color);
            }
        }
    }

    /// Classifies a node under the fixed precedence
    /// Hidden > Flattened > Unfolded > Folded. The ordering of these checks
    /// is the contract; do not reorder.
    pub fn state_of(&self, id: NodeId) -> NodeState {
        if self.hidden.contains(&id) {
            NodeState::Hidden
        } else if self.flattened.contains(&id) {
            NodeState::Flattened
        } else if self.unfolded.contains(&id) {
            NodeState::Unfolded
        } else {
            NodeState::Folded
        }
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.hidden.contains(&id)
    }

    pub fn is_fixed(&self, id: NodeId) -> bool {
        self.fixed.contains(&id)
    }

    pub fn color_of(&self, id: NodeId) -> Option<Color> {
        self.colors.get(&id).copied()
    }

    /// Number of rules in the set, colors included.
    pub fn len(&self) -> usize {
        self.unfolded.len()
            + self.hidden.len()
            + self.flattened.len()
            + self.fixed.len()
            + self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A hash over the structure-affecting rules (hide, flatten, unfold, fix),
    /// independent of insertion order. Colors are excluded -- they never
    /// change projection output -- so recoloring keeps memo entries valid.
    pub fn structural_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (tag, set) in [
            (0u8, &self.hidden),
            (1, &self.flattened),
            (2, &self.unfolded),
            (3, &self.fixed),
        ] {
            tag.hash(&mut hasher);
            let mut ids: Vec<NodeId> = set.iter().copied().collect();
            ids.sort_unstable();
            ids.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl Extend<FirstOrderRule> for RuleSet {
    fn extend<T: IntoIterator<Item = FirstOrderRule>>(&mut self, iter: T) {
        for rule in iter {
            self.insert(rule);
        }
    }
}

impl FromIterator<FirstOrderRule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = FirstOrderRule>>(iter: T) -> Self {
        let mut rules = RuleSet::new();
        rules.extend(iter);
        rules
    }
}

/// Parses a second-order rule document, as handed over by the settings layer.
pub fn rules_from_json(json: &str) -> Result<IndexSet<SecondOrderRule>, CoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes a second-order rule set for the settings layer.
pub fn rules_to_json(rules: &IndexSet<SecondOrderRule>) -> Result<String, CoreError> {
    Ok(serde_json::to_string(rules)?)
}
