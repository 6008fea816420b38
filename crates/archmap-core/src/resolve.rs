//! Second-order rule resolution.
//!
//! [`Resolver::resolve`] expands a declarative second-order rule set into the
//! concrete first-order [`RuleSet`] the projector consumes, with one
//! depth-first walk over the whole tree. Every rule is evaluated against
//! every node independently and the results are unioned, so walk order does
//! not affect the outcome.
//!
//! Patterns are compiled once per resolve. A pattern that fails to compile
//! becomes a never-matching rule: it contributes nothing, and it does not
//! abort resolution of other rules or other nodes.
//!
//! Interactive editing re-resolves the same rule set against unchanged
//! subtrees constantly, so per-node results are memoized by
//! (node id, rule-set fingerprint) inside the `Resolver` value. The memo is
//! owned, never global; drop the `Resolver` to drop the cache.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use regex::Regex;
use smallvec::SmallVec;
use tracing::debug;

use crate::color::Color;
use crate::id::NodeId;
use crate::node::Node;
use crate::rule::{FirstOrderRule, RuleSet, SecondOrderRule};

type Contribution = SmallVec<[FirstOrderRule; 4]>;

/// Expands second-order rules into first-order rules, memoizing per-node
/// results across calls.
#[derive(Debug, Default)]
pub struct Resolver {
    memo: HashMap<(NodeId, u64), Contribution>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Resolves `rules` against the tree rooted at `root`.
    pub fn resolve(&mut self, root: &Node, rules: &IndexSet<SecondOrderRule>) -> RuleSet {
        let fingerprint = rule_set_fingerprint(rules);
        let (mut resolved, compiled) = compile(rules);
        self.walk(root, &compiled, fingerprint, &mut resolved);
        debug!(
            second_order = rules.len(),
            first_order = resolved.len(),
            "resolved rule set"
        );
        resolved
    }

    /// Number of memoized per-node entries.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn clear_memo(&mut self) {
        self.memo.clear();
    }

    fn walk(&mut self, node: &Node, compiled: &[CompiledRule], fingerprint: u64, out: &mut RuleSet) {
        let key = (node.id(), fingerprint);
        if let Some(hit) = self.memo.get(&key) {
            out.extend(hit.iter().copied());
        } else {
            let contribution: Contribution = compiled
                .iter()
                .filter(|rule| rule.matches(node))
                .map(|rule| rule.action.applied_to(node.id()))
                .collect();
            out.extend(contribution.iter().copied());
            self.memo.insert(key, contribution);
        }
        for child in node.children() {
            self.walk(child, compiled, fingerprint, out);
        }
    }
}

/// One-shot resolution with a throwaway memo.
pub fn resolve(root: &Node, rules: &IndexSet<SecondOrderRule>) -> RuleSet {
    Resolver::new().resolve(root, rules)
}

/// What a matching rule contributes for the matched node.
#[derive(Debug, Clone, Copy)]
enum Action {
    Unfold,
    Hide,
    Flatten,
    Color(Color),
}

impl Action {
    fn applied_to(self, id: NodeId) -> FirstOrderRule {
        match self {
            Action::Unfold => FirstOrderRule::Unfold { id },
            Action::Hide => FirstOrderRule::Hide { id },
            Action::Flatten => FirstOrderRule::Flatten { id },
            Action::Color(color) => FirstOrderRule::Color { id, color },
        }
    }
}

/// What a rule matches on. A malformed pattern compiles to `None` and never
/// matches.
#[derive(Debug)]
enum Matcher {
    ScopeExact(String),
    NamePattern(Option<Regex>),
    ScopePattern(Option<Regex>),
}

#[derive(Debug)]
struct CompiledRule {
    matcher: Matcher,
    action: Action,
}

impl CompiledRule {
    fn matches(&self, node: &Node) -> bool {
        match &self.matcher {
            Matcher::ScopeExact(scope) => node.scope() == scope,
            Matcher::NamePattern(regex) => regex
                .as_ref()
                .is_some_and(|re| re.is_match(node.display_name())),
            Matcher::ScopePattern(regex) => {
                regex.as_ref().is_some_and(|re| re.is_match(node.scope()))
            }
        }
    }
}

/// Splits a second-order set into concrete pass-throughs (already first-order
/// in all but name) and compiled declarative rules.
fn compile(rules: &IndexSet<SecondOrderRule>) -> (RuleSet, Vec<CompiledRule>) {
    let mut concrete = RuleSet::new();
    let mut compiled = Vec::new();
    for rule in rules {
        match rule {
            SecondOrderRule::Unfold { id } => concrete.insert(FirstOrderRule::Unfold { id: *id }),
            SecondOrderRule::Hide { id } => concrete.insert(FirstOrderRule::Hide { id: *id }),
            SecondOrderRule::Flatten { id } => concrete.insert(FirstOrderRule::Flatten { id: *id }),
            SecondOrderRule::Color { id, color } => concrete.insert(FirstOrderRule::Color {
                id: *id,
                color: *color,
            }),
            SecondOrderRule::UnfoldScope { scope } => compiled.push(CompiledRule {
                matcher: Matcher::ScopeExact(scope.clone()),
                action: Action::Unfold,
            }),
            SecondOrderRule::HideScope { scope } => compiled.push(CompiledRule {
                matcher: Matcher::ScopeExact(scope.clone()),
                action: Action::Hide,
            }),
            SecondOrderRule::FlattenScope { scope } => compiled.push(CompiledRule {
                matcher: Matcher::ScopeExact(scope.clone()),
                action: Action::Flatten,
            }),
            SecondOrderRule::ColorScope { scope, color } => compiled.push(CompiledRule {
                matcher: Matcher::ScopeExact(scope.clone()),
                action: Action::Color(*color),
            }),
            SecondOrderRule::UnfoldNodes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::NamePattern(Regex::new(pattern).ok()),
                action: Action::Unfold,
            }),
            SecondOrderRule::HideNodes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::NamePattern(Regex::new(pattern).ok()),
                action: Action::Hide,
            }),
            SecondOrderRule::FlattenNodes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::NamePattern(Regex::new(pattern).ok()),
                action: Action::Flatten,
            }),
            SecondOrderRule::ColorNodes { pattern, color } => compiled.push(CompiledRule {
                matcher: Matcher::NamePattern(Regex::new(pattern).ok()),
                action: Action::Color(*color),
            }),
            SecondOrderRule::UnfoldScopes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::ScopePattern(Regex::new(pattern).ok()),
                action: Action::Unfold,
            }),
            SecondOrderRule::HideScopes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::ScopePattern(Regex::new(pattern).ok()),
                action: Action::Hide,
            }),
            SecondOrderRule::FlattenScopes { pattern } => compiled.push(CompiledRule {
                matcher: Matcher::ScopePattern(Regex::new(pattern).ok()),
                action: Action::Flatten,
            }),
            SecondOrderRule::ColorScopes { pattern, color } => compiled.push(CompiledRule {
                matcher: Matcher::ScopePattern(Regex::new(pattern).ok()),
                action: Action::Color(*color),
            }),
        }
    }
    (concrete, compiled)
}

/// Order-independent fingerprint of a second-order rule set.
fn rule_set_fingerprint(rules: &IndexSet<SecondOrderRule>) -> u64 {
    rules
        .iter()
        .map(|rule| {
            let mut hasher = DefaultHasher::new();
            rule.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::NodeState;

    fn tree() -> Node {
        let mut root = Node::root("module");
        let mut class = Node::named("class", "app.Window");
        class.add_child(Node::named("function", "app.Window.draw"));
        class.add_child(Node::named("function", "app.Window.resize"));
        root.add_child(class);
        root.add_child(Node::new("import"));
        root
    }

    fn id_of(root: &Node, name: &str) -> NodeId {
        std::iter::once(root)
            .chain(root.descendants())
            .find(|n| n.name() == Some(name))
            .map(Node::id)
            .unwrap()
    }

    #[test]
    fn scope_exact_matches_every_node_with_that_scope() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::HideScope {
            scope: "function".into(),
        });
        let resolved = resolve(&root, &rules);
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window.draw")),
            NodeState::Hidden
        );
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window.resize")),
            NodeState::Hidden
        );
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window")),
            NodeState::Folded
        );
    }

    #[test]
    fn name_pattern_matches_trailing_segment() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::UnfoldNodes {
            pattern: "^draw$".into(),
        });
        let resolved = resolve(&root, &rules);
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window.draw")),
            NodeState::Unfolded
        );
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window.resize")),
            NodeState::Folded
        );
    }

    #[test]
    fn name_pattern_falls_back_to_scope_for_unnamed_nodes() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::HideNodes {
            pattern: "^import$".into(),
        });
        let resolved = resolve(&root, &rules);
        let import = root
            .descendants()
            .find(|n| n.scope() == "import")
            .map(Node::id)
            .unwrap();
        assert_eq!(resolved.state_of(import), NodeState::Hidden);
    }

    #[test]
    fn scope_pattern_matches_scope() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::UnfoldScopes {
            pattern: "mod|class".into(),
        });
        let resolved = resolve(&root, &rules);
        assert_eq!(resolved.state_of(root.id()), NodeState::Unfolded);
        assert_eq!(
            resolved.state_of(id_of(&root, "app.Window")),
            NodeState::Unfolded
        );
    }

    #[test]
    fn malformed_pattern_only_fails_to_contribute() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::UnfoldNodes {
            pattern: "([unclosed".into(),
        });
        rules.insert(SecondOrderRule::HideScope {
            scope: "import".into(),
        });
        let resolved = resolve(&root, &rules);
        // the bad pattern contributed nothing, the good rule still resolved
        let import = root
            .descendants()
            .find(|n| n.scope() == "import")
            .map(Node::id)
            .unwrap();
        assert_eq!(resolved.state_of(import), NodeState::Hidden);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn concrete_rules_pass_through() {
        let root = tree();
        let class = id_of(&root, "app.Window");
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::Flatten { id: class });
        rules.insert(SecondOrderRule::Color {
            id: class,
            color: Color::rgb(1, 2, 3),
        });
        let resolved = resolve(&root, &rules);
        assert_eq!(resolved.state_of(class), NodeState::Flattened);
        assert_eq!(resolved.color_of(class), Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn memoized_resolution_is_identical() {
        let root = tree();
        let mut rules = IndexSet::new();
        rules.insert(SecondOrderRule::UnfoldScopes {
            pattern: ".*".into(),
        });
        let mut resolver = Resolver::new();
        let first = resolver.resolve(&root, &rules);
        assert!(resolver.memo_len() > 0);
        let second = resolver.resolve(&root, &rules);
        assert_eq!(first, second);
    }
}
