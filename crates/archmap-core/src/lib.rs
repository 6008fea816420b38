pub mod color;
pub mod error;
pub mod id;
pub mod node;
pub mod resolve;
pub mod rule;

// Re-export commonly used types
pub use color::Color;
pub use error::CoreError;
pub use id::NodeId;
pub use node::Node;
pub use resolve::{resolve, Resolver};
pub use rule::{
    rules_from_json, rules_to_json, FirstOrderRule, NodeState, RuleSet, SecondOrderRule,
};
