//! Projection of a source node tree into the visible graph.
//!
//! Everything in this crate is a pure derivation: given the immutable tree
//! from archmap-core and a resolved first-order rule set, the
//! [`Projector`] computes a reduced visible tree plus an aggregated,
//! weight-conserving arc list. The rendering and physics layers consume the
//! output; nothing here performs I/O.

pub mod align;
pub mod geometry;
pub mod memo;
pub mod project;
pub mod visible;

pub use align::align;
pub use geometry::GeometryConfig;
pub use memo::ProjectionMemo;
pub use project::Projector;
pub use visible::{VisibleArc, VisibleGraph, VisibleNode};
