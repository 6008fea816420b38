//! Area-preserving radius aggregation.
//!
//! Replacing N child circles with one enclosing circle keeps the total
//! enclosed area, scaled by a configurable multiplier that leaves breathing
//! room between siblings. Both constants are configuration inputs, not engine
//! constants.

use serde::{Deserialize, Serialize};

use crate::visible::VisibleNode;

/// Radius configuration for the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Radius of a visible leaf.
    pub base_radius: f64,
    /// Area scale applied when enclosing visible children.
    pub area_multiplier: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            base_radius: 1.0,
            area_multiplier: 4.0,
        }
    }
}

impl GeometryConfig {
    pub fn leaf_radius(&self) -> f64 {
        self.base_radius
    }

    /// `max(base_radius, sqrt(area_multiplier * Σ child.radius²))`.
    pub fn enclosing_radius(&self, children: &[VisibleNode]) -> f64 {
        let area: f64 = children.iter().map(|child| child.radius * child.radius).sum();
        self.base_radius.max((self.area_multiplier * area).sqrt())
    }
}
