use serde::{Deserialize, Serialize};

use crate::config::EAT_MASS_RATIO;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Drop the fractional part of both coordinates, toward zero.
    pub fn truncated(self) -> Self {
        Position {
            x: self.x.trunc(),
            y: self.y.trunc(),
        }
    }
}

/// Axis-aligned query rectangle. `top` is the smaller y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn around(center: Position, half_extent: f64) -> Self {
        BoundingBox {
            left: center.x - half_extent,
            right: center.x + half_extent,
            top: center.y - half_extent,
            bottom: center.y + half_extent,
        }
    }

    pub fn contains(&self, p: Position) -> bool {
        p.y <= self.bottom && p.y >= self.top && p.x <= self.right && p.x >= self.left
    }
}

pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// Cheap square test used before the exact distance check.
/// The reach is truncated to whole units.
pub fn simple_collide(x1: f64, y1: f64, other: Position, reach: f64) -> bool {
    let len = reach.trunc();
    (x1 - other.x).abs() < len && (y1 - other.y).abs() < len
}

/// Mass rule for eating: the prey must be clearly smaller.
pub fn outweighs(eater_mass: f64, prey_mass: f64) -> bool {
    prey_mass * EAT_MASS_RATIO < eater_mass
}

/// Unit travel vector for a heading; headings are measured from the +y axis.
pub fn heading(angle: f64) -> (f64, f64) {
    (angle.sin(), angle.cos())
}
