//! Golden-angle spiral placement of trees in the forest.

use crate::core::types::{GOLDEN_ANGLE_DEGREES, Position};

/// Angle in degrees of the `index`-th tree on the spiral.
pub fn golden_angle(index: u32) -> f64 {
    f64::from(index) * GOLDEN_ANGLE_DEGREES
}

/// Position of the `index`-th tree (index = number of the owner's prior trees).
pub fn golden_angle_position(index: u32, radius: f64) -> Position {
    let angle = golden_angle(index).to_radians();
    Position {
        x: radius * angle.cos(),
        z: radius * angle.sin(),
    }
}
