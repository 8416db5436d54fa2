//! Continuous world-space positions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A position in game space, in projection-space units.
///
/// x runs left to right, y back to front, z up from the ground.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Point {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Point {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Returns a copy moved by the given offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_to_squared(self, other: Self) -> f32 {
        let d = self - other;
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    /// Distance to another point
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        self.distance_to_squared(other).sqrt()
    }

    /// Distance ignoring height.
    #[must_use]
    pub fn distance_to_horizontal(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
