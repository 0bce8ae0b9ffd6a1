//! Small fixed-size vectors for the G-meter signal chain
//!
//! `Vec3` carries device-frame acceleration in m/s², `Vec2` carries
//! vehicle-frame load in G.

use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// Standard gravity, 1 G in m/s²
pub const STANDARD_GRAVITY: f64 = 9.80665;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Vehicle-frame load. `lateral > 0` is toward the vehicle's left,
/// `longitudinal > 0` is forward (throttle), braking is negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub lateral: f64,
    pub longitudinal: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { lateral: 0.0, longitudinal: 0.0 };

    pub fn new(lateral: f64, longitudinal: f64) -> Self {
        Self { lateral, longitudinal }
    }

    /// Euclidean norm (combined G)
    pub fn magnitude(&self) -> f64 {
        self.lateral.hypot(self.longitudinal)
    }
}
