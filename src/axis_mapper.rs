//! Device frame → vehicle frame
//!
//! The phone sits in landscape against the windshield or dash. Gravity then
//! runs along the device Y axis at rest, lateral load shows up on Y once the
//! zero point is removed, and fore/aft load shows up on Z (screen normal).
//!
//! Sign convention: lateral > 0 is toward the vehicle's left, longitudinal > 0
//! is forward. Which way +Y points depends on which edge the phone's bottom
//! is on, so the lateral sign follows the orientation:
//!
//! | orientation      | lateral | longitudinal |
//! |------------------|---------|--------------|
//! | landscape left   | -uy     | -uz          |
//! | landscape right  | +uy     | -uz          |
//! | portrait         | rejected               |
//!
//! `flip_lateral` / `flip_longitudinal` negate the result for mounts that
//! face the other way.

use crate::error::{GMeterError, GResult};
use crate::types::{Orientation, RawSample, Vec2, Vec3, STANDARD_GRAVITY};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisMapper {
    flip_lateral: bool,
    flip_longitudinal: bool,
}

impl AxisMapper {
    pub fn new(flip_lateral: bool, flip_longitudinal: bool) -> Self {
        Self {
            flip_lateral,
            flip_longitudinal,
        }
    }

    /// Subtract the zero point from a raw sample and map it to G
    pub fn map(&self, raw: &RawSample, offset: &Vec3, orientation: Orientation) -> GResult<Vec2> {
        let accel = raw.complete()?;
        self.map_user_accel(accel - *offset, orientation)
    }

    /// Map gravity-free device acceleration (m/s²) to vehicle-frame G
    pub fn map_user_accel(&self, user: Vec3, orientation: Orientation) -> GResult<Vec2> {
        let (lateral, longitudinal) = match orientation {
            Orientation::LandscapeLeft => (-user.y, -user.z),
            Orientation::LandscapeRight => (user.y, -user.z),
            Orientation::Portrait => return Err(GMeterError::UnsupportedOrientation(orientation)),
        };

        let lateral = if self.flip_lateral { -lateral } else { lateral };
        let longitudinal = if self.flip_longitudinal {
            -longitudinal
        } else {
            longitudinal
        };

        Ok(Vec2::new(
            lateral / STANDARD_GRAVITY,
            longitudinal / STANDARD_GRAVITY,
        ))
    }
}
