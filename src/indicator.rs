//! Ball position for the circular G-meter face.
//!
//! 1 G moves the ball the full `max_displacement` from centre. Screen x grows
//! to the vehicle's right and screen y grows downward, so left load moves the
//! ball left and forward load moves it up. The result is clipped to the
//! displacement circle.

use serde::{Deserialize, Serialize};

use crate::types::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorOffset {
    pub x_px: f64,
    pub y_px: f64,
    pub clipped: bool,
}

pub fn ball_offset(filtered: Vec2, max_displacement: f64) -> IndicatorOffset {
    let x = -filtered.lateral * max_displacement;
    let y = -filtered.longitudinal * max_displacement;

    let r = x.hypot(y);
    if r > max_displacement {
        let scale = max_displacement / r;
        IndicatorOffset {
            x_px: x * scale,
            y_px: y * scale,
            clipped: true,
        }
    } else {
        IndicatorOffset {
            x_px: x,
            y_px: y,
            clipped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_centre_at_rest() {
        let off = ball_offset(Vec2::ZERO, 150.0);
        assert_eq!(off.x_px, 0.0);
        assert_eq!(off.y_px, 0.0);
        assert!(!off.clipped);
    }

    #[test]
    fn test_direction() {
        // half a G to the left and half a G of braking
        let off = ball_offset(Vec2::new(0.5, -0.5), 150.0);
        assert_abs_diff_eq!(off.x_px, -75.0, epsilon = 1e-9);
        assert_abs_diff_eq!(off.y_px, 75.0, epsilon = 1e-9);
        assert!(!off.clipped);
    }

    #[test]
    fn test_clipped_to_circle() {
        let off = ball_offset(Vec2::new(-1.2, 1.2), 150.0);
        assert!(off.clipped);
        assert_abs_diff_eq!(off.x_px.hypot(off.y_px), 150.0, epsilon = 1e-9);
        assert!(off.x_px > 0.0 && off.y_px < 0.0);
    }
}
