pub mod vector;

pub use vector::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GMeterError, GResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// One accelerometer event as delivered by the platform, gravity included.
/// Any axis may be missing (browsers report `null` until the sensor warms up).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: f64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl RawSample {
    pub fn new(timestamp: f64, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp,
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// All three axes, or the first one that is missing or not finite
    pub fn complete(&self) -> GResult<Vec3> {
        let x = axis_value(self.x, Axis::X)?;
        let y = axis_value(self.y, Axis::Y)?;
        let z = axis_value(self.z, Axis::Z)?;
        Ok(Vec3::new(x, y, z))
    }
}

fn axis_value(value: Option<f64>, axis: Axis) -> GResult<f64> {
    match value {
        None => Err(GMeterError::IncompleteSample { axis }),
        Some(v) if !v.is_finite() => Err(GMeterError::NonFiniteSample { axis }),
        Some(v) => Ok(v),
    }
}

/// Screen orientation reported by the platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    /// Bottom edge on the left (browser angle -90)
    #[default]
    LandscapeLeft,
    /// Bottom edge on the right (browser angle +90)
    LandscapeRight,
}

impl Orientation {
    /// Browser-style `window.orientation` angle
    pub fn from_angle(angle: i32) -> Option<Self> {
        match angle {
            0 | 180 => Some(Orientation::Portrait),
            -90 | 270 => Some(Orientation::LandscapeLeft),
            90 => Some(Orientation::LandscapeRight),
            _ => None,
        }
    }

    pub fn is_landscape(&self) -> bool {
        !matches!(self, Orientation::Portrait)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Portrait => "portrait",
            Orientation::LandscapeLeft => "landscape_left",
            Orientation::LandscapeRight => "landscape_right",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Orientation {
    type Err = GMeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape_left" | "left" => Ok(Orientation::LandscapeLeft),
            "landscape_right" | "right" => Ok(Orientation::LandscapeRight),
            other => Err(GMeterError::InvalidConfig(format!(
                "unknown orientation '{}'",
                other
            ))),
        }
    }
}

/// Everything the sensor collaborator can deliver, in arrival order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionEvent {
    Sample(RawSample),
    Orientation { orientation: Orientation },
    Calibrate,
    ResetPeaks,
    Stop,
    Start,
}
