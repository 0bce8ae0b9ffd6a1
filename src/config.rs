use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GMeterError, GResult};
use crate::types::Orientation;

/// Longest slip window accepted (about 2.5 minutes at 60 Hz)
pub const MAX_HISTORY_SIZE: usize = 10_000;

/// G-drop detection strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlipStrategy {
    /// Sliding window of recent magnitudes plus a time-based cooldown
    #[default]
    Windowed,
    /// Single running peak, zeroed when a warning fires
    DecayingPeak,
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // ── Axis mapping ──
    pub flip_lateral: bool,
    pub flip_longitudinal: bool,
    pub initial_orientation: Orientation,

    // ── EMA smoother ──
    pub alpha: f64,

    // ── Slip detection ──
    pub slip_strategy: SlipStrategy,
    pub decline_threshold_g: f64,
    pub slip_peak_min_g: f64,
    pub cooldown_ms: u64,
    pub history_size: usize,

    // ── Indicator ──
    pub max_displacement_px: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flip_lateral: false,
            flip_longitudinal: false,
            initial_orientation: Orientation::LandscapeLeft,
            alpha: 0.2,
            slip_strategy: SlipStrategy::Windowed,
            decline_threshold_g: 0.3,
            slip_peak_min_g: 0.4,
            cooldown_ms: 3000,
            history_size: 12,
            max_displacement_px: 150.0,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> GResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| GMeterError::ConfigIo(format!("{}: {}", path.display(), e)))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .map_err(|e| GMeterError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(GMeterError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.decline_threshold_g.is_finite() && self.decline_threshold_g > 0.0) {
            return Err(GMeterError::InvalidConfig(format!(
                "decline_threshold_g must be positive, got {}",
                self.decline_threshold_g
            )));
        }
        if !(self.slip_peak_min_g.is_finite() && self.slip_peak_min_g >= 0.0) {
            return Err(GMeterError::InvalidConfig(format!(
                "slip_peak_min_g must be non-negative, got {}",
                self.slip_peak_min_g
            )));
        }
        if self.history_size == 0 || self.history_size > MAX_HISTORY_SIZE {
            return Err(GMeterError::InvalidConfig(format!(
                "history_size must be in 1..={}, got {}",
                MAX_HISTORY_SIZE, self.history_size
            )));
        }
        if !(self.max_displacement_px.is_finite() && self.max_displacement_px > 0.0) {
            return Err(GMeterError::InvalidConfig(format!(
                "max_displacement_px must be positive, got {}",
                self.max_displacement_px
            )));
        }
        Ok(())
    }
}
