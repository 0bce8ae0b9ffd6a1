use serde::{Deserialize, Serialize};

use crate::types::Vec2;

/// One EMA step, applied to each axis independently
pub fn ema(raw: Vec2, previous: Vec2, alpha: f64) -> Vec2 {
    Vec2::new(
        alpha * raw.lateral + (1.0 - alpha) * previous.lateral,
        alpha * raw.longitudinal + (1.0 - alpha) * previous.longitudinal,
    )
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredState {
    pub filtered: Vec2,
    pub magnitude: f64,
}

/// Exponential smoothing for the vehicle-frame G vector.
/// Smaller alpha is steadier but lags more.
#[derive(Clone, Debug)]
pub struct Smoother {
    alpha: f64,
    state: FilteredState,
}

impl Smoother {
    /// `alpha` must be in (0, 1]; `PipelineConfig::validate` enforces it
    pub fn new(alpha: f64) -> Self {
        Smoother {
            alpha,
            state: FilteredState::default(),
        }
    }

    pub fn update(&mut self, raw: Vec2) -> FilteredState {
        let filtered = ema(raw, self.state.filtered, self.alpha);
        self.state = FilteredState {
            filtered,
            magnitude: filtered.magnitude(),
        };
        self.state
    }

    /// Back to (0, 0); called on every new zero point
    pub fn reset(&mut self) {
        self.state = FilteredState::default();
    }

    pub fn state(&self) -> FilteredState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_alpha_one_passes_through() {
        let mut smoother = Smoother::new(1.0);
        let out = smoother.update(Vec2::new(0.3, -0.4));
        assert_eq!(out.filtered, Vec2::new(0.3, -0.4));
        assert_abs_diff_eq!(out.magnitude, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_single_step() {
        let out = ema(Vec2::new(1.0, -1.0), Vec2::new(0.5, 0.5), 0.2);
        assert_abs_diff_eq!(out.lateral, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(out.longitudinal, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_input_stays_zero() {
        for alpha in [0.08, 0.2, 0.3, 1.0] {
            let mut smoother = Smoother::new(alpha);
            let out = smoother.update(Vec2::ZERO);
            assert_eq!(out.magnitude, 0.0);
        }
    }

    #[test]
    fn test_convergence_bound() {
        for alpha in [0.08_f64, 0.2, 0.3] {
            let target = Vec2::new(0.7, -0.35);
            let bound = (1e-6_f64.ln() / (1.0 - alpha).ln()).ceil() as usize;
            let mut smoother = Smoother::new(alpha);
            let mut prev_err = f64::INFINITY;
            for _ in 0..bound {
                let out = smoother.update(target);
                let err = (out.filtered.lateral - target.lateral)
                    .abs()
                    .max((out.filtered.longitudinal - target.longitudinal).abs());
                assert!(err < prev_err, "error did not shrink");
                prev_err = err;
            }
            assert!(prev_err < 1e-6, "alpha {} err {}", alpha, prev_err);
        }
    }

    #[test]
    fn test_reset() {
        let mut smoother = Smoother::new(0.3);
        smoother.update(Vec2::new(1.0, 1.0));
        smoother.reset();
        assert_eq!(smoother.state(), FilteredState::default());
        let out = smoother.update(Vec2::new(1.0, 0.0));
        assert_abs_diff_eq!(out.filtered.lateral, 0.3, epsilon = 1e-12);
    }
}
