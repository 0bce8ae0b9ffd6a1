use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::{PipelineConfig, SlipStrategy, MAX_HISTORY_SIZE};

/// A sharp drop in combined G after a loaded phase (grip loss heuristic)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlipWarning {
    pub timestamp: f64,
    pub peak_g: f64,
    pub current_g: f64,
    pub decline_g: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipState {
    Idle,
    Cooldown,
}

/// G-drop detector.
///
/// Windowed: the last `history_size` magnitudes are kept; once the window is
/// full the current value (already in the window) is compared against the
/// window maximum, and a warning needs the cooldown to have elapsed.
///
/// Decaying peak: a single running maximum that is zeroed when a warning
/// fires, so it re-arms by itself without a timer.
pub struct SlipDetector {
    strategy: SlipStrategy,
    decline_threshold: f64,
    peak_min: f64,
    cooldown_ms: u64,
    history_size: usize,
    history: VecDeque<f64>,
    running_peak: f64,
    last_warning: Option<f64>,
}

impl SlipDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            strategy: config.slip_strategy,
            decline_threshold: config.decline_threshold_g,
            peak_min: config.slip_peak_min_g,
            cooldown_ms: config.cooldown_ms,
            history_size: config.history_size,
            history: VecDeque::with_capacity(config.history_size.min(MAX_HISTORY_SIZE)),
            running_peak: 0.0,
            last_warning: None,
        }
    }

    /// Feed one magnitude (G) at `timestamp` (seconds)
    pub fn check(&mut self, magnitude: f64, timestamp: f64) -> Option<SlipWarning> {
        let warning = match self.strategy {
            SlipStrategy::Windowed => self.check_windowed(magnitude, timestamp),
            SlipStrategy::DecayingPeak => self.check_decaying(magnitude, timestamp),
        };

        if let Some(ref w) = warning {
            self.last_warning = Some(timestamp);
            log::warn!(
                "G-drop warning: peak {:.2} G -> current {:.2} G (decline {:.2} G)",
                w.peak_g,
                w.current_g,
                w.decline_g
            );
        }
        warning
    }

    fn check_windowed(&mut self, magnitude: f64, timestamp: f64) -> Option<SlipWarning> {
        self.history.push_back(magnitude);
        while self.history.len() > self.history_size {
            self.history.pop_front();
        }
        if self.history.len() != self.history_size {
            return None;
        }

        let peak = self.history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let decline = peak - magnitude;

        if decline >= self.decline_threshold
            && peak >= self.peak_min
            && self.cooldown_elapsed(timestamp)
        {
            return Some(SlipWarning {
                timestamp,
                peak_g: peak,
                current_g: magnitude,
                decline_g: decline,
            });
        }
        None
    }

    fn check_decaying(&mut self, magnitude: f64, timestamp: f64) -> Option<SlipWarning> {
        self.running_peak = self.running_peak.max(magnitude);
        let peak = self.running_peak;

        if peak >= self.peak_min && magnitude < peak - self.decline_threshold {
            self.running_peak = 0.0;
            return Some(SlipWarning {
                timestamp,
                peak_g: peak,
                current_g: magnitude,
                decline_g: peak - magnitude,
            });
        }
        None
    }

    fn cooldown_elapsed(&self, timestamp: f64) -> bool {
        match self.last_warning {
            None => true,
            Some(last) => (timestamp - last) * 1000.0 > self.cooldown_ms as f64,
        }
    }

    /// Cooldown only exists for the windowed strategy
    pub fn state(&self, timestamp: f64) -> SlipState {
        match self.strategy {
            SlipStrategy::Windowed if self.last_warning.is_some() && !self.cooldown_elapsed(timestamp) => {
                SlipState::Cooldown
            }
            _ => SlipState::Idle,
        }
    }

    /// Drop magnitude history (window or running peak). The cooldown clock is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.running_peak = 0.0;
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_warning(&self) -> Option<f64> {
        self.last_warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn windowed() -> SlipDetector {
        SlipDetector::new(&PipelineConfig::default())
    }

    fn decaying() -> SlipDetector {
        SlipDetector::new(&PipelineConfig {
            slip_strategy: SlipStrategy::DecayingPeak,
            ..Default::default()
        })
    }

    #[test]
    fn test_drop_fires_then_cooldown_suppresses() {
        let mut det = windowed();
        let mut t = 0.0;
        for _ in 0..12 {
            assert!(det.check(0.5, t).is_none());
            t += DT;
        }
        let w = det.check(0.1, t).expect("drop should fire");
        assert_eq!(w.peak_g, 0.5);
        assert_eq!(w.current_g, 0.1);
        assert_eq!(det.state(t), SlipState::Cooldown);

        t += DT;
        assert!(det.check(0.1, t).is_none(), "second drop inside cooldown");
    }

    #[test]
    fn test_no_evaluation_until_window_full() {
        let mut det = windowed();
        for i in 0..10 {
            assert!(det.check(0.8, i as f64 * DT).is_none());
        }
        // 11 samples in the window: a big drop is still ignored
        assert!(det.check(0.0, 10.0 * DT).is_none());
        assert_eq!(det.history_len(), 11);
    }

    #[test]
    fn test_window_stays_bounded() {
        let mut det = windowed();
        for i in 0..100 {
            det.check(0.2, i as f64 * DT);
        }
        assert_eq!(det.history_len(), 12);
    }

    #[test]
    fn test_peak_below_minimum() {
        let mut det = windowed();
        for i in 0..12 {
            det.check(0.35, i as f64 * DT);
        }
        // decline 0.35 but the peak never reached 0.4 G
        assert!(det.check(0.0, 12.0 * DT).is_none());
    }

    #[test]
    fn test_small_decline_ignored() {
        let mut det = windowed();
        for i in 0..12 {
            det.check(0.6, i as f64 * DT);
        }
        assert!(det.check(0.4, 12.0 * DT).is_none());
    }

    #[test]
    fn test_fires_again_after_cooldown() {
        let mut det = windowed();
        for i in 0..12 {
            det.check(0.5, i as f64 * DT);
        }
        assert!(det.check(0.1, 0.2).is_some());

        // Reload, then drop again 3.5 s later
        let mut t = 1.0;
        for _ in 0..12 {
            det.check(0.5, t);
            t += DT;
        }
        assert_eq!(det.state(3.1), SlipState::Cooldown);
        assert_eq!(det.state(3.5), SlipState::Idle);
        assert!(det.check(0.1, 3.7).is_some());
    }

    #[test]
    fn test_cooldown_boundary_is_strict() {
        let mut det = windowed();
        for i in 0..12 {
            det.check(0.5, i as f64 * 0.01);
        }
        assert!(det.check(0.1, 1.0).is_some());
        for i in 0..11 {
            det.check(0.5, 2.0 + i as f64 * 0.01);
        }
        // exactly 3000 ms after the last warning
        assert!(det.check(0.1, 4.0).is_none());
    }

    #[test]
    fn test_clear_history_keeps_cooldown() {
        let mut det = windowed();
        for i in 0..12 {
            det.check(0.5, i as f64 * DT);
        }
        assert!(det.check(0.1, 0.25).is_some());
        det.clear_history();
        assert_eq!(det.history_len(), 0);
        assert_eq!(det.last_warning(), Some(0.25));
        assert_eq!(det.state(0.3), SlipState::Cooldown);
    }

    #[test]
    fn test_decaying_peak_fires_and_rearms() {
        let mut det = decaying();
        assert!(det.check(0.5, 0.0).is_none());
        assert!(det.check(0.45, 0.1).is_none());
        let w = det.check(0.1, 0.2).expect("drop from 0.5 G");
        assert_eq!(w.peak_g, 0.5);
        assert_eq!(det.state(0.2), SlipState::Idle);

        // Peak was zeroed: the same low value does not fire again
        assert!(det.check(0.1, 0.3).is_none());
        // No timer: a new load and drop fires straight away
        assert!(det.check(0.6, 0.4).is_none());
        assert!(det.check(0.2, 0.5).is_some());
    }

    #[test]
    fn test_decaying_peak_needs_minimum() {
        let mut det = decaying();
        det.check(0.35, 0.0);
        assert!(det.check(0.0, 0.1).is_none());
    }
}
