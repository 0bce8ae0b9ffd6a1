use serde::{Deserialize, Serialize};

use crate::types::Vec2;

/// Highest load seen per direction, in G
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub left: f64,
    pub right: f64,
    pub forward: f64,
    pub backward: f64,
}

/// Running maxima. Values only grow until an explicit `reset`.
#[derive(Clone, Debug, Default)]
pub struct PeakTracker {
    peaks: PeakRecord,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exactly one bucket per axis is touched. Zero lands in the right /
    /// backward bucket as `abs(0)`, which can never raise it.
    pub fn update(&mut self, filtered: Vec2) -> PeakRecord {
        if filtered.lateral > 0.0 {
            self.peaks.left = self.peaks.left.max(filtered.lateral);
        } else {
            self.peaks.right = self.peaks.right.max(filtered.lateral.abs());
        }

        if filtered.longitudinal > 0.0 {
            self.peaks.forward = self.peaks.forward.max(filtered.longitudinal);
        } else {
            self.peaks.backward = self.peaks.backward.max(filtered.longitudinal.abs());
        }

        self.peaks
    }

    pub fn reset(&mut self) -> PeakRecord {
        self.peaks = PeakRecord::default();
        self.peaks
    }

    pub fn peaks(&self) -> PeakRecord {
        self.peaks
    }
}
