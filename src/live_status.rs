use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::peaks::PeakRecord;
use crate::pipeline::PipelineSnapshot;
use crate::slip::SlipState;
use crate::types::Orientation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    AwaitingCalibration,
    Measuring,
    Stopped,
}

impl TrackingStatus {
    /// Short text for a status line
    pub fn message(&self) -> &'static str {
        match self {
            TrackingStatus::AwaitingCalibration => "Hold still: next sample sets the zero point",
            TrackingStatus::Measuring => "Zero point set, measuring G",
            TrackingStatus::Stopped => "Tracking stopped",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub status: TrackingStatus,
    pub orientation: Orientation,
    pub samples_measured: u64,
    pub samples_rejected: u64,
    pub calibrations: u64,
    pub warnings_fired: u64,
    pub magnitude: f64,
    pub peaks: PeakRecord,
    pub slip_state: SlipState,
    pub uptime_seconds: u64,
}

impl LiveStatus {
    pub fn from_snapshot(snapshot: &PipelineSnapshot, uptime_seconds: u64) -> Self {
        let status = if snapshot.stopped {
            TrackingStatus::Stopped
        } else if snapshot.calibrated {
            TrackingStatus::Measuring
        } else {
            TrackingStatus::AwaitingCalibration
        };

        Self {
            timestamp: current_timestamp(),
            status,
            orientation: snapshot.orientation,
            samples_measured: snapshot.samples_measured,
            samples_rejected: snapshot.samples_rejected,
            calibrations: snapshot.calibrations,
            warnings_fired: snapshot.warnings_fired,
            magnitude: snapshot.filtered.magnitude,
            peaks: snapshot.peaks,
            slip_state: snapshot.slip_state,
            uptime_seconds,
        }
    }

    /// One human-readable line for the console
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {:.2} G | peaks L{:.2} R{:.2} F{:.2} B{:.2} | samples {} (rejected {}) | warnings {}",
            self.status.message(),
            self.orientation,
            self.magnitude,
            self.peaks.left,
            self.peaks.right,
            self.peaks.forward,
            self.peaks.backward,
            self.samples_measured,
            self.samples_rejected,
            self.warnings_fired
        )
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
