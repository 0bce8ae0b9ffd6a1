// pipeline.rs: Pure computation layer for the G-meter
//
// Nothing in here touches tokio, stdin, files or audio. Samples and commands
// go in, G readings and warnings come out, so recorded sessions replay
// exactly like live ones.

use serde::{Deserialize, Serialize};

use crate::axis_mapper::AxisMapper;
use crate::calibration::{CalibrationOffset, CalibrationStore};
use crate::config::PipelineConfig;
use crate::error::GResult;
use crate::peaks::{PeakRecord, PeakTracker};
use crate::slip::{SlipDetector, SlipState, SlipWarning};
use crate::smoothing::{FilteredState, Smoother};
use crate::types::{MotionEvent, Orientation, RawSample, Vec2};

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// Per-sample result handed to the display / alert side
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub timestamp: f64,
    /// Mapped load before smoothing
    pub raw: Vec2,
    pub filtered: Vec2,
    pub magnitude: f64,
    pub peaks: PeakRecord,
    pub warning_fired: bool,
    pub warning: Option<SlipWarning>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// The sample became the new zero point
    Calibrated(CalibrationOffset),
    Measured(PipelineOutput),
    /// Tracking is stopped
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EventOutcome {
    Sample(SampleOutcome),
    OrientationChanged {
        orientation: Orientation,
        recalibration_required: bool,
    },
    CalibrationRequested,
    PeaksReset(PeakRecord),
    Stopped,
    Started,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub calibrated: bool,
    pub stopped: bool,
    pub orientation: Orientation,
    pub offset: Option<CalibrationOffset>,
    pub filtered: FilteredState,
    pub peaks: PeakRecord,
    pub slip_state: SlipState,
    pub samples_measured: u64,
    pub samples_rejected: u64,
    pub calibrations: u64,
    pub warnings_fired: u64,
    pub last_timestamp: Option<f64>,
}

// ─── The pipeline ────────────────────────────────────────────────────────────

pub struct Pipeline {
    config: PipelineConfig,

    calibration: CalibrationStore,
    mapper: AxisMapper,
    smoother: Smoother,
    peaks: PeakTracker,
    slip: SlipDetector,

    orientation: Orientation,
    stopped: bool,

    // Diagnostics only
    samples_measured: u64,
    samples_rejected: u64,
    calibrations: u64,
    warnings_fired: u64,
    last_timestamp: Option<f64>,
}

impl Pipeline {
    /// Build from a config that is assumed valid; see `try_new`
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            calibration: CalibrationStore::new(),
            mapper: AxisMapper::new(config.flip_lateral, config.flip_longitudinal),
            smoother: Smoother::new(config.alpha),
            peaks: PeakTracker::new(),
            slip: SlipDetector::new(&config),
            orientation: config.initial_orientation,
            stopped: false,
            samples_measured: 0,
            samples_rejected: 0,
            calibrations: 0,
            warnings_fired: 0,
            last_timestamp: None,
            config,
        }
    }

    pub fn try_new(config: PipelineConfig) -> GResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    // ── Sample path ──────────────────────────────────────────────────────

    /// Process one motion event. Uncalibrated: the sample becomes the zero
    /// point. Calibrated: map → smooth → peaks + slip check.
    ///
    /// A rejected sample (missing axis, portrait) leaves all signal state untouched.
    pub fn on_sample(&mut self, sample: &RawSample) -> GResult<SampleOutcome> {
        if self.stopped {
            return Ok(SampleOutcome::Ignored);
        }

        let offset = match self.calibration.offset() {
            Some(offset) => offset.gravity,
            None => return self.capture_zero_point(sample),
        };

        let mapped = match self.mapper.map(sample, &offset, self.orientation) {
            Ok(v) => v,
            Err(e) => {
                self.samples_rejected += 1;
                log::debug!("Sample at {:.3}s dropped: {}", sample.timestamp, e);
                return Err(e);
            }
        };

        let state = self.smoother.update(mapped);
        let peaks = self.peaks.update(state.filtered);
        let warning = self.slip.check(state.magnitude, sample.timestamp);

        self.samples_measured += 1;
        if warning.is_some() {
            self.warnings_fired += 1;
        }
        self.last_timestamp = Some(sample.timestamp);

        Ok(SampleOutcome::Measured(PipelineOutput {
            timestamp: sample.timestamp,
            raw: mapped,
            filtered: state.filtered,
            magnitude: state.magnitude,
            peaks,
            warning_fired: warning.is_some(),
            warning,
        }))
    }

    fn capture_zero_point(&mut self, sample: &RawSample) -> GResult<SampleOutcome> {
        match self.calibration.capture(sample, self.orientation) {
            Ok(offset) => {
                // Stale filter output and slip history belong to the old zero point.
                // Peaks survive until the user resets them.
                self.smoother.reset();
                self.slip.clear_history();
                self.calibrations += 1;
                self.last_timestamp = Some(sample.timestamp);
                Ok(SampleOutcome::Calibrated(offset))
            }
            Err(e) => {
                self.samples_rejected += 1;
                log::debug!("Calibration sample at {:.3}s dropped: {}", sample.timestamp, e);
                Err(e)
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    /// Returns true when a zero point was dropped because of the change
    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        if orientation == self.orientation {
            return false;
        }
        log::info!("Orientation {} -> {}", self.orientation, orientation);
        self.orientation = orientation;
        let was_calibrated = self.calibration.is_calibrated();
        self.calibration.invalidate();
        was_calibrated
    }

    /// Next valid sample becomes the zero point
    pub fn calibrate(&mut self) {
        self.calibration.invalidate();
    }

    pub fn reset_peaks(&mut self) -> PeakRecord {
        self.peaks.reset()
    }

    pub fn stop(&mut self) {
        if !self.stopped {
            log::info!("Tracking stopped");
        }
        self.stopped = true;
        self.calibration.invalidate();
    }

    pub fn start(&mut self) {
        if self.stopped {
            log::info!("Tracking started, awaiting zero point");
        }
        self.stopped = false;
    }

    /// Dispatch for runtimes that deliver everything on one channel
    pub fn handle_event(&mut self, event: &MotionEvent) -> GResult<EventOutcome> {
        let outcome = match event {
            MotionEvent::Sample(sample) => EventOutcome::Sample(self.on_sample(sample)?),
            MotionEvent::Orientation { orientation } => EventOutcome::OrientationChanged {
                orientation: *orientation,
                recalibration_required: self.set_orientation(*orientation),
            },
            MotionEvent::Calibrate => {
                self.calibrate();
                EventOutcome::CalibrationRequested
            }
            MotionEvent::ResetPeaks => EventOutcome::PeaksReset(self.reset_peaks()),
            MotionEvent::Stop => {
                self.stop();
                EventOutcome::Stopped
            }
            MotionEvent::Start => {
                self.start();
                EventOutcome::Started
            }
        };
        Ok(outcome)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            calibrated: self.calibration.is_calibrated(),
            stopped: self.stopped,
            orientation: self.orientation,
            offset: self.calibration.offset().copied(),
            filtered: self.smoother.state(),
            peaks: self.peaks.peaks(),
            slip_state: self
                .last_timestamp
                .map(|t| self.slip.state(t))
                .unwrap_or(SlipState::Idle),
            samples_measured: self.samples_measured,
            samples_rejected: self.samples_rejected,
            calibrations: self.calibrations,
            warnings_fired: self.warnings_fired,
            last_timestamp: self.last_timestamp,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
