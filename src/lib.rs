//! Real-time G-meter: gravity zero point, device → vehicle axis mapping,
//! EMA smoothing, per-direction peaks and G-drop (slip) warnings.
//!
//! The library is runtime-free. `Pipeline` takes samples and commands in
//! arrival order and returns what a display or alert needs; the `gmeter` and
//! `replay` binaries provide the event plumbing.

pub mod axis_mapper;
pub mod calibration;
pub mod config;
pub mod error;
pub mod indicator;
pub mod live_status;
pub mod peaks;
pub mod pipeline;
pub mod sensors;
pub mod slip;
pub mod smoothing;
pub mod types;

#[cfg(feature = "rerun")]
pub mod rerun_logger;

pub use config::{PipelineConfig, SlipStrategy};
pub use error::{GMeterError, GResult};
pub use pipeline::{EventOutcome, Pipeline, PipelineOutput, PipelineSnapshot, SampleOutcome};
pub use types::{MotionEvent, Orientation, RawSample, Vec2, Vec3, STANDARD_GRAVITY};
