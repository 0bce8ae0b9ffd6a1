//! Zero-point capture
//!
//! A single sample taken at rest becomes the gravity reference that is
//! subtracted from everything that follows. There is no averaging, so a
//! bump at the capture instant ends up in the offset.

use serde::{Deserialize, Serialize};

use crate::error::GResult;
use crate::types::{Orientation, RawSample, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOffset {
    pub gravity: Vec3,
    /// Orientation the zero point belongs to
    pub orientation: Orientation,
    pub captured_at: f64,
}

#[derive(Clone, Debug, Default)]
pub struct CalibrationStore {
    offset: Option<CalibrationOffset>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self { offset: None }
    }

    /// Store `sample` verbatim as the new zero point.
    /// An incomplete or non-finite sample is rejected and the previous state is kept.
    pub fn capture(
        &mut self,
        sample: &RawSample,
        orientation: Orientation,
    ) -> GResult<CalibrationOffset> {
        let gravity = sample.complete()?;
        let offset = CalibrationOffset {
            gravity,
            orientation,
            captured_at: sample.timestamp,
        };
        self.offset = Some(offset);
        log::info!(
            "Zero point captured ({}): ({:.3}, {:.3}, {:.3}) m/s², |g|={:.3}",
            orientation,
            gravity.x,
            gravity.y,
            gravity.z,
            gravity.norm()
        );
        Ok(offset)
    }

    /// Forget the zero point; the next valid sample recalibrates
    pub fn invalidate(&mut self) {
        if self.offset.take().is_some() {
            log::info!("Zero point invalidated");
        }
    }

    pub fn offset(&self) -> Option<&CalibrationOffset> {
        self.offset.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_stores_sample_verbatim() {
        let mut store = CalibrationStore::new();
        let offset = store
            .capture(&RawSample::new(2.5, 1.0, 0.0, 9.8), Orientation::LandscapeLeft)
            .unwrap();
        assert_eq!(offset.gravity, Vec3::new(1.0, 0.0, 9.8));
        assert_eq!(offset.captured_at, 2.5);
        assert!(store.is_calibrated());
    }

    #[test]
    fn test_incomplete_capture_keeps_previous_offset() {
        let mut store = CalibrationStore::new();
        store
            .capture(&RawSample::new(0.0, 0.1, 0.2, 9.7), Orientation::LandscapeRight)
            .unwrap();
        let before = *store.offset().unwrap();

        let partial = RawSample {
            timestamp: 1.0,
            x: Some(5.0),
            y: Some(5.0),
            z: None,
        };
        assert!(store.capture(&partial, Orientation::LandscapeRight).is_err());
        assert_eq!(*store.offset().unwrap(), before);
    }

    #[test]
    fn test_incomplete_capture_on_empty_store() {
        let mut store = CalibrationStore::new();
        let partial = RawSample {
            timestamp: 0.0,
            x: None,
            y: Some(0.0),
            z: Some(9.8),
        };
        assert!(store.capture(&partial, Orientation::LandscapeLeft).is_err());
        assert!(!store.is_calibrated());
    }

    #[test]
    fn test_invalidate() {
        let mut store = CalibrationStore::new();
        store
            .capture(&RawSample::new(0.0, 0.0, 0.0, 9.8), Orientation::LandscapeLeft)
            .unwrap();
        store.invalidate();
        assert!(!store.is_calibrated());
        store.invalidate();
        assert!(store.offset().is_none());
    }
}
