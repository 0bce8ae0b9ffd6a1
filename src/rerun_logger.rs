use anyhow::Result;
use rerun::{archetypes::Scalar, RecordingStreamBuilder};

use crate::pipeline::PipelineOutput;

/// Writes replayed G readings to an `.rrd` file as scalar plots under
/// `gmeter/*`, with G-drop warnings under `warnings/g_drop/*`
pub struct RerunLogger {
    rec: rerun::RecordingStream,
}

impl RerunLogger {
    pub fn new(output_path: &str) -> Result<Self> {
        let rec = RecordingStreamBuilder::new("gmeter_replay")
            .save(output_path)
            .map_err(|e| anyhow::anyhow!("Failed to create Rerun recording: {}", e))?;

        log::info!("[RERUN] Recording G-meter replay to {}", output_path);

        Ok(RerunLogger { rec })
    }

    /// Sample timestamps drive the `sample_time` timeline
    fn set_sample_time(&self, timestamp: f64) {
        self.rec.set_time_seconds("sample_time", timestamp);
    }

    fn log_scalar(&self, path: &str, value: f64) {
        if let Err(e) = self.rec.log(path, &Scalar::new(value)) {
            log::debug!("[RERUN] dropped {}: {}", path, e);
        }
    }

    /// Mapped, filtered and peak values for one measured sample
    pub fn log_output(&self, out: &PipelineOutput) {
        self.set_sample_time(out.timestamp);
        self.log_scalar("gmeter/raw/lateral", out.raw.lateral);
        self.log_scalar("gmeter/raw/longitudinal", out.raw.longitudinal);
        self.log_scalar("gmeter/filtered/lateral", out.filtered.lateral);
        self.log_scalar("gmeter/filtered/longitudinal", out.filtered.longitudinal);
        self.log_scalar("gmeter/magnitude", out.magnitude);
        self.log_scalar("gmeter/peaks/left", out.peaks.left);
        self.log_scalar("gmeter/peaks/right", out.peaks.right);
        self.log_scalar("gmeter/peaks/forward", out.peaks.forward);
        self.log_scalar("gmeter/peaks/backward", out.peaks.backward);

        if let Some(ref w) = out.warning {
            self.log_scalar("warnings/g_drop/peak", w.peak_g);
            self.log_scalar("warnings/g_drop/decline", w.decline_g);
        }
    }
}
