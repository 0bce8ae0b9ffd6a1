use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::json;

use gmeter_rs::slip::SlipWarning;
use gmeter_rs::{
    GMeterError, MotionEvent, Orientation, Pipeline, PipelineConfig, SampleOutcome, SlipStrategy,
};

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recorded session log (.json or .json.gz)
    #[arg(long, conflicts_with = "session_dir")]
    log: Option<PathBuf>,

    /// Directory of session logs to batch replay (session_*.json[.gz])
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// JSON pipeline config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// EMA weight of the newest sample, (0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// G-drop decline threshold (G)
    #[arg(long)]
    decline_threshold: Option<f64>,

    /// Minimum peak before a G-drop counts (G)
    #[arg(long)]
    peak_min: Option<f64>,

    /// Warning cooldown (ms)
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Magnitude window length (samples)
    #[arg(long)]
    history_size: Option<usize>,

    #[arg(long, default_value_t = false)]
    flip_lateral: bool,

    #[arg(long, default_value_t = false)]
    flip_longitudinal: bool,

    /// Use the decaying-peak G-drop detector (A/B against the window)
    #[arg(long, default_value_t = false)]
    decaying_peak: bool,

    /// Write a Rerun recording of the replay (needs the `rerun` feature)
    #[arg(long)]
    rerun: Option<PathBuf>,
}

#[derive(Deserialize)]
struct SessionLog {
    /// Orientation at the start of the recording
    #[serde(default)]
    orientation: Option<Orientation>,
    events: Vec<MotionEvent>,
}

fn load_log(path: &Path) -> anyhow::Result<SessionLog> {
    let file = File::open(path)?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let gz = GzDecoder::new(file);
        let reader = BufReader::new(gz);
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn build_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(v) = args.alpha {
        config.alpha = v;
    }
    if let Some(v) = args.decline_threshold {
        config.decline_threshold_g = v;
    }
    if let Some(v) = args.peak_min {
        config.slip_peak_min_g = v;
    }
    if let Some(v) = args.cooldown_ms {
        config.cooldown_ms = v;
    }
    if let Some(v) = args.history_size {
        config.history_size = v;
    }
    config.flip_lateral |= args.flip_lateral;
    config.flip_longitudinal |= args.flip_longitudinal;
    if args.decaying_peak {
        config.slip_strategy = SlipStrategy::DecayingPeak;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Default)]
struct ReplayStats {
    events: usize,
    incomplete: u64,
    unsupported_orientation: u64,
    max_magnitude: f64,
    first_ts: Option<f64>,
    last_ts: Option<f64>,
    warnings: Vec<SlipWarning>,
}

fn replay_session(
    log: &SessionLog,
    mut config: PipelineConfig,
    rerun_path: Option<&Path>,
) -> anyhow::Result<serde_json::Value> {
    if let Some(o) = log.orientation {
        config.initial_orientation = o;
    }
    let mut pipeline = Pipeline::try_new(config)?;
    let mut stats = ReplayStats::default();

    #[cfg(feature = "rerun")]
    let rerun_logger = match rerun_path {
        Some(p) => Some(gmeter_rs::rerun_logger::RerunLogger::new(&p.display().to_string())?),
        None => None,
    };
    #[cfg(not(feature = "rerun"))]
    if rerun_path.is_some() {
        anyhow::bail!("--rerun needs a build with the `rerun` feature");
    }

    for event in &log.events {
        stats.events += 1;
        if let MotionEvent::Sample(s) = event {
            stats.first_ts.get_or_insert(s.timestamp);
            stats.last_ts = Some(s.timestamp);
        }

        match pipeline.handle_event(event) {
            Ok(gmeter_rs::EventOutcome::Sample(SampleOutcome::Measured(out))) => {
                stats.max_magnitude = stats.max_magnitude.max(out.magnitude);
                #[cfg(feature = "rerun")]
                if let Some(ref r) = rerun_logger {
                    r.log_output(&out);
                }
                if let Some(w) = out.warning {
                    eprintln!(
                        "[G-DROP] t={:.2}s peak {:.2} G -> {:.2} G",
                        w.timestamp, w.peak_g, w.current_g
                    );
                    stats.warnings.push(w);
                }
            }
            Ok(gmeter_rs::EventOutcome::Sample(SampleOutcome::Calibrated(offset))) => {
                eprintln!(
                    "[ZERO] t={:.2}s ({}) |g|={:.3} m/s²",
                    offset.captured_at,
                    offset.orientation,
                    offset.gravity.norm()
                );
            }
            Ok(_) => {}
            Err(GMeterError::IncompleteSample { .. } | GMeterError::NonFiniteSample { .. }) => {
                stats.incomplete += 1
            }
            Err(GMeterError::UnsupportedOrientation(_)) => stats.unsupported_orientation += 1,
            Err(e) => return Err(e.into()),
        }
    }

    let snapshot = pipeline.snapshot();
    let duration = match (stats.first_ts, stats.last_ts) {
        (Some(a), Some(b)) => (b - a).max(0.0),
        _ => 0.0,
    };

    Ok(json!({
        "events": stats.events,
        "duration_secs": duration,
        "samples_measured": snapshot.samples_measured,
        "samples_rejected": snapshot.samples_rejected,
        "rejected_incomplete": stats.incomplete,
        "rejected_orientation": stats.unsupported_orientation,
        "calibrations": snapshot.calibrations,
        "warnings_fired": snapshot.warnings_fired,
        "warnings": stats.warnings,
        "max_magnitude_g": stats.max_magnitude,
        "final_peaks": snapshot.peaks,
        "final_orientation": snapshot.orientation,
        "calibrated_at_end": snapshot.calibrated,
    }))
}

fn run_once(path: &Path, args: &Args, config: &PipelineConfig) -> anyhow::Result<serde_json::Value> {
    let log = load_log(path)?;
    let mut result = replay_session(&log, config.clone(), args.rerun.as_deref())?;
    result["log"] = json!(path.display().to_string());
    Ok(result)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = build_config(&args)?;
    let mut results = Vec::new();

    if let Some(dir) = args.session_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !(name.starts_with("session_") && (name.ends_with(".json") || name.ends_with(".json.gz"))) {
                continue;
            }
            match run_once(&path, &args, &config) {
                Ok(res) => results.push(res),
                Err(e) => eprintln!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        results.push(run_once(log, &args, &config)?);
    } else {
        anyhow::bail!("Provide --log or --session-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmeter_rs::{RawSample, STANDARD_GRAVITY};

    fn session(events: Vec<MotionEvent>) -> SessionLog {
        SessionLog {
            orientation: Some(Orientation::LandscapeLeft),
            events,
        }
    }

    #[test]
    fn test_replay_counts_rejections_and_warnings() {
        let g = STANDARD_GRAVITY;
        let mut events = vec![MotionEvent::Sample(RawSample::new(0.0, 0.0, g, 0.0))];
        events.push(MotionEvent::Sample(RawSample {
            timestamp: 0.01,
            x: None,
            y: Some(g),
            z: Some(0.0),
        }));
        let mut t = 0.0;
        for _ in 0..12 {
            t += 1.0 / 60.0;
            events.push(MotionEvent::Sample(RawSample::new(t, 0.0, g - 0.5 * g, 0.0)));
        }
        t += 1.0 / 60.0;
        events.push(MotionEvent::Sample(RawSample::new(t, 0.0, g - 0.1 * g, 0.0)));

        let config = PipelineConfig { alpha: 1.0, ..Default::default() };
        let result = replay_session(&session(events), config, None).unwrap();
        assert_eq!(result["calibrations"], 1);
        assert_eq!(result["rejected_incomplete"], 1);
        assert_eq!(result["samples_measured"], 13);
        assert_eq!(result["warnings_fired"], 1);
    }

    #[test]
    fn test_session_log_parses() {
        let text = r#"{
            "orientation": "landscape_right",
            "events": [
                {"type": "sample", "timestamp": 0.0, "x": 0.0, "y": -9.8, "z": 0.0},
                {"type": "orientation", "orientation": "portrait"},
                {"type": "reset_peaks"}
            ]
        }"#;
        let log: SessionLog = serde_json::from_str(text).unwrap();
        assert_eq!(log.orientation, Some(Orientation::LandscapeRight));
        assert_eq!(log.events.len(), 3);

        let result = replay_session(&log, PipelineConfig::default(), None).unwrap();
        assert_eq!(result["final_orientation"], "portrait");
        assert_eq!(result["calibrated_at_end"], false);
    }
}
