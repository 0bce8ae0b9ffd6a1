use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

use gmeter_rs::live_status::LiveStatus;
use gmeter_rs::{
    indicator, sensors, EventOutcome, MotionEvent, Orientation, Pipeline, PipelineConfig,
    SampleOutcome, SlipStrategy,
};

#[derive(Parser, Debug)]
#[command(name = "gmeter")]
#[command(about = "Live G-meter: lateral/longitudinal G, peaks and G-drop warnings", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until input ends)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Event source (stdin, mock)
    #[arg(long, default_value = "stdin")]
    source: String,

    /// Mock sample rate in Hz
    #[arg(long, default_value = "60")]
    rate: f64,

    /// JSON pipeline config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// EMA weight of the newest sample, (0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Initial orientation (landscape_left, landscape_right, portrait)
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Negate lateral G
    #[arg(long)]
    flip_lateral: bool,

    /// Negate longitudinal G
    #[arg(long)]
    flip_longitudinal: bool,

    /// Use the decaying-peak G-drop detector instead of window + cooldown
    #[arg(long)]
    decaying_peak: bool,

    /// Seconds between status lines on stderr (0 = off)
    #[arg(long, default_value = "2")]
    status_interval: u64,

    /// Only print G-drop warnings to stdout
    #[arg(long)]
    warnings_only: bool,

    /// Ring the terminal bell on a G-drop warning
    #[arg(long)]
    bell: bool,
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match args.config.as_ref() {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(orientation) = args.orientation {
        config.initial_orientation = orientation;
    }
    if args.flip_lateral {
        config.flip_lateral = true;
    }
    if args.flip_longitudinal {
        config.flip_longitudinal = true;
    }
    if args.decaying_peak {
        config.slip_strategy = SlipStrategy::DecayingPeak;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = build_config(&args)?;

    eprintln!("[{}] G-meter starting", ts_now());
    eprintln!("  Source: {}", args.source);
    eprintln!("  Duration: {} seconds (0=until input ends)", args.duration);
    eprintln!("  Orientation: {}", config.initial_orientation);
    eprintln!("  Alpha: {}", config.alpha);
    eprintln!("  G-drop: {:?}", config.slip_strategy);

    let mut pipeline = Pipeline::try_new(config)?;

    let (event_tx, mut event_rx) = mpsc::channel::<MotionEvent>(500);
    let _source_handle = match args.source.as_str() {
        "stdin" => tokio::spawn(sensors::stdin_loop(event_tx)),
        "mock" => tokio::spawn(sensors::mock_loop(
            event_tx,
            args.rate,
            pipeline.orientation(),
        )),
        other => anyhow::bail!("Unknown source '{}' (expected stdin or mock)", other),
    };

    let start = Utc::now();
    let mut status_tick = interval(Duration::from_secs(args.status_interval.max(1)));
    // 0 = effectively unbounded; the source ending stops the loop
    let run_for = if args.duration > 0 { args.duration } else { 365 * 24 * 3600 };
    let deadline = tokio::time::sleep(Duration::from_secs(run_for));
    tokio::pin!(deadline);

    let stdout = std::io::stdout();

    eprintln!("[{}] Waiting for first sample (zero point)...", ts_now());

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    eprintln!("[{}] Input ended, stopping...", ts_now());
                    break;
                };
                let outcome = match pipeline.handle_event(&event) {
                    Ok(outcome) => outcome,
                    // already logged by the pipeline
                    Err(e) if e.is_sample_scoped() => continue,
                    Err(e) => return Err(e.into()),
                };
                let max_displacement = pipeline.config().max_displacement_px;
                report(&outcome, &args, max_displacement, &mut stdout.lock())?;
            }
            _ = status_tick.tick(), if args.status_interval > 0 => {
                let uptime = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
                let status = LiveStatus::from_snapshot(&pipeline.snapshot(), uptime);
                eprintln!("[{}] {}", ts_now(), status.summary_line());
            }
            _ = &mut deadline => {
                eprintln!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }
    }

    pipeline.stop();
    let uptime = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
    let final_status = LiveStatus::from_snapshot(&pipeline.snapshot(), uptime);

    eprintln!("\n=== Final Stats ===");
    eprintln!("Samples measured: {}", final_status.samples_measured);
    eprintln!("Samples rejected: {}", final_status.samples_rejected);
    eprintln!("Calibrations: {}", final_status.calibrations);
    eprintln!("G-drop warnings: {}", final_status.warnings_fired);
    eprintln!(
        "Peaks (G): left {:.2}  right {:.2}  forward {:.2}  backward {:.2}",
        final_status.peaks.left,
        final_status.peaks.right,
        final_status.peaks.forward,
        final_status.peaks.backward
    );

    Ok(())
}

/// One JSON line per outcome on stdout, the renderer's feed
fn report(
    outcome: &EventOutcome,
    args: &Args,
    max_displacement: f64,
    out: &mut impl Write,
) -> Result<()> {
    match outcome {
        EventOutcome::Sample(SampleOutcome::Measured(m)) => {
            if m.warning_fired && args.bell {
                eprint!("\x07");
            }
            if args.warnings_only && !m.warning_fired {
                return Ok(());
            }
            let line = serde_json::json!({
                "kind": "measured",
                "output": m,
                "indicator": indicator::ball_offset(m.filtered, max_displacement),
            });
            writeln!(out, "{}", line)?;
        }
        EventOutcome::Sample(SampleOutcome::Calibrated(offset)) => {
            eprintln!(
                "[{}] Zero point set ({}), measuring G",
                ts_now(),
                offset.orientation
            );
            if !args.warnings_only {
                writeln!(out, "{}", serde_json::to_string(outcome)?)?;
            }
        }
        EventOutcome::OrientationChanged {
            orientation,
            recalibration_required,
        } => {
            if !orientation.is_landscape() {
                eprintln!(
                    "[{}] {}: rotate to landscape to measure G",
                    ts_now(),
                    orientation
                );
            } else if *recalibration_required {
                eprintln!("[{}] Orientation changed, hold still to recalibrate", ts_now());
            }
            if !args.warnings_only {
                writeln!(out, "{}", serde_json::to_string(outcome)?)?;
            }
        }
        _ => {
            if !args.warnings_only {
                writeln!(out, "{}", serde_json::to_string(outcome)?)?;
            }
        }
    }
    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}
