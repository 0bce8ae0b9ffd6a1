use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::error::{GMeterError, GResult};
use crate::types::{MotionEvent, Orientation, RawSample, STANDARD_GRAVITY};

/// Mock source rate range (Hz)
pub const MIN_MOCK_RATE_HZ: f64 = 1.0;
pub const MAX_MOCK_RATE_HZ: f64 = 1000.0;

/// Orientation as a browser `window.orientation` angle
#[derive(Deserialize)]
struct AngleEvent {
    angle: i32,
}

/// One line of JSON input. Accepted forms:
/// - a tagged `MotionEvent`
/// - `{"type":"orientation","angle":90}` (angle in degrees)
/// - a bare sample `{"timestamp":..,"x":..,"y":..,"z":..}`
pub fn parse_event_line(line: &str) -> GResult<MotionEvent> {
    let tagged_err = match serde_json::from_str::<MotionEvent>(line) {
        Ok(event) => return Ok(event),
        Err(e) => e,
    };

    if let Ok(AngleEvent { angle }) = serde_json::from_str::<AngleEvent>(line) {
        return Orientation::from_angle(angle)
            .map(|orientation| MotionEvent::Orientation { orientation })
            .ok_or_else(|| {
                GMeterError::MalformedEvent(format!("unsupported orientation angle {}", angle))
            });
    }

    serde_json::from_str::<RawSample>(line)
        .map(MotionEvent::Sample)
        .map_err(|_| GMeterError::MalformedEvent(tagged_err.to_string()))
}

/// Forward JSON-lines events from stdin, in order, until EOF
pub async fn stdin_loop(tx: Sender<MotionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut event_count = 0u64;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                log::info!("[input] EOF after {} events", event_count);
                break;
            }
            Err(e) => {
                log::error!("[input] read failed after {} events: {}", event_count, e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match parse_event_line(line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("[input] skipping malformed line: {}", e);
                continue;
            }
        };

        if tx.send(event).await.is_err() {
            log::info!("[input] channel closed after {} events", event_count);
            break;
        }
        event_count += 1;
    }
}

/// Synthetic drive for demos: rest, build a corner + braking load, lose it
/// abruptly, recover. Repeats every 8 seconds.
pub fn mock_sample(t: f64, orientation: Orientation) -> RawSample {
    let phase = t % 8.0;
    let (lateral, longitudinal) = if phase < 1.0 {
        (0.0, 0.0)
    } else if phase < 4.0 {
        let ramp = ((phase - 1.0) / 1.5).min(1.0);
        (0.6 * ramp, -0.25 * ramp)
    } else if phase < 4.5 {
        // grip gone
        (0.08, -0.05)
    } else if phase < 6.0 {
        (0.2, 0.0)
    } else {
        (0.0, 0.0)
    };

    // small deterministic vibration
    let jitter = 0.01 * (t * 37.0).sin();

    let g = STANDARD_GRAVITY;
    let y = match orientation {
        Orientation::LandscapeRight => -g + lateral * g,
        _ => g - lateral * g,
    };
    RawSample::new(t, jitter * g, y + jitter, -longitudinal * g)
}

/// Sample period for a requested rate, clamped to the supported range.
/// Non-finite rates fall back to 60 Hz.
pub fn mock_period(rate_hz: f64) -> Duration {
    let rate = if rate_hz.is_finite() {
        rate_hz.clamp(MIN_MOCK_RATE_HZ, MAX_MOCK_RATE_HZ)
    } else {
        60.0
    };
    if rate != rate_hz {
        log::warn!("[mock] rate {} Hz out of range, using {} Hz", rate_hz, rate);
    }
    Duration::from_secs_f64(1.0 / rate)
}

/// Emit `mock_sample` at `rate_hz` until the receiver goes away
pub async fn mock_loop(tx: Sender<MotionEvent>, rate_hz: f64, orientation: Orientation) {
    let period = mock_period(rate_hz);
    let mut ticker = interval(period);
    let mut sample_count = 0u64;

    if tx
        .send(MotionEvent::Orientation { orientation })
        .await
        .is_err()
    {
        return;
    }

    loop {
        ticker.tick().await;
        let t = sample_count as f64 * period.as_secs_f64();

        if tx
            .send(MotionEvent::Sample(mock_sample(t, orientation)))
            .await
            .is_err()
        {
            log::info!("[mock] channel closed after {} samples", sample_count);
            break;
        }
        sample_count += 1;
        if sample_count % 600 == 0 {
            log::debug!("[mock] {} samples", sample_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::{Pipeline, SampleOutcome};

    #[test]
    fn test_parse_tagged_and_bare_lines() {
        let e = parse_event_line(r#"{"type":"calibrate"}"#).unwrap();
        assert_eq!(e, MotionEvent::Calibrate);

        let e = parse_event_line(r#"{"timestamp":1.0,"x":0.0,"y":9.8,"z":0.1}"#).unwrap();
        assert_eq!(e, MotionEvent::Sample(RawSample::new(1.0, 0.0, 9.8, 0.1)));

        assert!(parse_event_line("not json").is_err());
    }

    #[test]
    fn test_parse_orientation_angle() {
        let e = parse_event_line(r#"{"type":"orientation","angle":90}"#).unwrap();
        assert_eq!(
            e,
            MotionEvent::Orientation {
                orientation: Orientation::LandscapeRight
            }
        );
        let e = parse_event_line(r#"{"type":"orientation","angle":-90}"#).unwrap();
        assert_eq!(
            e,
            MotionEvent::Orientation {
                orientation: Orientation::LandscapeLeft
            }
        );
        let e = parse_event_line(r#"{"type":"orientation","angle":180}"#).unwrap();
        assert_eq!(
            e,
            MotionEvent::Orientation {
                orientation: Orientation::Portrait
            }
        );
        assert!(matches!(
            parse_event_line(r#"{"type":"orientation","angle":45}"#),
            Err(GMeterError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_mock_period_clamped() {
        assert_eq!(mock_period(60.0), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(mock_period(1e10), Duration::from_secs_f64(1.0 / MAX_MOCK_RATE_HZ));
        assert_eq!(mock_period(0.0), Duration::from_secs(1));
        assert_eq!(mock_period(f64::NAN), Duration::from_secs_f64(1.0 / 60.0));
        assert!(mock_period(f64::INFINITY) > Duration::ZERO);
    }

    #[test]
    fn test_mock_drive_triggers_warning() {
        for orientation in [Orientation::LandscapeLeft, Orientation::LandscapeRight] {
            let config = PipelineConfig {
                initial_orientation: orientation,
                ..Default::default()
            };
            let mut p = Pipeline::new(config);
            let mut warnings = 0;
            for i in 0..(60 * 8) {
                let t = i as f64 / 60.0;
                if let Ok(SampleOutcome::Measured(out)) = p.on_sample(&mock_sample(t, orientation)) {
                    if out.warning_fired {
                        warnings += 1;
                    }
                }
            }
            assert_eq!(warnings, 1, "{}", orientation);
            let peaks = p.snapshot().peaks;
            assert!(peaks.left > 0.5);
            assert!(peaks.backward > 0.2);
        }
    }

    #[tokio::test]
    async fn test_mock_loop_sends_orientation_first() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let handle = tokio::spawn(mock_loop(tx, 200.0, Orientation::LandscapeRight));
        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            MotionEvent::Orientation {
                orientation: Orientation::LandscapeRight
            }
        );
        assert!(matches!(rx.recv().await.unwrap(), MotionEvent::Sample(_)));
        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_loop_survives_absurd_rate() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let handle = tokio::spawn(mock_loop(tx, 1e10, Orientation::LandscapeLeft));
        assert!(matches!(
            rx.recv().await.unwrap(),
            MotionEvent::Orientation { .. }
        ));
        assert!(matches!(rx.recv().await.unwrap(), MotionEvent::Sample(_)));
        drop(rx);
        handle.await.unwrap();
    }
}
