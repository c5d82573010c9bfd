// inertrack_node/src/replay.rs

//! Recorded sensor logs.
//!
//! One sample per line, timestamps in seconds:
//!
//! ```text
//! # comment
//! o <t> <w> <x> <y> <z>    orientation quaternion
//! a <t> <x> <y> <z>        device-frame linear acceleration
//! ```

use inertrack_core::messages::{AccelerationSample, OrientationSample, SensorSample};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::NodeError;
use crate::feed::{Delivery, FeedSender};

pub fn load_replay(path: &Path) -> Result<Vec<SensorSample>, NodeError> {
    let text = fs::read_to_string(path)?;
    let samples = parse_replay(&text)?;
    info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

pub fn parse_replay(text: &str) -> Result<Vec<SensorSample>, NodeError> {
    text.lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                None
            } else {
                Some(parse_line(line).map_err(|reason| NodeError::Replay {
                    line: index + 1,
                    reason,
                }))
            }
        })
        .collect()
}

fn parse_line(line: &str) -> Result<SensorSample, String> {
    let mut fields = line.split_whitespace();
    let kind = fields.next().unwrap_or_default();
    let values = fields
        .map(|f| match f.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Err(format!("'{}' is not a finite number", f)),
            Err(_) => Err(format!("'{}' is not a number", f)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    match (kind, values.as_slice()) {
        ("o", &[t, w, x, y, z]) => Ok(OrientationSample::new(w, x, y, z, t).into()),
        ("a", &[t, x, y, z]) => Ok(AccelerationSample::new(x, y, z, t).into()),
        ("o", v) => Err(format!("orientation needs 5 values, got {}", v.len())),
        ("a", v) => Err(format!("acceleration needs 4 values, got {}", v.len())),
        (other, _) => Err(format!("unknown sample kind '{}'", other)),
    }
}

/// Pushes `samples` into the feed and returns how many were queued.
///
/// With `realtime` the gaps between timestamps are reproduced with sleeps;
/// otherwise samples are pushed back to back, yielding when the feed is full
/// so a fast replay does not just drop most of the log.
pub fn play(samples: &[SensorSample], feed: &FeedSender, realtime: bool) -> usize {
    let Some(first) = samples.first() else {
        return 0;
    };
    let origin_t = first.timestamp();
    let started = Instant::now();
    let mut queued = 0;

    for sample in samples {
        if realtime {
            let offset = (sample.timestamp() - origin_t).max(0.0);
            let due = Duration::try_from_secs_f64(offset)
                .ok()
                .and_then(|offset| started.checked_add(offset));
            match due {
                Some(due) => {
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }
                }
                None => warn!(
                    "Replay offset {} s cannot be paced, pushing immediately",
                    offset
                ),
            }
        }

        loop {
            match feed.push(*sample) {
                Delivery::Queued => {
                    queued += 1;
                    break;
                }
                Delivery::Dropped if realtime => break,
                Delivery::Dropped => thread::yield_now(),
                Delivery::Closed => {
                    warn!("Feed closed, replay stopped after {} samples", queued);
                    return queued;
                }
            }
        }
    }
    queued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::sensor_feed;

    const LOG: &str = "\
# short drive
o 0.0 1 0 0 0

a 0.00 1.0 0.0 0.0
a 0.10 1.0 0.0 0.0
";

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let samples = parse_replay(LOG).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(matches!(samples[0], SensorSample::Orientation(_)));
        assert_eq!(
            samples[2],
            SensorSample::Acceleration(AccelerationSample::new(1.0, 0.0, 0.0, 0.1))
        );
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_replay("# header\na 0 1 2\n").unwrap_err();
        assert!(matches!(err, NodeError::Replay { line: 2, .. }));

        let err = parse_replay("o 0 1 0 0 zero\n").unwrap_err();
        assert!(matches!(err, NodeError::Replay { line: 1, ref reason } if reason.contains("zero")));

        let err = parse_replay("g 0 0 0 0\n").unwrap_err();
        assert!(matches!(err, NodeError::Replay { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_non_finite_values() {
        let err = parse_replay("a 0 0 0 0\na inf 0 0 0\n").unwrap_err();
        assert!(matches!(err, NodeError::Replay { line: 2, ref reason } if reason.contains("inf")));

        let err = parse_replay("o 0 NaN 0 0 0\n").unwrap_err();
        assert!(matches!(err, NodeError::Replay { line: 1, .. }));

        // 1e400 overflows to infinity when parsed.
        assert!(parse_replay("a 1e400 0 0 0\n").is_err());
    }

    #[test]
    fn test_play_realtime_does_not_pace_unreachable_offsets() {
        let samples = vec![
            SensorSample::Acceleration(AccelerationSample::new(0.0, 0.0, 0.0, 0.0)),
            SensorSample::Acceleration(AccelerationSample::new(0.0, 0.0, 0.0, 1e300)),
        ];
        let (tx, _rx) = sensor_feed(8);
        let started = Instant::now();
        assert_eq!(play(&samples, &tx, true), 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_play_waits_for_room_when_not_realtime() {
        let samples = parse_replay(LOG).unwrap();
        let (tx, rx) = sensor_feed(1);
        let consumer = thread::spawn(move || {
            let mut got = Vec::new();
            while let Ok(sample) = rx.recv_timeout(Duration::from_secs(2)) {
                got.push(sample);
            }
            got
        });

        assert_eq!(play(&samples, &tx, false), 3);
        drop(tx);
        assert_eq!(consumer.join().unwrap(), samples);
    }

    #[test]
    fn test_play_realtime_respects_timestamps() {
        let samples = parse_replay("a 5.00 0 0 0\na 5.05 0 0 0\n").unwrap();
        let (tx, _rx) = sensor_feed(8);
        let started = Instant::now();
        assert_eq!(play(&samples, &tx, true), 2);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_play_into_closed_feed_stops() {
        let samples = parse_replay(LOG).unwrap();
        let (tx, rx) = sensor_feed(8);
        drop(rx);
        assert_eq!(play(&samples, &tx, false), 0);
    }
}
