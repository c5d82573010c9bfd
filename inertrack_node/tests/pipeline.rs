// inertrack_node/tests/pipeline.rs

//! Replay -> feed -> fusion -> engine -> UDP publisher -> collector, over loopback.

use approx::assert_abs_diff_eq;
use inertrack_node::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Yawed 90° about z, then 1 m/s² forward for one second in 0.1 s steps.
const YAWED_DRIVE: &str = "\
o 0.0 0.7071067811865476 0 0 0.7071067811865476
a 0.0 1 0 0
a 0.1 1 0 0
a 0.2 1 0 0
a 0.3 1 0 0
a 0.4 1 0 0
a 0.5 1 0 0
a 0.6 1 0 0
a 0.7 1 0 0
a 0.8 1 0 0
a 0.9 1 0 0
a 1.0 1 0 0
";

struct Pipeline {
    engine: EngineHandle,
    feed: FeedSender,
    fusion: FusionWorker,
    publisher: TelemetryPublisher,
    collector: Collector,
}

fn pipeline(engine_config: EngineConfig, settings: PublisherSettings) -> Pipeline {
    let collector = Collector::bind("127.0.0.1:0", settings.format).unwrap();
    let target = collector.local_addr().unwrap().to_string();

    let engine = TrackingEngine::shared(engine_config);
    let (feed, feed_rx) = sensor_feed(64);
    let fusion =
        FusionWorker::spawn(Arc::clone(&engine), feed_rx, Duration::from_millis(10)).unwrap();
    let transport = UdpTransport::new(target).unwrap();
    let publisher = TelemetryPublisher::spawn(Arc::clone(&engine), transport, settings).unwrap();

    Pipeline {
        engine,
        feed,
        fusion,
        publisher,
        collector,
    }
}

fn settings(format: WireFormat, include_z: bool) -> PublisherSettings {
    PublisherSettings {
        session_id: SessionId(21),
        interval: Duration::from_millis(10),
        format,
        include_z,
        publish_when_idle: false,
    }
}

/// Receives until a report satisfies `done`, or fails after a few seconds.
fn collect_until(collector: &mut Collector, done: impl Fn(&PositionReport) -> bool) -> PositionReport {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(report) = collector.recv_once(Duration::from_millis(50)).unwrap() {
            if done(&report) {
                return report;
            }
        }
    }
    panic!("collector never saw the expected report");
}

#[test]
fn replayed_drive_reaches_the_collector() {
    let mut p = pipeline(
        EngineConfig {
            time_base: TimeBase::SampleTimestamp,
            ..EngineConfig::default()
        },
        settings(WireFormat::Binary, false),
    );
    p.engine.start_tracking().unwrap();

    let samples = parse_replay(YAWED_DRIVE).unwrap();
    assert_eq!(play(&samples, &p.feed, false), samples.len());
    drop(p.feed);
    let stats = p.fusion.join();
    assert_eq!(stats.orientation, 1);
    assert_eq!(stats.anchored, 1);
    assert_eq!(stats.integrated, 10);

    // v_k = 0.1 k, so p = Σ 0.1 · 0.1 k for k = 1..10 = 0.55, all along global y.
    let report = collect_until(&mut p.collector, |r| r.y > 0.5);
    assert_eq!(report.session_id, SessionId(21));
    assert_abs_diff_eq!(report.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(report.y, 0.55, epsilon = 1e-9);
    assert_eq!(report.z, None);
    assert_eq!(p.collector.latest(SessionId(21)), Some(&report));

    let publisher = p.publisher.shutdown();
    assert!(publisher.sent >= 1);
    assert_eq!(publisher.failed, 0);
}

#[test]
fn text_datagrams_carry_z_and_stop_halts_reports() {
    let mut p = pipeline(
        EngineConfig {
            time_base: TimeBase::Fixed(0.1),
            ..EngineConfig::default()
        },
        settings(WireFormat::Text, true),
    );
    p.engine.start_tracking().unwrap();
    for i in 0..5 {
        p.feed.push(AccelerationSample::new(0.0, 0.0, 2.0, i as f64 * 0.1));
    }

    let report = collect_until(&mut p.collector, |r| r.z.unwrap_or(0.0) > 0.25);
    // Five 0.1 s steps at 2 m/s² up: z = 0.1 · (0.2 + 0.4 + 0.6 + 0.8 + 1.0).
    assert_abs_diff_eq!(report.z.unwrap_or_default(), 0.3, epsilon = 1e-9);

    // Once stopped (and not publishing while idle) the publisher only skips.
    p.engine.stop_tracking().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    let before = p.publisher.stats();
    std::thread::sleep(Duration::from_millis(50));
    let after = p.publisher.stats();
    assert_eq!(before.sent, after.sent);
    assert!(after.skipped > before.skipped);

    p.fusion.shutdown();
    p.publisher.shutdown();
}
