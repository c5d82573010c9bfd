// inertrack_core/tests/concurrency.rs

//! Concurrent readers and writers against one shared engine.

use inertrack_core::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const READERS: usize = 6;
const UPDATES: u64 = 5_000;

/// Constant unit acceleration along x with dt = 1 from rest gives, after n
/// committed cycles, v = n and p = n(n+1)/2. Any snapshot mixing two cycles
/// breaks that pairing with `sequence`.
fn assert_snapshot_is_one_cycle(snap: &Snapshot) {
    let n = snap.sequence as f64;
    assert_eq!(
        snap.velocity.x, n,
        "velocity {} does not belong to cycle {}",
        snap.velocity.x, snap.sequence
    );
    assert_eq!(
        snap.position.x,
        n * (n + 1.0) / 2.0,
        "position {} does not belong to cycle {}",
        snap.position.x,
        snap.sequence
    );
}

#[test]
fn snapshots_never_mix_update_cycles() {
    let engine = TrackingEngine::shared(EngineConfig {
        max_dt: 1.0,
        time_base: TimeBase::Fixed(1.0),
        ..EngineConfig::default()
    });
    engine.start_tracking().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(READERS + 1));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut observed = 0u64;
                let mut last_sequence = 0u64;
                while !done.load(Ordering::Acquire) {
                    let snap = engine.snapshot();
                    assert_snapshot_is_one_cycle(&snap);
                    assert!(snap.sequence >= last_sequence, "sequence went backwards");
                    last_sequence = snap.sequence;
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    barrier.wait();
    let sample = AccelerationSample::new(1.0, 0.0, 0.0, 0.0);
    for _ in 0..UPDATES {
        engine.apply_acceleration(&sample).unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        let observed = reader.join().expect("reader panicked");
        assert!(observed > 0);
    }
    let last = engine.snapshot();
    assert_eq!(last.sequence, UPDATES);
    assert_snapshot_is_one_cycle(&last);
}

#[test]
fn orientation_writes_from_another_context_do_not_tear_updates() {
    let engine = TrackingEngine::shared(EngineConfig {
        time_base: TimeBase::Fixed(0.01),
        ..EngineConfig::default()
    });
    engine.start_tracking().unwrap();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..2_000 {
                let angle = i as f64 * 0.001;
                // Deliberately non-unit to exercise renormalisation under contention.
                let sample = OrientationSample::new(2.0 * angle.cos(), 0.0, 0.0, 2.0 * angle.sin(), 0.0);
                engine.set_orientation(&sample).unwrap();
            }
        })
    };

    for _ in 0..2_000 {
        engine
            .apply_acceleration(&AccelerationSample::new(0.1, 0.0, 0.0, 0.0))
            .unwrap();
        let snap = engine.snapshot();
        assert!((snap.orientation.norm() - 1.0).abs() <= 1e-6);
    }
    writer.join().unwrap();
}

#[test]
fn stop_races_in_flight_updates_without_deadlock() {
    let engine = TrackingEngine::shared(EngineConfig {
        time_base: TimeBase::Fixed(0.01),
        ..EngineConfig::default()
    });

    let running = Arc::new(AtomicBool::new(true));
    let fusion = {
        let engine = Arc::clone(&engine);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let sample = AccelerationSample::new(1.0, 1.0, 0.0, 0.0);
            while running.load(Ordering::Acquire) {
                // Errors are lifecycle noise here; the point is no panic and no deadlock.
                let _ = engine.apply_acceleration(&sample);
            }
        })
    };

    for _ in 0..500 {
        let _ = engine.start_tracking();
        let _ = engine.stop_tracking();
        let snap = engine.snapshot();
        if snap.status == TrackingStatus::Idle {
            // Either the update landed before the reset or was skipped after it.
            assert_eq!(snap.velocity, Vec3::zeros());
        }
    }
    running.store(false, Ordering::Release);
    fusion.join().unwrap();

    let _ = engine.stop_tracking();
    let snap = engine.snapshot();
    assert_eq!(snap.status, TrackingStatus::Idle);
    assert_eq!(snap.position, Vec3::zeros());
}
