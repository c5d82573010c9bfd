// inertrack_node/src/main.rs

use clap::Parser;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

use inertrack_node::cli::{init_tracing, NodeCli};
use inertrack_node::config;
use inertrack_node::control::{report_lifecycle, run_console};
use inertrack_node::prelude::*;

const SYNTHETIC_RATE_HZ: f64 = 100.0;
const SYNTHETIC_NOISE_STD: f64 = 0.02;

/// Where the sensor samples come from for this run.
enum Source {
    Replay {
        samples: Vec<SensorSample>,
        realtime: bool,
    },
    Synthetic {
        motion: SyntheticMotion,
        duration: Duration,
    },
    /// Nothing is fed; only useful with `--interactive`.
    Silent,
}

impl Source {
    fn from_cli(cli: &NodeCli, config: &NodeConfig) -> Result<Self, NodeError> {
        if let Some(path) = &cli.replay {
            return Ok(Source::Replay {
                samples: load_replay(path)?,
                realtime: cli.realtime,
            });
        }
        match cli.synthetic_secs {
            Some(secs) => {
                let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
                    NodeError::Config(format!("--synthetic-secs must be >= 0, got {}", secs))
                })?;
                let seed = config.session.id as u64;
                Ok(Source::Synthetic {
                    motion: SyntheticMotion::new(seed, SYNTHETIC_NOISE_STD)?,
                    duration,
                })
            }
            None => Ok(Source::Silent),
        }
    }

    fn run(self, feed: &FeedSender) -> Result<(), NodeError> {
        match self {
            Source::Replay { samples, realtime } => {
                let queued = play(&samples, feed, realtime);
                info!("Replay finished: {} of {} samples queued", queued, samples.len());
            }
            Source::Synthetic {
                mut motion,
                duration,
            } => {
                let pairs = run_synthetic(&mut motion, feed, SYNTHETIC_RATE_HZ, duration)?;
                info!("Synthetic source finished: {} sample pairs", pairs);
            }
            Source::Silent => {}
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = NodeCli::parse();
    init_tracing(cli.log_filter.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: NodeCli) -> Result<(), NodeError> {
    let config = cli.resolve_config()?;

    if cli.print_config {
        print!("{}", config::to_toml(&config)?);
        return Ok(());
    }

    let source = Source::from_cli(&cli, &config)?;

    // --- 1. The single shared engine ---
    let engine = TrackingEngine::shared(config.engine_config());
    info!("Engine created: {:?}", engine.config());

    // --- 2. Workers ---
    let (feed_tx, feed_rx) = sensor_feed(config.feed.capacity);
    let fusion = FusionWorker::spawn(Arc::clone(&engine), feed_rx, config.poll_interval())?;
    let settings = PublisherSettings::from_config(&config);
    let transport = UdpTransport::new(config.telemetry.target.clone())?;
    let publisher = TelemetryPublisher::spawn(Arc::clone(&engine), transport, settings)?;
    let display = config
        .display_interval()
        .map(|interval| DisplayWorker::spawn(Arc::clone(&engine), interval))
        .transpose()?;

    if config.lifecycle.auto_start {
        report_lifecycle("start", engine.start_tracking());
    }

    // --- 3. Drive the source ---
    let fusion_stats = if cli.interactive {
        let source_thread = thread::Builder::new()
            .name("source".to_string())
            .spawn(move || source.run(&feed_tx))?;

        let stdin = io::stdin();
        run_console(&engine, stdin.lock(), io::stdout())?;

        // Stopping fusion drops the feed receiver, which ends a still-running source.
        let stats = fusion.shutdown();
        match source_thread.join() {
            Ok(result) => result?,
            Err(_) => error!("Source thread panicked"),
        }
        stats
    } else {
        source.run(&feed_tx)?;
        // Closing the feed lets fusion drain what is queued, then exit.
        drop(feed_tx);
        let stats = fusion.join();
        // Give the publisher one more tick to send the final position.
        thread::sleep(settings.interval);
        stats
    };

    // --- 4. Shutdown ---
    let last = engine.snapshot();
    info!("Final state:\n{}", render_snapshot(&last));
    if last.status == TrackingStatus::Tracking {
        report_lifecycle("stop", engine.stop_tracking());
    }
    let publisher_stats = publisher.shutdown();
    if let Some(display) = display {
        display.shutdown();
    }
    info!("Fusion: {:?}", fusion_stats);
    info!("Telemetry: {:?}", publisher_stats);
    Ok(())
}
