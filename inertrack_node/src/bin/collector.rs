// inertrack_node/src/bin/collector.rs

use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use tracing::error;

use inertrack_node::cli::{init_tracing, CollectorCli};
use inertrack_node::prelude::*;

fn main() -> ExitCode {
    let cli = CollectorCli::parse();
    init_tracing(cli.log_filter.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CollectorCli) -> Result<(), NodeError> {
    let config = cli.resolve_config()?;

    let mut collector = Collector::bind(config.collector.bind.as_str(), config.telemetry.format)?;
    // Never raised: the collector serves until the process is killed or a socket error.
    collector.run(&AtomicBool::new(false))
}
