// inertrack_node/src/cli.rs

use clap::Parser;
use inertrack_core::prelude::WireFormat;
use std::path::PathBuf;

use crate::config::{self, NodeConfig};
use crate::error::NodeError;

/// Default `EnvFilter` directive when neither `RUST_LOG` nor `--log-filter` is given.
pub const DEFAULT_LOG_FILTER: &str = "info,inertrack_core=debug,inertrack_node=debug";

/// Inertrack node: dead-reckons a device from its inertial feed and streams
/// the position to a collector.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct NodeCli {
    /// TOML configuration file. Defaults and `INERTRACK_*` env vars apply without it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay a recorded sensor log instead of generating synthetic motion.
    #[arg(short, long, conflicts_with = "synthetic_secs")]
    pub replay: Option<PathBuf>,

    /// Pace the replay by its timestamps instead of pushing it as fast as possible.
    #[arg(long, default_value_t = false, requires = "replay")]
    pub realtime: bool,

    /// Run the synthetic motion source for this many seconds.
    #[arg(long)]
    pub synthetic_secs: Option<f64>,

    /// Collector address, overrides `telemetry.target`.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Overrides `session.id`.
    #[arg(long)]
    pub session_id: Option<i32>,

    /// Read start/stop/status commands from stdin.
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// `tracing` filter directive, e.g. `info,inertrack_core=trace`.
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl NodeCli {
    /// CLI flags win over file and environment values.
    pub fn apply_overrides(&self, config: &mut NodeConfig) {
        if let Some(target) = &self.target {
            config.telemetry.target = target.clone();
        }
        if let Some(id) = self.session_id {
            config.session.id = id;
        }
    }

    /// Loads the layered config, applies the flags and validates the result.
    pub fn resolve_config(&self) -> Result<NodeConfig, NodeError> {
        let mut config = config::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Inertrack collector: receives position datagrams and tracks the latest
/// report of every session.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CollectorCli {
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, overrides `collector.bind`.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// `binary` or `text`, overrides `telemetry.format`.
    #[arg(short, long, value_parser = parse_wire_format)]
    pub format: Option<WireFormat>,

    #[arg(long)]
    pub log_filter: Option<String>,
}

impl CollectorCli {
    pub fn apply_overrides(&self, config: &mut NodeConfig) {
        if let Some(bind) = &self.bind {
            config.collector.bind = bind.clone();
        }
        if let Some(format) = self.format {
            config.telemetry.format = format;
        }
    }

    pub fn resolve_config(&self) -> Result<NodeConfig, NodeError> {
        let mut config = config::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn parse_wire_format(value: &str) -> Result<WireFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "binary" | "bin" => Ok(WireFormat::Binary),
        "text" | "txt" => Ok(WireFormat::Text),
        other => Err(format!("unknown wire format '{}' (binary|text)", other)),
    }
}

/// Installs the global `tracing` subscriber.
///
/// Precedence: `--log-filter`, then `RUST_LOG`, then [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(log_filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match log_filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}
