// inertrack_node/src/config/mod.rs

//! Loading and validating the node configuration.
//!
//! Layers, lowest priority first: built-in defaults, the optional TOML file,
//! `INERTRACK_*` environment variables (`__` separates sections, e.g.
//! `INERTRACK_TELEMETRY__INTERVAL_MS=100`). CLI flags are applied last by the
//! binaries.

pub mod structs;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use crate::error::NodeError;
pub use structs::NodeConfig;

pub const ENV_PREFIX: &str = "INERTRACK_";

/// The layered figment for an optional config file.
pub fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(NodeConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads, merges and validates the configuration.
///
/// A missing file is an error: `Toml::file` alone would silently fall back to defaults.
pub fn load(path: Option<&Path>) -> Result<NodeConfig, NodeError> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(NodeError::Config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        info!("Loading configuration from: {}", path.display());
    }
    extract(&figment(path))
}

/// Extracts and validates a `NodeConfig` from any figment.
pub fn extract(figment: &Figment) -> Result<NodeConfig, NodeError> {
    let config: NodeConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// The effective configuration as TOML, for `--print-config`.
pub fn to_toml(config: &NodeConfig) -> Result<String, NodeError> {
    toml::to_string_pretty(config).map_err(|e| NodeError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inertrack_core::prelude::{PositionDims, TimeBase, WireFormat};

    fn from_toml(text: &str) -> Result<NodeConfig, NodeError> {
        extract(&Figment::from(Serialized::defaults(NodeConfig::default())).merge(Toml::string(text)))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.telemetry.target, "127.0.0.1:11000");
        assert_eq!(config.telemetry.interval_ms, 200);
        assert_eq!(config.integration.max_dt, 0.5);
        assert!(config.lifecycle.reset_position_on_stop);
        assert_eq!(config.feed.capacity, 1024);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = from_toml(
            r#"
            [session]
            id = 12

            [telemetry]
            format = "text"
            include_z = true

            [integration]
            time_base = { fixed = 0.01 }
            position_dims = "planar"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.id, 12);
        assert_eq!(config.telemetry.format, WireFormat::Text);
        assert!(config.telemetry.include_z);
        assert_eq!(config.telemetry.interval_ms, 200);
        assert_eq!(config.integration.time_base, TimeBase::Fixed(0.01));
        assert_eq!(config.integration.position_dims, PositionDims::Planar);

        let engine = config.engine_config();
        assert_eq!(engine.time_base, TimeBase::Fixed(0.01));
        assert!(engine.reset_position_on_stop);
    }

    #[test]
    fn test_sample_time_base_name() {
        let config = from_toml("[integration]\ntime_base = \"sample\"\n").unwrap();
        assert_eq!(config.integration.time_base, TimeBase::SampleTimestamp);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for text in [
            "[integration]\nmax_dt = 0.0\n",
            "[integration]\nmax_dt = -1.0\n",
            "[integration]\ntime_base = { fixed = 0.0 }\n",
            "[integration]\nquaternion_tolerance = 0.5\n",
            "[telemetry]\ninterval_ms = 0\n",
            "[feed]\ncapacity = 0\n",
        ] {
            assert!(
                matches!(from_toml(text), Err(NodeError::Config(_))),
                "accepted: {}",
                text
            );
        }
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(matches!(
            from_toml("[telemetry]\ntarget_host = \"x\"\n"),
            Err(NodeError::Figment(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn test_printed_config_loads_back() {
        let mut config = NodeConfig::default();
        config.integration.time_base = TimeBase::Fixed(0.02);
        config.display.interval_ms = 0;
        let text = to_toml(&config).unwrap();
        assert_eq!(from_toml(&text).unwrap(), config);
        assert_eq!(config.display_interval(), None);
    }
}
