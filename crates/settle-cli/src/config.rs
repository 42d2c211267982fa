//! Application configuration.
//!
//! Layered with the `config` crate: built-in defaults, then the TOML file,
//! then `SETTLE__<SECTION>__<KEY>` environment overrides, e.g.
//! `SETTLE__ORDER__CHAIN_ID=137`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use settle_channel::ChannelConfig;
use settle_escrow::EscrowConfig;
use settle_order::OrderConfig;
use settle_scanner::ScannerConfig;
use settle_telemetry::TelemetryConfig;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Config file used when neither `--config` nor `SETTLE_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SETTLE_CONFIG";

const ENV_PREFIX: &str = "SETTLE";
const ENV_SEPARATOR: &str = "__";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub escrow: EscrowConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path precedence: `path` argument > `SETTLE_CONFIG` > `config/default.toml`.
    /// An explicitly named file must exist; a missing default file means
    /// built-in defaults.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let explicit = path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        let required = explicit.is_some();
        let selected = explicit.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        debug!(config_path = %selected, required, "Loading configuration");

        let settings = Config::builder()
            .add_source(File::from(Path::new(&selected)).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without touching files or the environment.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        let sections = [
            ("order", self.order.validate()),
            ("escrow", self.escrow.validate()),
            ("channel", self.channel.validate()),
            ("scanner", self.scanner.validate()),
        ];
        for (name, result) in sections {
            result.map_err(|e| AppError::Config(format!("[{name}] {e}")))?;
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to render config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use settle_escrow::HashAlgorithm;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [order]
            chain_id = 137

            [escrow]
            hash_algorithm = "keccak256"

            [scanner]
            fee_bps = "5"
            "#,
        )
        .unwrap();
        assert_eq!(config.order.chain_id, 137);
        assert_eq!(config.order.domain_version, "1");
        assert_eq!(config.escrow.hash_algorithm, HashAlgorithm::Keccak256);
        assert_eq!(config.escrow.safety_margin_secs, 3600);
        assert_eq!(config.scanner.fee_bps, dec!(5));
        assert_eq!(config.channel, ChannelConfig::default());
    }

    #[test]
    fn test_invalid_section_named_in_error() {
        let err = AppConfig::from_toml_str("[channel]\nchallenge_period_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("[channel]"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some("does/not/exist.toml")).is_err());
    }

    #[test]
    fn test_shipped_default_matches_builtin() {
        let shipped = AppConfig::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(shipped, AppConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
