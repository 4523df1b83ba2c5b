//! Configuration management for chaser-shot

use crate::capture::CaptureOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of every environment variable the tool reads
pub const ENV_PREFIX: &str = "CHASER";

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// DevTools endpoint of the browser to drive
    pub cdp_endpoint: String,

    /// Directory finished captures are written to
    pub output_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Capture session tuning
    pub capture: CaptureOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_endpoint: "ws://localhost:9222".to_string(),
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            capture: CaptureOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))
    }

    /// Layered load: defaults, then the optional file, then `CHASER_*`
    /// variables (`CHASER_CAPTURE__SETTLE_DELAY_MS` for nested keys).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// [`Config::load`] reading variables from `vars` instead of the process
    /// environment when given
    fn load_from(path: Option<&Path>, vars: Option<::config::Map<String, String>>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())
            .map_err(|e| Error::configuration(format!("Failed to seed defaults: {}", e)))?;

        let mut builder = ::config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("capture.denied_hosts")
                    .source(vars),
            )
            .build()
            .map_err(|e| Error::configuration(format!("Failed to load config: {}", e)))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the capture engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.cdp_endpoint)
            .map_err(|e| Error::configuration(format!("Invalid cdp_endpoint {}: {}", self.cdp_endpoint, e)))?;
        if !matches!(endpoint.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(Error::configuration(format!(
                "cdp_endpoint must be a ws:// or http:// URL, got {}",
                self.cdp_endpoint
            )));
        }

        let capture = &self.capture;
        if capture.max_primary_dimension == 0
            || capture.max_secondary_dimension == 0
            || capture.max_area == 0
        {
            return Err(Error::configuration("Tile limits must be non-zero"));
        }

        if capture.capture_timeout_ms == 0 {
            return Err(Error::configuration("capture_timeout_ms must be non-zero"));
        }

        if !(capture.scroll_pad.is_finite() && capture.scroll_pad >= 0.0) {
            return Err(Error::configuration("scroll_pad must be a non-negative number"));
        }

        Ok(())
    }
}
