// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// The configuration file consulted when no `--config` flag is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_min_delay_ms() -> u64 {
    0
}
fn default_max_delay_ms() -> u64 {
    1000
}
fn default_memory_sample_interval_secs() -> u64 {
    5
}

/// Represents the server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Lower bound (inclusive) of the simulated per-request work, in milliseconds.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Upper bound (exclusive) of the simulated per-request work, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Seconds between two memory samples.
    #[serde(default = "default_memory_sample_interval_secs")]
    pub memory_sample_interval_secs: u64,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            memory_sample_interval_secs: default_memory_sample_interval_secs(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolves the configuration to run with.
    ///
    /// An explicitly requested file must exist. When no file is requested, the
    /// default path is used if present and the built-in defaults otherwise.
    pub fn load(explicit_path: Option<&str>) -> Result<Self> {
        match explicit_path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            None => Ok(Self::default()),
        }
    }

    /// The sampling period of the memory sampler.
    pub fn memory_sample_interval(&self) -> Duration {
        Duration::from_secs(self.memory_sample_interval_secs)
    }

    /// Replaces the listening port, then re-validates so command-line
    /// overrides are held to the same rules as the file.
    pub fn override_port(&mut self, port: u16) -> Result<()> {
        self.port = port;
        self.validate()
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.max_delay_ms <= self.min_delay_ms {
            return Err(anyhow!(
                "max_delay_ms ({}) must be greater than min_delay_ms ({})",
                self.max_delay_ms,
                self.min_delay_ms
            ));
        }
        if self.memory_sample_interval_secs == 0 {
            return Err(anyhow!("memory_sample_interval_secs cannot be 0"));
        }
        if self.max_delay_ms > 60_000 {
            warn!(
                "max_delay_ms is {} ms. Shutdown waits for every in-flight request, so draining may take as long.",
                self.max_delay_ms
            );
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
