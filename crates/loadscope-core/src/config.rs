//! Configuration management for LoadScope
//!
//! This module provides a centralized configuration system that supports:
//! - YAML/TOML/JSON configuration files
//! - Environment variable overrides
//! - Reasonable defaults
//! - Configuration validation

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::pattern::{LoadPatternConfig, PatternKind};
use crate::scenario::{validate_scenarios, ScenarioTemplate};

/// Root configuration structure for LoadScope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadScopeConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub thresholds: DegradationThresholds,

    #[serde(default = "default_load_pattern")]
    pub load_pattern: LoadPatternConfig,

    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<ScenarioTemplate>,

    #[serde(default)]
    pub target: SimulatedTargetConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for LoadScopeConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            thresholds: DegradationThresholds::default(),
            load_pattern: default_load_pattern(),
            scenarios: default_scenarios(),
            target: SimulatedTargetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl LoadScopeConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by LOADSCOPE_CONFIG env var
    /// 3. ./config/loadscope.{yaml,toml,json}
    /// 4. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("LOADSCOPE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/loadscope").required(false));

        // Example: LOADSCOPE__RUN__THINK_TIME_MS=250
        builder = builder.add_source(
            Environment::with_prefix("LOADSCOPE")
                .separator("__")
                .try_parsing(true),
        );

        let config: LoadScopeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, still honouring
    /// environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: LoadScopeConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("LOADSCOPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Set default values for all scalar configuration options
    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            // Run
            .set_default("run.timeout_ms", 30_000)?
            .set_default("run.think_time_ms", 1_000)?
            .set_default("run.tick_interval_ms", 1_000)?
            .set_default("run.window_size_ms", 10_000)?
            .set_default("run.progress_every", 10)?
            .set_default("run.rolling_window", 100)?
            .set_default("run.safety_margin", 0.2)?
            // Thresholds
            .set_default("thresholds.latency_factor", 1.5)?
            .set_default("thresholds.throughput_factor", 0.7)?
            .set_default("thresholds.max_error_rate", 0.05)?
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.thresholds.validate()?;

        self.load_pattern
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        validate_scenarios(&self.scenarios).map_err(|e| ConfigError::Message(e.to_string()))?;

        if !(0.0..=1.0).contains(&self.target.error_rate) {
            return Err(ConfigError::Message(
                "target.error_rate must be within 0.0-1.0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load generation and analysis settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Pause between a virtual user's requests in milliseconds
    pub think_time_ms: u64,

    /// Controller retarget cadence in milliseconds
    pub tick_interval_ms: u64,

    /// Aggregation window size in milliseconds
    pub window_size_ms: u64,

    /// Completed requests between progress callbacks
    pub progress_every: usize,

    /// Recent requests used for rolling progress statistics
    pub rolling_window: usize,

    /// Fraction subtracted from measured capacity (0.0-1.0)
    pub safety_margin: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            think_time_ms: 1_000,
            tick_interval_ms: 1_000,
            window_size_ms: 10_000,
            progress_every: 10,
            rolling_window: 100,
            safety_margin: 0.2,
        }
    }
}

impl RunConfig {
    /// Get request timeout duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get think time duration
    pub fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_time_ms)
    }

    /// Get controller tick duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Message("run.timeout_ms must be > 0".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "run.tick_interval_ms must be > 0".to_string(),
            ));
        }
        if self.window_size_ms == 0 {
            return Err(ConfigError::Message(
                "run.window_size_ms must be > 0".to_string(),
            ));
        }
        if self.progress_every == 0 || self.rolling_window == 0 {
            return Err(ConfigError::Message(
                "run.progress_every and run.rolling_window must be > 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.safety_margin) {
            return Err(ConfigError::Message(
                "run.safety_margin must be within [0.0, 1.0)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds used to flag a window as degraded relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct DegradationThresholds {
    /// Window average latency above `baseline * latency_factor` is degraded
    pub latency_factor: f64,

    /// Window throughput below `baseline * throughput_factor` is degraded
    pub throughput_factor: f64,

    /// Absolute error rate above which a window is degraded
    pub max_error_rate: f64,
}

impl Default for DegradationThresholds {
    fn default() -> Self {
        Self {
            latency_factor: 1.5,
            throughput_factor: 0.7,
            max_error_rate: 0.05,
        }
    }
}

impl DegradationThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.latency_factor) || !positive(self.throughput_factor) {
            return Err(ConfigError::Message(
                "thresholds.latency_factor and thresholds.throughput_factor must be > 0"
                    .to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_error_rate) {
            return Err(ConfigError::Message(
                "thresholds.max_error_rate must be within 0.0-1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the built-in simulated target
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatedTargetConfig {
    /// Latency of an unloaded request (default: 100)
    #[serde(default = "default_base_latency_ms")]
    pub base_latency_ms: u64,

    /// Extra latency per in-flight request above `knee_users` (default: 0)
    #[serde(default)]
    pub latency_per_user_ms: u64,

    /// In-flight requests the target absorbs without slowing down (default: 0)
    #[serde(default)]
    pub knee_users: usize,

    /// Probability that a request fails outright (default: 0.0)
    #[serde(default)]
    pub error_rate: f64,

    /// In-flight requests above which the target sheds load (default: unlimited)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_users: Option<usize>,

    /// Response chunks streamed per request (default: 1)
    #[serde(default = "default_chunk_count")]
    pub chunk_count: usize,

    /// Bytes per response chunk (default: 256)
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,
}

impl Default for SimulatedTargetConfig {
    fn default() -> Self {
        Self {
            base_latency_ms: default_base_latency_ms(),
            latency_per_user_ms: 0,
            knee_users: 0,
            error_rate: 0.0,
            capacity_users: None,
            chunk_count: default_chunk_count(),
            chunk_bytes: default_chunk_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty (default: "pretty")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_load_pattern() -> LoadPatternConfig {
    LoadPatternConfig::new(PatternKind::Sustained, 0, 10, 60_000)
}

fn default_scenarios() -> Vec<ScenarioTemplate> {
    vec![ScenarioTemplate::new("default", serde_json::Value::Null)]
}

fn default_base_latency_ms() -> u64 {
    100
}

fn default_chunk_count() -> usize {
    1
}

fn default_chunk_bytes() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
