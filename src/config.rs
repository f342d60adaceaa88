//! Engine and pipeline configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one sliding window engine
///
/// Immutable once the engine starts.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Retention span, also the deadline for the first evaluation
    pub window_duration: Duration,

    /// Period of the evaluation ticker
    pub evaluation_interval: Duration,

    /// Capacity of the inbound and outbound feed channels
    pub channel_buffer: usize,

    /// Mean at or above which the average aggregator reports a breach
    pub average_threshold: f32,
}

impl EngineConfig {
    pub const DEFAULT_WINDOW_MS: u64 = 10_000;
    pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
    pub const DEFAULT_CHANNEL_BUFFER: usize = 1_024;
    pub const DEFAULT_AVERAGE_THRESHOLD: f32 = 13.0;

    pub fn new(window_duration: Duration, evaluation_interval: Duration) -> Result<Self, ConfigError> {
        let config = Self {
            window_duration,
            evaluation_interval,
            channel_buffer: Self::DEFAULT_CHANNEL_BUFFER,
            average_threshold: Self::DEFAULT_AVERAGE_THRESHOLD,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WINDOW_DURATION_MS` (default: 10000)
    /// - `EVALUATION_INTERVAL_MS` (default: 1000)
    /// - `FEED_CHANNEL_BUFFER` (default: 1024)
    /// - `AVERAGE_THRESHOLD` (default: 13)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            window_duration: Duration::from_millis(parse_var(
                "WINDOW_DURATION_MS",
                Self::DEFAULT_WINDOW_MS,
            )?),
            evaluation_interval: Duration::from_millis(parse_var(
                "EVALUATION_INTERVAL_MS",
                Self::DEFAULT_INTERVAL_MS,
            )?),
            channel_buffer: parse_var("FEED_CHANNEL_BUFFER", Self::DEFAULT_CHANNEL_BUFFER)?,
            average_threshold: parse_var("AVERAGE_THRESHOLD", Self::DEFAULT_AVERAGE_THRESHOLD)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_channel_buffer(mut self, channel_buffer: usize) -> Result<Self, ConfigError> {
        self.channel_buffer = channel_buffer;
        self.validate()?;
        Ok(self)
    }

    pub fn with_average_threshold(mut self, threshold: f32) -> Result<Self, ConfigError> {
        self.average_threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_duration.is_zero() {
            return Err(ConfigError::InvalidValue(
                "window duration must be positive".to_string(),
            ));
        }

        if self.evaluation_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "evaluation interval must be positive".to_string(),
            ));
        }

        if self.channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "feed channel buffer must be at least 1".to_string(),
            ));
        }

        if !self.average_threshold.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "average threshold must be finite, got {}",
                self.average_threshold
            )));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_duration: Duration::from_millis(Self::DEFAULT_WINDOW_MS),
            evaluation_interval: Duration::from_millis(Self::DEFAULT_INTERVAL_MS),
            channel_buffer: Self::DEFAULT_CHANNEL_BUFFER,
            average_threshold: Self::DEFAULT_AVERAGE_THRESHOLD,
        }
    }
}

/// Configuration for the noise pipeline binary
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name stamped on every generated reading
    pub source_name: String,

    /// Delay between generated readings
    pub source_interval: Duration,

    /// Divisor applied by the scale stage
    pub scale_divisor: f32,

    /// Single-value threshold checked by the peak stage
    pub peak_threshold: f32,

    pub engine: EngineConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables (plus everything `EngineConfig::from_env` reads):
    /// - `SOURCE_NAME` (default: localhost)
    /// - `SOURCE_INTERVAL_MS` (default: 5000)
    /// - `SCALE_DIVISOR` (default: 10)
    /// - `PEAK_THRESHOLD` (default: 16)
    pub fn from_env() -> Result<Self, ConfigError> {
        let source_name = env::var("SOURCE_NAME").unwrap_or_else(|_| "localhost".to_string());

        let source_interval_ms: u64 = parse_var("SOURCE_INTERVAL_MS", 5_000)?;
        if source_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "SOURCE_INTERVAL_MS must be positive".to_string(),
            ));
        }

        let scale_divisor: f32 = parse_var("SCALE_DIVISOR", 10.0)?;
        if scale_divisor == 0.0 || !scale_divisor.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "SCALE_DIVISOR must be finite and non-zero, got {}",
                scale_divisor
            )));
        }

        let peak_threshold: f32 = parse_var("PEAK_THRESHOLD", 16.0)?;
        if !peak_threshold.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "PEAK_THRESHOLD must be finite, got {}",
                peak_threshold
            )));
        }

        Ok(Self {
            source_name,
            source_interval: Duration::from_millis(source_interval_ms),
            scale_divisor,
            peak_threshold,
            engine: EngineConfig::from_env()?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{} could not be parsed from '{}'", name, raw))
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue(format!(
            "{} is not valid unicode",
            name
        ))),
    }
}
