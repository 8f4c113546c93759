//! Configuration parsing and validation for the stereo sync node.

use eyre::{Result, WrapErr, bail, ensure};
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path, time::Duration};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Streams to synchronize, in slot order.
    #[serde(default = "default_streams")]
    pub streams: Vec<StreamConfig>,

    /// Loop rate limit.
    #[serde(default)]
    pub rate: RateConfig,

    /// Depth of every subscription and publication queue.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// How often synchronization statistics are logged.
    #[serde(default = "default_stats_interval", with = "humantime_serde")]
    pub stats_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            streams: default_streams(),
            rate: RateConfig::default(),
            queue_size: default_queue_size(),
            stats_interval: default_stats_interval(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .wrap_err_with(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).wrap_err("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.streams.is_empty(), "At least one stream is required");

        for (i, stream) in self.streams.iter().enumerate() {
            ensure!(!stream.name.is_empty(), "Stream name at index {} cannot be empty", i);
            ensure!(
                !stream.input.is_empty(),
                "Input topic of stream '{}' cannot be empty",
                stream.name
            );
            ensure!(
                !stream.output.is_empty(),
                "Output topic of stream '{}' cannot be empty",
                stream.name
            );
        }

        check_unique("stream name", self.streams.iter().map(|s| s.name.as_str()))?;
        check_unique("input topic", self.streams.iter().map(|s| s.input.as_str()))?;
        check_unique("output topic", self.streams.iter().map(|s| s.output.as_str()))?;

        ensure!(
            self.rate.max_rate_hz.is_finite() && self.rate.max_rate_hz > 0.0,
            "rate.max_rate_hz must be a positive number, got {}",
            self.rate.max_rate_hz
        );
        self.loop_period()?;

        ensure!(self.queue_size > 0, "queue_size must be greater than zero");

        ensure!(
            !self.stats_interval.is_zero(),
            "stats_interval must be greater than zero"
        );
        ensure!(
            self.stats_interval <= MAX_INTERVAL,
            "stats_interval must not exceed {:?}, got {:?}",
            MAX_INTERVAL,
            self.stats_interval
        );

        Ok(())
    }

    /// The minimum time between two iterations of the node loop.
    ///
    /// Fails unless the period is between one nanosecond and
    /// [`MAX_INTERVAL`].
    pub fn loop_period(&self) -> Result<Duration> {
        let hz = self.rate.max_rate_hz;
        let period = Duration::try_from_secs_f64(1.0 / hz)
            .wrap_err_with(|| format!("rate.max_rate_hz {} gives no valid loop period", hz))?;

        ensure!(
            !period.is_zero(),
            "rate.max_rate_hz {} is too high, the loop period rounds to zero",
            hz
        );
        ensure!(
            period <= MAX_INTERVAL,
            "rate.max_rate_hz {} is too low, the loop period exceeds {:?}",
            hz,
            MAX_INTERVAL
        );

        Ok(period)
    }
}

/// Upper bound on the loop period and the statistics interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn check_unique<'a>(what: &str, values: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            bail!("Duplicate {}: {}", what, value);
        }
    }
    Ok(())
}

/// One synchronized stream: where frames come from and where the
/// stamped copies go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Slot name, e.g. "left".
    pub name: String,

    /// Topic carrying unsynchronized frames and camera info.
    pub input: String,

    /// Topic the synchronized frames are republished on.
    pub output: String,
}

impl StreamConfig {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

fn default_streams() -> Vec<StreamConfig> {
    vec![
        StreamConfig::new("left", "unsynced/left/image_raw", "synced/left/image_raw"),
        StreamConfig::new("right", "unsynced/right/image_raw", "synced/right/image_raw"),
    ]
}

/// Rate limit of the node loop.
#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    /// Upper bound on loop iterations, and therefore on emitted pairs,
    /// per second.
    #[serde(default = "default_max_rate_hz")]
    pub max_rate_hz: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            max_rate_hz: default_max_rate_hz(),
        }
    }
}

fn default_max_rate_hz() -> f64 {
    120.0
}

fn default_queue_size() -> usize {
    1
}

fn default_stats_interval() -> Duration {
    Duration::from_secs(10)
}
