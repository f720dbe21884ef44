//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};

use crate::ratelimit::LimitRules;

/// Main configuration for the Floodgate library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Bucket store configuration
    #[serde(default)]
    pub store: StoreSettings,

    /// Background sweep configuration
    #[serde(default)]
    pub sweep: SweepSettings,

    /// Declarative rate limit rules
    #[serde(default)]
    pub rules: LimitRules,
}

/// Bucket store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Bucket count at which an inline eviction pass is triggered
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,

    /// Number of windows a bucket may sit idle before it is evictable
    #[serde(default = "default_stale_after_windows")]
    pub stale_after_windows: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_buckets: default_max_buckets(),
            stale_after_windows: default_stale_after_windows(),
        }
    }
}

fn default_max_buckets() -> usize {
    10000
}

fn default_stale_after_windows() -> u32 {
    4
}

/// Background sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

impl FloodgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
