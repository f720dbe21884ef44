//! Declarative rate limit rules.
//!
//! Rules let deployments configure budgets in YAML instead of hard-coding a
//! limit and window at every call site. Keys conventionally take the shape
//! `class:identifier` (for example `ip:203.0.113.9` or `user:42`), and a
//! rule can target one exact key, a whole class, or everything.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};

/// A rate limit rule specifying the budget and time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRule {
    /// Number of requests allowed per unit of time
    pub requests_per_unit: u64,
    /// The time unit
    pub unit: TimeUnit,
}

/// Time unit for rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Get the duration of this time unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(3600),
            TimeUnit::Day => Duration::from_secs(86400),
        }
    }
}

impl LimitRule {
    /// The window duration this rule counts over.
    pub fn window(&self) -> Duration {
        self.unit.duration()
    }
}

/// A complete set of rate limit rules.
///
/// Resolution order for a key: an exact key match wins, then the key's
/// class (the text before the first `:`), then the default rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitRules {
    /// Rule applied when nothing more specific matches
    #[serde(default)]
    pub default: Option<LimitRule>,
    /// Rules per key class
    #[serde(default)]
    pub classes: HashMap<String, LimitRule>,
    /// Rules per exact key
    #[serde(default)]
    pub keys: HashMap<String, LimitRule>,
}

impl LimitRules {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load rules from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| FloodgateError::Config(format!("Failed to parse rate limit rules: {}", e)))
    }

    /// Find the rule that governs `key`.
    pub fn find_limit(&self, key: &str) -> Option<&LimitRule> {
        if let Some(rule) = self.keys.get(key) {
            return Some(rule);
        }

        if let Some((class, _)) = key.split_once(':') {
            if let Some(rule) = self.classes.get(class) {
                return Some(rule);
            }
        }

        self.default.as_ref()
    }
}
