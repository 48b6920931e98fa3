//! Engine configuration
//!
//! Plain serde-deserializable configuration with per-field defaults, so the
//! engine runs with sensible values when no configuration is supplied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level settlement engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Product state cache configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on a single cache read; an elapsed timeout is treated as
    /// a miss
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl CacheConfig {
    /// The read timeout as a [`Duration`]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_read_timeout_ms() -> u64 {
    5_000
}
