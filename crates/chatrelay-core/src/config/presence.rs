//! Presence store configuration.

use serde::{Deserialize, Serialize};

/// Presence backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Presence backend: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis connection URL (only used by the redis backend).
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Prefix prepended to every presence key.
    #[serde(default)]
    pub key_prefix: String,
    /// Lifetime of the online marker and room set, refreshed on every join.
    #[serde(default = "default_online_ttl")]
    pub online_ttl_seconds: u64,
    /// Upper bound on tracked users in the memory backend.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis_url: default_redis_url(),
            key_prefix: String::new(),
            online_ttl_seconds: default_online_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_online_ttl() -> u64 {
    1800
}

fn default_max_capacity() -> u64 {
    100_000
}
