//! Response cache configuration.

use serde::{Deserialize, Serialize};

/// Default time-to-live for cached responses, in seconds.
const fn default_ttl_secs() -> u64 {
    3600
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Whether completed responses are looked up and stored at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How long a stored response stays valid.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_secs: default_ttl_secs(),
        }
    }
}
