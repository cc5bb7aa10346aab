//! Evidence source overrides and HTTP source settings.

use std::collections::BTreeMap;

use claim_core::enums::SourceCategory;
use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

/// Per-source override keyed by registry key under `[sources.<key>]`.
///
/// For a key already in the built-in registry every field is optional and
/// only replaces what it names. A key the registry does not know adds a new
/// source and must provide `category` and `sequence`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceOverride {
    #[serde(default)]
    pub sequence: Option<i32>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub category: Option<SourceCategory>,

    #[serde(default)]
    pub display_name: Option<String>,
}

impl Default for SourceOverride {
    fn default() -> Self {
        Self {
            sequence: None,
            enabled: default_enabled(),
            category: None,
            display_name: None,
        }
    }
}

/// Default HTTP timeout for evidence source requests, in seconds.
const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "claimcheck/0.1".to_string()
}

/// Settings for the generic HTTP evidence source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Search endpoint per source key (e.g., `news = "https://search.example/news"`).
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Whether an endpoint is configured for `key`.
    #[must_use]
    pub fn is_configured(&self, key: &str) -> bool {
        self.endpoints.get(key).is_some_and(|url| !url.is_empty())
    }
}
