//! # claim-config
//!
//! Layered configuration loading for claimcheck using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CLAIMCHECK_*` prefix, `__` as separator)
//! 2. Project-level `.claimcheck/config.toml`
//! 3. User-level `~/.config/claimcheck/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CLAIMCHECK_CACHE__TTL_SECS` -> `cache.ttl_secs`,
//! `CLAIMCHECK_SOURCES__TWITTER__SEQUENCE` -> `sources.twitter.sequence`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use claim_config::ClaimConfig;
//!
//! let config = ClaimConfig::load_with_dotenv().expect("config");
//! if config.cache.enabled {
//!     println!("responses cached for {}s", config.cache.ttl_secs);
//! }
//! ```

mod cache;
mod error;
mod logging;
mod sources;
mod verification;

pub use cache::CacheConfig;
pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use sources::{HttpConfig, SourceOverride};
pub use verification::{InstrumentationConfig, VerificationConfig};

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClaimConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub instrumentation: InstrumentationConfig,
    /// Registry overrides keyed by source key.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceOverride>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClaimConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a provider fails to parse or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a provider fails to parse or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on extraction failure or invalid values.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".claimcheck/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CLAIMCHECK_").split("__"))
    }

    /// Check cross-field constraints figment cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs".into(),
                reason: "must be positive when the cache is enabled".into(),
            });
        }
        if self.instrumentation.call_chain_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "instrumentation.call_chain_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        if let Some(key) = self.sources.keys().find(|key| key.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("sources.{key}"),
                reason: "source key must not be blank".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("claimcheck").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) looking for a `.env`
    /// file, then falls back to the current directory.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}
