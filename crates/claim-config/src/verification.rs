//! Verification and stage instrumentation settings.

use serde::{Deserialize, Serialize};

/// Default number of entries kept in an error's condensed call chain.
const fn default_call_chain_depth() -> usize {
    5
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Leave sources with a negative sequence out of the default traversal order.
    ///
    /// Off by default: every registered source is traversed. A claim whose
    /// `where` answer names a skipped source still queries it first.
    #[serde(default)]
    pub skip_negative_sequence: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentationConfig {
    /// Maximum entries in the call chain captured when a stage fails.
    #[serde(default = "default_call_chain_depth")]
    pub call_chain_depth: usize,

    /// Parameter-name fragments redacted in addition to the built-in list
    /// (password, token, secret, image_data, api_key).
    #[serde(default)]
    pub extra_sensitive_keys: Vec<String>,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            call_chain_depth: default_call_chain_depth(),
            extra_sensitive_keys: Vec::new(),
        }
    }
}
