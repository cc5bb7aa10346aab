use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::evidence::{EvidenceSummary, Reference};
use crate::enums::Verdict;

/// Where and why a pipeline stage failed.
///
/// Only created on failure and only attached to `Verdict::Error` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorContext {
    pub failed_stage: String,
    /// Fully-qualified identifier of the function that failed.
    pub failed_function: String,
    /// Parameter snapshot with binary payloads and secrets scrubbed.
    pub input_params: BTreeMap<String, serde_json::Value>,
    pub error_type: String,
    pub error_message: String,
    /// Condensed chain from the failing function down to the root cause.
    pub call_chain: Vec<String>,
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Complete fact-check output returned to the caller.
///
/// `evidence`, `references`, and `search_queries_used` are `null` exactly
/// when `verdict` is `error`; `error_details` is present exactly then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    pub request_id: String,
    pub claim_id: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub evidence: Option<Vec<EvidenceSummary>>,
    pub references: Option<Vec<Reference>>,
    pub explanation: String,
    pub search_queries_used: Option<Vec<String>>,
    pub cached: bool,
    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub error_details: Option<ErrorContext>,
}

impl Response {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.verdict.is_error()
    }
}
