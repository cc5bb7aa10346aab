use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::claim::Metadata;

/// A single item returned by an evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceResult {
    /// Registry key of the source that produced this result.
    pub source: String,
    pub content: String,
    pub author: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// Engagement counters such as `likes` or `shares`.
    #[serde(default)]
    pub engagement: BTreeMap<String, u64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl EvidenceResult {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        url: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            author: author.into(),
            url: url.into(),
            timestamp,
            engagement: BTreeMap::new(),
            metadata: Metadata::new(),
        }
    }
}

/// Supporting evidence for one claim fragment in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceSummary {
    pub claim_fragment: String,
    pub finding: String,
    pub supporting_results: Vec<EvidenceResult>,
    pub confidence: f64,
}

/// A citable source backing a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub platform: String,
}
