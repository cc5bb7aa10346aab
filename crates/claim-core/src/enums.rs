//! Verdicts, claim question types, provenance tags, and source categories.
//!
//! All enums use `snake_case` serialization unless the wire format is fixed
//! otherwise (source categories keep their upper-case registry codes).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Final categorical judgment attached to a response.
///
/// `Error` is the sentinel used when the pipeline itself failed; it is never
/// produced by result analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Authentic,
    NotAuthentic,
    Mixed,
    Unclear,
    Error,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentic => "authentic",
            Self::NotAuthentic => "not_authentic",
            Self::Mixed => "mixed",
            Self::Unclear => "unclear",
            Self::Error => "error",
        }
    }

    /// Whether this verdict reports a pipeline fault rather than an analysis outcome.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QuestionType
// ---------------------------------------------------------------------------

/// The question a [`SubAnswer`](crate::entities::SubAnswer) answers about a claim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Who,
    What,
    When,
    Where,
    How,
    Why,
    Platform,
}

impl QuestionType {
    /// Question types whose confidence is pinned to 1.0 when a claim is matched.
    pub const ANCHORS: [Self; 3] = [Self::Who, Self::What, Self::Where];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Who => "who",
            Self::What => "what",
            Self::When => "when",
            Self::Where => "where",
            Self::How => "how",
            Self::Why => "why",
            Self::Platform => "platform",
        }
    }

    #[must_use]
    pub fn is_anchor(self) -> bool {
        Self::ANCHORS.contains(&self)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExtractedFrom
// ---------------------------------------------------------------------------

/// Provenance of an extracted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractedFrom {
    Text,
    Image,
    Hybrid,
}

impl ExtractedFrom {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ExtractedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawInputType
// ---------------------------------------------------------------------------

/// Which inputs the originating request carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RawInputType {
    TextOnly,
    ImageOnly,
    Both,
}

impl RawInputType {
    /// Classify a pair of optional inputs. Returns `None` when both are absent.
    #[must_use]
    pub const fn from_inputs(has_text: bool, has_image: bool) -> Option<Self> {
        match (has_text, has_image) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::TextOnly),
            (false, true) => Some(Self::ImageOnly),
            (false, false) => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextOnly => "text_only",
            Self::ImageOnly => "image_only",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for RawInputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// VerificationStatus
// ---------------------------------------------------------------------------

/// Outcome recorded in a claim's `verification_status` metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NoEvidence,
    Matched,
}

impl VerificationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEvidence => "no_evidence",
            Self::Matched => "matched",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceCategory
// ---------------------------------------------------------------------------

/// Category code of an external evidence source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SourceCategory {
    /// Social media.
    #[serde(rename = "SOC")]
    Social,
    /// News and commercial media.
    #[serde(rename = "NWS")]
    News,
    /// Government and official bodies.
    #[serde(rename = "GOV")]
    Government,
    /// Academic, research, and everything else.
    #[serde(rename = "OTH")]
    Other,
}

impl SourceCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Social => "SOC",
            Self::News => "NWS",
            Self::Government => "GOV",
            Self::Other => "OTH",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Verdict::Authentic, "authentic")]
    #[case(Verdict::NotAuthentic, "not_authentic")]
    #[case(Verdict::Mixed, "mixed")]
    #[case(Verdict::Unclear, "unclear")]
    #[case(Verdict::Error, "error")]
    fn verdict_serializes_as_snake_case(#[case] verdict: Verdict, #[case] expected: &str) {
        let json = serde_json::to_value(verdict).unwrap();
        assert_eq!(json, serde_json::Value::String(expected.to_string()));
        assert_eq!(verdict.as_str(), expected);
    }

    #[test]
    fn only_error_verdict_is_error() {
        assert!(Verdict::Error.is_error());
        assert!(!Verdict::Unclear.is_error());
    }

    #[test]
    fn anchors_are_who_what_where() {
        assert!(QuestionType::Who.is_anchor());
        assert!(QuestionType::What.is_anchor());
        assert!(QuestionType::Where.is_anchor());
        assert!(!QuestionType::When.is_anchor());
        assert!(!QuestionType::Platform.is_anchor());
    }

    #[test]
    fn raw_input_type_from_inputs() {
        assert_eq!(RawInputType::from_inputs(true, true), Some(RawInputType::Both));
        assert_eq!(RawInputType::from_inputs(true, false), Some(RawInputType::TextOnly));
        assert_eq!(RawInputType::from_inputs(false, true), Some(RawInputType::ImageOnly));
        assert_eq!(RawInputType::from_inputs(false, false), None);
    }

    #[test]
    fn source_category_uses_registry_codes() {
        let json = serde_json::to_string(&SourceCategory::Government).unwrap();
        assert_eq!(json, "\"GOV\"");
        let parsed: SourceCategory = serde_json::from_str("\"SOC\"").unwrap();
        assert_eq!(parsed, SourceCategory::Social);
    }
}
