use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ExtractedFrom, QuestionType, RawInputType, VerificationStatus};

/// Free-form key/value facts attached to claims and evidence.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Metadata keys written by the pipeline.
pub mod meta {
    pub const VERIFICATION_STATUS: &str = "verification_status";
    pub const RESULT_COUNT: &str = "result_count";
    pub const ERROR: &str = "error";
    pub const COMBINATION_METHOD: &str = "combination_method";
    pub const SEARCH_QUERY: &str = "search_query";
    pub const SOURCES_QUERIED: &str = "sources_queried";
    pub const SOURCES_FAILED: &str = "sources_failed";
    pub const IMAGE_ROLE: &str = "image_role";
}

/// One typed fragment of a claim ("who said it", "where was it posted").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubAnswer {
    pub question: QuestionType,
    pub answer: String,
    pub related_entity: Option<String>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
}

impl SubAnswer {
    /// Create a sub-answer. Confidence is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(question: QuestionType, answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            question,
            answer: answer.into(),
            related_entity: None,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn with_related_entity(mut self, entity: impl Into<String>) -> Self {
        self.related_entity = Some(entity.into());
        self
    }
}

/// A single verifiable statement extracted from a request.
///
/// Extraction creates claims, verification mutates `confidence` and
/// `metadata` in place, and response assembly only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Claim {
    pub text: String,
    pub extracted_from: ExtractedFrom,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub raw_input_type: RawInputType,
    /// At most one entry per [`QuestionType`], in insertion order.
    pub sub_answers: Vec<SubAnswer>,
    pub segments: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Claim {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        extracted_from: ExtractedFrom,
        raw_input_type: RawInputType,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            extracted_from,
            confidence: confidence.clamp(0.0, 1.0),
            raw_input_type,
            sub_answers: Vec::new(),
            segments: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// A placeholder claim standing in for a failed extraction.
    ///
    /// Carries empty text, zero confidence, and the failure reason under
    /// `metadata.error`.
    #[must_use]
    pub fn error_sentinel(
        message: impl Into<String>,
        extracted_from: ExtractedFrom,
        raw_input_type: RawInputType,
    ) -> Self {
        let mut claim = Self::new(String::new(), extracted_from, raw_input_type, 0.0);
        claim
            .metadata
            .insert(meta::ERROR.to_string(), message.into().into());
        claim.metadata.insert(
            meta::COMBINATION_METHOD.to_string(),
            "error_fallback".into(),
        );
        claim
    }

    #[must_use]
    pub fn with_sub_answer(mut self, sub_answer: SubAnswer) -> Self {
        self.set_sub_answer(sub_answer);
        self
    }

    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Insert a sub-answer, replacing any existing answer of the same type in place.
    pub fn set_sub_answer(&mut self, sub_answer: SubAnswer) {
        match self
            .sub_answers
            .iter_mut()
            .find(|existing| existing.question == sub_answer.question)
        {
            Some(existing) => *existing = sub_answer,
            None => self.sub_answers.push(sub_answer),
        }
    }

    #[must_use]
    pub fn sub_answer(&self, question: QuestionType) -> Option<&SubAnswer> {
        self.sub_answers.iter().find(|a| a.question == question)
    }

    /// Failure reason if this claim is an extraction error sentinel.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.metadata.get(meta::ERROR).and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn is_error_sentinel(&self) -> bool {
        self.error().is_some()
    }

    #[must_use]
    pub fn verification_status(&self) -> Option<VerificationStatus> {
        match self
            .metadata
            .get(meta::VERIFICATION_STATUS)
            .and_then(serde_json::Value::as_str)
        {
            Some("no_evidence") => Some(VerificationStatus::NoEvidence),
            Some("matched") => Some(VerificationStatus::Matched),
            _ => None,
        }
    }

    pub fn set_verification_status(&mut self, status: VerificationStatus) {
        self.metadata.insert(
            meta::VERIFICATION_STATUS.to_string(),
            status.as_str().into(),
        );
    }
}
