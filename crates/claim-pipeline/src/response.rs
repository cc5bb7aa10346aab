//! Response assembly.

use std::time::Duration;

use chrono::Utc;
use claim_core::entities::{ErrorContext, Response};
use claim_core::enums::Verdict;

use crate::error::PipelineError;
use crate::processor::ProcessorOutput;

/// Placeholder for context fields an unexpected failure cannot provide.
const UNKNOWN: &str = "unknown";

fn elapsed_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

/// A fresh, successful response.
#[must_use]
pub fn success(
    request_id: &str,
    claim_id: &str,
    output: ProcessorOutput,
    elapsed: Duration,
) -> Response {
    Response {
        request_id: request_id.to_string(),
        claim_id: claim_id.to_string(),
        verdict: output.verdict,
        confidence: output.confidence.clamp(0.0, 1.0),
        evidence: Some(output.evidence),
        references: Some(output.references),
        explanation: output.explanation,
        search_queries_used: Some(output.search_queries),
        cached: false,
        processing_time_ms: elapsed_ms(elapsed),
        timestamp: Utc::now(),
        error_details: None,
    }
}

/// A cached response restamped for the current request.
#[must_use]
pub fn from_cache(mut cached: Response, request_id: &str, elapsed: Duration) -> Response {
    cached.request_id = request_id.to_string();
    cached.cached = true;
    cached.processing_time_ms = elapsed_ms(elapsed);
    cached
}

/// An `error` verdict describing why the run stopped.
#[must_use]
pub fn failure(
    request_id: &str,
    claim_id: &str,
    error: &PipelineError,
    elapsed: Duration,
) -> Response {
    let mut context = match error {
        PipelineError::Stage(stage_error) => stage_error.to_context(),
        PipelineError::Unexpected(message) => ErrorContext {
            failed_stage: UNKNOWN.to_string(),
            failed_function: UNKNOWN.to_string(),
            input_params: std::collections::BTreeMap::new(),
            error_type: "unexpected".to_string(),
            error_message: message.clone(),
            call_chain: Vec::new(),
            request_id: None,
            timestamp: Utc::now(),
        },
    };
    if context.request_id.is_none() {
        context.request_id = Some(request_id.to_string());
    }

    Response {
        request_id: request_id.to_string(),
        claim_id: claim_id.to_string(),
        verdict: Verdict::Error,
        confidence: 0.0,
        evidence: None,
        references: None,
        explanation: format!(
            "Fact-check failed during {}: {}",
            context.failed_stage, context.error_message
        ),
        search_queries_used: None,
        cached: false,
        processing_time_ms: elapsed_ms(elapsed),
        timestamp: Utc::now(),
        error_details: Some(context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::instrument::{Instrumentation, Params, Stage};
    use pretty_assertions::assert_eq;

    fn output() -> ProcessorOutput {
        ProcessorOutput {
            verdict: Verdict::Unclear,
            confidence: 0.5,
            evidence: Vec::new(),
            references: Vec::new(),
            explanation: "No relevant results found".into(),
            search_queries: Vec::new(),
        }
    }

    #[test]
    fn success_has_non_null_collections() {
        let response = success("req-1", "clm-1", output(), Duration::from_millis(12));
        assert_eq!(response.evidence, Some(Vec::new()));
        assert_eq!(response.references, Some(Vec::new()));
        assert!(!response.cached);
        assert!(response.error_details.is_none());
        assert!((response.processing_time_ms - 12.0).abs() < 1e-6);
    }

    #[test]
    fn from_cache_restamps() {
        let stored = success("req-old", "clm-1", output(), Duration::from_millis(500));
        let response = from_cache(stored, "req-new", Duration::from_millis(2));
        assert_eq!(response.request_id, "req-new");
        assert_eq!(response.claim_id, "clm-1");
        assert!(response.cached);
        assert!((response.processing_time_ms - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn failure_from_stage_error() {
        let stage_error = Instrumentation::default()
            .run(Stage::CacheStorage, "tests::store", Params::new(), async {
                Err::<(), _>(CacheError::Unavailable("disk full".into()))
            })
            .await
            .unwrap_err();

        let response = failure(
            "req-1",
            "clm-1",
            &PipelineError::Stage(stage_error),
            Duration::from_millis(5),
        );

        assert_eq!(response.verdict, Verdict::Error);
        assert!(response.confidence.abs() < f64::EPSILON);
        assert!(response.evidence.is_none());
        assert!(response.references.is_none());
        assert!(response.search_queries_used.is_none());
        assert_eq!(
            response.explanation,
            "Fact-check failed during Cache Storage: cache unavailable: disk full"
        );
        let details = response.error_details.unwrap();
        assert_eq!(details.failed_stage, "Cache Storage");
        assert_eq!(details.failed_function, "tests::store");
        assert_eq!(details.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn unexpected_failure_has_degraded_context() {
        let response = failure(
            "req-1",
            "clm-1",
            &PipelineError::Unexpected("boom".into()),
            Duration::ZERO,
        );
        let details = response.error_details.unwrap();
        assert_eq!(details.failed_stage, "unknown");
        assert_eq!(details.failed_function, "unknown");
        assert_eq!(details.error_message, "boom");
        assert_eq!(response.explanation, "Fact-check failed during unknown: boom");
    }
}
