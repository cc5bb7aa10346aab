//! Error types for the fact-check pipeline.

use std::collections::BTreeMap;

use claim_core::entities::ErrorContext;
use claim_sources::SourceError;
use thiserror::Error;

use crate::instrument::Stage;

/// Failure reported by an extraction collaborator.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The underlying model call exceeded its own deadline.
    #[error("extraction timed out: {0}")]
    Timeout(String),

    /// The model answered with something that could not be turned into a claim.
    #[error("model error: {0}")]
    Model(String),

    /// The image payload could not be decoded or split.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure reported by a response cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be encoded: {0}")]
    Serialization(String),
}

/// Failure reported by a result processor.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A stage failure with everything needed to build an [`ErrorContext`].
#[derive(Debug, Error)]
#[error("{stage} failed: {message}")]
pub struct StageError {
    pub stage: Stage,
    /// Fully-qualified identifier of the wrapped function.
    pub function: &'static str,
    /// Sanitized parameter snapshot.
    pub params: BTreeMap<String, serde_json::Value>,
    /// Short type name of the original error, or `panic`.
    pub error_type: String,
    pub message: String,
    /// The wrapped function followed by the deepest causes.
    pub call_chain: Vec<String>,
    /// Correlation id of the run the failure happened in.
    pub request_id: Option<String>,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl StageError {
    #[must_use]
    pub fn to_context(&self) -> ErrorContext {
        ErrorContext {
            failed_stage: self.stage.to_string(),
            failed_function: self.function.to_string(),
            input_params: self.params.clone(),
            error_type: self.error_type.clone(),
            error_message: self.message.clone(),
            call_chain: self.call_chain.clone(),
            request_id: self.request_id.clone(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Anything that stops a `check` run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A wrapped stage failed; full context is available.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// A failure outside any wrapped stage; context is best-effort.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Errors building a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Source(#[from] SourceError),
}
