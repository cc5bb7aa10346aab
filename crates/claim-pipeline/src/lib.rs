//! # claim-pipeline
//!
//! The claimcheck fact-check pipeline.
//!
//! A [`Pipeline`] takes a [`Request`](claim_core::entities::Request) through
//! cache lookup, claim extraction, per-claim verification against evidence
//! sources, response generation, and cache storage. Each stage is wrapped by
//! [`Instrumentation`], so any failure reaches the caller as an `error`
//! verdict with a populated error context instead of an `Err` or a panic.
//!
//! Collaborators plug in through traits: [`Extractor`] and
//! [`ImageClassifier`] for extraction, [`claim_sources::EvidenceSource`] for
//! evidence, [`ResponseCache`] for caching, [`Processor`] for verdicts, and
//! [`MatchPredicate`] for deciding when evidence is conclusive.

pub mod cache;
pub mod context;
pub mod error;
pub mod extraction;
pub mod instrument;
pub mod orchestrator;
pub mod processor;
pub mod response;
pub mod telemetry;
pub mod verification;

pub use cache::{MemoryCache, ResponseCache, cache_key};
pub use error::{BuildError, CacheError, ExtractError, PipelineError, ProcessError, StageError};
pub use extraction::{ExtractionCoordinator, Extractor, ImageClassifier};
pub use instrument::{Instrumentation, Param, Stage};
pub use orchestrator::{Pipeline, PipelineBuilder};
pub use processor::{Processor, ProcessorOutput, ResultAnalyzer};
pub use verification::{MatchPredicate, NeverMatch, ResultsFound, VerificationEngine};
