//! The `check` state machine.
//!
//! ```text
//! Start → CacheLookup ─ hit ──→ restamp cached response → Done
//!                     └ miss ─→ ClaimExtraction → ClaimVerification
//!                               → ResponseGeneration → CacheStorage → Done
//! ```
//!
//! Every stage runs through [`Instrumentation`]; the first failure
//! short-circuits to an `error` response. [`Pipeline::check`] never fails
//! and never panics.

use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use claim_config::ClaimConfig;
use claim_core::entities::{Claim, EvidenceResult, Request, Response};
use claim_core::ids;
use claim_sources::SourceCatalog;
use futures::FutureExt;
use tracing::Instrument;

use crate::cache::{self, MemoryCache, ResponseCache};
use crate::context;
use crate::error::{BuildError, PipelineError, StageError};
use crate::extraction::{ExtractionCoordinator, Extractor, ImageClassifier};
use crate::instrument::{Instrumentation, Param, Params, Stage, panic_message};
use crate::processor::{Processor, ProcessorOutput, ResultAnalyzer};
use crate::response;
use crate::verification::{MatchPredicate, NeverMatch, VerificationEngine};

const CHECK_CACHE: &str = concat!(module_path!(), "::Pipeline::check_cache");
const EXTRACT_CLAIMS: &str = concat!(module_path!(), "::Pipeline::extract_claims");
const VERIFY_CLAIMS: &str = concat!(module_path!(), "::Pipeline::verify_claims");
const GENERATE_RESPONSE: &str = concat!(module_path!(), "::Pipeline::generate_response");
const STORE_RESPONSE: &str = concat!(module_path!(), "::Pipeline::store_response");

/// The fact-check pipeline.
///
/// Cheap to share behind an `Arc`; concurrent `check` calls only share the
/// cache.
pub struct Pipeline {
    cache: Option<Arc<dyn ResponseCache>>,
    extraction: ExtractionCoordinator,
    verification: VerificationEngine,
    processor: Arc<dyn Processor>,
    instrumentation: Instrumentation,
}

impl Pipeline {
    #[must_use]
    pub fn builder(config: ClaimConfig) -> PipelineBuilder {
        PipelineBuilder {
            config,
            extractor: None,
            classifier: None,
            catalog: None,
            cache: None,
            processor: None,
            predicate: None,
        }
    }

    /// Fact-check a request.
    ///
    /// Always returns a well-formed response; any failure becomes an
    /// `error` verdict with `error_details` populated.
    pub async fn check(&self, request: &Request) -> Response {
        let started = Instant::now();
        let request_id = request
            .request_id()
            .filter(|id| !id.trim().is_empty())
            .map_or_else(ids::request_id, str::to_string);
        let claim_id = ids::claim_id();

        let span = tracing::info_span!(
            "check",
            request_id = %request_id,
            user_id = request.user_id(),
            source_platform = request.source_platform(),
        );

        let run = AssertUnwindSafe(self.run(request, &request_id, &claim_id, started))
            .catch_unwind();
        let outcome = context::scope(request_id.clone(), run)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        let error = match outcome {
            Ok(Ok(response)) => {
                tracing::info!(
                    verdict = %response.verdict,
                    cached = response.cached,
                    elapsed_ms = response.processing_time_ms,
                    "fact-check completed"
                );
                return response;
            }
            Ok(Err(error)) => error,
            Err(payload) => PipelineError::Unexpected(panic_message(&*payload)),
        };

        tracing::error!(%error, "fact-check failed");
        response::failure(&request_id, &claim_id, &error, started.elapsed())
    }

    async fn run(
        &self,
        request: &Request,
        request_id: &str,
        claim_id: &str,
        started: Instant,
    ) -> Result<Response, PipelineError> {
        tracing::info!("fact-check started");
        let key = cache::cache_key(request);

        if let Some(cache) = &self.cache {
            if let Some(cached) = self.check_cache(cache.as_ref(), request, &key).await? {
                tracing::info!("cache hit");
                return Ok(response::from_cache(cached, request_id, started.elapsed()));
            }
        }

        let mut claims = self.extract_claims(request).await?;
        let results = self.verify_claims(&mut claims).await?;
        let output = self.generate_response(&claims, &results)?;
        let response = response::success(request_id, claim_id, output, started.elapsed());

        if let Some(cache) = &self.cache {
            self.store_response(cache.as_ref(), &key, &response).await?;
        }

        Ok(response)
    }

    fn request_params(&self, request: &Request) -> Params {
        self.instrumentation.snapshot(&[
            ("claim_text", Param::from(request.claim_text())),
            ("image_data", Param::from(request.image_data())),
            ("user_id", Param::from(request.user_id())),
        ])
    }

    async fn check_cache(
        &self,
        cache: &dyn ResponseCache,
        request: &Request,
        key: &str,
    ) -> Result<Option<Response>, StageError> {
        let mut params = self.request_params(request);
        params.insert("key".to_string(), key.into());
        self.instrumentation
            .run(Stage::CacheLookup, CHECK_CACHE, params, cache.get(key))
            .await
    }

    async fn extract_claims(&self, request: &Request) -> Result<Vec<Claim>, StageError> {
        let params = self.request_params(request);
        self.instrumentation
            .run(Stage::ClaimExtraction, EXTRACT_CLAIMS, params, async {
                Ok::<_, Infallible>(self.extraction.extract_claims(request).await)
            })
            .await
    }

    async fn verify_claims(
        &self,
        claims: &mut [Claim],
    ) -> Result<Vec<EvidenceResult>, StageError> {
        let claim_texts: Vec<Param<'_>> = claims.iter().map(|c| Param::from(&c.text)).collect();
        let params = self.instrumentation.snapshot(&[
            ("claim_count", Param::from(claims.len())),
            ("claims", Param::List(claim_texts)),
        ]);
        self.instrumentation
            .run(Stage::ClaimVerification, VERIFY_CLAIMS, params, async {
                Ok::<_, Infallible>(self.verification.verify(claims).await)
            })
            .await
    }

    fn generate_response(
        &self,
        claims: &[Claim],
        results: &[EvidenceResult],
    ) -> Result<ProcessorOutput, StageError> {
        let params = self.instrumentation.snapshot(&[
            ("claim_count", Param::from(claims.len())),
            ("result_count", Param::from(results.len())),
        ]);
        self.instrumentation.run_sync(
            Stage::ResponseGeneration,
            GENERATE_RESPONSE,
            params,
            || self.processor.process(claims, results),
        )
    }

    async fn store_response(
        &self,
        cache: &dyn ResponseCache,
        key: &str,
        response: &Response,
    ) -> Result<(), StageError> {
        let params = self.instrumentation.snapshot(&[
            ("key", Param::from(key)),
            ("request_id", Param::from(response.request_id.as_str())),
        ]);
        self.instrumentation
            .run(Stage::CacheStorage, STORE_RESPONSE, params, cache.set(key, response))
            .await
    }
}

/// Assembles a [`Pipeline`] from configuration and collaborators.
///
/// An extractor and an image classifier are required. Everything else
/// defaults from configuration: the source catalog from `sources` and
/// `http`, an in-memory cache when `cache.enabled`, the
/// [`ResultAnalyzer`] processor, and the [`NeverMatch`] predicate.
pub struct PipelineBuilder {
    config: ClaimConfig,
    extractor: Option<Arc<dyn Extractor>>,
    classifier: Option<Arc<dyn ImageClassifier>>,
    catalog: Option<SourceCatalog>,
    cache: Option<Arc<dyn ResponseCache>>,
    processor: Option<Arc<dyn Processor>>,
    predicate: Option<Arc<dyn MatchPredicate>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    #[must_use]
    pub fn image_classifier(mut self, classifier: impl ImageClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: SourceCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use a custom cache. Ignored when `cache.enabled` is false.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    #[must_use]
    pub fn match_predicate(mut self, predicate: impl MatchPredicate + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// # Errors
    ///
    /// Returns [`BuildError::Missing`] without an extractor or image
    /// classifier, and [`BuildError::Source`] if the default catalog cannot
    /// be built from configuration.
    pub fn build(self) -> Result<Pipeline, BuildError> {
        let extractor = self.extractor.ok_or(BuildError::Missing("extractor"))?;
        let classifier = self
            .classifier
            .ok_or(BuildError::Missing("image classifier"))?;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => SourceCatalog::from_config(&self.config)?,
        };
        let processor = self
            .processor
            .unwrap_or_else(|| Arc::new(ResultAnalyzer::new(catalog.registry().clone())));
        let predicate = self.predicate.unwrap_or_else(|| Arc::new(NeverMatch));

        let cache = if self.config.cache.enabled {
            Some(
                self.cache
                    .unwrap_or_else(|| Arc::new(MemoryCache::from_config(&self.config.cache))),
            )
        } else {
            None
        };

        tracing::debug!(
            sources = catalog.registry().len(),
            registered = catalog.len(),
            cache = cache.is_some(),
            "pipeline built"
        );

        Ok(Pipeline {
            cache,
            extraction: ExtractionCoordinator::new(extractor, classifier),
            verification: VerificationEngine::new(Arc::new(catalog), predicate)
                .skip_negative_sequence(self.config.verification.skip_negative_sequence),
            processor,
            instrumentation: Instrumentation::new(&self.config.instrumentation),
        })
    }
}
