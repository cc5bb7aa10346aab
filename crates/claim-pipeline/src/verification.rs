//! Per-claim evidence gathering and confidence aggregation.

use std::sync::Arc;

use claim_core::entities::{Claim, EvidenceResult, meta};
use claim_core::enums::{QuestionType, VerificationStatus};
use claim_sources::{SearchParams, SourceCatalog};

/// Confidence floor for non-anchor sub-answers of a matched claim.
const MATCHED_FLOOR: f64 = 0.5;

/// Decides whether the evidence gathered so far settles a claim.
///
/// Traversal stops at the first decisive source and the claim is marked
/// `matched`; otherwise every source is queried and the claim ends up with
/// `no_evidence`.
pub trait MatchPredicate: Send + Sync {
    fn is_decisive(&self, claim: &Claim, results: &[EvidenceResult]) -> bool;
}

/// Never decisive. Every claim is traversed in full and reported as
/// `no_evidence`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverMatch;

impl MatchPredicate for NeverMatch {
    fn is_decisive(&self, _claim: &Claim, _results: &[EvidenceResult]) -> bool {
        false
    }
}

/// Decisive as soon as any source has returned a result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsFound;

impl MatchPredicate for ResultsFound {
    fn is_decisive(&self, _claim: &Claim, results: &[EvidenceResult]) -> bool {
        !results.is_empty()
    }
}

/// Queries evidence sources for each claim and updates its confidence.
#[derive(Clone)]
pub struct VerificationEngine {
    catalog: Arc<SourceCatalog>,
    predicate: Arc<dyn MatchPredicate>,
    skip_negative: bool,
}

impl VerificationEngine {
    #[must_use]
    pub fn new(catalog: Arc<SourceCatalog>, predicate: Arc<dyn MatchPredicate>) -> Self {
        Self {
            catalog,
            predicate,
            skip_negative: false,
        }
    }

    /// Leave negative-sequence sources out of the default traversal.
    #[must_use]
    pub const fn skip_negative_sequence(mut self, skip: bool) -> Self {
        self.skip_negative = skip;
        self
    }

    /// Verify every claim in order, returning all gathered evidence.
    ///
    /// Claims are updated in place with their confidence and verification
    /// metadata.
    pub async fn verify(&self, claims: &mut [Claim]) -> Vec<EvidenceResult> {
        let mut all = Vec::new();
        for claim in claims.iter_mut() {
            all.extend(self.verify_claim(claim).await);
        }
        all
    }

    /// Source keys to query for `claim`.
    ///
    /// Registry order, except that a `where` answer naming a registered
    /// source (case-insensitively) moves that source to the front. The
    /// registry itself is never reordered.
    #[must_use]
    pub fn traversal_order(&self, claim: &Claim) -> Vec<String> {
        let registry = self.catalog.registry();
        let mut order = registry.default_order(self.skip_negative);

        let preferred = claim
            .sub_answer(QuestionType::Where)
            .and_then(|answer| registry.resolve_key(&answer.answer));
        if let Some(key) = preferred {
            order.retain(|k| k != key);
            order.insert(0, key.to_string());
        }
        order
    }

    async fn verify_claim(&self, claim: &mut Claim) -> Vec<EvidenceResult> {
        let (Some(who), Some(what)) = (
            answer(claim, QuestionType::Who),
            answer(claim, QuestionType::What),
        ) else {
            tracing::debug!(claim = %claim.text, "claim lacks who/what, skipping search");
            mark_no_evidence(claim);
            return Vec::new();
        };

        let query = format!("{who} {what}");
        let mut params = SearchParams::from([
            ("who".to_string(), who),
            ("what".to_string(), what),
        ]);
        if let Some(place) = answer(claim, QuestionType::Where) {
            params.insert("where".to_string(), place);
        }

        let order = self.traversal_order(claim);
        let mut results = Vec::new();
        let mut queried = Vec::new();
        let mut failed = Vec::new();
        let mut matched = false;

        for key in order {
            let outcome = match self.catalog.get(&key) {
                Ok(source) => source.search(&query, &params).await,
                Err(error) => Err(error),
            };
            match outcome {
                Ok(found) => {
                    tracing::debug!(source = %key, count = found.len(), "source searched");
                    results.extend(found);
                    queried.push(key);
                    if self.predicate.is_decisive(claim, &results) {
                        matched = true;
                        break;
                    }
                }
                Err(error) => {
                    tracing::warn!(source = %key, %error, "evidence source failed, continuing");
                    failed.push(key);
                }
            }
        }

        claim.metadata.insert(meta::SEARCH_QUERY.to_string(), query.into());
        claim.metadata.insert(meta::SOURCES_QUERIED.to_string(), queried.into());
        claim.metadata.insert(meta::SOURCES_FAILED.to_string(), failed.into());
        claim.metadata.insert(meta::RESULT_COUNT.to_string(), results.len().into());

        if matched {
            apply_match(claim);
        } else {
            mark_no_evidence(claim);
        }
        results
    }
}

/// Non-blank answer text for `question`.
fn answer(claim: &Claim, question: QuestionType) -> Option<String> {
    claim
        .sub_answer(question)
        .map(|a| a.answer.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn mark_no_evidence(claim: &mut Claim) {
    claim.confidence = 0.0;
    claim.set_verification_status(VerificationStatus::NoEvidence);
}

/// Pin anchors to 1.0, lift the rest to the floor, and average.
#[allow(clippy::cast_precision_loss)] // sub-answer counts are tiny
fn apply_match(claim: &mut Claim) {
    for sub in &mut claim.sub_answers {
        if sub.question.is_anchor() {
            sub.confidence = 1.0;
        } else if sub.confidence < MATCHED_FLOOR {
            sub.confidence = MATCHED_FLOOR;
        }
    }
    claim.confidence = if claim.sub_answers.is_empty() {
        1.0
    } else {
        claim.sub_answers.iter().map(|s| s.confidence).sum::<f64>() / claim.sub_answers.len() as f64
    };
    claim.set_verification_status(VerificationStatus::Matched);
}
