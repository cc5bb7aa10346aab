//! Turning verified claims and gathered evidence into a verdict.

use claim_core::entities::{Claim, EvidenceResult, EvidenceSummary, Reference, meta};
use claim_core::enums::Verdict;
use claim_sources::SourceRegistry;
use serde_json::Value;

use crate::error::ProcessError;

/// Maximum characters of result content quoted in a reference.
const SNIPPET_CHARS: usize = 200;

/// Confidence reported while no verdict can be drawn from the evidence.
const UNDECIDED_CONFIDENCE: f64 = 0.5;

/// Everything a success response needs from result analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOutput {
    pub verdict: Verdict,
    pub confidence: f64,
    pub evidence: Vec<EvidenceSummary>,
    pub references: Vec<Reference>,
    pub explanation: String,
    pub search_queries: Vec<String>,
}

/// Draws a verdict from verified claims and their evidence.
pub trait Processor: Send + Sync {
    /// `results` holds each searched claim's evidence contiguously, in claim order.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] when the inputs cannot be analysed.
    fn process(
        &self,
        claims: &[Claim],
        results: &[EvidenceResult],
    ) -> Result<ProcessorOutput, ProcessError>;
}

/// Default processor.
///
/// Groups evidence per searched claim and cites every result, but leaves the
/// verdict `unclear`: relevance scoring is a separate concern.
#[derive(Debug, Clone, Default)]
pub struct ResultAnalyzer {
    registry: SourceRegistry,
}

impl ResultAnalyzer {
    #[must_use]
    pub const fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    fn reference(&self, result: &EvidenceResult) -> Reference {
        let platform = self
            .registry
            .get(&result.source)
            .map_or_else(|| result.source.clone(), |s| s.display_name.clone());
        let title = if result.author.is_empty() {
            platform.clone()
        } else {
            format!("{platform}: {}", result.author)
        };
        Reference {
            title,
            url: result.url.clone(),
            snippet: result.content.chars().take(SNIPPET_CHARS).collect(),
            platform,
        }
    }
}

impl Processor for ResultAnalyzer {
    fn process(
        &self,
        claims: &[Claim],
        results: &[EvidenceResult],
    ) -> Result<ProcessorOutput, ProcessError> {
        let mut evidence = Vec::new();
        let mut search_queries: Vec<String> = Vec::new();
        let mut offset: usize = 0;

        for claim in claims {
            let Some(query) = claim
                .metadata
                .get(meta::SEARCH_QUERY)
                .and_then(Value::as_str)
            else {
                continue;
            };
            if !search_queries.iter().any(|q| q == query) {
                search_queries.push(query.to_string());
            }

            let count = claim
                .metadata
                .get(meta::RESULT_COUNT)
                .and_then(Value::as_u64)
                .map_or(0, |c| usize::try_from(c).unwrap_or(usize::MAX));
            let end = offset.saturating_add(count);
            let supporting = results.get(offset..end).ok_or_else(|| {
                ProcessError::Analysis(format!(
                    "claim expects results {offset}..{end} but {} were gathered",
                    results.len()
                ))
            })?;
            offset = end;

            evidence.push(EvidenceSummary {
                claim_fragment: claim.text.clone(),
                finding: match supporting.len() {
                    0 => "No related results".to_string(),
                    1 => "1 related result".to_string(),
                    n => format!("{n} related results"),
                },
                supporting_results: supporting.to_vec(),
                confidence: claim.confidence,
            });
        }

        let references: Vec<Reference> = results.iter().map(|r| self.reference(r)).collect();

        let explanation = if results.is_empty() {
            "No relevant results found".to_string()
        } else {
            let mut platforms: Vec<&str> = Vec::new();
            for reference in &references {
                if !platforms.contains(&reference.platform.as_str()) {
                    platforms.push(&reference.platform);
                }
            }
            format!(
                "Found {} related results from {}; none was decisive",
                results.len(),
                platforms.join(", ")
            )
        };

        Ok(ProcessorOutput {
            verdict: Verdict::Unclear,
            confidence: UNDECIDED_CONFIDENCE,
            evidence,
            references,
            explanation,
            search_queries,
        })
    }
}
