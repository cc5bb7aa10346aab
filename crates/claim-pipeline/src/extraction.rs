//! Claim extraction coordination.
//!
//! Text and image inputs are extracted concurrently and merged into one
//! ordered claim list: the text-derived claim first, then image-derived
//! claims (outer image before the image quoted inside it). Collaborator
//! failures drop only the affected path.

use std::sync::Arc;

use async_trait::async_trait;
use claim_core::entities::{Claim, Request, meta};
use claim_core::enums::{ExtractedFrom, RawInputType};

use crate::error::ExtractError;

/// Sentinel message when an image carries no readable text.
pub const NOT_TEXT_IMAGE: &str = "Image does not contain readable text";

/// Sentinel message when neither input yields a claim.
pub const NOTHING_EXTRACTED: &str = "No claims could be extracted from the request";

/// Turns raw request input into a structured claim.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExtractError`] when no claim can be produced.
    async fn extract(
        &self,
        text: Option<&str>,
        image: Option<&[u8]>,
    ) -> Result<Claim, ExtractError>;
}

/// Inspects and decomposes screenshot-style images.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Whether the image contains readable text.
    async fn is_text_image(&self, image: &[u8]) -> Result<bool, ExtractError>;

    /// Whether the image quotes another image (a screenshot of a repost).
    async fn has_nested_image(&self, image: &[u8]) -> Result<bool, ExtractError>;

    /// Split a nested image into `(outer, inner)`.
    async fn split_nested(&self, image: &[u8]) -> Result<(Vec<u8>, Vec<u8>), ExtractError>;

    /// Extract a claim from a single text image, if one is present.
    async fn extract_from(&self, image: &[u8]) -> Result<Option<Claim>, ExtractError>;
}

/// Runs the extraction collaborators for one request.
#[derive(Clone)]
pub struct ExtractionCoordinator {
    extractor: Arc<dyn Extractor>,
    classifier: Arc<dyn ImageClassifier>,
}

impl ExtractionCoordinator {
    #[must_use]
    pub fn new(extractor: Arc<dyn Extractor>, classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Extract every claim in the request. Never returns an empty list: when
    /// nothing could be extracted the result is a single error sentinel.
    pub async fn extract_claims(&self, request: &Request) -> Vec<Claim> {
        let raw_input_type = request.raw_input_type();

        let (text_claim, image_claims) = tokio::join!(
            self.claim_from_text(request.claim_text()),
            self.claims_from_image(request.image_data(), raw_input_type),
        );

        let mut claims: Vec<Claim> = text_claim.into_iter().chain(image_claims).collect();
        if claims.is_empty() {
            tracing::warn!(%raw_input_type, "no claims extracted, returning error sentinel");
            claims.push(Claim::error_sentinel(
                NOTHING_EXTRACTED,
                ExtractedFrom::Hybrid,
                raw_input_type,
            ));
        }
        tracing::debug!(count = claims.len(), "claims extracted");
        claims
    }

    async fn claim_from_text(&self, text: Option<&str>) -> Option<Claim> {
        let text = text?;
        match self.extractor.extract(Some(text), None).await {
            Ok(claim) => Some(claim),
            Err(error) => {
                tracing::warn!(%error, "text extraction failed, dropping text path");
                None
            }
        }
    }

    async fn claims_from_image(
        &self,
        image: Option<&[u8]>,
        raw_input_type: RawInputType,
    ) -> Vec<Claim> {
        let Some(image) = image else {
            return Vec::new();
        };

        match self.classifier.is_text_image(image).await {
            Ok(true) => {}
            Ok(false) => {
                return vec![Claim::error_sentinel(
                    NOT_TEXT_IMAGE,
                    ExtractedFrom::Image,
                    raw_input_type,
                )];
            }
            Err(error) => {
                tracing::warn!(%error, "image classification failed, dropping image path");
                return Vec::new();
            }
        }

        let nested = match self.classifier.has_nested_image(image).await {
            Ok(nested) => nested,
            Err(error) => {
                tracing::warn!(%error, "nested image detection failed, dropping image path");
                return Vec::new();
            }
        };

        if !nested {
            return self.claim_from_image(image, None).await.into_iter().collect();
        }

        let (outer, inner) = match self.classifier.split_nested(image).await {
            Ok(parts) => parts,
            Err(error) => {
                tracing::warn!(%error, "nested image split failed, dropping image path");
                return Vec::new();
            }
        };

        let mut claims = Vec::with_capacity(2);
        for (role, part) in [("outer", &outer), ("inner", &inner)] {
            if let Some(claim) = self.claim_from_image(part, Some(role)).await {
                claims.push(claim);
            }
        }
        claims
    }

    async fn claim_from_image(&self, image: &[u8], role: Option<&str>) -> Option<Claim> {
        match self.classifier.extract_from(image).await {
            Ok(Some(claim)) => Some(match role {
                Some(role) => claim.with_metadata(meta::IMAGE_ROLE, role),
                None => claim,
            }),
            Ok(None) => {
                tracing::debug!(role, "image yielded no claim");
                None
            }
            Err(error) => {
                tracing::warn!(role, %error, "image extraction failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct EchoExtractor {
        fail: bool,
    }

    #[async_trait]
    impl Extractor for EchoExtractor {
        async fn extract(
            &self,
            text: Option<&str>,
            _image: Option<&[u8]>,
        ) -> Result<Claim, ExtractError> {
            if self.fail {
                return Err(ExtractError::Timeout("model call exceeded 30s".into()));
            }
            Ok(Claim::new(
                text.unwrap_or_default(),
                ExtractedFrom::Text,
                RawInputType::TextOnly,
                1.0,
            ))
        }
    }

    /// Images are byte strings: `T` marks a text image, `N` a nested one, and
    /// a nested image splits on `|` into outer and inner halves.
    #[derive(Default)]
    struct ByteClassifier {
        fail_split: bool,
    }

    #[async_trait]
    impl ImageClassifier for ByteClassifier {
        async fn is_text_image(&self, image: &[u8]) -> Result<bool, ExtractError> {
            Ok(image.contains(&b'T'))
        }

        async fn has_nested_image(&self, image: &[u8]) -> Result<bool, ExtractError> {
            Ok(image.contains(&b'N'))
        }

        async fn split_nested(&self, image: &[u8]) -> Result<(Vec<u8>, Vec<u8>), ExtractError> {
            if self.fail_split {
                return Err(ExtractError::InvalidImage("no separator".into()));
            }
            let at = image
                .iter()
                .position(|b| *b == b'|')
                .ok_or_else(|| ExtractError::InvalidImage("no separator".into()))?;
            Ok((image[..at].to_vec(), image[at + 1..].to_vec()))
        }

        async fn extract_from(&self, image: &[u8]) -> Result<Option<Claim>, ExtractError> {
            let text = String::from_utf8_lossy(image).into_owned();
            if text.contains("fail") {
                return Err(ExtractError::Model("unreadable".into()));
            }
            Ok(Some(Claim::new(
                text,
                ExtractedFrom::Image,
                RawInputType::ImageOnly,
                0.9,
            )))
        }
    }

    fn coordinator(text_fails: bool, classifier: ByteClassifier) -> ExtractionCoordinator {
        ExtractionCoordinator::new(
            Arc::new(EchoExtractor { fail: text_fails }),
            Arc::new(classifier),
        )
    }

    #[tokio::test]
    async fn text_only_yields_one_claim() {
        let request = Request::text("u1", "The sky is blue").unwrap();
        let claims = coordinator(false, ByteClassifier::default())
            .extract_claims(&request)
            .await;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].text, "The sky is blue");
    }

    #[tokio::test]
    async fn non_text_image_yields_single_sentinel() {
        let request = Request::image("u1", b"photo".to_vec()).unwrap();
        let claims = coordinator(false, ByteClassifier::default())
            .extract_claims(&request)
            .await;

        assert_eq!(claims.len(), 1);
        assert!(claims[0].confidence.abs() < f64::EPSILON);
        assert_eq!(claims[0].error(), Some(NOT_TEXT_IMAGE));
        assert_eq!(claims[0].extracted_from, ExtractedFrom::Image);
    }

    #[tokio::test]
    async fn nested_image_orders_outer_before_inner() {
        let request = Request::image("u1", b"T N outer|T inner".to_vec()).unwrap();
        let claims = coordinator(false, ByteClassifier::default())
            .extract_claims(&request)
            .await;

        let texts: Vec<&str> = claims.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["T N outer", "T inner"]);
        assert_eq!(claims[0].metadata[meta::IMAGE_ROLE], serde_json::json!("outer"));
        assert_eq!(claims[1].metadata[meta::IMAGE_ROLE], serde_json::json!("inner"));
    }

    #[tokio::test]
    async fn failed_outer_keeps_inner() {
        let request = Request::image("u1", b"T N fail|T inner".to_vec()).unwrap();
        let claims = coordinator(false, ByteClassifier::default())
            .extract_claims(&request)
            .await;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].text, "T inner");
    }

    #[tokio::test]
    async fn text_claim_precedes_image_claims() {
        let request = Request::new("u1", Some("caption".into()), Some(b"T screenshot".to_vec()))
            .unwrap();
        let claims = coordinator(false, ByteClassifier::default())
            .extract_claims(&request)
            .await;
        let texts: Vec<&str> = claims.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["caption", "T screenshot"]);
    }

    #[tokio::test]
    async fn text_failure_does_not_abort_image_path() {
        let request = Request::new("u1", Some("caption".into()), Some(b"T screenshot".to_vec()))
            .unwrap();
        let claims = coordinator(true, ByteClassifier::default())
            .extract_claims(&request)
            .await;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].text, "T screenshot");
    }

    #[tokio::test]
    async fn split_failure_drops_image_path_and_falls_back_to_sentinel() {
        let request = Request::image("u1", b"T N a|b".to_vec()).unwrap();
        let classifier = ByteClassifier { fail_split: true };
        let claims = coordinator(false, classifier)
            .extract_claims(&request)
            .await;

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].error(), Some(NOTHING_EXTRACTED));
        assert_eq!(claims[0].raw_input_type, RawInputType::ImageOnly);
    }

    #[tokio::test]
    async fn all_paths_failing_yields_sentinel() {
        let request = Request::text("u1", "anything").unwrap();
        let claims = coordinator(true, ByteClassifier::default())
            .extract_claims(&request)
            .await;
        assert_eq!(claims.len(), 1);
        assert!(claims[0].is_error_sentinel());
        assert_eq!(claims[0].extracted_from, ExtractedFrom::Hybrid);
    }
}
