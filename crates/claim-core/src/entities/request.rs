use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RawInputType;
use crate::errors::CoreError;

/// Platform assumed when the caller does not name one.
pub const DEFAULT_SOURCE_PLATFORM: &str = "whatsapp";

/// A claim submitted for verification.
///
/// Claim text is trimmed on construction, and empty text or an empty image
/// count as absent. At least one input must remain; the invariant is checked
/// both by [`Request::new`] and on deserialization, so a `Request` value
/// always carries something to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RequestFields")]
pub struct Request {
    claim_text: Option<String>,
    image_data: Option<Vec<u8>>,
    user_id: String,
    source_platform: String,
    request_id: Option<String>,
}

/// Unvalidated wire shape of a [`Request`].
#[derive(Debug, Deserialize, JsonSchema)]
struct RequestFields {
    #[serde(default)]
    claim_text: Option<String>,
    #[serde(default)]
    image_data: Option<Vec<u8>>,
    user_id: String,
    #[serde(default = "default_source_platform")]
    source_platform: String,
    #[serde(default)]
    request_id: Option<String>,
}

fn default_source_platform() -> String {
    DEFAULT_SOURCE_PLATFORM.to_string()
}

impl TryFrom<RequestFields> for Request {
    type Error = CoreError;

    fn try_from(fields: RequestFields) -> Result<Self, Self::Error> {
        let mut request = Self::new(fields.user_id, fields.claim_text, fields.image_data)?;
        request.source_platform = fields.source_platform;
        request.request_id = fields.request_id;
        Ok(request)
    }
}

impl Request {
    /// Build a request, normalizing inputs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when neither claim text nor image data
    /// remains after trimming.
    pub fn new(
        user_id: impl Into<String>,
        claim_text: Option<String>,
        image_data: Option<Vec<u8>>,
    ) -> Result<Self, CoreError> {
        let claim_text = claim_text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let image_data = image_data.filter(|bytes| !bytes.is_empty());

        if claim_text.is_none() && image_data.is_none() {
            return Err(CoreError::Validation(
                "At least one of claim_text or image_data must be provided".to_string(),
            ));
        }

        Ok(Self {
            claim_text,
            image_data,
            user_id: user_id.into(),
            source_platform: default_source_platform(),
            request_id: None,
        })
    }

    /// Text-only request.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `text` is blank.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Result<Self, CoreError> {
        Self::new(user_id, Some(text.into()), None)
    }

    /// Image-only request.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `image` is empty.
    pub fn image(user_id: impl Into<String>, image: Vec<u8>) -> Result<Self, CoreError> {
        Self::new(user_id, None, Some(image))
    }

    #[must_use]
    pub fn with_source_platform(mut self, platform: impl Into<String>) -> Self {
        self.source_platform = platform.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn claim_text(&self) -> Option<&str> {
        self.claim_text.as_deref()
    }

    #[must_use]
    pub fn image_data(&self) -> Option<&[u8]> {
        self.image_data.as_deref()
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn source_platform(&self) -> &str {
        &self.source_platform
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Which inputs this request carries.
    #[must_use]
    pub fn raw_input_type(&self) -> RawInputType {
        RawInputType::from_inputs(self.claim_text.is_some(), self.image_data.is_some())
            .unwrap_or(RawInputType::TextOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_request_without_inputs() {
        let err = Request::new("u1", None, None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn whitespace_only_text_counts_as_absent() {
        assert!(Request::text("u1", "   \n\t ").is_err());
        assert!(Request::new("u1", Some("  ".into()), Some(Vec::new())).is_err());
    }

    #[test]
    fn trims_claim_text_and_defaults_platform() {
        let request = Request::text("u1", "  The sky is blue  ").unwrap();
        assert_eq!(request.claim_text(), Some("The sky is blue"));
        assert_eq!(request.source_platform(), "whatsapp");
        assert_eq!(request.request_id(), None);
        assert_eq!(request.raw_input_type(), RawInputType::TextOnly);
    }

    #[test]
    fn image_and_text_is_both() {
        let request = Request::new("u1", Some("caption".into()), Some(vec![1, 2, 3])).unwrap();
        assert_eq!(request.raw_input_type(), RawInputType::Both);
        assert_eq!(request.image_data(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn deserialization_applies_validation() {
        let err = serde_json::from_str::<Request>(r#"{"user_id":"u1","claim_text":"  "}"#);
        assert!(err.is_err());

        let request: Request = serde_json::from_str(
            r#"{
                "user_id": "u1",
                "claim_text": " hi ",
                "source_platform": "telegram",
                "request_id": "r-1"
            }"#,
        )
        .unwrap();
        assert_eq!(request.claim_text(), Some("hi"));
        assert_eq!(request.source_platform(), "telegram");
        assert_eq!(request.request_id(), Some("r-1"));
    }

    #[test]
    fn builders_set_platform_and_request_id() {
        let request = Request::image("u2", vec![0xff])
            .unwrap()
            .with_source_platform("signal")
            .with_request_id("req-given");
        assert_eq!(request.user_id(), "u2");
        assert_eq!(request.source_platform(), "signal");
        assert_eq!(request.request_id(), Some("req-given"));
        assert_eq!(request.raw_input_type(), RawInputType::ImageOnly);
    }
}
