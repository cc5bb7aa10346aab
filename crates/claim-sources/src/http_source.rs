//! Generic JSON evidence source over HTTP.
//!
//! Sends `POST {endpoint}` with body `{"query": ..., "params": {...}}` and
//! expects a JSON array of results. Missing optional fields default to
//! empty values; a missing timestamp is stamped with the time of the query.
//!
//! A 429 answer becomes [`SourceError::RateLimited`] and any other
//! non-success status becomes [`SourceError::Api`], both naming the source
//! key so a skipped source can be identified from the verification logs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use claim_config::HttpConfig;
use claim_core::entities::{EvidenceResult, Metadata};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::{EvidenceSource, SearchParams};

/// Back-off assumed when a 429 carries no usable `Retry-After` header.
const DEFAULT_BACKOFF_SECS: u64 = 60;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    params: &'a SearchParams,
}

#[derive(Deserialize)]
struct WireResult {
    content: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    engagement: BTreeMap<String, u64>,
    #[serde(default)]
    metadata: Metadata,
}

// ── Source ─────────────────────────────────────────────────────────

/// Evidence source backed by a configured HTTP search endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    key: String,
    endpoint: String,
    http: reqwest::Client,
}

impl HttpSource {
    /// Create a source for registry key `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        key: impl Into<String>,
        endpoint: impl Into<String>,
        config: &HttpConfig,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            key: key.into(),
            endpoint: endpoint.into(),
            http,
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EvidenceSource for HttpSource {
    async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<EvidenceResult>, SourceError> {
        let body = SearchBody { query, params };
        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let text = self.read_body(resp).await?;
        let results = parse_results(&self.key, &text)?;
        tracing::debug!(
            source = %self.key,
            count = results.len(),
            "http source returned results"
        );
        Ok(results)
    }
}

impl HttpSource {
    /// Body of a successful answer, or the status mapped to a [`SourceError`].
    async fn read_body(&self, resp: reqwest::Response) -> Result<String, SourceError> {
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_BACKOFF_SECS);
            return Err(SourceError::RateLimited {
                key: self.key.clone(),
                retry_after_secs,
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SourceError::Api {
                key: self.key.clone(),
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}

/// Map a response body to evidence results attributed to `source`.
fn parse_results(source: &str, body: &str) -> Result<Vec<EvidenceResult>, SourceError> {
    let wire: Vec<WireResult> =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(format!("{source}: {e}")))?;
    let now = Utc::now();

    Ok(wire
        .into_iter()
        .map(|item| EvidenceResult {
            source: source.to_string(),
            content: item.content,
            author: item.author,
            url: item.url,
            timestamp: item.timestamp.unwrap_or(now),
            engagement: item.engagement,
            metadata: item.metadata,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"[
        {
            "content": "Ministry confirms the new policy takes effect in May.",
            "author": "Press Office",
            "url": "https://gov.example/press/118",
            "timestamp": "2026-03-02T09:30:00Z",
            "engagement": {"shares": 14},
            "metadata": {"lang": "en"}
        },
        {
            "content": "Unverified repost of the announcement."
        }
    ]"#;

    #[test]
    fn parse_fixture() {
        let results = parse_results("gov", FIXTURE).unwrap();
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.source, "gov");
        assert_eq!(first.author, "Press Office");
        assert_eq!(first.url, "https://gov.example/press/118");
        assert_eq!(first.engagement.get("shares"), Some(&14));
        assert_eq!(first.metadata["lang"], serde_json::json!("en"));
        assert_eq!(first.timestamp.to_rfc3339(), "2026-03-02T09:30:00+00:00");

        let second = &results[1];
        assert_eq!(second.source, "gov");
        assert!(second.author.is_empty());
        assert!(second.engagement.is_empty());
    }

    #[test]
    fn parse_empty_array() {
        assert!(parse_results("news", "[]").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_non_array_body() {
        let err = parse_results("news", r#"{"error": "bad query"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Parse(msg) if msg.starts_with("news:")));
    }

    #[test]
    fn new_keeps_key_and_endpoint() {
        let source =
            HttpSource::new("news", "https://search.example/news", &HttpConfig::default()).unwrap();
        assert_eq!(source.key(), "news");
        assert_eq!(source.endpoint(), "https://search.example/news");
    }

    fn source() -> HttpSource {
        HttpSource::new("news", "https://search.example/news", &HttpConfig::default()).unwrap()
    }

    fn answer(status: u16, retry_after: Option<&str>, body: &'static str) -> reqwest::Response {
        let mut builder = ::http::Response::builder().status(status);
        if let Some(value) = retry_after {
            builder = builder.header("Retry-After", value);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn success_body_is_returned() {
        let body = source().read_body(answer(200, None, "[]")).await.unwrap();
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn rate_limit_names_source_and_backoff() {
        let err = source()
            .read_body(answer(429, Some(" 15 "), ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::RateLimited { ref key, retry_after_secs: 15 } if key == "news"
        ));
        assert_eq!(err.to_string(), "source 'news' is rate limited, retry after 15s");
    }

    #[tokio::test]
    async fn rate_limit_without_usable_header_backs_off_a_minute() {
        for header in [None, Some("tomorrow")] {
            let err = source().read_body(answer(429, header, "")).await.unwrap_err();
            assert!(matches!(
                err,
                SourceError::RateLimited {
                    retry_after_secs: DEFAULT_BACKOFF_SECS,
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn server_error_keeps_key_status_and_body() {
        let err = source()
            .read_body(answer(503, None, "maintenance\n"))
            .await
            .unwrap_err();
        match err {
            SourceError::Api {
                key,
                status,
                message,
            } => {
                assert_eq!(key, "news");
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    #[ignore] // requires network
    async fn unreachable_endpoint_is_http_error() {
        let source =
            HttpSource::new("news", "http://127.0.0.1:9/search", &HttpConfig::default()).unwrap();
        let err = source.search("q", &SearchParams::new()).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }
}
