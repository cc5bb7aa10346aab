//! Response caching.
//!
//! The cache is the only state shared across requests. Concurrent writers
//! for one key race and the last write wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use claim_config::CacheConfig;
use claim_core::entities::{Request, Response};
use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// Prefix of every cache key.
const KEY_PREFIX: &str = "claim-";

/// Storage for finished responses.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backing store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<Response>, CacheError>;

    /// # Errors
    ///
    /// Returns [`CacheError`] when the backing store cannot be written.
    async fn set(&self, key: &str, response: &Response) -> Result<(), CacheError>;
}

/// Cache key for a request's content.
///
/// Claim text is trimmed and lowercased before hashing so trivially
/// different submissions of the same claim share an entry. Lookup and
/// storage use the same key.
#[must_use]
pub fn cache_key(request: &Request) -> String {
    let mut hasher = Sha256::new();
    if let Some(text) = request.claim_text() {
        hasher.update(text.trim().to_lowercase().as_bytes());
    }
    hasher.update([0u8]);
    if let Some(image) = request.image_data() {
        hasher.update(image);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{KEY_PREFIX}{hex}")
}

/// In-process cache with a fixed time-to-live.
///
/// Expired entries are evicted when read.
#[derive(Debug)]
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Response)>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs))
    }

    /// Drop every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the entry lock is poisoned.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Number of stored entries, including expired ones not yet evicted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the entry lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the entry lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (Instant, Response)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".into()))
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Response>, CacheError> {
        let mut entries = self.lock()?;
        let Some((stored, response)) = entries.get(key) else {
            return Ok(None);
        };
        if stored.elapsed() < self.ttl {
            return Ok(Some(response.clone()));
        }
        tracing::debug!(key, "cache entry expired");
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, response: &Response) -> Result<(), CacheError> {
        self.lock()?
            .insert(key.to_string(), (Instant::now(), response.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use claim_core::enums::Verdict;

    use super::*;
    use pretty_assertions::assert_eq;

    fn response(request_id: &str) -> Response {
        Response {
            request_id: request_id.into(),
            claim_id: "clm-1".into(),
            verdict: Verdict::Unclear,
            confidence: 0.5,
            evidence: Some(Vec::new()),
            references: Some(Vec::new()),
            explanation: "No relevant results found".into(),
            search_queries_used: Some(Vec::new()),
            cached: false,
            processing_time_ms: 3.0,
            timestamp: Utc::now(),
            error_details: None,
        }
    }

    #[test]
    fn key_normalizes_text() {
        let a = Request::text("u1", "The Sky is Blue").unwrap();
        let b = Request::text("u2", "  the sky is blue ").unwrap();
        assert_eq!(cache_key(&a), cache_key(&b));
        assert!(cache_key(&a).starts_with("claim-"));
        assert_eq!(cache_key(&a).len(), "claim-".len() + 64);
    }

    #[test]
    fn key_distinguishes_text_from_image() {
        let text = Request::text("u1", "abc").unwrap();
        let image = Request::image("u1", b"abc".to_vec()).unwrap();
        let both = Request::new("u1", Some("abc".into()), Some(b"abc".to_vec())).unwrap();
        assert_ne!(cache_key(&text), cache_key(&image));
        assert_ne!(cache_key(&text), cache_key(&both));
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.set("k", &response("req-1")).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().unwrap().request_id, "req-1");
        assert_eq!(cache.len().unwrap(), 1);

        cache.set("k", &response("req-2")).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().unwrap().request_id, "req-2");

        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_on_read() {
        let cache = MemoryCache::new(Duration::ZERO);
        cache.set("k", &response("req-1")).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().unwrap());
    }
}
