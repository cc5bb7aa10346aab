//! Registration table from registry keys to live source instances.

use std::collections::HashMap;
use std::sync::Arc;

use claim_config::ClaimConfig;

use crate::EvidenceSource;
use crate::error::SourceError;
use crate::http_source::HttpSource;
use crate::registry::SourceRegistry;

/// Live evidence sources, keyed by their registry entry.
///
/// Built once at startup through [`SourceCatalogBuilder`] and shared
/// read-only across requests. A registry entry with no registered instance
/// is valid; looking it up yields [`SourceError::NotFound`].
#[derive(Clone)]
pub struct SourceCatalog {
    registry: SourceRegistry,
    sources: HashMap<String, Arc<dyn EvidenceSource>>,
}

impl std::fmt::Debug for SourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut registered: Vec<&String> = self.sources.keys().collect();
        registered.sort();
        f.debug_struct("SourceCatalog")
            .field("registry", &self.registry)
            .field("registered", &registered)
            .finish()
    }
}

impl SourceCatalog {
    #[must_use]
    pub fn builder(registry: SourceRegistry) -> SourceCatalogBuilder {
        SourceCatalogBuilder {
            registry,
            sources: HashMap::new(),
        }
    }

    /// Catalog from configuration: the built-in registry with overrides
    /// applied, plus one [`HttpSource`] per configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the overrides are invalid, an endpoint is
    /// configured for a key the registry does not list, or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &ClaimConfig) -> Result<Self, SourceError> {
        let mut builder = Self::builder(SourceRegistry::from_config(config)?);
        for (key, endpoint) in &config.http.endpoints {
            if !config.http.is_configured(key) {
                continue;
            }
            let source = HttpSource::new(key.clone(), endpoint.clone(), &config.http)?;
            builder = builder.register(key, source)?;
        }
        Ok(builder.build())
    }

    #[must_use]
    pub const fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Look up the instance registered for `key` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no instance is registered.
    pub fn get(&self, key: &str) -> Result<Arc<dyn EvidenceSource>, SourceError> {
        self.registry
            .resolve_key(key)
            .and_then(|canonical| self.sources.get(canonical))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }

    /// Number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Builder for [`SourceCatalog`].
pub struct SourceCatalogBuilder {
    registry: SourceRegistry,
    sources: HashMap<String, Arc<dyn EvidenceSource>>,
}

impl SourceCatalogBuilder {
    /// Register an instance for a registry key.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unregistered`] if the registry does not list `key`.
    pub fn register(
        self,
        key: &str,
        source: impl EvidenceSource + 'static,
    ) -> Result<Self, SourceError> {
        self.register_arc(key, Arc::new(source))
    }

    /// Register a shared instance for a registry key. Replaces any earlier
    /// registration for the same key.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unregistered`] if the registry does not list `key`.
    pub fn register_arc(
        mut self,
        key: &str,
        source: Arc<dyn EvidenceSource>,
    ) -> Result<Self, SourceError> {
        let canonical = self
            .registry
            .resolve_key(key)
            .ok_or_else(|| SourceError::Unregistered(key.to_string()))?
            .to_string();
        self.sources.insert(canonical, source);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> SourceCatalog {
        SourceCatalog {
            registry: self.registry,
            sources: self.sources,
        }
    }
}
