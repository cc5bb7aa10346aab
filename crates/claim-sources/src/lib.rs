//! # claim-sources
//!
//! Evidence sources for claimcheck.
//!
//! - [`SourceRegistry`]: the ordered table of known sources and their
//!   traversal priority.
//! - [`EvidenceSource`]: the search contract every source implements.
//! - [`SourceCatalog`]: the registration table mapping registry keys to live
//!   source instances, built once at startup.
//! - [`HttpSource`]: a generic JSON-over-HTTP source for configured endpoints.

mod catalog;
mod error;
mod http_source;
mod registry;

pub use catalog::{SourceCatalog, SourceCatalogBuilder};
pub use error::SourceError;
pub use http_source::HttpSource;
pub use registry::{SourceConfig, SourceRegistry};

use std::collections::BTreeMap;

use async_trait::async_trait;
use claim_core::entities::EvidenceResult;

/// Named search parameters passed alongside a query (`who`, `what`, `where`).
pub type SearchParams = BTreeMap<String, String>;

/// An external collaborator queried for content about a claim.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Search this source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the source cannot be reached or its
    /// response cannot be understood. Callers treat this as a soft failure
    /// for this source only.
    async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<EvidenceResult>, SourceError>;
}
