//! Entity structs for the claimcheck domain.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so the
//! request/response contract can be exchanged as JSON and validated against
//! a generated schema.

mod claim;
mod evidence;
mod request;
mod response;

pub use claim::{Claim, Metadata, SubAnswer, meta};
pub use evidence::{EvidenceResult, EvidenceSummary, Reference};
pub use request::{DEFAULT_SOURCE_PLATFORM, Request};
pub use response::{ErrorContext, Response};
