//! Cross-cutting error types for claimcheck.
//!
//! Domain-specific errors (e.g., `SourceError`, `StageError`) are defined in
//! their respective crates. Only errors that any crate may raise live here.

use thiserror::Error;

/// Errors that can be raised by any claimcheck crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (missing inputs, out-of-range values).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
