//! # claim-core
//!
//! Core types, ID generation, and error types for claimcheck.
//!
//! This crate provides the foundational types shared across all claimcheck crates:
//! - Entity structs for the verification domain (requests, claims, evidence, responses)
//! - Enums for verdicts, claim questions, provenance, and source categories
//! - Prefixed ID generation for requests and claims
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
