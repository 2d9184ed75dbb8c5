//! Samtrace Domain Layer
//!
//! This crate contains the core data model for the claim-provenance pipeline.
//! It defines the record types produced by the four analysis phases, the
//! closed vocabularies those records draw from, and the trait interfaces that
//! all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **ClaimOrigin**: a claim's first documented appearance in a case
//! - **ClaimPropagation**: one edge in the claim's citation/adoption graph
//! - **AuthorityMarker**: a claim invoked with institutional weight
//! - **SamOutcome**: a real-world consequence traced back to root claims
//! - **Finding**: an analyst-facing result with cited statistics
//! - **Phase**: the fixed anchor → inherit → compound → arrive order
//!
//! ## Architecture
//!
//! This crate holds value types and trait seams only:
//! - Every record belongs to exactly one case and is immutable once written
//! - Identifiers are deterministic UUIDv5 values (per ADR-007), so re-running
//!   a phase over identical inputs reproduces identical records
//! - Infrastructure implementations (oracle clients, stores) live in other
//!   crates behind the traits defined here

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod document;
pub mod finding;
pub mod ids;
pub mod origin;
pub mod outcome;
pub mod phase;
pub mod propagation;
pub mod traits;

// Re-exports for convenience
pub use authority::{AuthorityMarker, AuthorityType, EndorsementType};
pub use document::{sort_chronological, CaseDocument};
pub use finding::{Finding, PhaseWarning, Severity};
pub use ids::{FindingId, MarkerId, OriginId, OutcomeId, PropagationId};
pub use origin::{claim_key, ClaimOrigin, FalsePremiseType, OriginType};
pub use outcome::{CausationChain, HarmLevel, OutcomeType, SamOutcome};
pub use phase::Phase;
pub use propagation::{ClaimPropagation, MutationType, PropagationType};
pub use traits::{
    DocumentStore, ExtractionKind, ExtractionOracle, FindingsSink, OracleRequest, PhaseRecord,
    PhaseStore,
};
