//! Samtrace Pipeline
//!
//! The four-phase claim-provenance engine. Given a case's documents and a
//! structured-extraction oracle, it anchors each claim to its first
//! documented appearance, traces how claims propagate between documents,
//! accumulates the institutional authority chains acquire along the way,
//! and maps claims to the real-world outcomes they produced.
//!
//! ## Architecture
//!
//! - Every oracle response is untrusted JSON: it is parsed, validated
//!   field by field, and bad items are dropped with a warning rather than
//!   failing the batch
//! - Phase outputs are persisted with full-replace semantics and
//!   deterministic record ids, so any phase can be re-run or resumed
//! - The orchestrator ([`SamPipeline`]) owns sequencing, persistence,
//!   resumption, and cooperative cancellation
//!
//! Statistical claims in findings (laundering rates, outcome patterns) are
//! computed by `samtrace-stats` and carried in finding payloads.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod anchor;
mod arrive;
mod calls;
mod compound;
pub mod config;
pub mod error;
mod graph;
mod inherit;
mod mutation;
pub mod orchestrator;
mod parser;
mod prompt;
pub mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::{CancelFlag, SamPipeline};
pub use types::{CaseSummary, PhaseOutputs, PipelineResult};
