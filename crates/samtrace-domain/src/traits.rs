//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! infrastructure. Implementations live in other crates (samtrace-oracle,
//! samtrace-store); the pipeline is generic over them, which is what makes
//! every phase unit-testable with canned oracle responses (per ADR-009).

use serde::{Deserialize, Serialize};

use crate::document::CaseDocument;
use crate::finding::Finding;
use crate::phase::Phase;

/// Which structured extraction the oracle is being asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    /// Candidate claims and their attribution for one document
    ClaimOrigin,

    /// Candidate propagation links for one ordered document pair
    Propagation,

    /// Candidate authority invocations for one document
    Authority,

    /// Candidate real-world outcomes for one case
    Outcome,
}

impl ExtractionKind {
    /// Get the extraction kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionKind::ClaimOrigin => "claim_origin",
            ExtractionKind::Propagation => "propagation",
            ExtractionKind::Authority => "authority",
            ExtractionKind::Outcome => "outcome",
        }
    }
}

impl std::fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request to the extraction oracle.
///
/// `subject` identifies what the request is about (a document id, a
/// "source|target" pair, or a case id) and is what fixture oracles key
/// their canned responses on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Which extraction to perform
    pub kind: ExtractionKind,

    /// Case the request belongs to
    pub case_id: String,

    /// Document id, document pair, or case id the request is about
    pub subject: String,

    /// The full prompt to send
    pub prompt: String,
}

impl OracleRequest {
    /// Create a new oracle request.
    pub fn new(
        kind: ExtractionKind,
        case_id: impl Into<String>,
        subject: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            case_id: case_id.into(),
            subject: subject.into(),
            prompt: prompt.into(),
        }
    }
}

/// Trait for the structured-extraction oracle.
///
/// Implemented by the infrastructure layer (samtrace-oracle). The returned
/// string is an untrusted JSON document, possibly wrapped in markdown
/// fences; callers validate every field before anything reaches storage.
pub trait ExtractionOracle {
    /// Error type for oracle operations
    type Error;

    /// Run one structured extraction
    fn extract(&self, request: &OracleRequest) -> Result<String, Self::Error>;
}

/// Trait for reading case documents.
///
/// Implemented by the infrastructure layer (samtrace-store).
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// All documents in a case, in no particular order
    fn documents_for_case(&self, case_id: &str) -> Result<Vec<CaseDocument>, Self::Error>;

    /// Look up a single document by id
    fn get_document(&self, id: &str) -> Result<Option<CaseDocument>, Self::Error>;
}

/// One serialized record of a phase's output.
///
/// Phase outputs are persisted as JSON documents keyed by record id; the
/// pipeline owns the typed forms and the store never interprets the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// Record identifier within the phase (an entity id rendered as string)
    pub record_id: String,

    /// The serialized record
    pub body: serde_json::Value,
}

impl PhaseRecord {
    /// Create a new phase record.
    pub fn new(record_id: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            record_id: record_id.into(),
            body,
        }
    }
}

/// Trait for persisting phase outputs.
///
/// `replace_phase` is all-or-nothing: after it returns Ok, exactly the given
/// records exist for that (case, phase) and nothing of any earlier run
/// remains (per ADR-011). That full-replace contract plus deterministic
/// record ids is what makes phase re-runs idempotent.
pub trait PhaseStore {
    /// Error type for store operations
    type Error;

    /// Atomically replace a phase's output for a case
    fn replace_phase(
        &mut self,
        case_id: &str,
        phase: Phase,
        records: Vec<PhaseRecord>,
    ) -> Result<(), Self::Error>;

    /// Load a phase's output for a case
    fn load_phase(&self, case_id: &str, phase: Phase) -> Result<Vec<PhaseRecord>, Self::Error>;

    /// Whether a phase has ever produced output for a case
    fn has_phase(&self, case_id: &str, phase: Phase) -> Result<bool, Self::Error>;
}

/// Trait for receiving findings as phases produce them.
pub trait FindingsSink {
    /// Error type for sink operations
    type Error;

    /// Record one finding
    fn emit(&mut self, finding: Finding) -> Result<(), Self::Error>;
}
