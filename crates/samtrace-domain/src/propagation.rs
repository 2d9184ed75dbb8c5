//! Claim propagation module - edges in the citation/adoption graph

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{OriginId, PropagationId};

/// How a claim moved from one document to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationType {
    /// Near-identical text reproduced in the target document
    Verbatim,

    /// Restated in different words
    Paraphrase,

    /// Explicitly attributed to the source document
    Citation,

    /// Treated as established without attribution
    ImplicitAdoption,

    /// The edge that closes a citation cycle
    CircularReference,

    /// Invoked on the strength of who said it rather than what supports it
    AuthorityAppeal,
}

impl PropagationType {
    /// Get the propagation type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PropagationType::Verbatim => "verbatim",
            PropagationType::Paraphrase => "paraphrase",
            PropagationType::Citation => "citation",
            PropagationType::ImplicitAdoption => "implicit_adoption",
            PropagationType::CircularReference => "circular_reference",
            PropagationType::AuthorityAppeal => "authority_appeal",
        }
    }

    /// Parse a propagation type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verbatim" => Some(PropagationType::Verbatim),
            "paraphrase" => Some(PropagationType::Paraphrase),
            "citation" => Some(PropagationType::Citation),
            "implicit_adoption" => Some(PropagationType::ImplicitAdoption),
            "circular_reference" => Some(PropagationType::CircularReference),
            "authority_appeal" => Some(PropagationType::AuthorityAppeal),
            _ => None,
        }
    }
}

impl std::str::FromStr for PropagationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid propagation type: {}", s))
    }
}

impl std::fmt::Display for PropagationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the claim's content changed while crossing the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// Certainty increased ("alleged" became "established")
    Amplification,

    /// Certainty decreased
    Attenuation,

    /// Certainty rank unchanged but the governing term shifted
    CertaintyDrift,

    /// The stated source changed without new evidence
    AttributionShift,

    /// The claim now covers more parties or conduct than before
    ScopeExpansion,

    /// The claim now covers less than before
    ScopeContraction,
}

impl MutationType {
    /// Get the mutation type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationType::Amplification => "amplification",
            MutationType::Attenuation => "attenuation",
            MutationType::CertaintyDrift => "certainty_drift",
            MutationType::AttributionShift => "attribution_shift",
            MutationType::ScopeExpansion => "scope_expansion",
            MutationType::ScopeContraction => "scope_contraction",
        }
    }

    /// Parse a mutation type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "amplification" => Some(MutationType::Amplification),
            "attenuation" => Some(MutationType::Attenuation),
            "certainty_drift" => Some(MutationType::CertaintyDrift),
            "attribution_shift" => Some(MutationType::AttributionShift),
            "scope_expansion" => Some(MutationType::ScopeExpansion),
            "scope_contraction" => Some(MutationType::ScopeContraction),
            _ => None,
        }
    }
}

impl std::str::FromStr for MutationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid mutation type: {}", s))
    }
}

impl std::fmt::Display for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One directed edge in a claim's propagation graph.
///
/// Created only by the inherit phase. Edges must not be self-loops, and when
/// both dates are known the target must not precede the source; the inherit
/// phase rejects violating candidates before construction rather than
/// repairing them. Many edges may share a `claim_id`, and cycles introduced
/// by stated-source citations are legal (they are detected and classified,
/// not rejected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimPropagation {
    /// Deterministic identifier (claim + ordered document pair)
    pub id: PropagationId,

    /// The claim that moved
    pub claim_id: OriginId,

    /// Document the claim moved from
    pub source_document_id: String,

    /// Document the claim moved to
    pub target_document_id: String,

    /// Source document date, when known
    pub source_date: Option<NaiveDate>,

    /// Target document date, when known
    pub target_date: Option<NaiveDate>,

    /// Institution behind the source document, when known
    pub source_institution: Option<String>,

    /// Institution behind the target document, when known
    pub target_institution: Option<String>,

    /// How the claim crossed this edge
    pub propagation_type: PropagationType,

    /// Whether the claim's content changed in transit
    pub mutation_detected: bool,

    /// The kind of change, when one was detected
    pub mutation_type: Option<MutationType>,

    /// Whether the target's author re-examined the underlying evidence
    pub verification_performed: bool,

    /// What the re-examination concluded, when it happened
    pub verification_outcome: Option<String>,

    /// Source and target institutions both known and different
    pub crossed_institutional_boundary: bool,

    /// The claim as stated in the source document
    pub original_text: Option<String>,

    /// The claim as stated in the target document
    pub mutated_text: Option<String>,
}

impl ClaimPropagation {
    /// Create a new propagation edge.
    ///
    /// `crossed_institutional_boundary` is computed from the institution
    /// fields; it is true only when both are known and differ.
    pub fn new(
        claim_id: OriginId,
        source_document_id: impl Into<String>,
        target_document_id: impl Into<String>,
        propagation_type: PropagationType,
    ) -> Self {
        let source_document_id = source_document_id.into();
        let target_document_id = target_document_id.into();
        let id = PropagationId::derive(claim_id, &source_document_id, &target_document_id);
        Self {
            id,
            claim_id,
            source_document_id,
            target_document_id,
            source_date: None,
            target_date: None,
            source_institution: None,
            target_institution: None,
            propagation_type,
            mutation_detected: false,
            mutation_type: None,
            verification_performed: false,
            verification_outcome: None,
            crossed_institutional_boundary: false,
            original_text: None,
            mutated_text: None,
        }
    }

    /// Set the endpoint dates
    pub fn with_dates(mut self, source: Option<NaiveDate>, target: Option<NaiveDate>) -> Self {
        self.source_date = source;
        self.target_date = target;
        self
    }

    /// Set the endpoint institutions and recompute the boundary flag
    pub fn with_institutions(
        mut self,
        source: Option<String>,
        target: Option<String>,
    ) -> Self {
        self.crossed_institutional_boundary = match (&source, &target) {
            (Some(s), Some(t)) => s != t,
            _ => false,
        };
        self.source_institution = source;
        self.target_institution = target;
        self
    }

    /// Record a detected mutation with the texts it was detected from
    pub fn with_mutation(
        mut self,
        mutation_type: MutationType,
        original: impl Into<String>,
        mutated: impl Into<String>,
    ) -> Self {
        self.mutation_detected = true;
        self.mutation_type = Some(mutation_type);
        self.original_text = Some(original.into());
        self.mutated_text = Some(mutated.into());
        self
    }

    /// Record that the target's author re-examined the evidence
    pub fn with_verification(mut self, outcome: impl Into<String>) -> Self {
        self.verification_performed = true;
        self.verification_outcome = Some(outcome.into());
        self
    }

    /// True when both dates are known and the target precedes the source.
    pub fn violates_temporal_order(&self) -> bool {
        match (self.source_date, self.target_date) {
            (Some(source), Some(target)) => target < source,
            _ => false,
        }
    }
}
