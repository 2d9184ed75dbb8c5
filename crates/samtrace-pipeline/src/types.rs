//! Request, candidate, and result types for the pipeline

use chrono::NaiveDate;
use samtrace_domain::{
    AuthorityMarker, AuthorityType, CausationChain, ClaimOrigin, ClaimPropagation,
    EndorsementType, FalsePremiseType, Finding, OriginType, OutcomeType, PhaseWarning, SamOutcome,
};
use serde::{Deserialize, Serialize};

/// Everything a pipeline run produced, phase by phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutputs {
    /// Claim origins from the anchor phase
    pub origins: Vec<ClaimOrigin>,

    /// Propagation edges from the inherit phase
    pub propagations: Vec<ClaimPropagation>,

    /// Authority markers from the compound phase
    pub markers: Vec<AuthorityMarker>,

    /// Outcomes from the arrive phase
    pub outcomes: Vec<SamOutcome>,
}

/// Aggregate counts over a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    /// Documents the run analyzed
    pub documents_analyzed: usize,

    /// Distinct claims anchored
    pub total_claims: usize,

    /// Claims whose origin is a false premise
    pub false_premises: usize,

    /// Claims with at least one propagation edge
    pub propagation_chains: usize,

    /// Authority markers emitted
    pub authority_markers: usize,

    /// Markers flagged as authority laundering
    pub laundering_instances: usize,

    /// Outcomes mapped to root claims
    pub outcomes_mapped: usize,

    /// Outcomes at severe harm or worse
    pub harmful_outcomes: usize,

    /// Findings emitted across all computed phases
    pub findings_emitted: usize,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Case the run analyzed
    pub case_id: String,

    /// Typed phase outputs (loaded or computed)
    pub phases: PhaseOutputs,

    /// Causation chains assembled by the arrive phase (derived data)
    pub chains: Vec<CausationChain>,

    /// Aggregate counts
    pub summary: CaseSummary,

    /// Item-level problems the run recovered from
    pub warnings: Vec<PhaseWarning>,
}

/// A computed phase's records plus whatever it recovered or flagged.
#[derive(Debug, Clone)]
pub(crate) struct PhaseOutcome<T> {
    pub records: Vec<T>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<PhaseWarning>,
}

impl<T> Default for PhaseOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            findings: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Candidate claim from a `claim_origin` extraction, one document.
///
/// Deserialized straight from oracle JSON; enum-valued fields fail
/// deserialization on anything outside the closed vocabulary, which is how
/// unrecognized values reject the item instead of being coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OriginCandidate {
    pub claim_text: String,
    pub origin_type: OriginType,
    pub confidence_score: f64,
    #[serde(default)]
    pub origin_date: Option<NaiveDate>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub is_false_premise: bool,
    #[serde(default)]
    pub false_premise_type: Option<FalsePremiseType>,
    #[serde(default)]
    pub factually_wrong: bool,
    #[serde(default)]
    pub contradicting_evidence: Option<String>,
}

impl OriginCandidate {
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_text.trim().is_empty() {
            return Err("claim_text is empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(format!(
                "confidence_score {} out of range [0.0, 1.0]",
                self.confidence_score
            ));
        }
        if self.false_premise_type.is_some() && !self.is_false_premise {
            return Err("false_premise_type present without is_false_premise".to_string());
        }
        Ok(())
    }
}

/// Relation hints the oracle may offer for a propagation candidate.
///
/// Deliberately narrower than `PropagationType`: verbatim, citation, and
/// circular classifications are computed from evidence, never taken on the
/// oracle's word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RelationHint {
    ImplicitAdoption,
    AuthorityAppeal,
}

/// Candidate propagation from a `propagation` extraction, one ordered
/// document pair. Each item means "this claim appears in the pair's target
/// document"; the fields describe how it relates to the pair's source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PropagationCandidate {
    pub claim_text: String,
    #[serde(default)]
    pub relation_hint: Option<RelationHint>,
    #[serde(default)]
    pub explicit_citation: bool,
    /// Document the target names as its source, when it names one other
    /// than the pair's source
    #[serde(default)]
    pub target_cites: Option<String>,
    #[serde(default)]
    pub source_excerpt: Option<String>,
    #[serde(default)]
    pub target_excerpt: Option<String>,
    #[serde(default)]
    pub source_date: Option<NaiveDate>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub verification_performed: bool,
    #[serde(default)]
    pub verification_outcome: Option<String>,
}

impl PropagationCandidate {
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_text.trim().is_empty() {
            return Err("claim_text is empty".to_string());
        }
        if self.verification_outcome.is_some() && !self.verification_performed {
            return Err("verification_outcome present without verification_performed".to_string());
        }
        Ok(())
    }
}

/// Candidate authority invocation from an `authority` extraction, one
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AuthorityCandidate {
    pub claim_text: String,
    pub authority_type: AuthorityType,
    #[serde(default)]
    pub endorsement_type: Option<EndorsementType>,
    #[serde(default)]
    pub authority_date: Option<NaiveDate>,
    #[serde(default)]
    pub independent_corroboration: bool,
}

impl AuthorityCandidate {
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_text.trim().is_empty() {
            return Err("claim_text is empty".to_string());
        }
        Ok(())
    }
}

/// Candidate outcome from an `outcome` extraction, one per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OutcomeCandidate {
    pub description: String,
    pub outcome_type: OutcomeType,
    #[serde(default)]
    pub outcome_date: Option<NaiveDate>,
    #[serde(default)]
    pub supporting_documents: Vec<String>,
    #[serde(default = "default_true")]
    pub remediation_possible: bool,
    #[serde(default)]
    pub harm_description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl OutcomeCandidate {
    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("description is empty".to_string());
        }
        if self.supporting_documents.is_empty() {
            return Err("supporting_documents is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_origin_candidate() {
        let candidate = OriginCandidate {
            claim_text: "the report was filed late".to_string(),
            origin_type: OriginType::Hearsay,
            confidence_score: 0.8,
            origin_date: None,
            page: None,
            is_false_premise: false,
            false_premise_type: None,
            factually_wrong: false,
            contradicting_evidence: None,
        };
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn test_origin_candidate_empty_claim() {
        let candidate = OriginCandidate {
            claim_text: "   ".to_string(),
            origin_type: OriginType::Hearsay,
            confidence_score: 0.8,
            origin_date: None,
            page: None,
            is_false_premise: false,
            false_premise_type: None,
            factually_wrong: false,
            contradicting_evidence: None,
        };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_origin_candidate_confidence_out_of_range() {
        let candidate = OriginCandidate {
            claim_text: "x".to_string(),
            origin_type: OriginType::Speculation,
            confidence_score: 1.5,
            origin_date: None,
            page: None,
            is_false_premise: false,
            false_premise_type: None,
            factually_wrong: false,
            contradicting_evidence: None,
        };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_origin_candidate_premise_type_requires_flag() {
        let candidate = OriginCandidate {
            claim_text: "x".to_string(),
            origin_type: OriginType::Speculation,
            confidence_score: 0.5,
            origin_date: None,
            page: None,
            is_false_premise: false,
            false_premise_type: Some(FalsePremiseType::FactualError),
            factually_wrong: false,
            contradicting_evidence: None,
        };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_outcome_candidate_requires_supporting_documents() {
        let candidate = OutcomeCandidate {
            description: "custody transferred".to_string(),
            outcome_type: OutcomeType::CourtOrder,
            outcome_date: None,
            supporting_documents: vec![],
            remediation_possible: true,
            harm_description: None,
        };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_relation_hint_wire_names() {
        let hint: RelationHint = serde_json::from_str("\"implicit_adoption\"").unwrap();
        assert_eq!(hint, RelationHint::ImplicitAdoption);
        assert!(serde_json::from_str::<RelationHint>("\"verbatim\"").is_err());
    }

    #[test]
    fn test_outcome_remediation_defaults_true() {
        let json = r#"{
            "description": "supervised contact ordered",
            "outcome_type": "court_order",
            "supporting_documents": ["d3"]
        }"#;
        let candidate: OutcomeCandidate = serde_json::from_str(json).unwrap();
        assert!(candidate.remediation_possible);
    }
}
