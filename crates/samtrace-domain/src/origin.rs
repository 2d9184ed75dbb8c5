//! Claim origin module - a claim's first documented appearance

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::OriginId;

/// How a claim entered the documentary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    /// Direct evidence: the document itself witnesses the asserted event
    PrimarySource,

    /// A credentialed judgment offered within the author's competence
    ProfessionalOpinion,

    /// A report of what someone else said, without direct knowledge
    Hearsay,

    /// Conjecture presented as such
    Speculation,

    /// A statement attributed to a source that does not support it
    Misattribution,

    /// A statement with no identifiable source at all
    Fabrication,
}

impl OriginType {
    /// Get the origin type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginType::PrimarySource => "primary_source",
            OriginType::ProfessionalOpinion => "professional_opinion",
            OriginType::Hearsay => "hearsay",
            OriginType::Speculation => "speculation",
            OriginType::Misattribution => "misattribution",
            OriginType::Fabrication => "fabrication",
        }
    }

    /// Parse an origin type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary_source" => Some(OriginType::PrimarySource),
            "professional_opinion" => Some(OriginType::ProfessionalOpinion),
            "hearsay" => Some(OriginType::Hearsay),
            "speculation" => Some(OriginType::Speculation),
            "misattribution" => Some(OriginType::Misattribution),
            "fabrication" => Some(OriginType::Fabrication),
            _ => None,
        }
    }
}

impl std::str::FromStr for OriginType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid origin type: {}", s))
    }
}

impl std::fmt::Display for OriginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The specific defect that makes an origin a false premise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalsePremiseType {
    /// The asserted fact is contradicted by the record
    FactualError,

    /// The cited source does not say what the claim attributes to it
    Misattribution,

    /// Conjecture restated with the hedging removed
    SpeculationAsFact,

    /// Accurate words deprived of the context that changes their meaning
    ContextStripping,

    /// A quotation truncated or reordered to alter its meaning
    SelectiveQuotation,

    /// Events re-sequenced so a later fact appears to precede an earlier one
    TemporalDistortion,
}

impl FalsePremiseType {
    /// Get the false premise type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FalsePremiseType::FactualError => "factual_error",
            FalsePremiseType::Misattribution => "misattribution",
            FalsePremiseType::SpeculationAsFact => "speculation_as_fact",
            FalsePremiseType::ContextStripping => "context_stripping",
            FalsePremiseType::SelectiveQuotation => "selective_quotation",
            FalsePremiseType::TemporalDistortion => "temporal_distortion",
        }
    }

    /// Parse a false premise type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "factual_error" => Some(FalsePremiseType::FactualError),
            "misattribution" => Some(FalsePremiseType::Misattribution),
            "speculation_as_fact" => Some(FalsePremiseType::SpeculationAsFact),
            "context_stripping" => Some(FalsePremiseType::ContextStripping),
            "selective_quotation" => Some(FalsePremiseType::SelectiveQuotation),
            "temporal_distortion" => Some(FalsePremiseType::TemporalDistortion),
            _ => None,
        }
    }
}

impl std::str::FromStr for FalsePremiseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid false premise type: {}", s))
    }
}

impl std::fmt::Display for FalsePremiseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize claim text into the key that defines claim identity.
///
/// Lowercased, whitespace collapsed to single spaces, trimmed. Two sightings
/// with the same key are the same claim; linking paraphrases under one
/// canonical text is the extraction oracle's job, not this function's.
pub fn claim_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A claim's first documented appearance in a case.
///
/// Created only by the anchor phase and never mutated afterward. There is
/// exactly one origin per distinct claim key per case; the origin document is
/// the earliest document (acquisition order) in which the claim appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOrigin {
    /// Deterministic identifier (case + claim key)
    pub id: OriginId,

    /// Case this record belongs to
    pub case_id: String,

    /// The claim as first stated
    pub claim_text: String,

    /// Document of first appearance
    pub origin_document_id: String,

    /// Date of first appearance, when known
    pub origin_date: Option<NaiveDate>,

    /// Page of first appearance, when known
    pub origin_page: Option<u32>,

    /// How the claim entered the record
    pub origin_type: OriginType,

    /// Extraction confidence in [0, 1]
    pub confidence_score: f64,

    /// Whether the origin is contradicted by the documentary record
    pub is_false_premise: bool,

    /// The specific defect, when `is_false_premise` is set
    pub false_premise_type: Option<FalsePremiseType>,

    /// Citation of the contradicting evidence, when any
    pub contradicting_evidence: Option<String>,
}

impl ClaimOrigin {
    /// Create a new claim origin.
    ///
    /// The id is minted from the case and the normalized claim key, so the
    /// same claim in the same case always yields the same record id.
    pub fn new(
        case_id: impl Into<String>,
        claim_text: impl Into<String>,
        origin_document_id: impl Into<String>,
        origin_type: OriginType,
        confidence_score: f64,
    ) -> Self {
        let case_id = case_id.into();
        let claim_text = claim_text.into();
        let id = OriginId::derive(&case_id, &claim_key(&claim_text));
        Self {
            id,
            case_id,
            claim_text,
            origin_document_id: origin_document_id.into(),
            origin_date: None,
            origin_page: None,
            origin_type,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            is_false_premise: false,
            false_premise_type: None,
            contradicting_evidence: None,
        }
    }

    /// Set the origin date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.origin_date = Some(date);
        self
    }

    /// Set the origin page
    pub fn with_page(mut self, page: u32) -> Self {
        self.origin_page = Some(page);
        self
    }

    /// Mark the origin as a false premise with its defect and evidence
    pub fn with_false_premise(
        mut self,
        premise_type: FalsePremiseType,
        evidence: impl Into<String>,
    ) -> Self {
        self.is_false_premise = true;
        self.false_premise_type = Some(premise_type);
        self.contradicting_evidence = Some(evidence.into());
        self
    }

    /// The normalized key that defines this claim's identity
    pub fn key(&self) -> String {
        claim_key(&self.claim_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_key_normalization() {
        assert_eq!(claim_key("The  Sky\tis   FALLING "), "the sky is falling");
        assert_eq!(claim_key(""), "");
        assert_eq!(claim_key("   "), "");
    }

    #[test]
    fn test_origin_id_stable_across_whitespace_variants() {
        let a = ClaimOrigin::new("case-1", "The sky is falling", "doc-1", OriginType::Hearsay, 0.9);
        let b = ClaimOrigin::new(
            "case-1",
            "the sky   is falling",
            "doc-2",
            OriginType::Hearsay,
            0.4,
        );
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_false_premise_builder() {
        let origin = ClaimOrigin::new("c", "x said y", "doc-1", OriginType::Misattribution, 0.8)
            .with_false_premise(FalsePremiseType::Misattribution, "x's affidavit says otherwise");
        assert!(origin.is_false_premise);
        assert_eq!(origin.false_premise_type, Some(FalsePremiseType::Misattribution));
        assert!(origin.contradicting_evidence.is_some());
    }

    #[test]
    fn test_confidence_clamped() {
        let origin = ClaimOrigin::new("c", "x", "d", OriginType::Speculation, 1.7);
        assert_eq!(origin.confidence_score, 1.0);
        let origin = ClaimOrigin::new("c", "x", "d", OriginType::Speculation, -0.2);
        assert_eq!(origin.confidence_score, 0.0);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(OriginType::PrimarySource.as_str(), "primary_source");
        assert_eq!(
            FalsePremiseType::SpeculationAsFact.as_str(),
            "speculation_as_fact"
        );
        let json = serde_json::to_string(&OriginType::Fabrication).unwrap();
        assert_eq!(json, "\"fabrication\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ORIGIN_TYPES: [OriginType; 6] = [
        OriginType::PrimarySource,
        OriginType::ProfessionalOpinion,
        OriginType::Hearsay,
        OriginType::Speculation,
        OriginType::Misattribution,
        OriginType::Fabrication,
    ];

    proptest! {
        /// Property: claim_key is idempotent
        #[test]
        fn test_claim_key_idempotent(text in ".*") {
            let once = claim_key(&text);
            let twice = claim_key(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: wire names round-trip through parse
        #[test]
        fn test_origin_type_roundtrip(idx in 0usize..6) {
            let ty = ORIGIN_TYPES[idx];
            prop_assert_eq!(OriginType::parse(ty.as_str()), Some(ty));
        }

        /// Property: serde wire form matches as_str
        #[test]
        fn test_origin_type_serde_matches_as_str(idx in 0usize..6) {
            let ty = ORIGIN_TYPES[idx];
            let json = serde_json::to_string(&ty).unwrap();
            prop_assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }
}
