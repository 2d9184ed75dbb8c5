//! Outcome module - real-world consequences traced back to root claims

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{OriginId, OutcomeId, PropagationId};

/// The kind of real-world consequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    /// An order made by a court
    CourtOrder,

    /// A formal finding of fact on the record
    FindingOfFact,

    /// A recommendation adopted by a decision-maker
    Recommendation,

    /// An administrative agency's decision
    AgencyDecision,

    /// Action taken by a regulator
    RegulatoryAction,

    /// Publication in the press
    MediaPublication,
}

impl OutcomeType {
    /// Get the outcome type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::CourtOrder => "court_order",
            OutcomeType::FindingOfFact => "finding_of_fact",
            OutcomeType::Recommendation => "recommendation",
            OutcomeType::AgencyDecision => "agency_decision",
            OutcomeType::RegulatoryAction => "regulatory_action",
            OutcomeType::MediaPublication => "media_publication",
        }
    }

    /// Parse an outcome type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "court_order" => Some(OutcomeType::CourtOrder),
            "finding_of_fact" => Some(OutcomeType::FindingOfFact),
            "recommendation" => Some(OutcomeType::Recommendation),
            "agency_decision" => Some(OutcomeType::AgencyDecision),
            "regulatory_action" => Some(OutcomeType::RegulatoryAction),
            "media_publication" => Some(OutcomeType::MediaPublication),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutcomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid outcome type: {}", s))
    }
}

impl std::fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of the harm an outcome caused.
///
/// The derived ordering runs minor → catastrophic, so `max` picks the worse
/// of two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmLevel {
    /// Inconvenience or reputational bruising, fully recoverable
    Minor,

    /// Material harm with a practical path to remediation
    Moderate,

    /// Lasting harm that remediation can only partly undo
    Severe,

    /// Irreversible harm to a protected interest
    Catastrophic,
}

impl HarmLevel {
    /// Get the harm level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmLevel::Minor => "minor",
            HarmLevel::Moderate => "moderate",
            HarmLevel::Severe => "severe",
            HarmLevel::Catastrophic => "catastrophic",
        }
    }

    /// Parse a harm level from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(HarmLevel::Minor),
            "moderate" => Some(HarmLevel::Moderate),
            "severe" => Some(HarmLevel::Severe),
            "catastrophic" => Some(HarmLevel::Catastrophic),
            _ => None,
        }
    }
}

impl std::str::FromStr for HarmLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid harm level: {}", s))
    }
}

impl std::fmt::Display for HarmLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A real-world consequence traced to a root claim.
///
/// Created only by the arrive phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamOutcome {
    /// Deterministic identifier (case + root claim + description)
    pub id: OutcomeId,

    /// The origin the outcome traces back to
    pub root_claim_id: OriginId,

    /// What happened
    pub outcome_description: String,

    /// The kind of consequence
    pub outcome_type: OutcomeType,

    /// When it happened, when known
    pub outcome_date: Option<NaiveDate>,

    /// Severity of the harm
    pub harm_level: HarmLevel,

    /// Narrative description of the harm, when the oracle supplied one
    pub harm_description: Option<String>,

    /// Whether the harm can still be remediated
    pub remediation_possible: bool,

    /// Templated but-for statement linking root claim to outcome
    pub but_for_analysis: Option<String>,

    /// Normalized causation strength in [0, 1]
    pub causation_strength: f64,
}

impl SamOutcome {
    /// Create a new outcome record.
    pub fn new(
        case_id: &str,
        root_claim_id: OriginId,
        outcome_description: impl Into<String>,
        outcome_type: OutcomeType,
        harm_level: HarmLevel,
        remediation_possible: bool,
    ) -> Self {
        let outcome_description = outcome_description.into();
        let id = OutcomeId::derive(case_id, root_claim_id, &outcome_description);
        Self {
            id,
            root_claim_id,
            outcome_description,
            outcome_type,
            outcome_date: None,
            harm_level,
            harm_description: None,
            remediation_possible,
            but_for_analysis: None,
            causation_strength: 0.0,
        }
    }

    /// Set the outcome date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.outcome_date = Some(date);
        self
    }

    /// Set the harm description
    pub fn with_harm_description(mut self, description: impl Into<String>) -> Self {
        self.harm_description = Some(description.into());
        self
    }

    /// Set the but-for statement
    pub fn with_but_for(mut self, analysis: impl Into<String>) -> Self {
        self.but_for_analysis = Some(analysis.into());
        self
    }

    /// Set the causation strength, clamped to [0, 1]
    pub fn with_causation_strength(mut self, strength: f64) -> Self {
        self.causation_strength = strength.clamp(0.0, 1.0);
        self
    }
}

/// The path from root claims to an outcome, assembled on demand by the
/// arrive phase. Derived data; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausationChain {
    /// The outcome the chain explains
    pub outcome_id: OutcomeId,

    /// Root claims in walk order
    pub root_claims: Vec<OriginId>,

    /// Propagation edges along the dominant path, in chain order
    pub propagation_path: Vec<PropagationId>,

    /// Cumulative authority accumulated along the dominant path
    pub authority_accumulation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harm_level_ordering() {
        assert!(HarmLevel::Minor < HarmLevel::Moderate);
        assert!(HarmLevel::Moderate < HarmLevel::Severe);
        assert!(HarmLevel::Severe < HarmLevel::Catastrophic);
        assert_eq!(
            HarmLevel::Severe.max(HarmLevel::Moderate),
            HarmLevel::Severe
        );
    }

    #[test]
    fn test_outcome_id_deterministic() {
        let claim = OriginId::derive("case", "claim");
        let a = SamOutcome::new(
            "case",
            claim,
            "supervised contact ordered",
            OutcomeType::CourtOrder,
            HarmLevel::Severe,
            true,
        );
        let b = SamOutcome::new(
            "case",
            claim,
            "supervised contact ordered",
            OutcomeType::CourtOrder,
            HarmLevel::Minor,
            false,
        );
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_causation_strength_clamped() {
        let claim = OriginId::derive("case", "claim");
        let outcome = SamOutcome::new(
            "case",
            claim,
            "x",
            OutcomeType::Recommendation,
            HarmLevel::Minor,
            true,
        )
        .with_causation_strength(1.4);
        assert_eq!(outcome.causation_strength, 1.0);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(OutcomeType::FindingOfFact.as_str(), "finding_of_fact");
        assert_eq!(HarmLevel::Catastrophic.as_str(), "catastrophic");
        let json = serde_json::to_string(&HarmLevel::Severe).unwrap();
        assert_eq!(json, "\"severe\"");
    }
}
