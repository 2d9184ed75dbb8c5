//! Configuration for the pipeline

use samtrace_domain::{AuthorityType, EndorsementType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base authority weight for each authority type.
///
/// These are the fixed lookup values the compound phase starts from before
/// endorsement scaling. Adjudicated findings sit above investigative
/// conclusions; the investigative types are the only ones that respond to
/// the independent-corroboration bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityWeights {
    /// Weight for a court's adjudicated finding
    pub court_finding: f64,

    /// Weight for an expert witness opinion
    pub expert_opinion: f64,

    /// Weight for a formal institutional report
    pub official_report: f64,

    /// Weight for a practitioner's assessment
    pub professional_assessment: f64,

    /// Weight for a police investigation's conclusion
    pub police_conclusion: f64,

    /// Weight for an administrative agency's determination
    pub agency_determination: f64,
}

impl AuthorityWeights {
    /// Base weight for an authority type
    pub fn weight_for(&self, authority_type: AuthorityType) -> f64 {
        match authority_type {
            AuthorityType::CourtFinding => self.court_finding,
            AuthorityType::ExpertOpinion => self.expert_opinion,
            AuthorityType::OfficialReport => self.official_report,
            AuthorityType::ProfessionalAssessment => self.professional_assessment,
            AuthorityType::PoliceConclusion => self.police_conclusion,
            AuthorityType::AgencyDetermination => self.agency_determination,
        }
    }

    fn values(&self) -> [f64; 6] {
        [
            self.court_finding,
            self.expert_opinion,
            self.official_report,
            self.professional_assessment,
            self.police_conclusion,
            self.agency_determination,
        ]
    }
}

impl Default for AuthorityWeights {
    fn default() -> Self {
        Self {
            court_finding: 0.95,
            expert_opinion: 0.85,
            official_report: 0.70,
            professional_assessment: 0.65,
            police_conclusion: 0.60,
            agency_determination: 0.55,
        }
    }
}

/// Multiplier applied to a marker's base weight for each endorsement type.
///
/// A marker whose endorsement the oracle could not classify keeps the full
/// base weight (factor 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndorsementFactors {
    /// Claim adopted in the document's own voice
    pub explicit_adoption: f64,

    /// Claim adopted with reservations on the record
    pub qualified_acceptance: f64,

    /// Reasoning depends on the claim without saying so
    pub implicit_reliance: f64,

    /// Cited as established without any check of the evidence
    pub referenced_without_verification: f64,
}

impl EndorsementFactors {
    /// Multiplier for an endorsement type; `None` means no discount
    pub fn factor_for(&self, endorsement: Option<EndorsementType>) -> f64 {
        match endorsement {
            Some(EndorsementType::ExplicitAdoption) => self.explicit_adoption,
            Some(EndorsementType::QualifiedAcceptance) => self.qualified_acceptance,
            Some(EndorsementType::ImplicitReliance) => self.implicit_reliance,
            Some(EndorsementType::ReferencedWithoutVerification) => {
                self.referenced_without_verification
            }
            None => 1.0,
        }
    }

    fn values(&self) -> [f64; 4] {
        [
            self.explicit_adoption,
            self.qualified_acceptance,
            self.implicit_reliance,
            self.referenced_without_verification,
        ]
    }
}

impl Default for EndorsementFactors {
    fn default() -> Self {
        Self {
            explicit_adoption: 1.0,
            qualified_acceptance: 0.7,
            implicit_reliance: 0.5,
            referenced_without_verification: 0.4,
        }
    }
}

/// Certainty vocabulary ranked from hedged to absolute.
///
/// `ranks[0]` holds the most hedged register ("alleged"), the last rank the
/// most absolute ("proven fact"). Mutation classification compares the
/// highest rank present in each text, so the lexicon is ordered data, not a
/// flat word list. The defaults cover the registers family-court records
/// actually use; cases in other domains can supply their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertaintyLexicon {
    /// Terms by rank, hedged to absolute
    pub ranks: Vec<Vec<String>>,
}

impl CertaintyLexicon {
    /// Rank of a single lowercase token, if it is in the lexicon
    pub fn rank_of(&self, token: &str) -> Option<usize> {
        self.ranks
            .iter()
            .position(|terms| terms.iter().any(|t| t == token))
    }

    /// The highest certainty rank present in a text, with the first token
    /// that reaches it (the governing term). `None` when the text carries
    /// no lexicon term at all.
    pub fn governing_term(&self, text: &str) -> Option<(usize, String)> {
        let mut best: Option<(usize, String)> = None;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if let Some(rank) = self.rank_of(&token) {
                match &best {
                    Some((r, _)) if *r >= rank => {}
                    _ => best = Some((rank, token)),
                }
            }
        }
        best
    }
}

impl Default for CertaintyLexicon {
    fn default() -> Self {
        let rank = |terms: &[&str]| terms.iter().map(|t| t.to_string()).collect();
        Self {
            ranks: vec![
                rank(&[
                    "alleged",
                    "allegedly",
                    "alleges",
                    "allegation",
                    "claimed",
                    "claims",
                    "reportedly",
                    "suspected",
                ]),
                rank(&["likely", "probable", "probably", "appears", "suggests"]),
                rank(&["established", "confirmed", "determined", "found"]),
                rank(&["fact", "proven", "certain", "undisputed"]),
            ],
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum oracle calls in flight at once
    pub max_concurrent_calls: usize,

    /// Maximum time for a single oracle call (seconds)
    pub oracle_timeout_secs: u64,

    /// Token-set similarity at or above which two excerpts count as
    /// verbatim reproduction
    pub verbatim_similarity: f64,

    /// Base authority weight per authority type
    pub authority_weights: AuthorityWeights,

    /// Endorsement multipliers applied to base weights
    pub endorsement_factors: EndorsementFactors,

    /// Added to investigative weights when the oracle attests independent
    /// corroboration (result capped at 1.0)
    pub corroboration_bonus: f64,

    /// Maximum contribution of a marker once both endpoint institutions
    /// have already endorsed the claim elsewhere
    pub cross_citation_cap: f64,

    /// Markers below this weight count as a weak chain start
    pub laundering_low_weight: f64,

    /// Markers at or above this weight count as a high-weight endorsement
    pub laundering_high_weight: f64,

    /// Saturation constant for causation normalization
    /// (`score / (score + saturation)`)
    pub causation_saturation: f64,

    /// Certainty vocabulary used by mutation classification
    pub certainty_lexicon: CertaintyLexicon,
}

impl PipelineConfig {
    /// Get the oracle timeout as a Duration
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_calls == 0 {
            return Err("max_concurrent_calls must be greater than 0".to_string());
        }
        if self.oracle_timeout_secs == 0 {
            return Err("oracle_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.verbatim_similarity) {
            return Err("verbatim_similarity must be within [0, 1]".to_string());
        }
        for weight in self.authority_weights.values() {
            if !(0.0..=1.0).contains(&weight) {
                return Err("authority weights must be within [0, 1]".to_string());
            }
        }
        for factor in self.endorsement_factors.values() {
            if !(0.0..=1.0).contains(&factor) {
                return Err("endorsement factors must be within [0, 1]".to_string());
            }
        }
        if !(0.0..=1.0).contains(&self.corroboration_bonus) {
            return Err("corroboration_bonus must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.cross_citation_cap) {
            return Err("cross_citation_cap must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.laundering_low_weight)
            || !(0.0..=1.0).contains(&self.laundering_high_weight)
        {
            return Err("laundering thresholds must be within [0, 1]".to_string());
        }
        if self.laundering_low_weight >= self.laundering_high_weight {
            return Err("laundering_low_weight must be below laundering_high_weight".to_string());
        }
        if self.causation_saturation <= 0.0 {
            return Err("causation_saturation must be greater than 0".to_string());
        }
        if self.certainty_lexicon.ranks.is_empty() {
            return Err("certainty_lexicon must have at least one rank".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    /// Default configuration matching the documented weight tables
    fn default() -> Self {
        Self {
            max_concurrent_calls: 4,
            oracle_timeout_secs: 120,
            verbatim_similarity: 0.85,
            authority_weights: AuthorityWeights::default(),
            endorsement_factors: EndorsementFactors::default(),
            corroboration_bonus: 0.15,
            cross_citation_cap: 0.05,
            laundering_low_weight: 0.5,
            laundering_high_weight: 0.8,
            causation_saturation: 2.0,
            certainty_lexicon: CertaintyLexicon::default(),
        }
    }
}
