//! Authority marker module - claims invoked with institutional weight

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{MarkerId, OriginId};

/// The kind of institutional weight a document lends a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityType {
    /// A court's adjudicated finding
    CourtFinding,

    /// An expert witness or instructed expert's opinion
    ExpertOpinion,

    /// A formal report issued by an institution
    OfficialReport,

    /// A practitioner's assessment within their role
    ProfessionalAssessment,

    /// A police investigation's conclusion
    PoliceConclusion,

    /// A regulatory or administrative agency's determination
    AgencyDetermination,
}

impl AuthorityType {
    /// Get the authority type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityType::CourtFinding => "court_finding",
            AuthorityType::ExpertOpinion => "expert_opinion",
            AuthorityType::OfficialReport => "official_report",
            AuthorityType::ProfessionalAssessment => "professional_assessment",
            AuthorityType::PoliceConclusion => "police_conclusion",
            AuthorityType::AgencyDetermination => "agency_determination",
        }
    }

    /// Parse an authority type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "court_finding" => Some(AuthorityType::CourtFinding),
            "expert_opinion" => Some(AuthorityType::ExpertOpinion),
            "official_report" => Some(AuthorityType::OfficialReport),
            "professional_assessment" => Some(AuthorityType::ProfessionalAssessment),
            "police_conclusion" => Some(AuthorityType::PoliceConclusion),
            "agency_determination" => Some(AuthorityType::AgencyDetermination),
            _ => None,
        }
    }

    /// Whether this authority derives from investigation rather than
    /// adjudication. Investigative conclusions are the two types whose
    /// weight responds to independent corroboration.
    pub fn is_investigative(&self) -> bool {
        matches!(
            self,
            AuthorityType::PoliceConclusion | AuthorityType::AgencyDetermination
        )
    }
}

impl std::str::FromStr for AuthorityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid authority type: {}", s))
    }
}

impl std::fmt::Display for AuthorityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How firmly the invoking document adopted the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsementType {
    /// The claim is adopted in the document's own voice
    ExplicitAdoption,

    /// The document's reasoning depends on the claim without stating so
    ImplicitReliance,

    /// Adopted with reservations on the record
    QualifiedAcceptance,

    /// Cited as established without any check of the underlying evidence
    ReferencedWithoutVerification,
}

impl EndorsementType {
    /// Get the endorsement type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EndorsementType::ExplicitAdoption => "explicit_adoption",
            EndorsementType::ImplicitReliance => "implicit_reliance",
            EndorsementType::QualifiedAcceptance => "qualified_acceptance",
            EndorsementType::ReferencedWithoutVerification => "referenced_without_verification",
        }
    }

    /// Parse an endorsement type from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "explicit_adoption" => Some(EndorsementType::ExplicitAdoption),
            "implicit_reliance" => Some(EndorsementType::ImplicitReliance),
            "qualified_acceptance" => Some(EndorsementType::QualifiedAcceptance),
            "referenced_without_verification" => {
                Some(EndorsementType::ReferencedWithoutVerification)
            }
            _ => None,
        }
    }
}

impl std::str::FromStr for EndorsementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid endorsement type: {}", s))
    }
}

impl std::fmt::Display for EndorsementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One instance of a claim being invoked with institutional weight.
///
/// Created only by the compound phase from the propagation graph and the
/// oracle's authority candidates; read by the arrive phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityMarker {
    /// Deterministic identifier (claim + document + authority type)
    pub id: MarkerId,

    /// The claim being invoked
    pub claim_id: OriginId,

    /// The document doing the invoking
    pub document_id: String,

    /// The kind of institutional weight
    pub authority_type: AuthorityType,

    /// How firmly the claim was adopted, when the oracle could tell
    pub endorsement_type: Option<EndorsementType>,

    /// Effective weight in [0, 1] after endorsement scaling
    pub authority_weight: f64,

    /// Date of the invocation, when known
    pub authority_date: Option<NaiveDate>,

    /// Whether this marker sits on a laundering path
    pub is_authority_laundering: bool,

    /// The edge sequence of the laundering path, when flagged
    pub laundering_path: Option<String>,
}

impl AuthorityMarker {
    /// Create a new authority marker.
    pub fn new(
        claim_id: OriginId,
        document_id: impl Into<String>,
        authority_type: AuthorityType,
        authority_weight: f64,
    ) -> Self {
        let document_id = document_id.into();
        let id = MarkerId::derive(claim_id, &document_id, authority_type.as_str());
        Self {
            id,
            claim_id,
            document_id,
            authority_type,
            endorsement_type: None,
            authority_weight: authority_weight.clamp(0.0, 1.0),
            authority_date: None,
            is_authority_laundering: false,
            laundering_path: None,
        }
    }

    /// Set the endorsement type
    pub fn with_endorsement(mut self, endorsement: EndorsementType) -> Self {
        self.endorsement_type = Some(endorsement);
        self
    }

    /// Set the invocation date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.authority_date = Some(date);
        self
    }

    /// Flag the marker as the endpoint of a laundering path
    pub fn with_laundering_path(mut self, path: impl Into<String>) -> Self {
        self.is_authority_laundering = true;
        self.laundering_path = Some(path.into());
        self
    }
}
