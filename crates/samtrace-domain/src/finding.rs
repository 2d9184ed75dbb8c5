//! Finding module - analyst-facing results and recovered warnings

use serde::{Deserialize, Serialize};

use crate::ids::FindingId;
use crate::phase::Phase;

/// Severity of a finding.
///
/// Derived ordering runs info → critical, so `max` picks the worse level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Context worth recording, no defect
    Info,

    /// A defect with little practical effect
    Low,

    /// A defect an analyst should review
    Medium,

    /// A defect that likely changed the record's meaning
    High,

    /// A defect that likely changed an outcome
    Critical,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Severity::Info),
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid severity: {}", s))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An analyst-facing result: circular citations, temporal impossibilities,
/// authority laundering, harmful outcomes, and their case-level rollups.
///
/// The `payload` carries the cited statistics (test results, intervals) as
/// structured JSON so a report can quote exact numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Deterministic identifier (case + kind + subject)
    pub id: FindingId,

    /// Case this finding belongs to
    pub case_id: String,

    /// Short title
    pub title: String,

    /// Narrative description
    pub description: String,

    /// Severity
    pub severity: Severity,

    /// Documents the finding rests on
    pub supporting_documents: Vec<String>,

    /// Structured statistics and context
    pub payload: serde_json::Value,
}

impl Finding {
    /// Create a new finding.
    ///
    /// `kind` and `subject` determine the id, so re-running a phase emits
    /// the same finding id for the same defect.
    pub fn new(
        case_id: impl Into<String>,
        kind: &str,
        subject: &str,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let case_id = case_id.into();
        let id = FindingId::derive(&case_id, kind, subject);
        Self {
            id,
            case_id,
            title: title.into(),
            description: description.into(),
            severity,
            supporting_documents: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }

    /// Set the supporting documents
    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.supporting_documents = documents;
        self
    }

    /// Set the structured payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A recovered, item-level problem a phase worked around.
///
/// Warnings are data on the phase output, not log lines: a skipped document
/// or rejected candidate must be visible to the caller, not just the logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWarning {
    /// Phase that recovered
    pub phase: Phase,

    /// What the problem was about: a document id, a document pair, or an
    /// item index in an oracle response
    pub subject: String,

    /// What happened
    pub message: String,
}

impl PhaseWarning {
    /// Create a new warning.
    pub fn new(phase: Phase, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phase,
            subject: subject.into(),
            message: message.into(),
        }
    }
}
