//! Phase module - the fixed execution order of the provenance pipeline

use serde::{Deserialize, Serialize};

/// One of the four analysis phases.
///
/// Phases always execute in declaration order:
/// - Anchor: locate each claim's first documented appearance
/// - Inherit: trace how claims propagate between documents
/// - Compound: accumulate institutional authority along chains
/// - Arrive: map claims to real-world outcomes
///
/// The derived ordering is the execution ordering, which is what resumption
/// (`start_phase`) relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Claim origin analysis
    Anchor,

    /// Propagation tracing
    Inherit,

    /// Authority accumulation
    Compound,

    /// Outcome causation mapping
    Arrive,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 4] = [Phase::Anchor, Phase::Inherit, Phase::Compound, Phase::Arrive];

    /// Get the phase name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Anchor => "anchor",
            Phase::Inherit => "inherit",
            Phase::Compound => "compound",
            Phase::Arrive => "arrive",
        }
    }

    /// Parse a phase from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anchor" => Some(Phase::Anchor),
            "inherit" => Some(Phase::Inherit),
            "compound" => Some(Phase::Compound),
            "arrive" => Some(Phase::Arrive),
            _ => None,
        }
    }

    /// Get the next phase in execution order
    pub fn next(&self) -> Option<Self> {
        match self {
            Phase::Anchor => Some(Phase::Inherit),
            Phase::Inherit => Some(Phase::Compound),
            Phase::Compound => Some(Phase::Arrive),
            Phase::Arrive => None,
        }
    }

    /// Phases strictly before this one, in execution order.
    pub fn predecessors(&self) -> &'static [Phase] {
        match self {
            Phase::Anchor => &[],
            Phase::Inherit => &[Phase::Anchor],
            Phase::Compound => &[Phase::Anchor, Phase::Inherit],
            Phase::Arrive => &[Phase::Anchor, Phase::Inherit, Phase::Compound],
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid phase: {}", s))
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
