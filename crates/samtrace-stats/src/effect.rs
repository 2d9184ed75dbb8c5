//! Effect size measures

use serde::{Deserialize, Serialize};

/// Cohen's h: effect size between two proportions.
///
/// `h = 2 * asin(sqrt(p1)) - 2 * asin(sqrt(p2))`, the difference of the
/// arcsine-transformed proportions. Inputs are clamped into [0, 1] so the
/// transform stays real. Antisymmetric in its arguments.
pub fn cohens_h(p1: f64, p2: f64) -> f64 {
    let phi = |p: f64| 2.0 * p.clamp(0.0, 1.0).sqrt().asin();
    phi(p1) - phi(p2)
}

/// Conventional magnitude bucket for an effect size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    /// |h| < 0.2
    Negligible,

    /// |h| < 0.5
    Small,

    /// |h| < 0.8
    Medium,

    /// |h| < 1.2
    Large,

    /// |h| < 1.6
    VeryLarge,

    /// |h| >= 1.6
    Extreme,
}

impl EffectMagnitude {
    /// Bucket an effect size by magnitude. Sign is ignored.
    pub fn classify(h: f64) -> Self {
        let h = h.abs();
        if h < 0.2 {
            EffectMagnitude::Negligible
        } else if h < 0.5 {
            EffectMagnitude::Small
        } else if h < 0.8 {
            EffectMagnitude::Medium
        } else if h < 1.2 {
            EffectMagnitude::Large
        } else if h < 1.6 {
            EffectMagnitude::VeryLarge
        } else {
            EffectMagnitude::Extreme
        }
    }

    /// Get the magnitude name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
            EffectMagnitude::VeryLarge => "very_large",
            EffectMagnitude::Extreme => "extreme",
        }
    }
}

impl std::fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
