//! Hypothesis tests and meta-analysis combiners

use serde::{Deserialize, Serialize};

use crate::special::{chi_square_sf, two_tailed_p};

/// Smallest p-value fed into a logarithm. Keeps Fisher's statistic finite
/// when a caller passes an underflowed p of exactly zero.
const MIN_P: f64 = 1e-300;

/// Result of a two-proportion binomial z-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTest {
    /// The z statistic
    pub z: f64,

    /// Two-tailed p-value
    pub p_value: f64,
}

/// Two-sided binomial test of whether two counts depart from a 50/50 split.
///
/// The observed proportion is `count1 / (count1 + count2)`; the null is a
/// fair split, so the standard error is `sqrt(0.25 / n)` and
/// `z = (observed - 0.5) / se`. The p-value is two-tailed against the
/// standard normal. Both counts zero is the degenerate case and returns the
/// null result `{z: 0, p: 1}`.
pub fn binomial_test(count1: u64, count2: u64) -> BinomialTest {
    let n = count1 + count2;
    if n == 0 {
        return BinomialTest { z: 0.0, p_value: 1.0 };
    }

    let observed = count1 as f64 / n as f64;
    let se = (0.25 / n as f64).sqrt();
    let z = (observed - 0.5) / se;

    BinomialTest {
        z,
        p_value: two_tailed_p(z),
    }
}

/// Conventional significance bucket for a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceLevel {
    /// p > 0.05
    NotSignificant,

    /// p <= 0.05
    Significant,

    /// p <= 0.01
    VerySignificant,

    /// p <= 0.001
    HighlySignificant,

    /// p <= 0.00001
    ExtremelySignificant,
}

impl SignificanceLevel {
    /// Star notation as it appears in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SignificanceLevel::NotSignificant => "NS",
            SignificanceLevel::Significant => "*",
            SignificanceLevel::VerySignificant => "**",
            SignificanceLevel::HighlySignificant => "***",
            SignificanceLevel::ExtremelySignificant => "****",
        }
    }
}

impl std::fmt::Display for SignificanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bucket a p-value into the conventional significance levels.
pub fn significance_level(p: f64) -> SignificanceLevel {
    if p <= 0.00001 {
        SignificanceLevel::ExtremelySignificant
    } else if p <= 0.001 {
        SignificanceLevel::HighlySignificant
    } else if p <= 0.01 {
        SignificanceLevel::VerySignificant
    } else if p <= 0.05 {
        SignificanceLevel::Significant
    } else {
        SignificanceLevel::NotSignificant
    }
}

/// Result of a meta-analysis combiner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedTest {
    /// The combined statistic (chi-square for Fisher, z for Stouffer)
    pub statistic: f64,

    /// The combined p-value
    pub p_value: f64,
}

impl CombinedTest {
    /// The combiner's null result, returned for empty input.
    pub fn null() -> Self {
        Self {
            statistic: 0.0,
            p_value: 1.0,
        }
    }
}

/// Fisher's method: combine independent p-values into one.
///
/// `X^2 = -2 * sum(ln p_i)` against chi-square with `2k` degrees of
/// freedom. Inputs are clamped into [MIN_P, 1] first so an underflowed zero
/// cannot produce an infinite statistic. An empty slice returns the null
/// result.
pub fn fisher_combined(p_values: &[f64]) -> CombinedTest {
    if p_values.is_empty() {
        return CombinedTest::null();
    }

    let statistic: f64 = p_values
        .iter()
        .map(|p| -2.0 * p.clamp(MIN_P, 1.0).ln())
        .sum();
    let dof = 2.0 * p_values.len() as f64;

    CombinedTest {
        statistic,
        p_value: chi_square_sf(statistic, dof),
    }
}

/// Stouffer's method: combine independent z-scores into one.
///
/// `Z = sum(z_i) / sqrt(k)`, two-tailed p against the standard normal.
/// An empty slice returns the null result.
pub fn stouffer_z(z_scores: &[f64]) -> CombinedTest {
    if z_scores.is_empty() {
        return CombinedTest::null();
    }

    let k = z_scores.len() as f64;
    let z: f64 = z_scores.iter().sum::<f64>() / k.sqrt();

    CombinedTest {
        statistic: z,
        p_value: two_tailed_p(z),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: binomial test output is always finite with p in [0, 1]
        #[test]
        fn test_binomial_total(c1 in 0u64..100_000, c2 in 0u64..100_000) {
            let result = binomial_test(c1, c2);
            prop_assert!(result.z.is_finite());
            prop_assert!(result.p_value.is_finite());
            prop_assert!((0.0..=1.0).contains(&result.p_value));
        }

        /// Property: swapping the counts negates z and preserves p
        #[test]
        fn test_binomial_antisymmetry(c1 in 0u64..10_000, c2 in 0u64..10_000) {
            let ab = binomial_test(c1, c2);
            let ba = binomial_test(c2, c1);
            prop_assert!((ab.z + ba.z).abs() < 1e-9);
            prop_assert!((ab.p_value - ba.p_value).abs() < 1e-9);
        }

        /// Property: Fisher's statistic is finite and p stays in [0, 1]
        #[test]
        fn test_fisher_total(ps in proptest::collection::vec(0.0f64..=1.0, 0..20)) {
            let result = fisher_combined(&ps);
            prop_assert!(result.statistic.is_finite());
            prop_assert!((0.0..=1.0).contains(&result.p_value));
        }

        /// Property: Stouffer's combiner is total over moderate z-scores
        #[test]
        fn test_stouffer_total(zs in proptest::collection::vec(-30.0f64..30.0, 0..20)) {
            let result = stouffer_z(&zs);
            prop_assert!(result.statistic.is_finite());
            prop_assert!((0.0..=1.0).contains(&result.p_value));
        }
    }
}
