//! Exact binomial confidence intervals

use serde::{Deserialize, Serialize};

use crate::special::inverse_incomplete_beta;

/// Confidence level used when callers do not have a reason to pick another.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// An exact two-sided interval for a binomial proportion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialInterval {
    /// Lower bound, in [0, 1]
    pub lower: f64,

    /// Upper bound, in [0, 1], never below `lower`
    pub upper: f64,
}

impl BinomialInterval {
    /// Whether the interval contains a proportion.
    pub fn contains(&self, p: f64) -> bool {
        (self.lower..=self.upper).contains(&p)
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Clopper-Pearson exact interval for `successes` out of `n` trials.
///
/// Bounds come from inverting the regularized incomplete beta function:
/// with `alpha = 1 - level`, the lower bound is the `alpha/2` quantile of
/// Beta(x, n - x + 1) and the upper bound the `1 - alpha/2` quantile of
/// Beta(x + 1, n - x). The boundary cases are exact: zero successes pin the
/// lower bound to 0, and `successes == n` pins the upper bound to 1.
///
/// Total over degenerate input: `n == 0` yields the vacuous interval
/// [0, 1], and `successes > n` is treated as `successes == n`.
pub fn clopper_pearson_ci(successes: u64, n: u64, level: f64) -> BinomialInterval {
    if n == 0 {
        return BinomialInterval { lower: 0.0, upper: 1.0 };
    }

    let x = successes.min(n);
    let level = level.clamp(0.0, 1.0);
    let alpha = 1.0 - level;

    let lower = if x == 0 {
        0.0
    } else {
        inverse_incomplete_beta(alpha / 2.0, x as f64, (n - x + 1) as f64)
    };

    let upper = if x == n {
        1.0
    } else {
        inverse_incomplete_beta(1.0 - alpha / 2.0, (x + 1) as f64, (n - x) as f64)
    };

    BinomialInterval { lower, upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_successes_pins_lower() {
        let ci = clopper_pearson_ci(0, 20, DEFAULT_CONFIDENCE_LEVEL);
        assert_eq!(ci.lower, 0.0);
        assert!(ci.upper > 0.0 && ci.upper < 1.0);
    }

    #[test]
    fn test_all_successes_pins_upper() {
        let ci = clopper_pearson_ci(20, 20, DEFAULT_CONFIDENCE_LEVEL);
        assert_eq!(ci.upper, 1.0);
        assert!(ci.lower > 0.0 && ci.lower < 1.0);
    }

    #[test]
    fn test_known_interval() {
        // 5 of 20 at 95%: the standard published interval is
        // approximately [0.0866, 0.4910]
        let ci = clopper_pearson_ci(5, 20, 0.95);
        assert!((ci.lower - 0.0866).abs() < 1e-3, "lower was {}", ci.lower);
        assert!((ci.upper - 0.4910).abs() < 1e-3, "upper was {}", ci.upper);
    }

    #[test]
    fn test_degenerate_n() {
        let ci = clopper_pearson_ci(0, 0, 0.95);
        assert_eq!(ci.lower, 0.0);
        assert_eq!(ci.upper, 1.0);
    }

    #[test]
    fn test_successes_above_n_clamped() {
        let clamped = clopper_pearson_ci(25, 20, 0.95);
        let exact = clopper_pearson_ci(20, 20, 0.95);
        assert_eq!(clamped, exact);
    }

    #[test]
    fn test_wider_level_wider_interval() {
        let narrow = clopper_pearson_ci(10, 40, 0.90);
        let wide = clopper_pearson_ci(10, 40, 0.99);
        assert!(wide.width() > narrow.width());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the interval always contains the observed proportion
        #[test]
        fn test_contains_observed(n in 1u64..400, frac in 0.0f64..=1.0) {
            let successes = ((n as f64) * frac).round() as u64;
            let successes = successes.min(n);
            let ci = clopper_pearson_ci(successes, n, DEFAULT_CONFIDENCE_LEVEL);
            let observed = successes as f64 / n as f64;
            prop_assert!(
                ci.contains(observed),
                "[{}, {}] missed {}", ci.lower, ci.upper, observed
            );
        }

        /// Property: bounds are ordered and inside [0, 1]
        #[test]
        fn test_bounds_well_formed(n in 1u64..400, successes in 0u64..400) {
            let ci = clopper_pearson_ci(successes, n, DEFAULT_CONFIDENCE_LEVEL);
            prop_assert!(ci.lower >= 0.0);
            prop_assert!(ci.upper <= 1.0);
            prop_assert!(ci.lower <= ci.upper);
        }
    }
}
