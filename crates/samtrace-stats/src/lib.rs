//! Samtrace Statistical Significance Engine
//!
//! Hypothesis tests, effect sizes, exact intervals, and meta-analysis
//! combiners used by the provenance pipeline's severity scoring. Everything
//! here is a pure function: no I/O, no allocation beyond results, and total
//! over its documented domain - degenerate inputs return the null result
//! (z = 0, p = 1) rather than panicking (per ADR-014).
//!
//! The numbers these functions produce end up quoted in findings, so the
//! algorithms are fixed: the Abramowitz-Stegun rational erf approximation
//! for the normal CDF, Lentz continued fractions for the incomplete beta
//! and gamma functions, and bisection for the inverse beta. Two builds of
//! this crate must agree bit-for-bit on every output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod effect;
pub mod interval;
pub mod significance;
mod special;

pub use effect::{cohens_h, EffectMagnitude};
pub use interval::{clopper_pearson_ci, BinomialInterval, DEFAULT_CONFIDENCE_LEVEL};
pub use significance::{
    binomial_test, fisher_combined, significance_level, stouffer_z, BinomialTest, CombinedTest,
    SignificanceLevel,
};
