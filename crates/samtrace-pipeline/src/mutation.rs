//! Mutation classification between a claim's source and target renditions
//!
//! Classification checks run in precedence order: certainty movement, then
//! scope change, then attribution shift. The certainty lexicon and the
//! verbatim threshold come from `PipelineConfig`; treat them as calibration
//! inputs, not fixed truths.

use std::collections::HashSet;

use samtrace_domain::MutationType;

use crate::config::CertaintyLexicon;

/// Quantifiers that widen a claim's breadth without naming new parties.
const BROADENING_TERMS: [&str; 5] = ["all", "every", "always", "any", "never"];

/// Markers that introduce a stated source.
const ATTRIBUTION_MARKERS: [&[&str]; 4] = [
    &["according", "to"],
    &["per"],
    &["reported", "by"],
    &["stated", "by"],
];

/// Lowercase alphanumeric tokens of a text.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Jaccard similarity of two texts' token sets.
///
/// Two empty texts are identical (1.0); one empty text shares nothing (0.0).
pub(crate) fn token_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = tokens(a).into_iter().collect();
    let set_b: HashSet<String> = tokens(b).into_iter().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    intersection / union
}

/// Capitalized tokens that are not sentence-initial: the named parties.
fn named_parties(text: &str) -> HashSet<String> {
    let mut parties = HashSet::new();
    for sentence in text.split(['.', '!', '?']) {
        for word in sentence.split_whitespace().skip(1) {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            if cleaned.len() > 1 && cleaned.chars().next().is_some_and(|c| c.is_uppercase()) {
                parties.insert(cleaned.to_lowercase());
            }
        }
    }
    parties
}

/// The source a text attributes its claim to, when it states one.
fn stated_attribution(text: &str) -> Option<String> {
    let toks = tokens(text);
    for marker in ATTRIBUTION_MARKERS {
        for start in 0..toks.len() {
            if toks[start..].len() >= marker.len()
                && toks[start..].iter().zip(marker.iter()).all(|(t, m)| t == m)
            {
                let after = start + marker.len();
                if after < toks.len() {
                    return Some(toks[after].clone());
                }
            }
        }
    }
    None
}

/// Classify how a claim changed between its source and target renditions.
///
/// Returns `None` when no mutation is detected. Ties (a certainty term
/// changing without a rank change but to the same token, a party set that
/// neither grew nor shrank) resolve toward no mutation. Attribution shift
/// is suppressed when the target's author verified the evidence, because a
/// re-examined claim legitimately acquires a new source.
pub(crate) fn classify_mutation(
    original: &str,
    mutated: &str,
    lexicon: &CertaintyLexicon,
    verification_performed: bool,
) -> Option<MutationType> {
    if let (Some((source_rank, source_term)), Some((target_rank, target_term))) = (
        lexicon.governing_term(original),
        lexicon.governing_term(mutated),
    ) {
        if target_rank > source_rank {
            return Some(MutationType::Amplification);
        }
        if target_rank < source_rank {
            return Some(MutationType::Attenuation);
        }
        if source_term != target_term {
            return Some(MutationType::CertaintyDrift);
        }
    }

    let source_parties = named_parties(original);
    let target_parties = named_parties(mutated);
    if target_parties.is_superset(&source_parties) && target_parties.len() > source_parties.len() {
        return Some(MutationType::ScopeExpansion);
    }
    if target_parties.is_subset(&source_parties) && target_parties.len() < source_parties.len() {
        return Some(MutationType::ScopeContraction);
    }
    let source_broad = has_broadening_term(original);
    let target_broad = has_broadening_term(mutated);
    if target_broad && !source_broad {
        return Some(MutationType::ScopeExpansion);
    }
    if source_broad && !target_broad {
        return Some(MutationType::ScopeContraction);
    }

    if !verification_performed {
        if let (Some(source_attr), Some(target_attr)) =
            (stated_attribution(original), stated_attribution(mutated))
        {
            if source_attr != target_attr {
                return Some(MutationType::AttributionShift);
            }
        }
    }

    None
}

fn has_broadening_term(text: &str) -> bool {
    tokens(text).iter().any(|t| BROADENING_TERMS.contains(&t.as_str()))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: similarity is symmetric
        #[test]
        fn test_similarity_symmetric(a in ".*", b in ".*") {
            prop_assert_eq!(
                token_similarity(&a, &b).to_bits(),
                token_similarity(&b, &a).to_bits()
            );
        }

        /// Property: similarity stays in [0, 1]
        #[test]
        fn test_similarity_bounded(a in ".*", b in ".*") {
            let s = token_similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        /// Property: identical texts never mutate
        #[test]
        fn test_identical_text_never_mutates(text in ".*") {
            let lexicon = CertaintyLexicon::default();
            prop_assert_eq!(classify_mutation(&text, &text, &lexicon, false), None);
        }
    }
}
