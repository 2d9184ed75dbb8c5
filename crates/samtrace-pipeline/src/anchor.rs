//! ANCHOR - claim origin analysis
//!
//! One oracle call per document, concurrent up to the configured limit.
//! Documents are folded in acquisition order, so a claim's origin is its
//! first sighting and re-runs reproduce identical records. A failed call
//! skips that document with a warning; the phase itself never fails.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
use samtrace_domain::{claim_key, CaseDocument, ClaimOrigin, FalsePremiseType, Phase, PhaseWarning};
use tracing::{debug, info, warn};

use crate::calls::dispatch;
use crate::config::PipelineConfig;
use crate::parser::parse_candidates;
use crate::prompt::origin_prompt;
use crate::types::{OriginCandidate, PhaseOutcome};

/// Run the anchor phase over documents already in chronological order.
pub(crate) async fn run<O>(
    oracle: &Arc<O>,
    case_id: &str,
    documents: &[CaseDocument],
    config: &PipelineConfig,
) -> PhaseOutcome<ClaimOrigin>
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
{
    info!("anchor: extracting claims from {} documents", documents.len());
    let mut outcome = PhaseOutcome::default();

    let requests: Vec<OracleRequest> = documents
        .iter()
        .map(|doc| {
            OracleRequest::new(
                ExtractionKind::ClaimOrigin,
                case_id,
                &doc.id,
                origin_prompt(doc),
            )
        })
        .collect();

    let results: HashMap<String, Result<String, String>> = dispatch(
        oracle,
        requests,
        config.max_concurrent_calls,
        config.oracle_timeout(),
    )
    .await
    .into_iter()
    .collect();

    // Fold documents in date order; the first document reporting a claim
    // key owns the origin, later sightings can only contribute
    // contradiction evidence.
    let mut origins: HashMap<String, ClaimOrigin> = HashMap::new();

    for document in documents {
        let body = match results.get(&document.id) {
            Some(Ok(body)) => body,
            Some(Err(message)) => {
                warn!("anchor: skipping {}: {}", document.id, message);
                outcome
                    .warnings
                    .push(PhaseWarning::new(Phase::Anchor, &document.id, message));
                continue;
            }
            None => continue,
        };

        let (candidates, rejections) =
            match parse_candidates(body, OriginCandidate::validate) {
                Ok(parsed) => parsed,
                Err(message) => {
                    warn!("anchor: unusable response for {}: {}", document.id, message);
                    outcome
                        .warnings
                        .push(PhaseWarning::new(Phase::Anchor, &document.id, message));
                    continue;
                }
            };
        for rejection in rejections {
            outcome
                .warnings
                .push(PhaseWarning::new(Phase::Anchor, &document.id, rejection));
        }

        debug!("anchor: {} candidates in {}", candidates.len(), document.id);
        for candidate in candidates {
            let key = claim_key(&candidate.claim_text);
            match origins.get_mut(&key) {
                None => {
                    origins.insert(key, build_origin(case_id, document, &candidate));
                }
                Some(origin) => {
                    // Cross-check within the batch: a later sighting that
                    // documents a contradiction marks the origin.
                    if candidate.is_false_premise && !origin.is_false_premise {
                        origin.is_false_premise = true;
                        origin.false_premise_type = Some(resolve_premise_type(&candidate));
                        origin.contradicting_evidence = candidate
                            .contradicting_evidence
                            .clone()
                            .or_else(|| Some(format!("contradicted in {}", document.id)));
                    }
                }
            }
        }
    }

    outcome.records = origins.into_values().collect();
    outcome.records.sort_by_key(|o| o.id);
    info!(
        "anchor: {} origins, {} false premises, {} warnings",
        outcome.records.len(),
        outcome.records.iter().filter(|o| o.is_false_premise).count(),
        outcome.warnings.len()
    );
    outcome
}

fn build_origin(
    case_id: &str,
    document: &CaseDocument,
    candidate: &OriginCandidate,
) -> ClaimOrigin {
    let mut origin = ClaimOrigin::new(
        case_id,
        &candidate.claim_text,
        &document.id,
        candidate.origin_type,
        candidate.confidence_score,
    );
    if let Some(date) = candidate.origin_date {
        origin = origin.with_date(date);
    }
    if let Some(page) = candidate.page {
        origin = origin.with_page(page);
    }
    if candidate.is_false_premise {
        origin = origin.with_false_premise(
            resolve_premise_type(candidate),
            candidate
                .contradicting_evidence
                .clone()
                .unwrap_or_else(|| "contradiction reported by extraction".to_string()),
        );
    }
    origin
}

/// Pick the most specific false-premise defect for a candidate.
///
/// The quote-level defects only apply when the underlying assertion is not
/// itself wrong; a truncated quote of a wrong fact is a factual error.
fn resolve_premise_type(candidate: &OriginCandidate) -> FalsePremiseType {
    match candidate.false_premise_type {
        Some(FalsePremiseType::SelectiveQuotation) | Some(FalsePremiseType::ContextStripping)
            if candidate.factually_wrong =>
        {
            FalsePremiseType::FactualError
        }
        Some(premise_type) => premise_type,
        None if candidate.factually_wrong => FalsePremiseType::FactualError,
        None => FalsePremiseType::SpeculationAsFact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use samtrace_domain::OriginType;
    use samtrace_oracle::FixtureOracle;

    fn doc(id: &str, month: u32, index: u64) -> CaseDocument {
        CaseDocument::new(
            id,
            "case-1",
            format!("{}.pdf", id),
            NaiveDate::from_ymd_opt(2024, month, 10).unwrap(),
            index,
        )
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    const CLAIM_JSON: &str = r#"[{
        "claim_text": "the father missed the hearing",
        "origin_type": "hearsay",
        "confidence_score": 0.8,
        "origin_date": "2024-01-10",
        "page": 2
    }]"#;

    #[tokio::test]
    async fn test_first_sighting_owns_origin() {
        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::ClaimOrigin, "d1", CLAIM_JSON);
        oracle.add_response(
            ExtractionKind::ClaimOrigin,
            "d2",
            r#"[{"claim_text": "The father MISSED the hearing", "origin_type": "citation_is_invalid", "confidence_score": 0.9}]"#,
        );
        let oracle = Arc::new(oracle);

        let docs = vec![doc("d1", 1, 0), doc("d2", 2, 1)];
        let outcome = run(&oracle, "case-1", &docs, &config()).await;

        // d2's candidate has a bad origin_type and is rejected, but even a
        // valid one could not move the origin off d1.
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].origin_document_id, "d1");
        assert_eq!(outcome.records[0].origin_type, OriginType::Hearsay);
        assert_eq!(outcome.records[0].origin_page, Some(2));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_same_date_ordered_by_ingest_index() {
        let mut oracle = FixtureOracle::new();
        for d in ["early", "late"] {
            oracle.add_response(ExtractionKind::ClaimOrigin, d, CLAIM_JSON);
        }
        let oracle = Arc::new(oracle);

        // Both acquired the same day; ingest order decides.
        let docs = vec![doc("early", 3, 0), doc("late", 3, 1)];
        let outcome = run(&oracle, "case-1", &docs, &config()).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].origin_document_id, "early");
    }

    #[tokio::test]
    async fn test_failed_document_skipped_with_warning() {
        let mut oracle = FixtureOracle::new();
        oracle.add_error(ExtractionKind::ClaimOrigin, "d1");
        oracle.add_response(ExtractionKind::ClaimOrigin, "d2", CLAIM_JSON);
        let oracle = Arc::new(oracle);

        let docs = vec![doc("d1", 1, 0), doc("d2", 2, 1)];
        let outcome = run(&oracle, "case-1", &docs, &config()).await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].origin_document_id, "d2");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].subject, "d1");
    }

    #[tokio::test]
    async fn test_later_contradiction_marks_origin() {
        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::ClaimOrigin, "d1", CLAIM_JSON);
        oracle.add_response(
            ExtractionKind::ClaimOrigin,
            "d2",
            r#"[{
                "claim_text": "the father missed the hearing",
                "origin_type": "hearsay",
                "confidence_score": 0.9,
                "is_false_premise": true,
                "false_premise_type": "factual_error",
                "factually_wrong": true,
                "contradicting_evidence": "attendance register shows presence"
            }]"#,
        );
        let oracle = Arc::new(oracle);

        let docs = vec![doc("d1", 1, 0), doc("d2", 2, 1)];
        let outcome = run(&oracle, "case-1", &docs, &config()).await;

        assert_eq!(outcome.records.len(), 1);
        let origin = &outcome.records[0];
        assert_eq!(origin.origin_document_id, "d1");
        assert!(origin.is_false_premise);
        assert_eq!(origin.false_premise_type, Some(FalsePremiseType::FactualError));
        assert_eq!(
            origin.contradicting_evidence.as_deref(),
            Some("attendance register shows presence")
        );
    }

    #[tokio::test]
    async fn test_idempotent_across_reruns() {
        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::ClaimOrigin, "d1", CLAIM_JSON);
        let oracle = Arc::new(oracle);

        let docs = vec![doc("d1", 1, 0)];
        let first = run(&oracle, "case-1", &docs, &config()).await;
        let second = run(&oracle, "case-1", &docs, &config()).await;
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn test_premise_type_resolution() {
        let mut candidate = OriginCandidate {
            claim_text: "x".to_string(),
            origin_type: OriginType::Hearsay,
            confidence_score: 0.5,
            origin_date: None,
            page: None,
            is_false_premise: true,
            false_premise_type: Some(FalsePremiseType::SelectiveQuotation),
            factually_wrong: false,
            contradicting_evidence: None,
        };
        // Quote-level defect with a true underlying fact stays quote-level.
        assert_eq!(
            resolve_premise_type(&candidate),
            FalsePremiseType::SelectiveQuotation
        );

        candidate.factually_wrong = true;
        assert_eq!(resolve_premise_type(&candidate), FalsePremiseType::FactualError);

        candidate.false_premise_type = None;
        assert_eq!(resolve_premise_type(&candidate), FalsePremiseType::FactualError);

        candidate.factually_wrong = false;
        assert_eq!(
            resolve_premise_type(&candidate),
            FalsePremiseType::SpeculationAsFact
        );
    }
}
