//! ARRIVE - outcome causation mapping
//!
//! One oracle call per case. Each outcome's supporting documents are walked
//! backward through the propagation graph to origin documents; the chains
//! found there carry compound's accumulated authority into a bounded
//! causation strength. The but-for narrative is templated from the record,
//! never generated text.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
use samtrace_domain::{
    AuthorityMarker, CaseDocument, CausationChain, ClaimOrigin, Finding, HarmLevel, OriginId,
    OutcomeType, Phase, PhaseWarning, SamOutcome, Severity,
};
use samtrace_stats::{binomial_test, significance_level, stouffer_z};
use tracing::{debug, info, warn};

use crate::calls::dispatch;
use crate::compound::cumulative_scores_capped;
use crate::config::PipelineConfig;
use crate::graph::{PropagationGraph, RootPath};
use crate::parser::parse_candidates;
use crate::prompt::outcome_prompt;
use crate::types::{OutcomeCandidate, PhaseOutcome};

/// Run the arrive phase. Returns the phase outcome plus the causation
/// chains assembled for the result (derived data, never persisted).
pub(crate) async fn run<O>(
    oracle: &Arc<O>,
    case_id: &str,
    documents: &[CaseDocument],
    origins: &[ClaimOrigin],
    graph: &PropagationGraph,
    markers: &[AuthorityMarker],
    config: &PipelineConfig,
) -> (PhaseOutcome<SamOutcome>, Vec<CausationChain>)
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
{
    let mut outcome = PhaseOutcome::default();
    let mut chains = Vec::new();

    let request = OracleRequest::new(
        ExtractionKind::Outcome,
        case_id,
        case_id,
        outcome_prompt(case_id, documents),
    );
    info!("arrive: extracting outcomes for case {}", case_id);

    let results = dispatch(
        oracle,
        vec![request],
        config.max_concurrent_calls,
        config.oracle_timeout(),
    )
    .await;

    // One request, at most one result. Failure leaves arrive empty; the
    // upstream phases stand.
    let body = match results.into_iter().next() {
        Some((_, Ok(body))) => body,
        Some((subject, Err(message))) => {
            warn!("arrive: outcome extraction failed: {}", message);
            outcome
                .warnings
                .push(PhaseWarning::new(Phase::Arrive, subject, message));
            return (outcome, chains);
        }
        None => return (outcome, chains),
    };

    let (candidates, rejections) = match parse_candidates(&body, OutcomeCandidate::validate) {
        Ok(parsed) => parsed,
        Err(message) => {
            warn!("arrive: unusable outcome response: {}", message);
            outcome
                .warnings
                .push(PhaseWarning::new(Phase::Arrive, case_id, message));
            return (outcome, chains);
        }
    };
    for rejection in rejections {
        outcome
            .warnings
            .push(PhaseWarning::new(Phase::Arrive, case_id, rejection));
    }

    let origins_by_document: HashMap<&str, Vec<&ClaimOrigin>> = origins.iter().fold(
        HashMap::new(),
        |mut map, origin| {
            map.entry(origin.origin_document_id.as_str())
                .or_default()
                .push(origin);
            map
        },
    );
    let scores = cumulative_scores_capped(graph, markers, config);

    let mut harmful_z_scores: Vec<f64> = Vec::new();

    for candidate in candidates {
        // Candidate root claims: every origin whose document terminates a
        // backward walk from a supporting document.
        let mut root_claims: Vec<&ClaimOrigin> = Vec::new();
        let mut paths_by_claim: HashMap<OriginId, &RootPath> = HashMap::new();
        let mut root_paths: Vec<RootPath> = Vec::new();
        for document_id in &candidate.supporting_documents {
            root_paths.extend(graph.trace_back(document_id));
        }
        for path in &root_paths {
            for &origin in origins_by_document
                .get(path.root_document.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[])
            {
                if !root_claims.iter().any(|r| r.id == origin.id) {
                    root_claims.push(origin);
                }
                paths_by_claim.entry(origin.id).or_insert(path);
            }
        }

        if root_claims.is_empty() {
            outcome.warnings.push(PhaseWarning::new(
                Phase::Arrive,
                case_id,
                format!(
                    "no root claim traceable for outcome: {}",
                    candidate.description
                ),
            ));
            continue;
        }

        // Dominant root: the claim with the highest accumulated authority.
        let dominant = root_claims
            .iter()
            .copied()
            .max_by(|a, b| {
                let score_a = scores.get(&a.id).copied().unwrap_or(0.0);
                let score_b = scores.get(&b.id).copied().unwrap_or(0.0);
                score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.id.cmp(&a.id))
            })
            .unwrap_or(root_claims[0]);
        let dominant_score = scores.get(&dominant.id).copied().unwrap_or(0.0);

        let false_roots = root_claims.iter().filter(|r| r.is_false_premise).count();
        let false_fraction = false_roots as f64 / root_claims.len() as f64;
        let causation =
            (dominant_score / (dominant_score + config.causation_saturation)) * false_fraction;

        let has_false_root = false_roots > 0;
        let harm = harm_level(
            candidate.outcome_type,
            candidate.remediation_possible,
            has_false_root,
        );

        debug!(
            "arrive: outcome \"{}\" traces to {} roots, dominant score {:.3}",
            candidate.description,
            root_claims.len(),
            dominant_score
        );

        let mut record = SamOutcome::new(
            case_id,
            dominant.id,
            &candidate.description,
            candidate.outcome_type,
            harm,
            candidate.remediation_possible,
        )
        .with_causation_strength(causation)
        .with_but_for(but_for_statement(dominant, &candidate.description, candidate.outcome_type));
        if let Some(date) = candidate.outcome_date {
            record = record.with_date(date);
        }
        if let Some(description) = &candidate.harm_description {
            record = record.with_harm_description(description);
        }

        let dominant_path: Vec<_> = paths_by_claim
            .get(&dominant.id)
            .map(|path| {
                path.edge_path
                    .iter()
                    .map(|&idx| graph.edge(idx).id)
                    .collect()
            })
            .unwrap_or_default();
        chains.push(CausationChain {
            outcome_id: record.id,
            root_claims: root_claims.iter().map(|r| r.id).collect(),
            propagation_path: dominant_path,
            authority_accumulation: dominant_score,
        });

        if harm >= HarmLevel::Severe {
            let test = binomial_test(false_roots as u64, (root_claims.len() - false_roots) as u64);
            harmful_z_scores.push(test.z);
            outcome.findings.push(
                Finding::new(
                    case_id,
                    "harmful_outcome",
                    &record.id.to_string(),
                    "Harmful outcome traced to claim chain",
                    format!(
                        "The {} \"{}\" traces to {} root claim(s), {} of them false premises; \
                         accumulated authority along the dominant path is {:.2}.",
                        candidate.outcome_type,
                        candidate.description,
                        root_claims.len(),
                        false_roots,
                        dominant_score
                    ),
                    if harm == HarmLevel::Catastrophic {
                        Severity::Critical
                    } else {
                        Severity::High
                    },
                )
                .with_documents(candidate.supporting_documents.clone())
                .with_payload(serde_json::json!({
                    "outcome_id": record.id.to_string(),
                    "root_claim_id": dominant.id.to_string(),
                    "harm_level": harm.as_str(),
                    "causation_strength": record.causation_strength,
                    "authority_accumulation": dominant_score,
                    "false_premise_roots": false_roots,
                    "z": test.z,
                })),
            );
        }

        outcome.records.push(record);
    }

    if harmful_z_scores.len() >= 2 {
        let combined = stouffer_z(&harmful_z_scores);
        outcome.findings.push(
            Finding::new(
                case_id,
                "systemic_harm_pattern",
                case_id,
                "Systemic pattern of harmful outcomes",
                format!(
                    "{} harmful outcomes trace back to anchored claims; the combined \
                     direction of the pattern is summarized in the payload.",
                    harmful_z_scores.len()
                ),
                Severity::High,
            )
            .with_payload(serde_json::json!({
                "outcomes": harmful_z_scores.len(),
                "stouffer_z": combined.statistic,
                "combined_p": combined.p_value,
                "significance": significance_level(combined.p_value).as_str(),
            })),
        );
    }

    outcome.records.sort_by_key(|o| o.id);
    chains.sort_by_key(|c| c.outcome_id);

    info!(
        "arrive: {} outcomes, {} findings, {} warnings",
        outcome.records.len(),
        outcome.findings.len(),
        outcome.warnings.len()
    );
    (outcome, chains)
}

/// Severity table keyed by outcome type and remediability. Catastrophic is
/// reserved for irreversible outcomes resting on a false premise.
fn harm_level(
    outcome_type: OutcomeType,
    remediation_possible: bool,
    has_false_premise_root: bool,
) -> HarmLevel {
    let base = match outcome_type {
        OutcomeType::CourtOrder | OutcomeType::FindingOfFact => HarmLevel::Severe,
        OutcomeType::AgencyDecision
        | OutcomeType::RegulatoryAction
        | OutcomeType::MediaPublication => HarmLevel::Moderate,
        OutcomeType::Recommendation => HarmLevel::Minor,
    };

    if remediation_possible {
        return base;
    }
    match base {
        HarmLevel::Severe if has_false_premise_root => HarmLevel::Catastrophic,
        HarmLevel::Severe => HarmLevel::Severe,
        HarmLevel::Moderate => HarmLevel::Severe,
        other => other.max(HarmLevel::Moderate),
    }
}

fn but_for_statement(root: &ClaimOrigin, description: &str, outcome_type: OutcomeType) -> String {
    match root.false_premise_type {
        Some(premise) => format!(
            "But for the claim \"{}\" (a false premise: {}), the {} \"{}\" would not have followed.",
            root.claim_text, premise, outcome_type, description
        ),
        None => format!(
            "But for the claim \"{}\", the {} \"{}\" would not have followed.",
            root.claim_text, outcome_type, description
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use samtrace_domain::{
        AuthorityType, ClaimPropagation, FalsePremiseType, OriginType, PropagationType,
    };
    use samtrace_oracle::FixtureOracle;

    fn doc(id: &str, month: u32, index: u64) -> CaseDocument {
        CaseDocument::new(
            id,
            "case-1",
            format!("{}.pdf", id),
            NaiveDate::from_ymd_opt(2024, month, 10).unwrap(),
            index,
        )
        .with_institution("court")
    }

    fn edge(claim: OriginId, source: &str, target: &str, month: u32) -> ClaimPropagation {
        ClaimPropagation::new(claim, source, target, PropagationType::Paraphrase).with_dates(
            Some(NaiveDate::from_ymd_opt(2024, month, 1).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, month, 10).unwrap()),
        )
    }

    fn setup() -> (Vec<CaseDocument>, Vec<ClaimOrigin>, PropagationGraph, Vec<AuthorityMarker>)
    {
        let origin = ClaimOrigin::new(
            "case-1",
            "the father neglected the child",
            "d1",
            OriginType::Hearsay,
            0.8,
        )
        .with_false_premise(FalsePremiseType::FactualError, "school records contradict");
        let claim = origin.id;
        let graph = PropagationGraph::new(vec![
            edge(claim, "d1", "d2", 2),
            edge(claim, "d2", "d3", 3),
        ]);
        let markers = vec![
            AuthorityMarker::new(claim, "d2", AuthorityType::OfficialReport, 0.7),
            AuthorityMarker::new(claim, "d3", AuthorityType::CourtFinding, 0.95),
        ];
        let docs = vec![doc("d1", 1, 0), doc("d2", 2, 1), doc("d3", 3, 2)];
        (docs, vec![origin], graph, markers)
    }

    const OUTCOME_JSON: &str = r#"[{
        "description": "residence transferred away from the father",
        "outcome_type": "court_order",
        "outcome_date": "2024-03-20",
        "supporting_documents": ["d3"],
        "remediation_possible": false,
        "harm_description": "contact reduced to supervised visits"
    }]"#;

    #[tokio::test]
    async fn test_outcome_traced_to_false_premise_root() {
        let (docs, origins, graph, markers) = setup();
        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::Outcome, "case-1", OUTCOME_JSON);
        let oracle = Arc::new(oracle);

        let (outcome, chains) = run(
            &oracle,
            "case-1",
            &docs,
            &origins,
            &graph,
            &markers,
            &PipelineConfig::default(),
        )
        .await;

        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.root_claim_id, origins[0].id);
        // Irremediable court order on a false premise: catastrophic.
        assert_eq!(record.harm_level, HarmLevel::Catastrophic);
        assert!(record.causation_strength > 0.0);
        assert!(record
            .but_for_analysis
            .as_deref()
            .is_some_and(|s| s.contains("false premise: factual_error")));

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].root_claims, vec![origins[0].id]);
        assert_eq!(chains[0].propagation_path.len(), 2);
        assert!(chains[0].authority_accumulation > 1.6);
    }

    #[tokio::test]
    async fn test_true_premise_outcome_has_zero_causation() {
        let (docs, mut origins, graph, markers) = setup();
        // Same chain, but the origin is not a false premise.
        origins[0].is_false_premise = false;
        origins[0].false_premise_type = None;

        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::Outcome, "case-1", OUTCOME_JSON);
        let oracle = Arc::new(oracle);

        let (outcome, _) = run(
            &oracle,
            "case-1",
            &docs,
            &origins,
            &graph,
            &markers,
            &PipelineConfig::default(),
        )
        .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].causation_strength, 0.0);
        // Severe, not catastrophic, without a false-premise root.
        assert_eq!(outcome.records[0].harm_level, HarmLevel::Severe);
    }

    #[tokio::test]
    async fn test_untraceable_outcome_warns() {
        let (docs, origins, graph, markers) = setup();
        let mut oracle = FixtureOracle::new();
        oracle.add_response(
            ExtractionKind::Outcome,
            "case-1",
            r#"[{"description": "press coverage", "outcome_type": "media_publication",
                 "supporting_documents": ["unrelated-doc"]}]"#,
        );
        let oracle = Arc::new(oracle);

        let (outcome, chains) = run(
            &oracle,
            "case-1",
            &docs,
            &origins,
            &graph,
            &markers,
            &PipelineConfig::default(),
        )
        .await;

        // "unrelated-doc" has no incoming edges, so it is its own root,
        // but no origin anchors there.
        assert!(outcome.records.is_empty());
        assert!(chains.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_leaves_arrive_empty() {
        let (docs, origins, graph, markers) = setup();
        let mut oracle = FixtureOracle::new();
        oracle.add_error(ExtractionKind::Outcome, "case-1");
        let oracle = Arc::new(oracle);

        let (outcome, chains) = run(
            &oracle,
            "case-1",
            &docs,
            &origins,
            &graph,
            &markers,
            &PipelineConfig::default(),
        )
        .await;

        assert!(outcome.records.is_empty());
        assert!(chains.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_harm_table() {
        assert_eq!(harm_level(OutcomeType::CourtOrder, true, true), HarmLevel::Severe);
        assert_eq!(
            harm_level(OutcomeType::CourtOrder, false, true),
            HarmLevel::Catastrophic
        );
        // Catastrophic requires a false-premise origin.
        assert_eq!(
            harm_level(OutcomeType::CourtOrder, false, false),
            HarmLevel::Severe
        );
        assert_eq!(
            harm_level(OutcomeType::AgencyDecision, false, true),
            HarmLevel::Severe
        );
        assert_eq!(
            harm_level(OutcomeType::Recommendation, true, false),
            HarmLevel::Minor
        );
        assert_eq!(
            harm_level(OutcomeType::Recommendation, false, false),
            HarmLevel::Moderate
        );
    }

    #[test]
    fn test_but_for_statement_templated() {
        let origin = ClaimOrigin::new("c", "the report was late", "d1", OriginType::Hearsay, 0.8);
        let statement = but_for_statement(&origin, "sanction imposed", OutcomeType::AgencyDecision);
        assert_eq!(
            statement,
            "But for the claim \"the report was late\", the agency_decision \
             \"sanction imposed\" would not have followed."
        );
    }
}
