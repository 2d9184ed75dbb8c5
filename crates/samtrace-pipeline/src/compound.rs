//! COMPOUND - authority accumulation
//!
//! Markers are minted from the oracle's authority candidates for each
//! document the propagation graph feeds a claim into. Accumulation walks
//! each claim's chain in date order; once both endpoint institutions of an
//! edge have already endorsed the claim, that edge's markers are capped so
//! cross-citing institutions stop inflating the score. Laundering is a
//! weak or unverified chain start reaching a high-weight endorsement with
//! no verification in between.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;

use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
use samtrace_domain::{
    AuthorityMarker, CaseDocument, ClaimOrigin, Finding, MarkerId, OriginId, Phase, PhaseWarning,
    Severity,
};
use samtrace_stats::{
    binomial_test, clopper_pearson_ci, fisher_combined, significance_level, SignificanceLevel,
    DEFAULT_CONFIDENCE_LEVEL,
};
use tracing::{debug, info, warn};

use crate::calls::dispatch;
use crate::config::PipelineConfig;
use crate::graph::PropagationGraph;
use crate::parser::parse_candidates;
use crate::prompt::authority_prompt;
use crate::types::{AuthorityCandidate, PhaseOutcome};

/// Run the compound phase.
pub(crate) async fn run<O>(
    oracle: &Arc<O>,
    case_id: &str,
    documents: &[CaseDocument],
    origins: &[ClaimOrigin],
    graph: &PropagationGraph,
    config: &PipelineConfig,
) -> PhaseOutcome<AuthorityMarker>
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
{
    let mut outcome = PhaseOutcome::default();
    let documents_by_id: HashMap<&str, &CaseDocument> =
        documents.iter().map(|d| (d.id.as_str(), d)).collect();
    let origins_by_key: HashMap<String, &ClaimOrigin> =
        origins.iter().map(|o| (o.key(), o)).collect();
    let claim_refs: Vec<&ClaimOrigin> = origins.iter().collect();

    // Authority extraction runs once per distinct edge-target document that
    // carries institution metadata; a document without an institution lends
    // no weight.
    let mut target_ids: Vec<&str> = graph
        .edges()
        .iter()
        .map(|e| e.target_document_id.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|id| {
            documents_by_id
                .get(id)
                .is_some_and(|d| d.institution.is_some())
        })
        .collect();
    target_ids.sort_unstable();

    let requests: Vec<OracleRequest> = target_ids
        .iter()
        .filter_map(|id| documents_by_id.get(id))
        .map(|document| {
            OracleRequest::new(
                ExtractionKind::Authority,
                case_id,
                &document.id,
                authority_prompt(document, &claim_refs),
            )
        })
        .collect();
    info!(
        "compound: extracting authority from {} documents",
        requests.len()
    );

    let results = dispatch(
        oracle,
        requests,
        config.max_concurrent_calls,
        config.oracle_timeout(),
    )
    .await;

    let mut markers: Vec<AuthorityMarker> = Vec::new();
    let mut marker_ids: HashSet<MarkerId> = HashSet::new();

    for (subject, result) in results {
        let body = match result {
            Ok(body) => body,
            Err(message) => {
                warn!("compound: skipping {}: {}", subject, message);
                outcome
                    .warnings
                    .push(PhaseWarning::new(Phase::Compound, &subject, message));
                continue;
            }
        };
        let (candidates, rejections) =
            match parse_candidates(&body, AuthorityCandidate::validate) {
                Ok(parsed) => parsed,
                Err(message) => {
                    warn!("compound: unusable response for {}: {}", subject, message);
                    outcome
                        .warnings
                        .push(PhaseWarning::new(Phase::Compound, &subject, message));
                    continue;
                }
            };
        for rejection in rejections {
            outcome
                .warnings
                .push(PhaseWarning::new(Phase::Compound, &subject, rejection));
        }

        for candidate in candidates {
            let key = samtrace_domain::claim_key(&candidate.claim_text);
            let Some(origin) = origins_by_key.get(&key) else {
                outcome.warnings.push(PhaseWarning::new(
                    Phase::Compound,
                    &subject,
                    format!("authority candidate does not match an anchored claim: {}", candidate.claim_text),
                ));
                continue;
            };

            let weight = marker_weight(&candidate, config);
            let mut marker =
                AuthorityMarker::new(origin.id, &subject, candidate.authority_type, weight);
            if let Some(endorsement) = candidate.endorsement_type {
                marker = marker.with_endorsement(endorsement);
            }
            if let Some(date) = candidate.authority_date {
                marker = marker.with_date(date);
            }
            if marker_ids.insert(marker.id) {
                debug!(
                    "compound: {} invokes {} at weight {:.2}",
                    subject, origin.id, weight
                );
                markers.push(marker);
            }
        }
    }

    flag_laundering(case_id, graph, &mut markers, config, &mut outcome.findings);
    outcome.records = markers;
    outcome.records.sort_by_key(|m| m.id);

    info!(
        "compound: {} markers, {} laundering, {} warnings",
        outcome.records.len(),
        outcome
            .records
            .iter()
            .filter(|m| m.is_authority_laundering)
            .count(),
        outcome.warnings.len()
    );
    outcome
}

/// Base weight by authority type, corroboration bonus for investigative
/// types, then the endorsement multiplier.
fn marker_weight(candidate: &AuthorityCandidate, config: &PipelineConfig) -> f64 {
    let mut base = config.authority_weights.weight_for(candidate.authority_type);
    if candidate.authority_type.is_investigative() && candidate.independent_corroboration {
        base = (base + config.corroboration_bonus).min(1.0);
    }
    base * config
        .endorsement_factors
        .factor_for(candidate.endorsement_type)
}

/// Cumulative authority per claim over its chain, with cross-citation
/// capping. Also the arrive phase's input, recomputed from persisted
/// markers and edges so resumed runs agree with full runs.
pub(crate) fn cumulative_scores(
    graph: &PropagationGraph,
    markers: &[AuthorityMarker],
) -> HashMap<OriginId, f64> {
    cumulative_scores_with_cap(graph, markers, None)
}

pub(crate) fn cumulative_scores_capped(
    graph: &PropagationGraph,
    markers: &[AuthorityMarker],
    config: &PipelineConfig,
) -> HashMap<OriginId, f64> {
    cumulative_scores_with_cap(graph, markers, Some(config.cross_citation_cap))
}

fn cumulative_scores_with_cap(
    graph: &PropagationGraph,
    markers: &[AuthorityMarker],
    cap: Option<f64>,
) -> HashMap<OriginId, f64> {
    let mut markers_by_location: HashMap<(OriginId, &str), Vec<&AuthorityMarker>> = HashMap::new();
    for marker in markers {
        markers_by_location
            .entry((marker.claim_id, marker.document_id.as_str()))
            .or_default()
            .push(marker);
    }

    let mut scores = HashMap::new();
    for claim in graph.claims() {
        let mut endorsed: HashSet<&str> = HashSet::new();
        let mut score = 0.0;
        for edge_idx in graph.chain_order(claim) {
            let edge = graph.edge(edge_idx);
            let both_endorsed = match (&edge.source_institution, &edge.target_institution) {
                (Some(source), Some(target)) => {
                    endorsed.contains(source.as_str()) && endorsed.contains(target.as_str())
                }
                _ => false,
            };
            if let Some(edge_markers) =
                markers_by_location.get(&(claim, edge.target_document_id.as_str()))
            {
                for marker in edge_markers {
                    let contribution = match (both_endorsed, cap) {
                        (true, Some(cap)) => marker.authority_weight.min(cap),
                        _ => marker.authority_weight,
                    };
                    score += contribution;
                }
                if let Some(source) = &edge.source_institution {
                    endorsed.insert(source.as_str());
                }
                if let Some(target) = &edge.target_institution {
                    endorsed.insert(target.as_str());
                }
            }
        }
        scores.insert(claim, score);
    }
    scores
}

/// Walk each claim's chain flagging laundering markers and emitting the
/// per-claim findings; a case-level rollup combines the per-claim p-values
/// when two or more claims launder.
fn flag_laundering(
    case_id: &str,
    graph: &PropagationGraph,
    markers: &mut [AuthorityMarker],
    config: &PipelineConfig,
    findings: &mut Vec<Finding>,
) {
    let mut marker_index: HashMap<(OriginId, String), Vec<usize>> = HashMap::new();
    for (idx, marker) in markers.iter().enumerate() {
        marker_index
            .entry((marker.claim_id, marker.document_id.clone()))
            .or_default()
            .push(idx);
    }

    let mut laundering_p_values: Vec<(OriginId, f64)> = Vec::new();

    for claim in graph.claims() {
        let chain = graph.chain_order(claim);
        let mut last_weak: Option<usize> = None;
        let mut last_verified: Option<usize> = None;
        let mut claim_laundered = false;
        let mut unverified_edges = 0u64;
        let mut verified_edges = 0u64;

        for (position, &edge_idx) in chain.iter().enumerate() {
            let edge = graph.edge(edge_idx);
            if edge.verification_performed {
                verified_edges += 1;
                last_verified = Some(position);
            } else {
                unverified_edges += 1;
                last_weak = Some(position);
            }

            let weak_unresolved = match (last_weak, last_verified) {
                (Some(weak), Some(verified)) => verified < weak,
                (Some(_), None) => true,
                (None, _) => false,
            };

            let target_doc = edge.target_document_id.clone();
            if let Some(indices) = marker_index.get(&(claim, target_doc)) {
                for &marker_idx in indices {
                    let weight = markers[marker_idx].authority_weight;
                    if weak_unresolved && weight >= config.laundering_high_weight {
                        let path = laundering_path(graph, &chain[..=position]);
                        let marker = &mut markers[marker_idx];
                        marker.is_authority_laundering = true;
                        marker.laundering_path = Some(path);
                        claim_laundered = true;
                    }
                    if weight < config.laundering_low_weight {
                        last_weak = Some(position);
                    }
                }
            }
        }

        if claim_laundered {
            let test = binomial_test(unverified_edges, verified_edges);
            let total = unverified_edges + verified_edges;
            let interval =
                clopper_pearson_ci(unverified_edges, total.max(1), DEFAULT_CONFIDENCE_LEVEL);
            let level = significance_level(test.p_value);
            findings.push(
                Finding::new(
                    case_id,
                    "authority_laundering",
                    &claim.to_string(),
                    "Authority laundering",
                    format!(
                        "An unverified claim reached a high-weight endorsement with no \
                         verification in between; {} of {} propagation steps were unverified.",
                        unverified_edges, total
                    ),
                    laundering_severity(level),
                )
                .with_documents(chain_documents(graph, &chain))
                .with_payload(serde_json::json!({
                    "claim_id": claim.to_string(),
                    "unverified_edges": unverified_edges,
                    "verified_edges": verified_edges,
                    "z": test.z,
                    "p": test.p_value,
                    "significance": level.as_str(),
                    "unverified_fraction_ci": {
                        "lower": interval.lower,
                        "upper": interval.upper,
                    },
                })),
            );
            laundering_p_values.push((claim, test.p_value));
        }
    }

    if laundering_p_values.len() >= 2 {
        let p_values: Vec<f64> = laundering_p_values.iter().map(|&(_, p)| p).collect();
        let combined = fisher_combined(&p_values);
        let claims: Vec<String> = laundering_p_values
            .iter()
            .map(|(c, _)| c.to_string())
            .collect();
        findings.push(
            Finding::new(
                case_id,
                "systemic_authority_laundering",
                case_id,
                "Systemic authority laundering",
                format!(
                    "{} separate claims show laundering chains; combined across claims \
                     the pattern is unlikely to be incidental.",
                    claims.len()
                ),
                laundering_severity(significance_level(combined.p_value)),
            )
            .with_payload(serde_json::json!({
                "claims": claims,
                "fisher_statistic": combined.statistic,
                "combined_p": combined.p_value,
                "significance": significance_level(combined.p_value).as_str(),
            })),
        );
    }
}

fn laundering_severity(level: SignificanceLevel) -> Severity {
    match level {
        SignificanceLevel::NotSignificant | SignificanceLevel::Significant => Severity::Medium,
        SignificanceLevel::VerySignificant | SignificanceLevel::HighlySignificant => Severity::High,
        SignificanceLevel::ExtremelySignificant => Severity::Critical,
    }
}

fn laundering_path(graph: &PropagationGraph, chain_prefix: &[usize]) -> String {
    let mut path = Vec::new();
    for (i, &edge_idx) in chain_prefix.iter().enumerate() {
        let edge = graph.edge(edge_idx);
        if i == 0 {
            path.push(edge.source_document_id.clone());
        }
        path.push(edge.target_document_id.clone());
    }
    path.join(" -> ")
}

fn chain_documents(graph: &PropagationGraph, chain: &[usize]) -> Vec<String> {
    let mut documents = Vec::new();
    let mut seen = HashSet::new();
    for &edge_idx in chain {
        let edge = graph.edge(edge_idx);
        for id in [&edge.source_document_id, &edge.target_document_id] {
            if seen.insert(id.clone()) {
                documents.push(id.clone());
            }
        }
    }
    documents
}
