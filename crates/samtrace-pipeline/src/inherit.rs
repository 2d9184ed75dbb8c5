//! INHERIT - propagation tracing
//!
//! One oracle call per ordered document pair. For each claim the walk
//! follows documents forward from the origin; a sighting in a later
//! document emits an edge from the prior confirmed sighting. A stated
//! source that is neither endpoint adds an explicit citation edge, which is
//! the only way a cycle can enter the graph. Cycles are findings, not
//! failures.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;

use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
use samtrace_domain::{
    CaseDocument, ClaimOrigin, ClaimPropagation, Finding, Phase, PhaseWarning, PropagationId,
    PropagationType, Severity,
};
use tracing::{debug, info, warn};

use crate::calls::dispatch;
use crate::config::PipelineConfig;
use crate::graph::PropagationGraph;
use crate::mutation::{classify_mutation, token_similarity};
use crate::parser::parse_candidates;
use crate::prompt::propagation_prompt;
use crate::types::{PhaseOutcome, PropagationCandidate, RelationHint};

/// Run the inherit phase over documents already in chronological order.
pub(crate) async fn run<O>(
    oracle: &Arc<O>,
    case_id: &str,
    documents: &[CaseDocument],
    origins: &[ClaimOrigin],
    config: &PipelineConfig,
) -> PhaseOutcome<ClaimPropagation>
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
{
    let mut outcome = PhaseOutcome::default();
    let claim_refs: Vec<&ClaimOrigin> = origins.iter().collect();

    let mut requests = Vec::new();
    for (i, source) in documents.iter().enumerate() {
        for target in &documents[i + 1..] {
            requests.push(OracleRequest::new(
                ExtractionKind::Propagation,
                case_id,
                pair_subject(&source.id, &target.id),
                propagation_prompt(source, target, &claim_refs),
            ));
        }
    }
    info!(
        "inherit: comparing {} document pairs for {} claims",
        requests.len(),
        origins.len()
    );

    let results = dispatch(
        oracle,
        requests,
        config.max_concurrent_calls,
        config.oracle_timeout(),
    )
    .await;

    // Candidates per pair subject; failed or unusable pairs are warned and
    // contribute nothing.
    let mut candidates_by_pair: HashMap<String, Vec<PropagationCandidate>> = HashMap::new();
    for (subject, result) in results {
        let body = match result {
            Ok(body) => body,
            Err(message) => {
                warn!("inherit: skipping pair {}: {}", subject, message);
                outcome
                    .warnings
                    .push(PhaseWarning::new(Phase::Inherit, &subject, message));
                continue;
            }
        };
        match parse_candidates(&body, PropagationCandidate::validate) {
            Ok((candidates, rejections)) => {
                for rejection in rejections {
                    outcome
                        .warnings
                        .push(PhaseWarning::new(Phase::Inherit, &subject, rejection));
                }
                candidates_by_pair.insert(subject, candidates);
            }
            Err(message) => {
                warn!("inherit: unusable response for {}: {}", subject, message);
                outcome
                    .warnings
                    .push(PhaseWarning::new(Phase::Inherit, &subject, message));
            }
        }
    }

    let document_position: HashMap<&str, usize> = documents
        .iter()
        .enumerate()
        .map(|(i, d)| (d.id.as_str(), i))
        .collect();
    let known_documents: HashSet<&str> = document_position.keys().copied().collect();

    let mut edges: Vec<ClaimPropagation> = Vec::new();
    let mut edge_ids: HashSet<PropagationId> = HashSet::new();

    for origin in origins {
        let Some(&origin_position) = document_position.get(origin.origin_document_id.as_str())
        else {
            outcome.warnings.push(PhaseWarning::new(
                Phase::Inherit,
                origin.id.to_string(),
                format!(
                    "origin document {} is not in the document set",
                    origin.origin_document_id
                ),
            ));
            continue;
        };
        let key = origin.key();

        let mut prior = origin_position;
        for current in origin_position + 1..documents.len() {
            let source = &documents[prior];
            let target = &documents[current];
            let subject = pair_subject(&source.id, &target.id);
            let Some(candidate) = candidates_by_pair
                .get(&subject)
                .and_then(|list| {
                    list.iter()
                        .find(|c| samtrace_domain::claim_key(&c.claim_text) == key)
                })
            else {
                continue;
            };

            debug!("inherit: {} sighted in {}", origin.id, target.id);

            // Temporal invariant on the oracle's stated dates. A violation
            // is a finding in its own right, and the edge is dropped rather
            // than repaired.
            if let (Some(stated_source), Some(stated_target)) =
                (candidate.source_date, candidate.target_date)
            {
                if stated_target < stated_source {
                    outcome.findings.push(temporal_finding(
                        case_id, origin, source, target, stated_source, stated_target,
                    ));
                    outcome.warnings.push(PhaseWarning::new(
                        Phase::Inherit,
                        &subject,
                        format!(
                            "target date {} precedes source date {}",
                            stated_target, stated_source
                        ),
                    ));
                    prior = current;
                    continue;
                }
            }

            let edge = build_edge(origin, source, target, candidate, config);
            if edge_ids.insert(edge.id) {
                edges.push(edge);
            }

            // A stated source other than either endpoint contributes an
            // explicit citation edge from the cited document. Its direction
            // follows the citation, not acquisition order.
            if let Some(cited) = candidate
                .target_cites
                .as_deref()
                .filter(|c| *c != source.id && *c != target.id)
            {
                if known_documents.contains(cited) {
                    let cited_edge = ClaimPropagation::new(
                        origin.id,
                        cited,
                        &target.id,
                        PropagationType::Citation,
                    )
                    .with_dates(None, candidate.target_date.or(Some(target.acquired_at)))
                    .with_institutions(
                        documents[document_position[cited]].institution.clone(),
                        target.institution.clone(),
                    );
                    if edge_ids.insert(cited_edge.id) {
                        edges.push(cited_edge);
                    }
                } else {
                    outcome.warnings.push(PhaseWarning::new(
                        Phase::Inherit,
                        &subject,
                        format!("cited document {} is not in the case", cited),
                    ));
                }
            }

            prior = current;
        }
    }

    // Cycle pass: the closing edge of each cycle is reclassified and each
    // cycle yields exactly one finding.
    let mut graph = PropagationGraph::new(edges);
    for claim in graph.claims() {
        for cycle in graph.find_cycles(claim) {
            let Some(&closing) = cycle.last() else { continue };
            graph.edge_mut(closing).propagation_type = PropagationType::CircularReference;
            outcome
                .findings
                .push(circular_finding(case_id, claim, &cycle, &graph));
        }
    }
    outcome.records = graph.into_edges();
    outcome.records.sort_by_key(|e| e.id);

    info!(
        "inherit: {} edges, {} findings, {} warnings",
        outcome.records.len(),
        outcome.findings.len(),
        outcome.warnings.len()
    );
    outcome
}

pub(crate) fn pair_subject(source_id: &str, target_id: &str) -> String {
    format!("{}|{}", source_id, target_id)
}

fn build_edge(
    origin: &ClaimOrigin,
    source: &CaseDocument,
    target: &CaseDocument,
    candidate: &PropagationCandidate,
    config: &PipelineConfig,
) -> ClaimPropagation {
    let excerpts = candidate
        .source_excerpt
        .as_deref()
        .zip(candidate.target_excerpt.as_deref());

    let propagation_type = if let Some((source_text, target_text)) = excerpts {
        if token_similarity(source_text, target_text) >= config.verbatim_similarity {
            PropagationType::Verbatim
        } else if candidate.explicit_citation {
            PropagationType::Citation
        } else {
            hint_or_paraphrase(candidate.relation_hint)
        }
    } else if candidate.explicit_citation {
        PropagationType::Citation
    } else {
        hint_or_paraphrase(candidate.relation_hint)
    };

    let mut edge = ClaimPropagation::new(origin.id, &source.id, &target.id, propagation_type)
        .with_dates(
            candidate.source_date.or(Some(source.acquired_at)),
            candidate.target_date.or(Some(target.acquired_at)),
        )
        .with_institutions(source.institution.clone(), target.institution.clone());

    if let Some((source_text, target_text)) = excerpts {
        if let Some(mutation) = classify_mutation(
            source_text,
            target_text,
            &config.certainty_lexicon,
            candidate.verification_performed,
        ) {
            edge = edge.with_mutation(mutation, source_text, target_text);
        } else {
            edge.original_text = Some(source_text.to_string());
            edge.mutated_text = Some(target_text.to_string());
        }
    }

    if candidate.verification_performed {
        edge = edge.with_verification(
            candidate
                .verification_outcome
                .clone()
                .unwrap_or_else(|| "evidence re-examined".to_string()),
        );
    }

    edge
}

fn hint_or_paraphrase(hint: Option<RelationHint>) -> PropagationType {
    match hint {
        Some(RelationHint::ImplicitAdoption) => PropagationType::ImplicitAdoption,
        Some(RelationHint::AuthorityAppeal) => PropagationType::AuthorityAppeal,
        None => PropagationType::Paraphrase,
    }
}

fn temporal_finding(
    case_id: &str,
    origin: &ClaimOrigin,
    source: &CaseDocument,
    target: &CaseDocument,
    stated_source: chrono::NaiveDate,
    stated_target: chrono::NaiveDate,
) -> Finding {
    Finding::new(
        case_id,
        "temporal_impossibility",
        &format!("{}|{}|{}", source.id, target.id, origin.id),
        "Claim appears to propagate backward in time",
        format!(
            "The claim \"{}\" is dated {} in {} but {} in the document citing it; \
             a claim cannot precede its own source.",
            origin.claim_text, stated_target, target.id, stated_source
        ),
        Severity::High,
    )
    .with_documents(vec![source.id.clone(), target.id.clone()])
    .with_payload(serde_json::json!({
        "claim_id": origin.id.to_string(),
        "source_date": stated_source.to_string(),
        "target_date": stated_target.to_string(),
    }))
}

fn circular_finding(
    case_id: &str,
    claim: samtrace_domain::OriginId,
    cycle: &[usize],
    graph: &PropagationGraph,
) -> Finding {
    let mut documents: Vec<String> = cycle
        .iter()
        .map(|&idx| graph.edge(idx).source_document_id.clone())
        .collect();
    if let Some(&first) = cycle.first() {
        documents.push(graph.edge(first).source_document_id.clone());
    }
    let doc_chain = documents.join(" -> ");
    let edge_ids: Vec<String> = cycle.iter().map(|&idx| graph.edge(idx).id.to_string()).collect();

    Finding::new(
        case_id,
        "circular_citation",
        &edge_ids.join("->"),
        "Circular citation chain",
        format!(
            "The claim with id {} circulates through {}; each document's apparent \
             corroboration traces back to itself.",
            claim, doc_chain
        ),
        Severity::High,
    )
    .with_documents(documents)
    .with_payload(serde_json::json!({
        "claim_id": claim.to_string(),
        "cycle_edges": edge_ids,
        "cycle_length": cycle.len(),
    }))
}
