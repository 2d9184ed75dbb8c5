//! End-to-end pipeline tests over canned oracle fixtures.
//!
//! One shared scenario: a hearsay claim in an initial referral is restated
//! with rising certainty by an agency report and a court judgment, then a
//! custody order rests on it. Each test exercises a different orchestration
//! property over that case.

use samtrace_domain::traits::{ExtractionKind, PhaseStore};
use samtrace_domain::{
    CaseDocument, HarmLevel, MutationType, Phase, PropagationType, Severity,
};
use samtrace_oracle::FixtureOracle;
use samtrace_pipeline::{PipelineConfig, PipelineError, SamPipeline};
use samtrace_store::MemoryStore;

use chrono::NaiveDate;

const CASE: &str = "case-alder";
const CLAIM: &str = "the father failed to attend the safety meeting";

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn document_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_document(CaseDocument::new(
        "d1",
        CASE,
        "referral.pdf",
        date(1, 10),
        0,
    ));
    store.add_document(
        CaseDocument::new("d2", CASE, "agency-report.pdf", date(2, 15), 1)
            .with_institution("county_welfare"),
    );
    store.add_document(
        CaseDocument::new("d3", CASE, "judgment.pdf", date(3, 20), 2)
            .with_institution("family_court"),
    );
    store
}

fn scenario_oracle() -> FixtureOracle {
    let mut oracle = FixtureOracle::new();

    oracle.add_response(
        ExtractionKind::ClaimOrigin,
        "d1",
        format!(
            r#"[{{
                "claim_text": "{CLAIM}",
                "origin_type": "hearsay",
                "confidence_score": 0.8,
                "origin_date": "2024-01-08",
                "is_false_premise": true,
                "false_premise_type": "factual_error",
                "factually_wrong": true,
                "contradicting_evidence": "the attendance log records him present"
            }}]"#
        ),
    );

    oracle.add_response(
        ExtractionKind::Propagation,
        "d1|d2",
        format!(
            r#"[{{
                "claim_text": "{CLAIM}",
                "source_excerpt": "it is alleged the father failed to attend the safety meeting",
                "target_excerpt": "the father likely failed to attend the safety meeting"
            }}]"#
        ),
    );
    oracle.add_response(
        ExtractionKind::Propagation,
        "d2|d3",
        format!(
            r#"[{{
                "claim_text": "{CLAIM}",
                "explicit_citation": true,
                "source_excerpt": "the father likely failed to attend the safety meeting",
                "target_excerpt": "it is established that the father failed to attend the safety meeting"
            }}]"#
        ),
    );

    oracle.add_response(
        ExtractionKind::Authority,
        "d2",
        format!(
            r#"[{{
                "claim_text": "{CLAIM}",
                "authority_type": "official_report",
                "endorsement_type": "referenced_without_verification"
            }}]"#
        ),
    );
    oracle.add_response(
        ExtractionKind::Authority,
        "d3",
        format!(
            r#"[{{
                "claim_text": "{CLAIM}",
                "authority_type": "court_finding",
                "endorsement_type": "explicit_adoption"
            }}]"#
        ),
    );

    oracle.add_response(
        ExtractionKind::Outcome,
        CASE,
        r#"[{
            "description": "contact reduced to supervised visits",
            "outcome_type": "court_order",
            "outcome_date": "2024-04-02",
            "supporting_documents": ["d3"],
            "remediation_possible": false,
            "harm_description": "the father lost unsupervised contact"
        }]"#,
    );

    oracle
}

fn pipeline(
    oracle: FixtureOracle,
) -> SamPipeline<FixtureOracle, MemoryStore, MemoryStore, MemoryStore> {
    SamPipeline::new(
        oracle,
        document_store(),
        MemoryStore::new(),
        MemoryStore::new(),
        PipelineConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_full_run_end_to_end() {
    let mut pipeline = pipeline(scenario_oracle());
    let result = pipeline.run(&[], CASE, None).await.unwrap();

    assert_eq!(result.summary.documents_analyzed, 3);
    assert_eq!(result.summary.total_claims, 1);
    assert_eq!(result.summary.false_premises, 1);
    assert_eq!(result.summary.propagation_chains, 1);
    assert_eq!(result.summary.authority_markers, 2);
    assert_eq!(result.summary.laundering_instances, 1);
    assert_eq!(result.summary.outcomes_mapped, 1);
    assert_eq!(result.summary.harmful_outcomes, 1);
    assert_eq!(result.summary.findings_emitted, 2);
    assert!(result.warnings.is_empty());

    // The origin anchors at the earliest sighting with its contradiction.
    let origin = &result.phases.origins[0];
    assert_eq!(origin.origin_document_id, "d1");
    assert!(origin.is_false_premise);

    // Both restatements escalate certainty.
    assert_eq!(result.phases.propagations.len(), 2);
    for edge in &result.phases.propagations {
        assert_eq!(edge.mutation_type, Some(MutationType::Amplification));
    }
    let cited = result
        .phases
        .propagations
        .iter()
        .find(|e| e.source_document_id == "d2")
        .unwrap();
    assert_eq!(cited.propagation_type, PropagationType::Citation);

    // The court's endorsement caps an unverified chain: laundering.
    let court_marker = result
        .phases
        .markers
        .iter()
        .find(|m| m.document_id == "d3")
        .unwrap();
    assert!(court_marker.is_authority_laundering);
    assert_eq!(
        court_marker.laundering_path.as_deref(),
        Some("d1 -> d2 -> d3")
    );

    // Irremediable court order resting on a false premise.
    let outcome = &result.phases.outcomes[0];
    assert_eq!(outcome.root_claim_id, origin.id);
    assert_eq!(outcome.harm_level, HarmLevel::Catastrophic);
    // Accumulated authority 0.70 * 0.4 + 0.95 = 1.23, saturated against 2.0.
    assert!((outcome.causation_strength - 1.23 / 3.23).abs() < 1e-9);

    assert_eq!(result.chains.len(), 1);
    assert_eq!(result.chains[0].propagation_path.len(), 2);
    assert!((result.chains[0].authority_accumulation - 1.23).abs() < 1e-9);

    let findings = pipeline.findings().findings_for_case(CASE);
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().any(|f| f.title == "Authority laundering"));
    let harmful = findings
        .iter()
        .find(|f| f.title == "Harmful outcome traced to claim chain")
        .unwrap();
    assert_eq!(harmful.severity, Severity::Critical);
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let mut pipeline = pipeline(scenario_oracle());
    let first = pipeline.run(&[], CASE, None).await.unwrap();
    let first_stored = pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap();

    let second = pipeline.run(&[], CASE, None).await.unwrap();
    let second_stored = pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap();

    assert_eq!(first.phases, second.phases);
    assert_eq!(first_stored, second_stored);
}

#[tokio::test]
async fn test_resume_from_compound_reuses_earlier_phases() {
    let oracle = scenario_oracle();
    let counter = oracle.clone();
    let mut pipeline = pipeline(oracle);

    let full = pipeline.run(&[], CASE, None).await.unwrap();
    let anchor_before = pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap();
    let inherit_before = pipeline.phase_store().load_phase(CASE, Phase::Inherit).unwrap();

    counter.reset_call_count();
    let resumed = pipeline.run(&[], CASE, Some(Phase::Compound)).await.unwrap();

    // Two authority extractions and one outcome extraction; no re-anchoring.
    assert_eq!(counter.call_count(), 3);
    assert_eq!(
        pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap(),
        anchor_before
    );
    assert_eq!(
        pipeline.phase_store().load_phase(CASE, Phase::Inherit).unwrap(),
        inherit_before
    );
    assert_eq!(resumed.phases, full.phases);
    assert_eq!(resumed.summary.harmful_outcomes, full.summary.harmful_outcomes);
}

#[tokio::test]
async fn test_resume_without_stored_dependency_fails() {
    let mut pipeline = pipeline(scenario_oracle());
    let error = pipeline
        .run(&[], CASE, Some(Phase::Inherit))
        .await
        .unwrap_err();

    match error {
        PipelineError::MissingDependency { phase, missing } => {
            assert_eq!(phase, Phase::Inherit);
            assert_eq!(missing, Phase::Anchor);
        }
        other => panic!("expected MissingDependency, got {other}"),
    }
}

#[tokio::test]
async fn test_cancellation_before_first_phase() {
    let mut pipeline = pipeline(scenario_oracle());
    pipeline.cancel_flag().cancel();

    let error = pipeline.run(&[], CASE, None).await.unwrap_err();
    match error {
        PipelineError::Cancelled { last_completed } => assert_eq!(last_completed, None),
        other => panic!("expected Cancelled, got {other}"),
    }
    assert!(!pipeline.phase_store().has_phase(CASE, Phase::Anchor).unwrap());
}

#[tokio::test]
async fn test_unknown_document_rejected() {
    let mut pipeline = pipeline(scenario_oracle());
    let ids = vec!["d1".to_string(), "ghost".to_string()];
    let error = pipeline.run(&ids, CASE, None).await.unwrap_err();
    assert!(matches!(error, PipelineError::UnknownDocument(id) if id == "ghost"));
}

#[tokio::test]
async fn test_rerun_fully_replaces_phase_output() {
    let oracle = scenario_oracle();
    let mut handle = oracle.clone();
    let mut pipeline = pipeline(oracle);

    pipeline.run(&[], CASE, None).await.unwrap();
    let before = pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap();
    assert_eq!(before.len(), 1);

    // The source document is re-read and yields a different claim; nothing
    // of the earlier run's anchor output may survive.
    handle.add_response(
        ExtractionKind::ClaimOrigin,
        "d1",
        r#"[{
            "claim_text": "the mother withheld the medical records",
            "origin_type": "speculation",
            "confidence_score": 0.6
        }]"#,
    );
    pipeline.run(&[], CASE, None).await.unwrap();

    let after = pipeline.phase_store().load_phase(CASE, Phase::Anchor).unwrap();
    assert_eq!(after.len(), 1);
    assert_ne!(after[0].record_id, before[0].record_id);
}

#[tokio::test]
async fn test_empty_case_produces_empty_result() {
    let mut store = MemoryStore::new();
    store.add_document(CaseDocument::new("x1", "case-birch", "a.pdf", date(1, 1), 0));
    let mut pipeline = SamPipeline::new(
        FixtureOracle::new(),
        store,
        MemoryStore::new(),
        MemoryStore::new(),
        PipelineConfig::default(),
    )
    .unwrap();

    let result = pipeline.run(&[], "case-birch", None).await.unwrap();
    assert_eq!(result.summary.total_claims, 0);
    assert_eq!(result.summary.findings_emitted, 0);
    assert!(result.phases.outcomes.is_empty());
    // Every phase still records a completed (empty) run.
    for phase in Phase::ALL {
        assert!(pipeline.phase_store().has_phase("case-birch", phase).unwrap());
    }
}
