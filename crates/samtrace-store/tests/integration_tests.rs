//! Integration tests for samtrace-store
//!
//! These tests verify the document, phase-output, and findings contracts
//! against a real SQLite database, including the full-replace semantics
//! resumption depends on.

use chrono::NaiveDate;
use samtrace_domain::traits::{DocumentStore, FindingsSink, PhaseRecord, PhaseStore};
use samtrace_domain::{CaseDocument, Finding, Phase, Severity};
use samtrace_store::SqliteStore;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn document(id: &str, case: &str, acquired: NaiveDate, index: u64) -> CaseDocument {
    CaseDocument::new(id, case, format!("{}.pdf", id), acquired, index)
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_add_and_get_document() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let doc = document("doc-1", "case-1", date(2024, 1, 10), 0)
        .with_institution("family court");
    store.add_document(&doc).unwrap();

    let retrieved = store.get_document("doc-1").unwrap();
    assert_eq!(retrieved, Some(doc));

    assert_eq!(store.get_document("missing").unwrap(), None);
}

#[test]
fn test_documents_for_case_ordered() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store
        .add_document(&document("late", "case-1", date(2024, 3, 20), 0))
        .unwrap();
    store
        .add_document(&document("tie-b", "case-1", date(2024, 1, 10), 2))
        .unwrap();
    store
        .add_document(&document("tie-a", "case-1", date(2024, 1, 10), 1))
        .unwrap();
    store
        .add_document(&document("other", "case-2", date(2024, 1, 1), 0))
        .unwrap();

    let docs = store.documents_for_case("case-1").unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["tie-a", "tie-b", "late"]);
}

#[test]
fn test_phase_roundtrip() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let records = vec![
        PhaseRecord::new("r1", serde_json::json!({"claim": "x", "n": 1})),
        PhaseRecord::new("r2", serde_json::json!({"claim": "y", "n": 2})),
    ];
    store
        .replace_phase("case-1", Phase::Anchor, records.clone())
        .unwrap();

    let loaded = store.load_phase("case-1", Phase::Anchor).unwrap();
    assert_eq!(loaded, records);
}

#[test]
fn test_replace_phase_discards_previous_run() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let first = vec![
        PhaseRecord::new("stale-1", serde_json::json!({"v": 1})),
        PhaseRecord::new("stale-2", serde_json::json!({"v": 2})),
        PhaseRecord::new("stale-3", serde_json::json!({"v": 3})),
    ];
    store.replace_phase("case-1", Phase::Inherit, first).unwrap();

    let second = vec![PhaseRecord::new("fresh", serde_json::json!({"v": 9}))];
    store
        .replace_phase("case-1", Phase::Inherit, second)
        .unwrap();

    let loaded = store.load_phase("case-1", Phase::Inherit).unwrap();
    assert_eq!(loaded.len(), 1, "Stale rows must be gone after replace");
    assert_eq!(loaded[0].record_id, "fresh");
}

#[test]
fn test_empty_phase_counts_as_run() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    assert!(!store.has_phase("case-1", Phase::Anchor).unwrap());

    store
        .replace_phase("case-1", Phase::Anchor, Vec::new())
        .unwrap();

    assert!(store.has_phase("case-1", Phase::Anchor).unwrap());
    assert!(store.load_phase("case-1", Phase::Anchor).unwrap().is_empty());
    assert!(!store.has_phase("case-1", Phase::Inherit).unwrap());
}

#[test]
fn test_cases_are_isolated() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store
        .replace_phase(
            "case-1",
            Phase::Anchor,
            vec![PhaseRecord::new("a", serde_json::json!(1))],
        )
        .unwrap();
    store
        .replace_phase(
            "case-2",
            Phase::Anchor,
            vec![PhaseRecord::new("b", serde_json::json!(2))],
        )
        .unwrap();

    assert_eq!(store.load_phase("case-1", Phase::Anchor).unwrap().len(), 1);
    assert_eq!(
        store.load_phase("case-1", Phase::Anchor).unwrap()[0].record_id,
        "a"
    );
    assert_eq!(
        store.load_phase("case-2", Phase::Anchor).unwrap()[0].record_id,
        "b"
    );
}

#[test]
fn test_findings_upsert_by_id() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let finding = Finding::new("case-1", "kind", "subject", "first", "d", Severity::Low);
    store.emit(finding).unwrap();

    // Same (case, kind, subject) mints the same id, so this replaces
    let updated = Finding::new("case-1", "kind", "subject", "second", "d", Severity::High);
    store.emit(updated).unwrap();

    let findings = store.findings_for_case("case-1").unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "second");
    assert_eq!(findings[0].severity, Severity::High);
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samtrace.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store
            .add_document(&document("doc-1", "case-1", date(2024, 1, 10), 0))
            .unwrap();
        store
            .replace_phase(
                "case-1",
                Phase::Anchor,
                vec![PhaseRecord::new("r1", serde_json::json!({"v": 1}))],
            )
            .unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert!(store.get_document("doc-1").unwrap().is_some());
    assert!(store.has_phase("case-1", Phase::Anchor).unwrap());
    assert_eq!(store.load_phase("case-1", Phase::Anchor).unwrap().len(), 1);
}
