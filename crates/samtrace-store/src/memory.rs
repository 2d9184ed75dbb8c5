//! In-memory store for tests and one-shot runs

use std::collections::HashMap;

use samtrace_domain::traits::{DocumentStore, FindingsSink, PhaseRecord, PhaseStore};
use samtrace_domain::{CaseDocument, Finding, Phase};

use crate::StoreError;

/// In-process implementation of all three storage traits.
///
/// Findings are upserted by id, so re-emitting the same deterministic
/// finding replaces rather than duplicates it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<CaseDocument>,
    phases: HashMap<(String, Phase), Vec<PhaseRecord>>,
    findings: Vec<Finding>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Replaces any existing document with the same id.
    pub fn add_document(&mut self, document: CaseDocument) {
        if let Some(existing) = self.documents.iter_mut().find(|d| d.id == document.id) {
            *existing = document;
        } else {
            self.documents.push(document);
        }
    }

    /// All findings emitted so far, in emission order.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings for one case.
    pub fn findings_for_case(&self, case_id: &str) -> Vec<Finding> {
        self.findings
            .iter()
            .filter(|f| f.case_id == case_id)
            .cloned()
            .collect()
    }
}

impl DocumentStore for MemoryStore {
    type Error = StoreError;

    fn documents_for_case(&self, case_id: &str) -> Result<Vec<CaseDocument>, Self::Error> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.case_id == case_id)
            .cloned()
            .collect())
    }

    fn get_document(&self, id: &str) -> Result<Option<CaseDocument>, Self::Error> {
        Ok(self.documents.iter().find(|d| d.id == id).cloned())
    }
}

impl PhaseStore for MemoryStore {
    type Error = StoreError;

    fn replace_phase(
        &mut self,
        case_id: &str,
        phase: Phase,
        records: Vec<PhaseRecord>,
    ) -> Result<(), Self::Error> {
        self.phases.insert((case_id.to_string(), phase), records);
        Ok(())
    }

    fn load_phase(&self, case_id: &str, phase: Phase) -> Result<Vec<PhaseRecord>, Self::Error> {
        Ok(self
            .phases
            .get(&(case_id.to_string(), phase))
            .cloned()
            .unwrap_or_default())
    }

    fn has_phase(&self, case_id: &str, phase: Phase) -> Result<bool, Self::Error> {
        Ok(self.phases.contains_key(&(case_id.to_string(), phase)))
    }
}

impl FindingsSink for MemoryStore {
    type Error = StoreError;

    fn emit(&mut self, finding: Finding) -> Result<(), Self::Error> {
        if let Some(existing) = self.findings.iter_mut().find(|f| f.id == finding.id) {
            *existing = finding;
        } else {
            self.findings.push(finding);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use samtrace_domain::Severity;

    fn doc(id: &str, case: &str, index: u64) -> CaseDocument {
        CaseDocument::new(
            id,
            case,
            format!("{}.pdf", id),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            index,
        )
    }

    #[test]
    fn test_documents_filtered_by_case() {
        let mut store = MemoryStore::new();
        store.add_document(doc("a", "case-1", 0));
        store.add_document(doc("b", "case-1", 1));
        store.add_document(doc("c", "case-2", 0));

        assert_eq!(store.documents_for_case("case-1").unwrap().len(), 2);
        assert_eq!(store.documents_for_case("case-2").unwrap().len(), 1);
        assert!(store.documents_for_case("case-3").unwrap().is_empty());
    }

    #[test]
    fn test_add_document_replaces_by_id() {
        let mut store = MemoryStore::new();
        store.add_document(doc("a", "case-1", 0));
        store.add_document(doc("a", "case-1", 5));

        let docs = store.documents_for_case("case-1").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].ingest_index, 5);
    }

    #[test]
    fn test_replace_phase_discards_previous_run() {
        let mut store = MemoryStore::new();
        let first = vec![
            PhaseRecord::new("r1", serde_json::json!({"v": 1})),
            PhaseRecord::new("r2", serde_json::json!({"v": 2})),
        ];
        store.replace_phase("case-1", Phase::Anchor, first).unwrap();

        let second = vec![PhaseRecord::new("r3", serde_json::json!({"v": 3}))];
        store.replace_phase("case-1", Phase::Anchor, second).unwrap();

        let loaded = store.load_phase("case-1", Phase::Anchor).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].record_id, "r3");
    }

    #[test]
    fn test_has_phase() {
        let mut store = MemoryStore::new();
        assert!(!store.has_phase("case-1", Phase::Anchor).unwrap());

        store
            .replace_phase("case-1", Phase::Anchor, Vec::new())
            .unwrap();
        // An empty output still counts as a completed run
        assert!(store.has_phase("case-1", Phase::Anchor).unwrap());
        assert!(!store.has_phase("case-1", Phase::Inherit).unwrap());
    }

    #[test]
    fn test_findings_upsert_by_id() {
        let mut store = MemoryStore::new();
        let finding = Finding::new("case-1", "kind", "subject", "first", "d", Severity::Low);
        store.emit(finding.clone()).unwrap();

        let updated = Finding::new("case-1", "kind", "subject", "second", "d", Severity::High);
        store.emit(updated).unwrap();

        let findings = store.findings_for_case("case-1");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "second");
    }
}
