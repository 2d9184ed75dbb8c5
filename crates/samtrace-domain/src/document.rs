//! Case document module - the inputs the pipeline reads, never writes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A document in a case, as supplied by the document store.
///
/// The pipeline consumes documents read-only. Acquisition order is the
/// pipeline's notion of time: documents sort by `acquired_at`, with
/// `ingest_index` breaking ties, so two documents acquired the same day
/// still order deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDocument {
    /// Store-assigned document identifier
    pub id: String,

    /// Case this document belongs to
    pub case_id: String,

    /// Original filename
    pub filename: String,

    /// Date the document entered the record
    pub acquired_at: NaiveDate,

    /// Position in ingestion order, the tie-break for equal dates
    pub ingest_index: u64,

    /// Institution that produced the document, when known
    pub institution: Option<String>,
}

impl CaseDocument {
    /// Create a new case document.
    pub fn new(
        id: impl Into<String>,
        case_id: impl Into<String>,
        filename: impl Into<String>,
        acquired_at: NaiveDate,
        ingest_index: u64,
    ) -> Self {
        Self {
            id: id.into(),
            case_id: case_id.into(),
            filename: filename.into(),
            acquired_at,
            ingest_index,
            institution: None,
        }
    }

    /// Set the producing institution
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// The key documents sort by: acquisition date, then ingestion order.
    pub fn sort_key(&self) -> (NaiveDate, u64) {
        (self.acquired_at, self.ingest_index)
    }
}

/// Sort documents into the pipeline's canonical chronological order.
pub fn sort_chronological(documents: &mut [CaseDocument]) {
    documents.sort_by_key(|d| d.sort_key());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_sort_by_date_then_index() {
        let mut docs = vec![
            CaseDocument::new("c", "case", "c.pdf", d(2024, 3, 20), 2),
            CaseDocument::new("b", "case", "b.pdf", d(2024, 1, 10), 1),
            CaseDocument::new("a", "case", "a.pdf", d(2024, 1, 10), 0),
        ];
        sort_chronological(&mut docs);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_same_day_order_is_ingest_order() {
        let mut docs = vec![
            CaseDocument::new("late", "case", "x.pdf", d(2024, 5, 1), 7),
            CaseDocument::new("early", "case", "y.pdf", d(2024, 5, 1), 3),
        ];
        sort_chronological(&mut docs);
        assert_eq!(docs[0].id, "early");
    }
}
