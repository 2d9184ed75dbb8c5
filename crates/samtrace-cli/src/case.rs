//! Case file loading.
//!
//! A case file carries the documents under analysis and the canned
//! extraction responses to answer with, so a whole case replays
//! deterministically from one JSON document.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use samtrace_domain::traits::ExtractionKind;
use samtrace_domain::CaseDocument;
use samtrace_oracle::FixtureOracle;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// One document entry in a case file.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSpec {
    /// Document identifier, unique within the case
    pub id: String,

    /// Original filename
    pub filename: String,

    /// Date the document entered the record
    pub acquired_at: NaiveDate,

    /// Institution behind the document, when known
    #[serde(default)]
    pub institution: Option<String>,
}

/// One canned extraction response.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSpec {
    /// Which extraction the response answers
    pub kind: ExtractionKind,

    /// Document id, "source|target" pair, or case id
    pub subject: String,

    /// The response body (a JSON candidate list)
    #[serde(default)]
    pub response: Option<String>,

    /// Answer with an injected failure instead of a response
    #[serde(default)]
    pub fail: bool,
}

/// A complete replayable case.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseFile {
    /// Case identifier
    pub case_id: String,

    /// Documents in ingest order
    pub documents: Vec<DocumentSpec>,

    /// Canned extraction responses
    #[serde(default)]
    pub fixtures: Vec<FixtureSpec>,
}

impl CaseFile {
    /// Load and validate a case file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let case: CaseFile = serde_json::from_str(&text)?;
        case.validate()?;
        Ok(case)
    }

    fn validate(&self) -> Result<()> {
        if self.case_id.trim().is_empty() {
            return Err(CliError::InvalidInput("case_id is empty".to_string()));
        }
        if self.documents.is_empty() {
            return Err(CliError::InvalidInput(
                "case file has no documents".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for document in &self.documents {
            if !seen.insert(document.id.as_str()) {
                return Err(CliError::InvalidInput(format!(
                    "duplicate document id: {}",
                    document.id
                )));
            }
        }
        for fixture in &self.fixtures {
            if fixture.fail == fixture.response.is_some() {
                return Err(CliError::InvalidInput(format!(
                    "fixture for {} must have exactly one of response or fail",
                    fixture.subject
                )));
            }
        }
        Ok(())
    }

    /// The case's documents; ingest order is the array order.
    pub fn case_documents(&self) -> Vec<CaseDocument> {
        self.documents
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let mut document = CaseDocument::new(
                    &spec.id,
                    &self.case_id,
                    &spec.filename,
                    spec.acquired_at,
                    index as u64,
                );
                if let Some(institution) = &spec.institution {
                    document = document.with_institution(institution);
                }
                document
            })
            .collect()
    }

    /// A fixture oracle loaded with the case's canned responses.
    pub fn oracle(&self) -> FixtureOracle {
        let mut oracle = FixtureOracle::new();
        for fixture in &self.fixtures {
            if fixture.fail {
                oracle.add_error(fixture.kind, &fixture.subject);
            } else if let Some(response) = &fixture.response {
                oracle.add_response(fixture.kind, &fixture.subject, response);
            }
        }
        oracle
    }
}
