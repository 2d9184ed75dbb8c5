//! Samtrace Oracle Layer
//!
//! Pluggable implementations of the `ExtractionOracle` trait from
//! `samtrace-domain` (per ADR-009). The pipeline never knows which one it is
//! talking to; the implementation is chosen at construction time.
//!
//! # Oracles
//!
//! - `FixtureOracle`: deterministic canned responses, keyed by extraction
//!   kind and subject. The workhorse for tests and offline runs.
//! - `NullOracle`: answers every request with an empty candidate list.
//! - `HttpOracle`: a remote extraction service over HTTP.
//!
//! # Examples
//!
//! ```
//! use samtrace_oracle::FixtureOracle;
//! use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
//!
//! let mut oracle = FixtureOracle::new();
//! oracle.add_response(ExtractionKind::ClaimOrigin, "doc-1", r#"[{"claim": "x"}]"#);
//!
//! let request = OracleRequest::new(ExtractionKind::ClaimOrigin, "case", "doc-1", "...");
//! assert_eq!(oracle.extract(&request).unwrap(), r#"[{"claim": "x"}]"#);
//! ```

#![warn(missing_docs)]

pub mod http;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use samtrace_domain::traits::{ExtractionKind, ExtractionOracle, OracleRequest};
use thiserror::Error;

pub use http::HttpOracle;

/// Errors that can occur during oracle operations
#[derive(Error, Debug)]
pub enum OracleError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The service answered but the body was not usable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The configured model is not available on the service
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// A failure injected through a fixture, for tests
    #[error("Injected failure: {0}")]
    Injected(String),

    /// Generic error
    #[error("Oracle error: {0}")]
    Other(String),
}

type FixtureKey = (ExtractionKind, String);

/// Deterministic oracle backed by canned responses.
///
/// Responses are keyed by extraction kind and subject (the document id,
/// document pair, or case id the request is about), not by the full prompt,
/// so fixtures stay stable while prompt templates evolve. Requests with no
/// fixture get the default response, an empty candidate list.
///
/// Cloning shares the underlying fixtures and call counter, so a test can
/// hand the pipeline a clone and still observe call counts afterward.
#[derive(Debug, Clone)]
pub struct FixtureOracle {
    default_response: String,
    responses: Arc<Mutex<HashMap<FixtureKey, String>>>,
    errors: Arc<Mutex<HashSet<FixtureKey>>>,
    call_count: Arc<Mutex<usize>>,
}

impl FixtureOracle {
    /// Create a fixture oracle that answers `[]` to everything until
    /// fixtures are added.
    pub fn new() -> Self {
        Self {
            default_response: "[]".to_string(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            errors: Arc::new(Mutex::new(HashSet::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a canned response for a (kind, subject) pair
    pub fn add_response(
        &mut self,
        kind: ExtractionKind,
        subject: impl Into<String>,
        response: impl Into<String>,
    ) {
        self.responses
            .lock()
            .unwrap()
            .insert((kind, subject.into()), response.into());
    }

    /// Make a (kind, subject) pair fail with an injected error
    pub fn add_error(&mut self, kind: ExtractionKind, subject: impl Into<String>) {
        self.errors.lock().unwrap().insert((kind, subject.into()));
    }

    /// Get the number of times extract was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for FixtureOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionOracle for FixtureOracle {
    type Error = OracleError;

    fn extract(&self, request: &OracleRequest) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        let key = (request.kind, request.subject.clone());
        if self.errors.lock().unwrap().contains(&key) {
            return Err(OracleError::Injected(format!(
                "{} extraction for {}",
                request.kind, request.subject
            )));
        }

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(&key) {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}

/// Oracle that reports no candidates for any request.
///
/// Useful as a stand-in when a phase should run over an empty extraction,
/// and as the explicit "no oracle configured" choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOracle;

impl NullOracle {
    /// Create a null oracle.
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionOracle for NullOracle {
    type Error = OracleError;

    fn extract(&self, _request: &OracleRequest) -> Result<String, Self::Error> {
        Ok("[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: ExtractionKind, subject: &str) -> OracleRequest {
        OracleRequest::new(kind, "case-1", subject, "prompt text")
    }

    #[test]
    fn test_fixture_default_is_empty_list() {
        let oracle = FixtureOracle::new();
        let result = oracle.extract(&request(ExtractionKind::ClaimOrigin, "doc-1"));
        assert_eq!(result.unwrap(), "[]");
    }

    #[test]
    fn test_fixture_specific_responses() {
        let mut oracle = FixtureOracle::new();
        oracle.add_response(ExtractionKind::ClaimOrigin, "doc-1", "[1]");
        oracle.add_response(ExtractionKind::Propagation, "doc-1|doc-2", "[2]");

        assert_eq!(
            oracle
                .extract(&request(ExtractionKind::ClaimOrigin, "doc-1"))
                .unwrap(),
            "[1]"
        );
        assert_eq!(
            oracle
                .extract(&request(ExtractionKind::Propagation, "doc-1|doc-2"))
                .unwrap(),
            "[2]"
        );
        // Same subject, different kind falls through to the default
        assert_eq!(
            oracle
                .extract(&request(ExtractionKind::Authority, "doc-1"))
                .unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_fixture_call_count() {
        let oracle = FixtureOracle::new();
        assert_eq!(oracle.call_count(), 0);

        oracle
            .extract(&request(ExtractionKind::ClaimOrigin, "a"))
            .unwrap();
        oracle
            .extract(&request(ExtractionKind::ClaimOrigin, "b"))
            .unwrap();
        assert_eq!(oracle.call_count(), 2);

        oracle.reset_call_count();
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn test_fixture_injected_error() {
        let mut oracle = FixtureOracle::new();
        oracle.add_error(ExtractionKind::Authority, "doc-3");

        let result = oracle.extract(&request(ExtractionKind::Authority, "doc-3"));
        assert!(matches!(result, Err(OracleError::Injected(_))));

        // Other subjects unaffected
        assert!(oracle
            .extract(&request(ExtractionKind::Authority, "doc-4"))
            .is_ok());
    }

    #[test]
    fn test_fixture_clone_shares_state() {
        let oracle1 = FixtureOracle::new();
        let oracle2 = oracle1.clone();

        oracle1
            .extract(&request(ExtractionKind::Outcome, "case-1"))
            .unwrap();

        assert_eq!(oracle1.call_count(), 1);
        assert_eq!(oracle2.call_count(), 1);
    }

    #[test]
    fn test_null_oracle() {
        let oracle = NullOracle::new();
        let result = oracle.extract(&request(ExtractionKind::Outcome, "case-1"));
        assert_eq!(result.unwrap(), "[]");
    }
}
