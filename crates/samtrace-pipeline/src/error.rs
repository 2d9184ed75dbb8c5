//! Error types for the pipeline

use samtrace_domain::Phase;
use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Item-level problems (a failed oracle call, a rejected candidate) never
/// reach this enum; they are recovered in place and reported as
/// `PhaseWarning`s on the result. Everything here stops the run, with all
/// previously completed phases' output left intact.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A resumed run needs a phase that never produced output
    #[error("cannot start at {phase}: no stored output for {missing}")]
    MissingDependency {
        /// The phase the run was asked to start at
        phase: Phase,
        /// The prior phase with no stored output
        missing: Phase,
    },

    /// The cancel flag was set between phases
    #[error("pipeline cancelled after {}", last_completed.map(|p| p.as_str()).unwrap_or("no completed phase"))]
    Cancelled {
        /// The last phase that finished before the stop
        last_completed: Option<Phase>,
    },

    /// A requested document is not part of the case
    #[error("document {0} is not part of the case")]
    UnknownDocument(String),

    /// Document, phase, or findings store error
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Store(format!("phase record serialization: {}", e))
    }
}
