//! The pipeline orchestrator: phase sequencing, persistence, resumption
//!
//! Phases run in the fixed order anchor, inherit, compound, arrive. A run
//! may start at any phase; everything before the start is loaded from the
//! phase store instead of recomputed, and every computed phase fully
//! replaces its stored output before the next phase begins. Record ids are
//! deterministic, so re-running a phase over unchanged input writes the
//! same records it wrote before.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use samtrace_domain::traits::{
    DocumentStore, ExtractionOracle, FindingsSink, PhaseRecord, PhaseStore,
};
use samtrace_domain::{sort_chronological, CaseDocument, Finding, HarmLevel, Phase, PhaseWarning};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::graph::PropagationGraph;
use crate::types::{CaseSummary, PhaseOutputs, PipelineResult};
use crate::{anchor, arrive, compound, inherit};

/// Cooperative cancellation handle for a running pipeline.
///
/// Cancellation is observed at phase boundaries only; a phase that has
/// started always runs to completion and persists its output.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The four-phase provenance pipeline over one case.
///
/// Generic over its oracle, document store, phase store, and findings sink,
/// which is what lets the whole pipeline run against canned fixtures in
/// tests and against real infrastructure in production.
pub struct SamPipeline<O, D, P, F> {
    oracle: Arc<O>,
    documents: D,
    phase_store: P,
    findings: F,
    config: PipelineConfig,
    cancel: CancelFlag,
}

impl<O, D, P, F> SamPipeline<O, D, P, F>
where
    O: ExtractionOracle + Send + Sync + 'static,
    O::Error: Display + Send + 'static,
    D: DocumentStore,
    D::Error: Display,
    P: PhaseStore,
    P::Error: Display,
    F: FindingsSink,
    F::Error: Display,
{
    /// Create a pipeline. Rejects an invalid configuration up front so no
    /// oracle call is ever made under bad thresholds.
    pub fn new(
        oracle: O,
        documents: D,
        phase_store: P,
        findings: F,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            oracle: Arc::new(oracle),
            documents,
            phase_store,
            findings,
            config,
            cancel: CancelFlag::new(),
        })
    }

    /// A handle that cancels this pipeline at the next phase boundary.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The findings sink, for reading back what a run emitted.
    pub fn findings(&self) -> &F {
        &self.findings
    }

    /// The phase store, for inspecting persisted phase output.
    pub fn phase_store(&self) -> &P {
        &self.phase_store
    }

    /// Tear the pipeline down into its stores.
    pub fn into_parts(self) -> (P, F) {
        (self.phase_store, self.findings)
    }

    /// Run the pipeline over a case.
    ///
    /// An empty `document_ids` means every document in the case. With a
    /// `start_phase`, every earlier phase is loaded from the store instead
    /// of recomputed; asking to start past a phase that never ran is a
    /// `MissingDependency` error.
    pub async fn run(
        &mut self,
        document_ids: &[String],
        case_id: &str,
        start_phase: Option<Phase>,
    ) -> Result<PipelineResult, PipelineError> {
        let start = start_phase.unwrap_or(Phase::Anchor);
        let documents = self.load_documents(document_ids, case_id)?;
        info!(
            "pipeline: case {} with {} documents, starting at {}",
            case_id,
            documents.len(),
            start
        );

        for &predecessor in start.predecessors() {
            let present = self
                .phase_store
                .has_phase(case_id, predecessor)
                .map_err(store_error)?;
            if !present {
                return Err(PipelineError::MissingDependency {
                    phase: start,
                    missing: predecessor,
                });
            }
        }

        let mut outputs = PhaseOutputs::default();
        let mut warnings: Vec<PhaseWarning> = Vec::new();
        let mut chains = Vec::new();
        let mut findings_emitted = 0usize;
        let mut last_completed: Option<Phase> = None;

        if start > Phase::Anchor {
            outputs.origins = self.load_records(case_id, Phase::Anchor)?;
        }
        if start > Phase::Inherit {
            outputs.propagations = self.load_records(case_id, Phase::Inherit)?;
        }
        if start > Phase::Compound {
            outputs.markers = self.load_records(case_id, Phase::Compound)?;
        }

        for phase in Phase::ALL {
            if phase < start {
                last_completed = Some(phase);
                continue;
            }
            if self.cancel.is_cancelled() {
                warn!("pipeline: cancelled before {}", phase);
                return Err(PipelineError::Cancelled { last_completed });
            }

            match phase {
                Phase::Anchor => {
                    let outcome =
                        anchor::run(&self.oracle, case_id, &documents, &self.config).await;
                    self.persist(case_id, Phase::Anchor, &outcome.records)?;
                    findings_emitted += self.emit_all(outcome.findings)?;
                    warnings.extend(outcome.warnings);
                    outputs.origins = outcome.records;
                }
                Phase::Inherit => {
                    let outcome = inherit::run(
                        &self.oracle,
                        case_id,
                        &documents,
                        &outputs.origins,
                        &self.config,
                    )
                    .await;
                    self.persist(case_id, Phase::Inherit, &outcome.records)?;
                    findings_emitted += self.emit_all(outcome.findings)?;
                    warnings.extend(outcome.warnings);
                    outputs.propagations = outcome.records;
                }
                Phase::Compound => {
                    let graph = PropagationGraph::new(outputs.propagations.clone());
                    let outcome = compound::run(
                        &self.oracle,
                        case_id,
                        &documents,
                        &outputs.origins,
                        &graph,
                        &self.config,
                    )
                    .await;
                    self.persist(case_id, Phase::Compound, &outcome.records)?;
                    findings_emitted += self.emit_all(outcome.findings)?;
                    warnings.extend(outcome.warnings);
                    outputs.markers = outcome.records;
                }
                Phase::Arrive => {
                    let graph = PropagationGraph::new(outputs.propagations.clone());
                    let (outcome, arrive_chains) = arrive::run(
                        &self.oracle,
                        case_id,
                        &documents,
                        &outputs.origins,
                        &graph,
                        &outputs.markers,
                        &self.config,
                    )
                    .await;
                    self.persist(case_id, Phase::Arrive, &outcome.records)?;
                    findings_emitted += self.emit_all(outcome.findings)?;
                    warnings.extend(outcome.warnings);
                    outputs.outcomes = outcome.records;
                    chains = arrive_chains;
                }
            }
            last_completed = Some(phase);
        }

        let summary = summarize(&documents, &outputs, findings_emitted);
        info!(
            "pipeline: case {} complete: {} claims, {} edges, {} outcomes, {} findings",
            case_id,
            summary.total_claims,
            outputs.propagations.len(),
            summary.outcomes_mapped,
            summary.findings_emitted
        );

        Ok(PipelineResult {
            case_id: case_id.to_string(),
            phases: outputs,
            chains,
            summary,
            warnings,
        })
    }

    fn load_documents(
        &self,
        document_ids: &[String],
        case_id: &str,
    ) -> Result<Vec<CaseDocument>, PipelineError> {
        let mut documents = if document_ids.is_empty() {
            self.documents
                .documents_for_case(case_id)
                .map_err(store_error)?
        } else {
            let mut selected = Vec::with_capacity(document_ids.len());
            for id in document_ids {
                let document = self
                    .documents
                    .get_document(id)
                    .map_err(store_error)?
                    .filter(|d| d.case_id == case_id)
                    .ok_or_else(|| PipelineError::UnknownDocument(id.clone()))?;
                selected.push(document);
            }
            selected
        };
        sort_chronological(&mut documents);
        Ok(documents)
    }

    fn load_records<T: DeserializeOwned>(
        &self,
        case_id: &str,
        phase: Phase,
    ) -> Result<Vec<T>, PipelineError> {
        let records = self
            .phase_store
            .load_phase(case_id, phase)
            .map_err(store_error)?;
        records
            .into_iter()
            .map(|record| serde_json::from_value(record.body).map_err(PipelineError::from))
            .collect()
    }

    fn persist<T: Serialize + HasRecordId>(
        &mut self,
        case_id: &str,
        phase: Phase,
        records: &[T],
    ) -> Result<(), PipelineError> {
        let mut serialized = Vec::with_capacity(records.len());
        for record in records {
            serialized.push(PhaseRecord::new(
                record.record_id(),
                serde_json::to_value(record)?,
            ));
        }
        self.phase_store
            .replace_phase(case_id, phase, serialized)
            .map_err(store_error)
    }

    fn emit_all(&mut self, findings: Vec<Finding>) -> Result<usize, PipelineError> {
        let count = findings.len();
        for finding in findings {
            self.findings.emit(finding).map_err(store_error)?;
        }
        Ok(count)
    }
}

fn store_error(e: impl Display) -> PipelineError {
    PipelineError::Store(e.to_string())
}

fn summarize(
    documents: &[CaseDocument],
    outputs: &PhaseOutputs,
    findings_emitted: usize,
) -> CaseSummary {
    let graph = PropagationGraph::new(outputs.propagations.clone());
    CaseSummary {
        documents_analyzed: documents.len(),
        total_claims: outputs.origins.len(),
        false_premises: outputs
            .origins
            .iter()
            .filter(|o| o.is_false_premise)
            .count(),
        propagation_chains: graph.claims().len(),
        authority_markers: outputs.markers.len(),
        laundering_instances: outputs
            .markers
            .iter()
            .filter(|m| m.is_authority_laundering)
            .count(),
        outcomes_mapped: outputs.outcomes.len(),
        harmful_outcomes: outputs
            .outcomes
            .iter()
            .filter(|o| o.harm_level >= HarmLevel::Severe)
            .count(),
        findings_emitted,
    }
}

/// The identifier a record is stored under.
pub(crate) trait HasRecordId {
    fn record_id(&self) -> String;
}

impl HasRecordId for samtrace_domain::ClaimOrigin {
    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl HasRecordId for samtrace_domain::ClaimPropagation {
    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl HasRecordId for samtrace_domain::AuthorityMarker {
    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl HasRecordId for samtrace_domain::SamOutcome {
    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }
}
