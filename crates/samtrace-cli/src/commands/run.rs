//! The run command: execute the pipeline over a case file.

use samtrace_domain::Finding;
use samtrace_pipeline::{PipelineConfig, SamPipeline};
use samtrace_store::{MemoryStore, SqliteStore};
use tracing::info;

use crate::case::CaseFile;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the run command.
pub async fn execute_run(args: &RunArgs, formatter: &Formatter) -> Result<()> {
    let case = CaseFile::load(&args.case_file)?;
    let config = load_config(args)?;
    let oracle = case.oracle();
    let start_phase = args.start_phase.map(Into::into);

    info!(case_id = %case.case_id, documents = case.documents.len(), "starting run");

    let (result, findings) = match &args.db {
        Some(path) => {
            let mut documents = SqliteStore::new(path)?;
            for document in case.case_documents() {
                documents.add_document(&document)?;
            }
            let phase_store = SqliteStore::new(path)?;
            let findings = SqliteStore::new(path)?;
            let mut pipeline =
                SamPipeline::new(oracle, documents, phase_store, findings, config)?;
            let result = pipeline
                .run(&args.documents, &case.case_id, start_phase)
                .await?;
            let findings = pipeline.findings().findings_for_case(&case.case_id)?;
            (result, findings)
        }
        None => {
            let mut documents = MemoryStore::new();
            for document in case.case_documents() {
                documents.add_document(document);
            }
            let mut pipeline = SamPipeline::new(
                oracle,
                documents,
                MemoryStore::new(),
                MemoryStore::new(),
                config,
            )?;
            let result = pipeline
                .run(&args.documents, &case.case_id, start_phase)
                .await?;
            let findings: Vec<Finding> = pipeline.findings().findings_for_case(&case.case_id);
            (result, findings)
        }
    };

    println!("{}", formatter.format_run(&result, &findings)?);
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<PipelineConfig> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            PipelineConfig::from_toml(&text).map_err(CliError::InvalidInput)
        }
        None => Ok(PipelineConfig::default()),
    }
}
