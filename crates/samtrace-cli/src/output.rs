//! Output formatting for the CLI.

use colored::*;
use samtrace_domain::{Finding, Severity};
use samtrace_pipeline::PipelineResult;
use samtrace_stats::{BinomialInterval, BinomialTest, EffectMagnitude, SignificanceLevel};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

use crate::cli::CliFormat;
use crate::error::Result;

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a pipeline run's result and its findings.
    pub fn format_run(&self, result: &PipelineResult, findings: &[Finding]) -> Result<String> {
        match self.format {
            CliFormat::Json => self.format_run_json(result, findings),
            CliFormat::Table => Ok(self.format_run_table(result, findings)),
            CliFormat::Quiet => Ok(format!(
                "{} claims {} edges {} markers {} outcomes {} findings",
                result.summary.total_claims,
                result.phases.propagations.len(),
                result.summary.authority_markers,
                result.summary.outcomes_mapped,
                findings.len()
            )),
        }
    }

    fn format_run_json(&self, result: &PipelineResult, findings: &[Finding]) -> Result<String> {
        let value = serde_json::json!({
            "case_id": result.case_id,
            "summary": result.summary,
            "phases": result.phases,
            "chains": result.chains,
            "findings": findings,
            "warnings": result.warnings,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_run_table(&self, result: &PipelineResult, findings: &[Finding]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        let summary = &result.summary;
        for (metric, value) in [
            ("Documents analyzed", summary.documents_analyzed),
            ("Claims anchored", summary.total_claims),
            ("False premises", summary.false_premises),
            ("Propagation chains", summary.propagation_chains),
            ("Authority markers", summary.authority_markers),
            ("Laundering instances", summary.laundering_instances),
            ("Outcomes mapped", summary.outcomes_mapped),
            ("Harmful outcomes", summary.harmful_outcomes),
            ("Findings", summary.findings_emitted),
        ] {
            builder.push_record([metric.to_string(), value.to_string()]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut output = format!("Case {}\n{}\n", result.case_id, table);

        if !findings.is_empty() {
            output.push_str("\nFindings:\n");
            for finding in findings {
                output.push_str(&format!(
                    "  [{}] {}\n      {}\n",
                    self.severity_label(finding.severity),
                    finding.title,
                    finding.description
                ));
            }
        }
        if !result.warnings.is_empty() {
            output.push_str(&format!("\n{} warnings:\n", result.warnings.len()));
            for warning in &result.warnings {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    warning.phase, warning.subject, warning.message
                ));
            }
        }
        output
    }

    fn severity_label(&self, severity: Severity) -> String {
        if !self.color_enabled {
            return severity.as_str().to_uppercase();
        }
        let label = severity.as_str().to_uppercase();
        match severity {
            Severity::Critical => label.red().bold().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Medium => label.yellow().to_string(),
            Severity::Low | Severity::Info => label.normal().to_string(),
        }
    }

    /// Format a binomial test result.
    pub fn format_binomial(&self, test: &BinomialTest, level: SignificanceLevel) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "z": test.z,
                "p_value": test.p_value,
                "significance": level.as_str(),
            }))?),
            _ => Ok(format!(
                "z = {:.4}, p = {:.6} ({})",
                test.z,
                test.p_value,
                level.as_str()
            )),
        }
    }

    /// Format an effect size.
    pub fn format_effect(&self, h: f64, magnitude: EffectMagnitude) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "h": h,
                "magnitude": magnitude.as_str(),
            }))?),
            _ => Ok(format!("h = {:.4} ({})", h, magnitude)),
        }
    }

    /// Format a confidence interval.
    pub fn format_interval(&self, interval: &BinomialInterval, level: f64) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "level": level,
                "lower": interval.lower,
                "upper": interval.upper,
            }))?),
            _ => Ok(format!(
                "{:.0}% CI [{:.4}, {:.4}]",
                level * 100.0,
                interval.lower,
                interval.upper
            )),
        }
    }
}
