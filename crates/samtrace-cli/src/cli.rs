//! CLI command definitions and argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use samtrace_domain::Phase;

/// Samtrace CLI - trace claim provenance through a case's document record.
#[derive(Debug, Parser)]
#[command(name = "samtrace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the analysis pipeline over a case
    Run(RunArgs),

    /// Evaluate a statistic directly
    Stats(StatsArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Case file: documents and canned extraction responses (JSON)
    #[arg(short = 'F', long)]
    pub case_file: PathBuf,

    /// Phase to start at; earlier phases are loaded from the store
    #[arg(short, long, value_enum)]
    pub start_phase: Option<PhaseArg>,

    /// Pipeline configuration file (TOML); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Persist documents, phase output, and findings to this SQLite
    /// database instead of running in memory
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    /// Analyze only these document ids (default: the whole case)
    #[arg(long)]
    pub documents: Vec<String>,
}

/// Pipeline phase argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PhaseArg {
    /// Claim origin analysis
    Anchor,
    /// Propagation tracing
    Inherit,
    /// Authority accumulation
    Compound,
    /// Outcome causation mapping
    Arrive,
}

impl From<PhaseArg> for Phase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Anchor => Phase::Anchor,
            PhaseArg::Inherit => Phase::Inherit,
            PhaseArg::Compound => Phase::Compound,
            PhaseArg::Arrive => Phase::Arrive,
        }
    }
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub statistic: Statistic,
}

/// Directly computable statistics.
#[derive(Debug, Subcommand)]
pub enum Statistic {
    /// Binomial z-test of two counts against a 50/50 split
    Binomial {
        /// First count
        count1: u64,
        /// Second count
        count2: u64,
    },

    /// Cohen's h effect size between two proportions
    CohensH {
        /// First proportion (0.0-1.0)
        p1: f64,
        /// Second proportion (0.0-1.0)
        p2: f64,
    },

    /// Clopper-Pearson exact confidence interval
    Ci {
        /// Number of successes
        successes: u64,
        /// Number of trials
        trials: u64,
        /// Confidence level
        #[arg(short, long, default_value = "0.95")]
        level: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_parses() {
        let cli = Cli::parse_from(["samtrace", "run", "--case-file", "case.json"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.case_file, PathBuf::from("case.json"));
                assert!(args.start_phase.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_start_phase_parses() {
        let cli = Cli::parse_from([
            "samtrace",
            "run",
            "--case-file",
            "case.json",
            "--start-phase",
            "compound",
        ]);
        match cli.command {
            Command::Run(args) => {
                let phase: Phase = args.start_phase.unwrap().into();
                assert_eq!(phase, Phase::Compound);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_stats_binomial_parses() {
        let cli = Cli::parse_from(["samtrace", "stats", "binomial", "8", "2"]);
        match cli.command {
            Command::Stats(args) => match args.statistic {
                Statistic::Binomial { count1, count2 } => {
                    assert_eq!(count1, 8);
                    assert_eq!(count2, 2);
                }
                _ => panic!("Expected Binomial statistic"),
            },
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_phase_conversion() {
        let phase: Phase = PhaseArg::Arrive.into();
        assert_eq!(phase, Phase::Arrive);
    }
}
