//! Samtrace CLI library.
//!
//! This library provides the core functionality for the samtrace command-line
//! interface: case file loading, command execution, and output formatting.

pub mod case;
pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use case::CaseFile;
pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use output::Formatter;
