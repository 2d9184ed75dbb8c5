//! Command implementations.

pub mod run;
pub mod stats;

pub use run::execute_run;
pub use stats::execute_stats;
