//! Samtrace Storage Layer
//!
//! Reference implementations of the `DocumentStore`, `PhaseStore`, and
//! `FindingsSink` traits from `samtrace-domain`.
//!
//! # Architecture
//!
//! - `MemoryStore`: plain in-process maps, for tests and one-shot runs
//! - `SqliteStore`: SQLite persistence; phase outputs are JSON rows replaced
//!   transactionally, so a phase's stored output is always exactly one run's
//!   worth (per ADR-011)
//!
//! # Examples
//!
//! ```no_run
//! use samtrace_store::SqliteStore;
//!
//! let store = SqliteStore::new("samtrace.db").unwrap();
//! // Store is now ready for document and phase operations
//! ```

#![warn(missing_docs)]

pub mod memory;
pub mod sqlite;

use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
