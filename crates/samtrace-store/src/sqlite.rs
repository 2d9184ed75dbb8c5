//! SQLite store implementation

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use samtrace_domain::traits::{DocumentStore, FindingsSink, PhaseRecord, PhaseStore};
use samtrace_domain::{CaseDocument, Finding, Phase};

use crate::StoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed implementation of the storage traits.
///
/// Documents and findings are rows; phase outputs are JSON rows keyed by
/// (case, phase, record id) and rewritten wholesale inside a transaction on
/// every `replace_phase`, so readers never see half of one run and half of
/// another.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path.
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use samtrace_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("samtrace.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or replace a document.
    pub fn add_document(&mut self, document: &CaseDocument) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (id, case_id, filename, acquired_at, ingest_index, institution)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &document.id,
                &document.case_id,
                &document.filename,
                document.acquired_at.format(DATE_FORMAT).to_string(),
                document.ingest_index as i64,
                &document.institution,
            ],
        )?;
        Ok(())
    }

    /// All findings recorded for a case.
    pub fn findings_for_case(&self, case_id: &str) -> Result<Vec<Finding>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM findings WHERE case_id = ?1 ORDER BY id")?;
        let bodies = stmt
            .query_map(params![case_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    fn parse_date(s: &str) -> Result<NaiveDate, rusqlite::Error> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> Result<CaseDocument, rusqlite::Error> {
        let acquired_at: String = row.get(3)?;
        Ok(CaseDocument {
            id: row.get(0)?,
            case_id: row.get(1)?,
            filename: row.get(2)?,
            acquired_at: Self::parse_date(&acquired_at)?,
            ingest_index: row.get::<_, i64>(4)? as u64,
            institution: row.get(5)?,
        })
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn documents_for_case(&self, case_id: &str) -> Result<Vec<CaseDocument>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, case_id, filename, acquired_at, ingest_index, institution
             FROM documents WHERE case_id = ?1
             ORDER BY acquired_at, ingest_index",
        )?;

        let documents = stmt
            .query_map(params![case_id], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn get_document(&self, id: &str) -> Result<Option<CaseDocument>, Self::Error> {
        let document = self
            .conn
            .query_row(
                "SELECT id, case_id, filename, acquired_at, ingest_index, institution
                 FROM documents WHERE id = ?1",
                params![id],
                Self::row_to_document,
            )
            .optional()?;

        Ok(document)
    }
}

impl PhaseStore for SqliteStore {
    type Error = StoreError;

    fn replace_phase(
        &mut self,
        case_id: &str,
        phase: Phase,
        records: Vec<PhaseRecord>,
    ) -> Result<(), Self::Error> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM phase_outputs WHERE case_id = ?1 AND phase = ?2",
            params![case_id, phase.as_str()],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO phase_outputs (case_id, phase, record_id, body)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in &records {
                let body = serde_json::to_string(&record.body)?;
                stmt.execute(params![case_id, phase.as_str(), &record.record_id, body])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO phase_runs (case_id, phase, completed_at)
             VALUES (?1, ?2, ?3)",
            params![
                case_id,
                phase.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load_phase(&self, case_id: &str, phase: Phase) -> Result<Vec<PhaseRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, body FROM phase_outputs
             WHERE case_id = ?1 AND phase = ?2
             ORDER BY record_id",
        )?;

        let rows = stmt
            .query_map(params![case_id, phase.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(record_id, body)| {
                let body = serde_json::from_str(&body)?;
                Ok(PhaseRecord::new(record_id, body))
            })
            .collect()
    }

    fn has_phase(&self, case_id: &str, phase: Phase) -> Result<bool, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM phase_runs WHERE case_id = ?1 AND phase = ?2",
            params![case_id, phase.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl FindingsSink for SqliteStore {
    type Error = StoreError;

    fn emit(&mut self, finding: Finding) -> Result<(), Self::Error> {
        let body = serde_json::to_string(&finding)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO findings (id, case_id, body) VALUES (?1, ?2, ?3)",
            params![finding.id.to_string(), &finding.case_id, body],
        )?;
        Ok(())
    }
}
