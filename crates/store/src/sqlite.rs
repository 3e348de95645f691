//! SQLite storage for transaction records
//!
//! rusqlite is synchronous; every trait call runs on the blocking pool so
//! that a caller-side timeout can give up on a call stuck on a database lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tresor_core::{
    AggregationStatus, CorePayload, LedgerRef, RecordState, SubmissionStatus, TransactionRecord,
};

use crate::error::StoreError;
use crate::patch::{RecordFilter, RecordPatch};
use crate::store::RecordStore;

const COLUMNS: &str = "id, chain_id, kind, payload_json, submission_status,
    ledger_tx_id, block_number, block_hash, aggregation_status,
    aggregated_by, aggregated_at, aggregation_tx_id,
    cpe_validated_by, cpe_validated_at, cpe_validation_tx_id,
    created_by, created_at";

/// SQLite-backed record store
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Replace a stored record wholesale, bypassing compare-and-set
    pub fn overwrite(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        write_row(&conn, "INSERT OR REPLACE", record)
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            chain_id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            submission_status TEXT NOT NULL,
            ledger_tx_id TEXT,
            block_number INTEGER,
            block_hash TEXT,
            aggregation_status TEXT NOT NULL,
            aggregated_by TEXT,
            aggregated_at TEXT,
            aggregation_tx_id TEXT,
            cpe_validated_by TEXT,
            cpe_validated_at TEXT,
            cpe_validation_tx_id TEXT,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_status
         ON records(submission_status, aggregation_status)",
        [],
    )?;

    Ok(())
}

fn write_row(conn: &Connection, verb: &str, record: &TransactionRecord) -> Result<(), StoreError> {
    let payload_json = serde_json::to_string(&record.payload)?;
    let ledger = record.ledger_ref.as_ref();

    conn.execute(
        &format!(
            "{verb} INTO records ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            record.id,
            record.chain_id,
            record.kind().as_str(),
            payload_json,
            record.submission_status.as_str(),
            ledger.map(|l| l.transaction_id.clone()),
            ledger.map(|l| l.block_number as i64),
            ledger.map(|l| l.block_hash.clone()),
            record.aggregation_status.as_str(),
            record.aggregated_by,
            record.aggregated_at.map(|t| t.to_rfc3339()),
            record.aggregation_tx_id,
            record.cpe_validated_by,
            record.cpe_validated_at.map(|t| t.to_rfc3339()),
            record.cpe_validation_tx_id,
            record.created_by,
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Raw column values, converted after the row borrow ends
struct RawRow {
    id: String,
    chain_id: String,
    payload_json: String,
    submission_status: String,
    ledger_tx_id: Option<String>,
    block_number: Option<i64>,
    block_hash: Option<String>,
    aggregation_status: String,
    aggregated_by: Option<String>,
    aggregated_at: Option<String>,
    aggregation_tx_id: Option<String>,
    cpe_validated_by: Option<String>,
    cpe_validated_at: Option<String>,
    cpe_validation_tx_id: Option<String>,
    created_by: String,
    created_at: String,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chain_id: row.get(1)?,
            payload_json: row.get(3)?,
            submission_status: row.get(4)?,
            ledger_tx_id: row.get(5)?,
            block_number: row.get(6)?,
            block_hash: row.get(7)?,
            aggregation_status: row.get(8)?,
            aggregated_by: row.get(9)?,
            aggregated_at: row.get(10)?,
            aggregation_tx_id: row.get(11)?,
            cpe_validated_by: row.get(12)?,
            cpe_validated_at: row.get(13)?,
            cpe_validation_tx_id: row.get(14)?,
            created_by: row.get(15)?,
            created_at: row.get(16)?,
        })
    }

    fn into_record(self) -> Result<TransactionRecord, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt {
            id: id.clone(),
            reason,
        };
        let parse_time = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("invalid timestamp '{}': {}", s, e)))
        };

        let payload: CorePayload = serde_json::from_str(&self.payload_json)?;
        let submission_status = SubmissionStatus::from_str(&self.submission_status)
            .map_err(|_| corrupt(format!("invalid submission status '{}'", self.submission_status)))?;
        let aggregation_status = AggregationStatus::from_str(&self.aggregation_status)
            .map_err(|_| corrupt(format!("invalid aggregation status '{}'", self.aggregation_status)))?;

        let ledger_ref = match (self.ledger_tx_id, self.block_number, self.block_hash) {
            (Some(transaction_id), Some(block_number), Some(block_hash)) => Some(LedgerRef {
                transaction_id,
                block_number: block_number as u64,
                block_hash,
            }),
            _ => None,
        };

        let aggregated_at = self.aggregated_at.as_deref().map(parse_time).transpose()?;
        let cpe_validated_at = self.cpe_validated_at.as_deref().map(parse_time).transpose()?;
        let created_at = parse_time(&self.created_at)?;

        Ok(TransactionRecord {
            id: id.clone(),
            chain_id: self.chain_id,
            payload,
            submission_status,
            ledger_ref,
            aggregation_status,
            aggregated_by: self.aggregated_by,
            aggregated_at,
            aggregation_tx_id: self.aggregation_tx_id,
            cpe_validated_by: self.cpe_validated_by,
            cpe_validated_at,
            cpe_validation_tx_id: self.cpe_validation_tx_id,
            created_by: self.created_by,
            created_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.run(move |conn| {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM records WHERE id = ?1",
                params![record.id],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Err(StoreError::Duplicate(record.id.clone()));
            }
            write_row(conn, "INSERT", &record)
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM records WHERE id = ?1"))?;
            let raw = match stmt.query_row(params![id], RawRow::read) {
                Ok(raw) => raw,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(other) => return Err(StoreError::Database(other)),
            };
            raw.into_record().map(Some)
        })
        .await
    }

    async fn compare_and_set(
        &self,
        id: &str,
        expected: RecordState,
        patch: &RecordPatch,
    ) -> Result<bool, StoreError> {
        let id = id.to_string();
        let patch = patch.clone();
        self.run(move |conn| {
            let guard = "WHERE id = ?1 AND submission_status = ?2 AND aggregation_status = ?3";
            let sub = expected.submission.as_str();
            let agg = expected.aggregation.as_str();

            let rows = match &patch {
                RecordPatch::Submitted { ledger_ref } => conn.execute(
                    &format!(
                        "UPDATE records SET submission_status = ?4, ledger_tx_id = ?5,
                         block_number = ?6, block_hash = ?7 {guard}"
                    ),
                    params![
                        id,
                        sub,
                        agg,
                        SubmissionStatus::Success.as_str(),
                        ledger_ref.transaction_id,
                        ledger_ref.block_number as i64,
                        ledger_ref.block_hash,
                    ],
                )?,
                RecordPatch::SubmissionFailed => conn.execute(
                    &format!(
                        "UPDATE records SET submission_status = ?4, ledger_tx_id = NULL,
                         block_number = NULL, block_hash = NULL {guard}"
                    ),
                    params![id, sub, agg, SubmissionStatus::Failed.as_str()],
                )?,
                RecordPatch::Aggregated { status, by, at, tx_id } => conn.execute(
                    &format!(
                        "UPDATE records SET aggregation_status = ?4, aggregated_by = ?5,
                         aggregated_at = ?6, aggregation_tx_id = ?7 {guard}"
                    ),
                    params![id, sub, agg, status.as_str(), by, at.to_rfc3339(), tx_id],
                )?,
                RecordPatch::CpeValidated { status, by, at, tx_id } => conn.execute(
                    &format!(
                        "UPDATE records SET aggregation_status = ?4, cpe_validated_by = ?5,
                         cpe_validated_at = ?6, cpe_validation_tx_id = ?7 {guard}"
                    ),
                    params![id, sub, agg, status.as_str(), by, at.to_rfc3339(), tx_id],
                )?,
            };

            Ok(rows == 1)
        })
        .await
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut clauses = Vec::new();
        let mut values: Vec<&'static str> = Vec::new();
        if let Some(kind) = filter.kind {
            clauses.push("kind = ?");
            values.push(kind.as_str());
        }
        if let Some(status) = filter.submission {
            clauses.push("submission_status = ?");
            values.push(status.as_str());
        }
        if let Some(status) = filter.aggregation {
            clauses.push("aggregation_status = ?");
            values.push(status.as_str());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM records {where_clause} ORDER BY created_at ASC, id ASC"
            ))?;
            let raws = stmt
                .query_map(params_from_iter(values), RawRow::read)?
                .collect::<Result<Vec<_>, _>>()?;

            raws.into_iter().map(RawRow::into_record).collect()
        })
        .await
    }
}
