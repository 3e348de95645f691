//! Ledger entries
//!
//! Each entry records one workflow-significant event together with a
//! snapshot of the record at write time. Entries of the same chain are
//! linked by `prev_hash`; the first entry of a chain links to `GENESIS`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use tresor_core::{AggregationStatus, CorePayload, TransactionRecord};

use crate::hash::calculate_entry_hash;

/// `prev_hash` of the first entry of every chain
pub const GENESIS: &str = "GENESIS";

/// Kind of event a ledger write records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Initial submission of the record
    Created,
    /// Regional Treasurer decision
    Aggregated,
    /// Principal Accountant decision
    CpeValidated,
}

/// The record as it stood when an event was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub record_id: String,
    pub payload: CorePayload,
    pub aggregation_status: AggregationStatus,
    pub aggregated_by: Option<String>,
    pub aggregated_at: Option<DateTime<Utc>>,
    pub cpe_validated_by: Option<String>,
    pub cpe_validated_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<&TransactionRecord> for RecordSnapshot {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            payload: record.payload.clone(),
            aggregation_status: record.aggregation_status,
            aggregated_by: record.aggregated_by.clone(),
            aggregated_at: record.aggregated_at,
            cpe_validated_by: record.cpe_validated_by.clone(),
            cpe_validated_at: record.cpe_validated_at,
            created_by: record.created_by.clone(),
            created_at: record.created_at,
        }
    }
}

/// What the workflow hands to `Ledger::write`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPayload {
    pub event: LedgerEvent,
    pub record: RecordSnapshot,
}

impl LedgerPayload {
    pub fn new(event: LedgerEvent, record: impl Into<RecordSnapshot>) -> Self {
        Self {
            event,
            record: record.into(),
        }
    }
}

impl From<&TransactionRecord> for LedgerPayload {
    fn from(record: &TransactionRecord) -> Self {
        Self::new(LedgerEvent::Created, record)
    }
}

/// A sealed ledger write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position within the chain, starting at 1
    pub sequence: u64,
    pub chain_id: String,
    pub event: LedgerEvent,
    #[serde(rename = "Record")]
    pub record: RecordSnapshot,
    pub transaction_id: String,
    /// Global block height at which the write was committed
    pub block_number: u64,
    pub prev_hash: String,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// Seal a payload as the next entry of its chain.
    ///
    /// `head` is the `(sequence, hash)` of the chain's current last entry.
    pub fn seal(
        chain_id: &str,
        payload: LedgerPayload,
        head: Option<(u64, &str)>,
        block_number: u64,
    ) -> Self {
        let (sequence, prev_hash) = match head {
            Some((seq, hash)) => (seq + 1, hash.to_string()),
            None => (1, GENESIS.to_string()),
        };

        let mut entry = Self {
            sequence,
            chain_id: chain_id.to_string(),
            event: payload.event,
            record: payload.record,
            transaction_id: uuid::Uuid::new_v4().simple().to_string(),
            block_number,
            prev_hash,
            hash: String::new(),
            timestamp: Utc::now(),
        };
        entry.hash = calculate_entry_hash(&entry);
        entry
    }

    /// Reference returned to the writer
    pub fn ledger_ref(&self) -> tresor_core::LedgerRef {
        tresor_core::LedgerRef {
            transaction_id: self.transaction_id.clone(),
            block_number: self.block_number,
            block_hash: self.hash.clone(),
        }
    }
}
