//! Tresor Ledger - Append-only transaction history
//!
//! The ledger is an external collaborator (a permissioned blockchain in
//! production). This crate defines the interface the workflow consumes and
//! two implementations:
//! - `JsonlLedger`: append-only JSONL file, one line per entry
//! - `MemoryLedger`: in-process fake with failure injection, for tests
//!
//! # Key Types
//! - `Ledger`: write/read_history contract
//! - `LedgerEntry`: one sealed, hash-chained write (`{Record: snapshot}`)
//! - `RecordSnapshot`: the record as it stood when the event was written
//! - `LedgerEvent`: creation, aggregation decision, CPE decision

pub mod client;
pub mod entry;
pub mod error;
pub mod hash;
pub mod jsonl;
pub mod memory;

pub use client::Ledger;
pub use entry::{LedgerEntry, LedgerEvent, LedgerPayload, RecordSnapshot};
pub use error::LedgerError;
pub use entry::GENESIS;
pub use hash::{audit_log, verify_chain, ChainAudit, ChainError};
pub use jsonl::JsonlLedger;
pub use memory::{FailureKind, MemoryLedger};
