//! Tresor Store - Record Store
//!
//! Holds the current, mutable view of every payment and revenue. The
//! workflow only ever changes a record through `compare_and_set`, which
//! applies a `RecordPatch` iff both status axes still match what the
//! caller read.
//!
//! Implementations:
//! - `SqliteRecordStore`: rusqlite-backed, one row per record
//! - `MemoryRecordStore`: in-process fake for tests

pub mod error;
pub mod memory;
pub mod patch;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryRecordStore;
pub use patch::{RecordFilter, RecordPatch};
pub use sqlite::SqliteRecordStore;
pub use store::RecordStore;
