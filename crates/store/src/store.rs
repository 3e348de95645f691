//! Record store contract

use async_trait::async_trait;
use tresor_core::{RecordState, TransactionRecord};

use crate::error::StoreError;
use crate::patch::{RecordFilter, RecordPatch};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record; fails with `Duplicate` if the id exists
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>, StoreError>;

    /// Apply `patch` iff the record exists and its state equals `expected`.
    ///
    /// Returns `false` when nothing was written.
    async fn compare_and_set(
        &self,
        id: &str,
        expected: RecordState,
        patch: &RecordPatch,
    ) -> Result<bool, StoreError>;

    /// Matching records, oldest first
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<TransactionRecord>, StoreError>;
}
