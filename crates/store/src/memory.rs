//! In-memory record store for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tresor_core::{RecordState, TransactionRecord};

use crate::error::StoreError;
use crate::patch::{RecordFilter, RecordPatch};
use crate::store::RecordStore;

/// Mock record store
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, TransactionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Replace a stored record wholesale, bypassing compare-and-set
    pub fn overwrite(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.get(id).cloned())
    }

    async fn compare_and_set(
        &self,
        id: &str,
        expected: RecordState,
        patch: &RecordPatch,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::LockPoisoned)?;
        match records.get_mut(id) {
            Some(record) if record.state() == expected => {
                patch.apply(record);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<TransactionRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matching)
    }
}
