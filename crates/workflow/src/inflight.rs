//! In-flight operation tracking
//!
//! At most one workflow operation per record runs in this process at a
//! time. A second caller is turned away before it can reach the ledger.

use std::collections::HashSet;
use std::sync::Mutex;

use tresor_store::StoreError;

use crate::error::{WorkflowError, WorkflowResult};

#[derive(Default)]
pub struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` until the returned guard is dropped
    pub fn acquire(&self, id: &str) -> WorkflowResult<InFlightGuard<'_>> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| WorkflowError::Store(StoreError::LockPoisoned))?;
        if !ids.insert(id.to_string()) {
            tracing::warn!(record_id = %id, "Operation already in flight");
            return Err(WorkflowError::StaleState(id.to_string()));
        }
        Ok(InFlightGuard {
            owner: self,
            id: id.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.lock().map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the claim on drop, including when the operation is cancelled
pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.owner.ids.lock() {
            ids.remove(&self.id);
        }
    }
}
