//! Workflow engine - shared plumbing for every operation

use std::future::Future;
use std::sync::Arc;

use tresor_core::{Actor, LedgerRef, Role, TransactionRecord};
use tresor_integrity::IntegrityVerifier;
use tresor_ledger::{Ledger, LedgerError, LedgerPayload};
use tresor_store::{RecordPatch, RecordStore, StoreError};

use crate::config::WorkflowConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::inflight::InFlight;

/// The treasury workflow over a Record Store and a Ledger
pub struct Workflow {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) verifier: IntegrityVerifier,
    pub(crate) config: WorkflowConfig,
    pub(crate) inflight: InFlight,
}

impl Workflow {
    pub fn new(store: Arc<dyn RecordStore>, ledger: Arc<dyn Ledger>, config: WorkflowConfig) -> Self {
        let verifier = IntegrityVerifier::new().with_chain_check(config.verify_ledger_chain);
        Self {
            store,
            ledger,
            verifier,
            config,
            inflight: InFlight::new(),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Role gate; the role comes from the authenticated actor, never the request
    pub(crate) fn require_role(&self, actor: &Actor, required: Role) -> WorkflowResult<()> {
        if actor.has_role(required) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, role = %actor.role, required = %required, "Role check failed");
            Err(WorkflowError::Unauthorized {
                actor: actor.id.clone(),
                required,
            })
        }
    }

    pub(crate) fn check_batch_size(&self, len: usize) -> WorkflowResult<()> {
        if len > self.config.max_batch_size {
            return Err(WorkflowError::InvalidPayload(format!(
                "batch of {} exceeds the limit of {}",
                len, self.config.max_batch_size
            )));
        }
        Ok(())
    }

    /// Run a Record Store call under the store timeout
    pub(crate) async fn store_call<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> WorkflowResult<T> {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(WorkflowError::StoreTimeout(self.config.store_timeout_ms)),
        }
    }

    /// Run a ledger read under the ledger timeout
    pub(crate) async fn ledger_read<T>(
        &self,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> WorkflowResult<T> {
        match tokio::time::timeout(self.config.ledger_timeout(), call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(WorkflowError::LedgerUnavailable(format!(
                "read timed out after {}ms",
                self.config.ledger_timeout_ms
            ))),
        }
    }

    pub(crate) async fn load(&self, id: &str) -> WorkflowResult<TransactionRecord> {
        self.store_call(self.store.get(id))
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("record {}", id)))
    }

    /// Write an event for `record` to the ledger under the ledger timeout.
    ///
    /// A timeout means the write may or may not have been committed.
    pub(crate) async fn ledger_write(
        &self,
        record: &TransactionRecord,
        payload: LedgerPayload,
    ) -> WorkflowResult<LedgerRef> {
        let write = self.ledger.write(&record.chain_id, payload);
        match tokio::time::timeout(self.config.ledger_timeout(), write).await {
            Ok(Ok(reference)) => Ok(reference),
            Ok(Err(e)) => {
                tracing::error!(record_id = %record.id, chain_id = %record.chain_id, error = %e, "Ledger write failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(
                    record_id = %record.id,
                    chain_id = %record.chain_id,
                    timeout_ms = self.config.ledger_timeout_ms,
                    "Ledger write timed out; outcome unknown"
                );
                Err(WorkflowError::LedgerOutcomeUnknown {
                    id: record.id.clone(),
                    timeout_ms: self.config.ledger_timeout_ms,
                })
            }
        }
    }

    /// Commit a patch against the state the precondition was checked on.
    ///
    /// Losing here after a successful ledger write leaves a ledger event
    /// the record does not reflect; `verify` reports it.
    pub(crate) async fn commit(
        &self,
        record: &TransactionRecord,
        patch: &RecordPatch,
    ) -> WorkflowResult<()> {
        let applied = self
            .store_call(self.store.compare_and_set(&record.id, record.state(), patch))
            .await?;
        if applied {
            Ok(())
        } else {
            tracing::warn!(
                record_id = %record.id,
                expected = %record.state(),
                "Record changed between read and commit"
            );
            Err(WorkflowError::StaleState(record.id.clone()))
        }
    }
}
