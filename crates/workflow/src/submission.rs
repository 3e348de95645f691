//! Submission pipeline: pending records onto the ledger

use tresor_core::{Actor, LedgerRef, Role, SubmissionStatus};
use tresor_ledger::LedgerPayload;
use tresor_store::RecordPatch;

use crate::batch::BatchReport;
use crate::engine::Workflow;
use crate::error::{SubmissionError, WorkflowError};

impl Workflow {
    /// Write a pending record to the ledger.
    ///
    /// On a ledger failure the record is marked `failed`. On a timeout it
    /// stays `pending`, since the write may have been committed.
    pub async fn submit(&self, actor: &Actor, id: &str) -> Result<LedgerRef, SubmissionError> {
        self.require_role(actor, Role::Treasurer)?;
        let _guard = self.inflight.acquire(id)?;

        let record = self.load(id).await?;
        if record.submission_status != SubmissionStatus::Pending {
            tracing::warn!(record_id = %id, status = %record.submission_status, "Submit rejected");
            return Err(WorkflowError::InvalidState {
                id: id.to_string(),
                expected: SubmissionStatus::Pending.as_str(),
                actual: record.submission_status.to_string(),
            });
        }

        match self.ledger_write(&record, LedgerPayload::from(&record)).await {
            Ok(ledger_ref) => {
                let patch = RecordPatch::Submitted {
                    ledger_ref: ledger_ref.clone(),
                };
                self.commit(&record, &patch).await?;
                tracing::info!(
                    record_id = %id,
                    tx_id = %ledger_ref.transaction_id,
                    block = ledger_ref.block_number,
                    "Record submitted to ledger"
                );
                Ok(ledger_ref)
            }
            Err(err) if err.is_ledger_failure() => {
                // The ledger error is what the caller needs to see
                if let Err(e) = self.commit(&record, &RecordPatch::SubmissionFailed).await {
                    tracing::warn!(record_id = %id, error = %e, "Could not mark record as failed");
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Submit each record on its own; failures do not stop the batch
    pub async fn submit_many(&self, actor: &Actor, ids: &[String]) -> Result<BatchReport, SubmissionError> {
        self.require_role(actor, Role::Treasurer)?;
        self.check_batch_size(ids.len())?;

        let mut report = BatchReport::new();
        for id in ids {
            let outcome = self.submit(actor, id).await;
            report.push(id, outcome);
        }

        tracing::info!(
            submitted = report.success_count(),
            failed = report.failed.len(),
            "Submission batch finished"
        );
        Ok(report)
    }
}
