//! Aggregation state machine
//!
//! Two approval tiers, each gated by role:
//! - Regional Treasurer: `waiting_approval -> approved | rejected`
//! - Principal Accountant: `approved -> cpe_approved | cpe_rejected`

use chrono::Utc;
use tresor_core::{
    Actor, AggregationStatus, CpeDecision, LedgerRef, Role, TrDecision, TransactionRecord,
};
use tresor_ledger::{LedgerEvent, LedgerPayload};
use tresor_store::RecordPatch;

use crate::batch::BatchReport;
use crate::engine::Workflow;
use crate::error::{WorkflowError, WorkflowResult};

/// One tier of the state machine
struct Stage {
    role: Role,
    from: AggregationStatus,
    event: LedgerEvent,
}

const TR_STAGE: Stage = Stage {
    role: Role::RegionalTreasurer,
    from: AggregationStatus::WaitingApproval,
    event: LedgerEvent::Aggregated,
};

const CPE_STAGE: Stage = Stage {
    role: Role::PrincipalAccountant,
    from: AggregationStatus::Approved,
    event: LedgerEvent::CpeValidated,
};

impl Workflow {
    /// Regional Treasurer decision on a submitted record
    pub async fn aggregate(
        &self,
        actor: &Actor,
        id: &str,
        decision: TrDecision,
    ) -> WorkflowResult<LedgerRef> {
        self.transition(&TR_STAGE, actor, id, decision.into()).await
    }

    /// Principal Accountant decision on an aggregated record
    pub async fn cpe_validate(
        &self,
        actor: &Actor,
        id: &str,
        decision: CpeDecision,
    ) -> WorkflowResult<LedgerRef> {
        self.transition(&CPE_STAGE, actor, id, decision.into()).await
    }

    pub async fn aggregate_batch(
        &self,
        actor: &Actor,
        ids: &[String],
        decision: TrDecision,
    ) -> WorkflowResult<BatchReport> {
        self.transition_batch(&TR_STAGE, actor, ids, decision.into()).await
    }

    pub async fn cpe_validate_batch(
        &self,
        actor: &Actor,
        ids: &[String],
        decision: CpeDecision,
    ) -> WorkflowResult<BatchReport> {
        self.transition_batch(&CPE_STAGE, actor, ids, decision.into()).await
    }

    async fn transition(
        &self,
        stage: &Stage,
        actor: &Actor,
        id: &str,
        to: AggregationStatus,
    ) -> WorkflowResult<LedgerRef> {
        self.require_role(actor, stage.role)?;
        let _guard = self.inflight.acquire(id)?;

        let record = self.load(id).await?;
        check_source_state(&record, stage.from, to)?;

        let at = Utc::now();
        let mut decided = record.clone();
        decided.aggregation_status = to;
        if stage.role == Role::PrincipalAccountant {
            decided.cpe_validated_by = Some(actor.id.clone());
            decided.cpe_validated_at = Some(at);
        } else {
            decided.aggregated_by = Some(actor.id.clone());
            decided.aggregated_at = Some(at);
        }

        let ledger_ref = self
            .ledger_write(&record, LedgerPayload::new(stage.event, &decided))
            .await?;

        let tx_id = ledger_ref.transaction_id.clone();
        let patch = if stage.role == Role::PrincipalAccountant {
            RecordPatch::CpeValidated {
                status: to,
                by: actor.id.clone(),
                at,
                tx_id,
            }
        } else {
            RecordPatch::Aggregated {
                status: to,
                by: actor.id.clone(),
                at,
                tx_id,
            }
        };
        self.commit(&record, &patch).await?;

        tracing::info!(
            record_id = %id,
            from = %stage.from,
            to = %to,
            actor = %actor.id,
            tx_id = %ledger_ref.transaction_id,
            "Aggregation status changed"
        );
        Ok(ledger_ref)
    }

    async fn transition_batch(
        &self,
        stage: &Stage,
        actor: &Actor,
        ids: &[String],
        to: AggregationStatus,
    ) -> WorkflowResult<BatchReport> {
        self.require_role(actor, stage.role)?;
        self.check_batch_size(ids.len())?;

        let mut report = BatchReport::new();
        for id in ids {
            let outcome = self.transition(stage, actor, id, to).await;
            report.push(id, outcome);
        }

        tracing::info!(
            to = %to,
            succeeded = report.success_count(),
            failed = report.failed.len(),
            "Aggregation batch finished"
        );
        Ok(report)
    }
}

/// Only records on the ledger and exactly in `from` may move to `to`
fn check_source_state(
    record: &TransactionRecord,
    from: AggregationStatus,
    to: AggregationStatus,
) -> WorkflowResult<()> {
    if !record.is_on_ledger() {
        tracing::warn!(record_id = %record.id, status = %record.submission_status, "Record not on ledger");
        return Err(WorkflowError::InvalidState {
            id: record.id.clone(),
            expected: "submitted to ledger",
            actual: record.submission_status.to_string(),
        });
    }
    if record.aggregation_status != from || !from.can_transition_to(to) {
        tracing::warn!(
            record_id = %record.id,
            status = %record.aggregation_status,
            requested = %to,
            "Transition rejected"
        );
        return Err(WorkflowError::InvalidState {
            id: record.id.clone(),
            expected: from.as_str(),
            actual: record.aggregation_status.to_string(),
        });
    }
    Ok(())
}
