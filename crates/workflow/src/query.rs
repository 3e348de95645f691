//! Read-side operations: queues, statistics, history, verification, audit

use rust_decimal::Decimal;
use serde::Serialize;
use tresor_core::{
    Actor, AggregationStatus, DomainFields, Role, SubmissionStatus, TransactionKind,
    TransactionRecord,
};
use tresor_integrity::VerificationReport;
use tresor_ledger::{audit_log, ChainAudit, LedgerEntry};
use tresor_store::RecordFilter;

use crate::engine::Workflow;
use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionCounts {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationCounts {
    pub waiting_approval: usize,
    pub approved: usize,
    pub rejected: usize,
    pub cpe_approved: usize,
    pub cpe_rejected: usize,
}

/// Dashboard figures over the records visible to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub submission: SubmissionCounts,
    pub aggregation: AggregationCounts,
    /// Sum of amounts of records on the ledger
    pub total_amount: Decimal,
}

impl DashboardStats {
    fn add(&mut self, record: &TransactionRecord) -> WorkflowResult<()> {
        self.total += 1;
        match record.submission_status {
            SubmissionStatus::Pending => self.submission.pending += 1,
            SubmissionStatus::Success => {
                self.submission.success += 1;
                self.total_amount = self
                    .total_amount
                    .checked_add(record.payload.amount().value())
                    .ok_or_else(|| {
                        WorkflowError::InvalidPayload(format!(
                            "total amount overflows at record {}",
                            record.id
                        ))
                    })?;
            }
            SubmissionStatus::Failed => self.submission.failed += 1,
        }
        let counts = &mut self.aggregation;
        match record.aggregation_status {
            AggregationStatus::WaitingApproval => counts.waiting_approval += 1,
            AggregationStatus::Approved => counts.approved += 1,
            AggregationStatus::Rejected => counts.rejected += 1,
            AggregationStatus::CpeApproved => counts.cpe_approved += 1,
            AggregationStatus::CpeRejected => counts.cpe_rejected += 1,
        }
        Ok(())
    }
}

/// Result of checking every chain on the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAudit {
    pub height: u64,
    pub entries: usize,
    pub chains: Vec<ChainAudit>,
}

impl LedgerAudit {
    pub fn is_intact(&self) -> bool {
        self.chains.iter().all(|c| c.is_intact())
    }

    pub fn broken(&self) -> impl Iterator<Item = &ChainAudit> {
        self.chains.iter().filter(|c| !c.is_intact())
    }
}

impl Workflow {
    /// Records waiting on the caller's tier
    pub async fn pending(
        &self,
        actor: &Actor,
        kind: Option<TransactionKind>,
    ) -> WorkflowResult<Vec<TransactionRecord>> {
        let mut filter = match actor.role {
            Role::Treasurer => RecordFilter::all().submission(SubmissionStatus::Pending),
            Role::RegionalTreasurer => RecordFilter::all()
                .submission(SubmissionStatus::Success)
                .aggregation(AggregationStatus::WaitingApproval),
            Role::PrincipalAccountant => RecordFilter::all()
                .submission(SubmissionStatus::Success)
                .aggregation(AggregationStatus::Approved),
        };
        filter.kind = kind;
        self.store_call(self.store.list(&filter)).await
    }

    pub async fn list(&self, _actor: &Actor, filter: &RecordFilter) -> WorkflowResult<Vec<TransactionRecord>> {
        self.store_call(self.store.list(filter)).await
    }

    pub async fn get(&self, _actor: &Actor, id: &str) -> WorkflowResult<TransactionRecord> {
        self.load(id).await
    }

    pub async fn stats(&self, actor: &Actor, kind: Option<TransactionKind>) -> WorkflowResult<DashboardStats> {
        let filter = RecordFilter {
            kind,
            ..RecordFilter::all()
        };
        let records = self.list(actor, &filter).await?;

        let mut stats = DashboardStats::default();
        for record in &records {
            stats.add(record)?;
        }
        Ok(stats)
    }

    /// Ledger history of a record, oldest first
    pub async fn history(&self, _actor: &Actor, id: &str) -> WorkflowResult<Vec<LedgerEntry>> {
        let record = self.load(id).await?;
        self.ledger_read(self.ledger.read_history(&record.chain_id)).await
    }

    /// Compare a record with its ledger history stage by stage.
    ///
    /// Divergence is reported in the returned report, never as an error.
    pub async fn verify(&self, actor: &Actor, id: &str) -> WorkflowResult<VerificationReport> {
        let record = self.load(id).await?;
        let history = self.ledger_read(self.ledger.read_history(&record.chain_id)).await?;
        if history.is_empty() {
            return Err(WorkflowError::NotFound(format!("ledger history of record {}", id)));
        }

        let report = self.verifier.check(&record, &history)?;
        tracing::info!(
            record_id = %id,
            actor = %actor.id,
            all_valid = report.all_valid,
            "Integrity verified"
        );
        Ok(report)
    }

    /// Hash-chain check of the whole ledger
    pub async fn audit(&self, actor: &Actor) -> WorkflowResult<LedgerAudit> {
        let entries = self.ledger_read(self.ledger.read_all()).await?;
        let height = self.ledger_read(self.ledger.height()).await?;

        let audit = LedgerAudit {
            height,
            entries: entries.len(),
            chains: audit_log(&entries),
        };
        for chain in audit.broken() {
            if let Some(err) = &chain.error {
                tracing::warn!(chain_id = %chain.chain_id, error = %err, "Ledger chain broken");
            }
        }
        tracing::info!(
            actor = %actor.id,
            chains = audit.chains.len(),
            entries = audit.entries,
            intact = audit.is_intact(),
            "Ledger audited"
        );
        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use rust_decimal_macros::dec;
    use tresor_core::{CpeDecision, TrDecision};
    use tresor_integrity::IntegrityIssue;
    use tresor_ledger::LedgerEvent;

    #[tokio::test]
    async fn test_pending_queues_per_role() {
        let h = harness();
        let fresh = h.register(dec!(100)).await;
        let submitted = h.submitted(dec!(200)).await;
        let approved = h.approved(dec!(300)).await;
        let revenue = h
            .workflow
            .register_revenue(&treasurer(), revenue_fields(dec!(50)))
            .await
            .unwrap();
        h.workflow.submit(&treasurer(), &revenue.id).await.unwrap();

        let ids = |records: Vec<TransactionRecord>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();

        let mine = ids(h.workflow.pending(&treasurer(), None).await.unwrap());
        assert_eq!(mine, vec![fresh.id.clone()]);

        let tr = ids(h.workflow.pending(&regional(), None).await.unwrap());
        assert_eq!(tr.len(), 2);
        assert!(tr.contains(&submitted.id) && tr.contains(&revenue.id));

        let tr_payments = ids(
            h.workflow
                .pending(&regional(), Some(TransactionKind::Payment))
                .await
                .unwrap(),
        );
        assert_eq!(tr_payments, vec![submitted.id.clone()]);

        let cpe = ids(h.workflow.pending(&accountant(), None).await.unwrap());
        assert_eq!(cpe, vec![approved.id.clone()]);
    }

    #[tokio::test]
    async fn test_stats() {
        let h = harness();
        h.register(dec!(100)).await;
        h.submitted(dec!(200)).await;
        let approved = h.approved(dec!(300.50)).await;
        h.workflow
            .cpe_validate(&accountant(), &approved.id, CpeDecision::CpeApproved)
            .await
            .unwrap();

        let stats = h.workflow.stats(&regional(), None).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.submission,
            SubmissionCounts {
                pending: 1,
                success: 2,
                failed: 0
            }
        );
        assert_eq!(stats.aggregation.waiting_approval, 2);
        assert_eq!(stats.aggregation.cpe_approved, 1);
        assert_eq!(stats.total_amount, dec!(500.50));

        let revenue_stats = h
            .workflow
            .stats(&regional(), Some(TransactionKind::Revenue))
            .await
            .unwrap();
        assert_eq!(revenue_stats.total, 0);
    }

    #[tokio::test]
    async fn test_stats_total_overflow_is_an_error() {
        let h = harness();
        h.submitted(Decimal::MAX).await;
        // Pending records are not summed
        h.register(Decimal::MAX).await;
        let stats = h.workflow.stats(&regional(), None).await.unwrap();
        assert_eq!(stats.total_amount, Decimal::MAX);

        h.submitted(Decimal::MAX).await;
        let err = h.workflow.stats(&regional(), None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_history() {
        let h = harness();
        let record = h.approved(dec!(100)).await;
        h.workflow
            .cpe_validate(&accountant(), &record.id, CpeDecision::CpeRejected)
            .await
            .unwrap();

        let history = h.workflow.history(&treasurer(), &record.id).await.unwrap();
        let events: Vec<_> = history.iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![LedgerEvent::Created, LedgerEvent::Aggregated, LedgerEvent::CpeValidated]
        );
    }

    #[tokio::test]
    async fn test_verify_through_lifecycle() {
        let h = harness();
        let record = h.submitted(dec!(100000)).await;
        assert!(h.workflow.verify(&treasurer(), &record.id).await.unwrap().all_valid);

        h.workflow.aggregate(&regional(), &record.id, TrDecision::Approved).await.unwrap();
        assert!(h.workflow.verify(&treasurer(), &record.id).await.unwrap().all_valid);

        let mut edited = h.get(&record.id).await;
        *edited.payload.amount_mut() = tresor_core::Amount::new(dec!(999999)).unwrap();
        h.store.overwrite(&edited).unwrap();

        let report = h.workflow.verify(&treasurer(), &record.id).await.unwrap();
        assert!(!report.all_valid);
        assert_eq!(report.issues, vec![IntegrityIssue::CoreDataAltered]);
    }

    #[tokio::test]
    async fn test_verify_unsubmitted_is_not_found() {
        let h = harness();
        let record = h.register(dec!(100)).await;
        let err = h.workflow.verify(&treasurer(), &record.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));

        let err = h.workflow.verify(&treasurer(), "PAY-NOPE").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_audit() {
        let h = harness();
        let a = h.approved(dec!(100)).await;
        h.submitted(dec!(200)).await;

        let audit = h.workflow.audit(&accountant()).await.unwrap();
        assert!(audit.is_intact());
        assert_eq!(audit.chains.len(), 2);
        assert_eq!(audit.entries, 3);
        assert_eq!(audit.height, 3);

        h.ledger.tamper(&a.chain_id, 2, |e| e.record.aggregated_by = Some("x".to_string()));
        let audit = h.workflow.audit(&accountant()).await.unwrap();
        let broken: Vec<_> = audit.broken().collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].chain_id, a.chain_id);
    }
}
