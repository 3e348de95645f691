//! Record registration

use tresor_core::{Actor, CorePayload, DomainFields, PaymentFields, RevenueFields, Role, TransactionRecord};

use crate::engine::Workflow;
use crate::error::WorkflowResult;

impl Workflow {
    pub async fn register_payment(
        &self,
        actor: &Actor,
        fields: PaymentFields,
    ) -> WorkflowResult<TransactionRecord> {
        self.register(actor, fields.into()).await
    }

    pub async fn register_revenue(
        &self,
        actor: &Actor,
        fields: RevenueFields,
    ) -> WorkflowResult<TransactionRecord> {
        self.register(actor, fields.into()).await
    }

    /// Validate and store a new record; it is not on the ledger yet
    pub async fn register(&self, actor: &Actor, payload: CorePayload) -> WorkflowResult<TransactionRecord> {
        self.require_role(actor, Role::Treasurer)?;
        payload.validate()?;

        let record = TransactionRecord::new(payload, &actor.id);
        self.store_call(self.store.insert(&record)).await?;

        tracing::info!(
            record_id = %record.id,
            kind = %record.kind(),
            amount = %record.payload.amount(),
            created_by = %actor.id,
            "Record registered"
        );
        Ok(record)
    }
}
