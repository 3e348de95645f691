//! Shared test harness over the in-memory collaborators

use std::sync::Arc;

use rust_decimal::Decimal;
use tresor_core::{
    Actor, Amount, CpeDecision, PaymentFields, RevenueFields, Role, TrDecision, TransactionRecord,
};
use tresor_ledger::MemoryLedger;
use tresor_store::{MemoryRecordStore, RecordStore};

use crate::config::WorkflowConfig;
use crate::engine::Workflow;

pub struct Harness {
    pub workflow: Arc<Workflow>,
    pub store: Arc<MemoryRecordStore>,
    pub ledger: Arc<MemoryLedger>,
}

pub fn harness() -> Harness {
    harness_with_config(WorkflowConfig::default())
}

pub fn harness_with_timeout(ledger_timeout_ms: u64) -> Harness {
    harness_with_config(WorkflowConfig {
        ledger_timeout_ms,
        ..WorkflowConfig::default()
    })
}

pub fn harness_with_config(config: WorkflowConfig) -> Harness {
    let store = Arc::new(MemoryRecordStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let workflow = Arc::new(Workflow::new(store.clone(), ledger.clone(), config));
    Harness {
        workflow,
        store,
        ledger,
    }
}

pub fn treasurer() -> Actor {
    Actor::new("TMSP_jean", Role::Treasurer)
}

pub fn regional() -> Actor {
    Actor::new("TrRegionMSP_marie", Role::RegionalTreasurer)
}

pub fn accountant() -> Actor {
    Actor::new("CpeMSP_pierre", Role::PrincipalAccountant)
}

pub fn payment_fields(amount: Decimal) -> PaymentFields {
    PaymentFields {
        beneficiary_code: "MAT001".to_string(),
        full_name: "A. Ben".to_string(),
        bank_info: "SGBS 0012".to_string(),
        amount: Amount::new(amount).unwrap(),
    }
}

pub fn revenue_fields(amount: Decimal) -> RevenueFields {
    RevenueFields {
        taxpayer_number: "CTB-001".to_string(),
        full_name: "SARL Delta".to_string(),
        tax_type: "patente".to_string(),
        amount: Amount::new(amount).unwrap(),
    }
}

impl Harness {
    pub async fn get(&self, id: &str) -> TransactionRecord {
        self.store.get(id).await.unwrap().unwrap()
    }

    /// Registered, not yet on the ledger
    pub async fn register(&self, amount: Decimal) -> TransactionRecord {
        self.workflow
            .register_payment(&treasurer(), payment_fields(amount))
            .await
            .unwrap()
    }

    /// On the ledger, waiting for the Regional Treasurer
    pub async fn submitted(&self, amount: Decimal) -> TransactionRecord {
        let record = self.register(amount).await;
        self.workflow.submit(&treasurer(), &record.id).await.unwrap();
        self.get(&record.id).await
    }

    /// Approved by the Regional Treasurer, waiting for the CPE
    pub async fn approved(&self, amount: Decimal) -> TransactionRecord {
        let record = self.submitted(amount).await;
        self.workflow
            .aggregate(&regional(), &record.id, TrDecision::Approved)
            .await
            .unwrap();
        self.get(&record.id).await
    }

    /// Fully validated
    pub async fn validated(&self, amount: Decimal) -> TransactionRecord {
        let record = self.approved(amount).await;
        self.workflow
            .cpe_validate(&accountant(), &record.id, CpeDecision::CpeApproved)
            .await
            .unwrap();
        self.get(&record.id).await
    }
}
