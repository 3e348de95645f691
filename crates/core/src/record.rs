//! Transaction record - the mutable, queryable side of a payment or revenue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{CorePayload, DomainFields, TransactionKind};
use crate::status::{AggregationStatus, SubmissionStatus};

/// Location of a committed ledger write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRef {
    pub transaction_id: String,
    pub block_number: u64,
    pub block_hash: String,
}

/// The two status axes a compare-and-set is conditioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordState {
    pub submission: SubmissionStatus,
    pub aggregation: AggregationStatus,
}

impl RecordState {
    pub fn new(submission: SubmissionStatus, aggregation: AggregationStatus) -> Self {
        Self {
            submission,
            aggregation,
        }
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.submission, self.aggregation)
    }
}

/// A payment or revenue as held by the Record Store
///
/// # Invariants
/// - `ledger_ref` is present iff `submission_status == Success`
/// - `aggregated_by`/`aggregated_at` are set iff a Regional Treasurer decided
/// - `cpe_validated_by`/`cpe_validated_at` are set iff a Principal Accountant decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    /// Correlates the record with its ledger history stream
    pub chain_id: String,
    pub payload: CorePayload,
    pub submission_status: SubmissionStatus,
    pub ledger_ref: Option<LedgerRef>,
    pub aggregation_status: AggregationStatus,
    pub aggregated_by: Option<String>,
    pub aggregated_at: Option<DateTime<Utc>>,
    /// Ledger tx id of the Regional Treasurer decision
    pub aggregation_tx_id: Option<String>,
    pub cpe_validated_by: Option<String>,
    pub cpe_validated_at: Option<DateTime<Utc>>,
    /// Ledger tx id of the Principal Accountant decision
    pub cpe_validation_tx_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a fresh record: not yet on the ledger, awaiting approval
    pub fn new(payload: CorePayload, created_by: impl Into<String>) -> Self {
        let id = format!(
            "{}-{}",
            match payload.kind() {
                TransactionKind::Payment => "PAY",
                TransactionKind::Revenue => "REV",
            },
            uuid::Uuid::new_v4().simple().to_string()[..16].to_uppercase()
        );

        Self {
            id,
            chain_id: uuid::Uuid::new_v4().to_string(),
            payload,
            submission_status: SubmissionStatus::Pending,
            ledger_ref: None,
            aggregation_status: AggregationStatus::WaitingApproval,
            aggregated_by: None,
            aggregated_at: None,
            aggregation_tx_id: None,
            cpe_validated_by: None,
            cpe_validated_at: None,
            cpe_validation_tx_id: None,
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.payload.kind()
    }

    pub fn state(&self) -> RecordState {
        RecordState::new(self.submission_status, self.aggregation_status)
    }

    /// Only ledger-submitted records may enter the approval workflow
    pub fn is_on_ledger(&self) -> bool {
        self.submission_status == SubmissionStatus::Success
    }

    /// Check the structural invariants of the record
    pub fn invariants_hold(&self) -> bool {
        let ledger_ok = self.ledger_ref.is_some() == self.is_on_ledger();

        let tr_decided = self.aggregated_by.is_some();
        let tr_ok = tr_decided == self.aggregated_at.is_some()
            && tr_decided == (self.aggregation_status != AggregationStatus::WaitingApproval);

        let cpe_decided = self.cpe_validated_by.is_some();
        let cpe_ok = cpe_decided == self.cpe_validated_at.is_some()
            && cpe_decided == self.aggregation_status.is_cpe_decision()
            && (!cpe_decided || tr_decided);

        ledger_ok && tr_ok && cpe_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::payload::RevenueFields;
    use rust_decimal_macros::dec;

    fn revenue_record() -> TransactionRecord {
        TransactionRecord::new(
            CorePayload::Revenue(RevenueFields {
                taxpayer_number: "CTB-001".to_string(),
                full_name: "SARL Delta".to_string(),
                tax_type: "patente".to_string(),
                amount: Amount::new(dec!(250000)).unwrap(),
            }),
            "TMSP_jean",
        )
    }

    #[test]
    fn test_new_record_defaults() {
        let record = revenue_record();
        assert!(record.id.starts_with("REV-"));
        let suffix = &record.id["REV-".len()..];
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(record.submission_status, SubmissionStatus::Pending);
        assert_eq!(record.aggregation_status, AggregationStatus::WaitingApproval);
        assert!(record.ledger_ref.is_none());
        assert!(!record.is_on_ledger());
        assert!(record.invariants_hold());
    }

    #[test]
    fn test_chain_ids_are_unique() {
        let a = revenue_record();
        let b = revenue_record();
        assert_ne!(a.chain_id, b.chain_id);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_invariant_ledger_ref_iff_success() {
        let mut record = revenue_record();
        record.submission_status = SubmissionStatus::Success;
        assert!(!record.invariants_hold());

        record.ledger_ref = Some(LedgerRef {
            transaction_id: "tx-1".to_string(),
            block_number: 1,
            block_hash: "abc".to_string(),
        });
        assert!(record.invariants_hold());
    }

    #[test]
    fn test_invariant_cpe_requires_tr() {
        let mut record = revenue_record();
        record.aggregation_status = AggregationStatus::CpeApproved;
        record.cpe_validated_by = Some("CpeMSP_pierre".to_string());
        record.cpe_validated_at = Some(Utc::now());
        assert!(!record.invariants_hold());

        record.aggregated_by = Some("TrRegionMSP_marie".to_string());
        record.aggregated_at = Some(Utc::now());
        assert!(record.invariants_hold());
    }

    #[test]
    fn test_state_display() {
        let record = revenue_record();
        assert_eq!(record.state().to_string(), "pending/waiting_approval");
    }
}
