//! Record mutations and queries

use chrono::{DateTime, Utc};
use tresor_core::{
    AggregationStatus, LedgerRef, SubmissionStatus, TransactionKind, TransactionRecord,
};

/// A single workflow mutation, applied atomically by `compare_and_set`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    /// Creation write committed on the ledger
    Submitted { ledger_ref: LedgerRef },
    /// Creation write refused or lost
    SubmissionFailed,
    /// Regional Treasurer decision committed on the ledger
    Aggregated {
        status: AggregationStatus,
        by: String,
        at: DateTime<Utc>,
        tx_id: String,
    },
    /// Principal Accountant decision committed on the ledger
    CpeValidated {
        status: AggregationStatus,
        by: String,
        at: DateTime<Utc>,
        tx_id: String,
    },
}

impl RecordPatch {
    pub fn apply(&self, record: &mut TransactionRecord) {
        match self {
            RecordPatch::Submitted { ledger_ref } => {
                record.submission_status = SubmissionStatus::Success;
                record.ledger_ref = Some(ledger_ref.clone());
            }
            RecordPatch::SubmissionFailed => {
                record.submission_status = SubmissionStatus::Failed;
                record.ledger_ref = None;
            }
            RecordPatch::Aggregated { status, by, at, tx_id } => {
                record.aggregation_status = *status;
                record.aggregated_by = Some(by.clone());
                record.aggregated_at = Some(*at);
                record.aggregation_tx_id = Some(tx_id.clone());
            }
            RecordPatch::CpeValidated { status, by, at, tx_id } => {
                record.aggregation_status = *status;
                record.cpe_validated_by = Some(by.clone());
                record.cpe_validated_at = Some(*at);
                record.cpe_validation_tx_id = Some(tx_id.clone());
            }
        }
    }
}

/// Conjunctive filter over records; `None` matches anything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub kind: Option<TransactionKind>,
    pub submission: Option<SubmissionStatus>,
    pub aggregation: Option<AggregationStatus>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn submission(mut self, status: SubmissionStatus) -> Self {
        self.submission = Some(status);
        self
    }

    pub fn aggregation(mut self, status: AggregationStatus) -> Self {
        self.aggregation = Some(status);
        self
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.kind.map_or(true, |k| record.kind() == k)
            && self.submission.map_or(true, |s| record.submission_status == s)
            && self.aggregation.map_or(true, |a| record.aggregation_status == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tresor_core::{Amount, CorePayload, PaymentFields};

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            CorePayload::Payment(PaymentFields {
                beneficiary_code: "MAT001".to_string(),
                full_name: "A. Ben".to_string(),
                bank_info: "SGBS 001".to_string(),
                amount: Amount::new(dec!(100000)).unwrap(),
            }),
            "TMSP_jean",
        )
    }

    #[test]
    fn test_patches_keep_invariants() {
        let mut record = record();

        RecordPatch::Submitted {
            ledger_ref: LedgerRef {
                transaction_id: "tx-1".to_string(),
                block_number: 1,
                block_hash: "h1".to_string(),
            },
        }
        .apply(&mut record);
        assert!(record.invariants_hold());

        RecordPatch::Aggregated {
            status: AggregationStatus::Approved,
            by: "TrRegionMSP_marie".to_string(),
            at: Utc::now(),
            tx_id: "tx-2".to_string(),
        }
        .apply(&mut record);
        assert!(record.invariants_hold());
        assert_eq!(record.aggregation_tx_id.as_deref(), Some("tx-2"));

        RecordPatch::CpeValidated {
            status: AggregationStatus::CpeApproved,
            by: "CpeMSP_pierre".to_string(),
            at: Utc::now(),
            tx_id: "tx-3".to_string(),
        }
        .apply(&mut record);
        assert!(record.invariants_hold());
        assert_eq!(record.aggregation_status, AggregationStatus::CpeApproved);
    }

    #[test]
    fn test_filter_matching() {
        let record = record();
        assert!(RecordFilter::all().matches(&record));
        assert!(RecordFilter::all().kind(TransactionKind::Payment).matches(&record));
        assert!(!RecordFilter::all().kind(TransactionKind::Revenue).matches(&record));
        assert!(!RecordFilter::all()
            .submission(SubmissionStatus::Success)
            .matches(&record));
        assert!(RecordFilter::all()
            .submission(SubmissionStatus::Pending)
            .aggregation(AggregationStatus::WaitingApproval)
            .matches(&record));
    }
}
