//! Integrity verifier

use thiserror::Error;
use tresor_core::TransactionRecord;
use tresor_ledger::{verify_chain, LedgerEntry};

use crate::digest::{core_digest, cpe_digest, tr_digest};
use crate::report::{IntegrityIssue, VerificationReport};

/// Why a verification could not be carried out
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("No ledger history for record {0}")]
    HistoryNotFound(String),
}

/// Compares a record with the ledger history the caller fetched for it
#[derive(Debug, Clone, Copy)]
pub struct IntegrityVerifier {
    check_chain: bool,
}

impl Default for IntegrityVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrityVerifier {
    pub fn new() -> Self {
        Self { check_chain: true }
    }

    /// Also check the hash links of the history being compared against
    pub fn with_chain_check(mut self, enabled: bool) -> Self {
        self.check_chain = enabled;
        self
    }

    /// Compare a record against its ledger history, oldest entry first
    pub fn check(
        &self,
        record: &TransactionRecord,
        history: &[LedgerEntry],
    ) -> Result<VerificationReport, IntegrityError> {
        let creation = history
            .first()
            .ok_or_else(|| IntegrityError::HistoryNotFound(record.id.clone()))?;

        let mut issues = Vec::new();

        if self.check_chain {
            if let Err(e) = verify_chain(history) {
                tracing::warn!(record_id = %record.id, error = %e, "Ledger history fails chain check");
                issues.push(IntegrityIssue::LedgerChainBroken);
            }
        }

        if core_digest(&creation.record.payload) != core_digest(&record.payload) {
            issues.push(IntegrityIssue::CoreDataAltered);
        }

        // The record's status is overwritten by the CPE stage, so compare
        // the TR decision it must have passed through.
        let ledger_tr = history
            .iter()
            .find(|e| e.record.aggregation_status.is_tr_decision());
        let record_tr = record.aggregation_status.tr_stage();
        let tr_matches = match ledger_tr {
            Some(entry) => {
                tr_digest(Some(entry.record.aggregation_status), entry.record.aggregated_by.as_deref())
                    == tr_digest(record_tr, record.aggregated_by.as_deref())
            }
            // No TR decision on the ledger: the record must not claim one
            None => record_tr.is_none() && record.aggregated_by.is_none(),
        };
        if !tr_matches {
            issues.push(IntegrityIssue::TrAggregationAltered);
        }

        let ledger_cpe = history
            .iter()
            .find(|e| e.record.aggregation_status.is_cpe_decision());
        let record_cpe = Some(record.aggregation_status).filter(|s| s.is_cpe_decision());
        let cpe_matches = match ledger_cpe {
            Some(entry) => {
                cpe_digest(Some(entry.record.aggregation_status), entry.record.cpe_validated_by.as_deref())
                    == cpe_digest(record_cpe, record.cpe_validated_by.as_deref())
            }
            None => record_cpe.is_none() && record.cpe_validated_by.is_none(),
        };
        if !cpe_matches {
            issues.push(IntegrityIssue::CpeValidationAltered);
        }

        let report = VerificationReport::new(&record.id, issues, history.len());
        if report.all_valid {
            tracing::debug!(record_id = %record.id, entries = history.len(), "Record matches ledger");
        } else {
            let issues: Vec<_> = report.issues.iter().map(|i| i.as_str()).collect();
            tracing::warn!(record_id = %record.id, issues = ?issues, "Record diverges from ledger");
        }
        Ok(report)
    }
}
