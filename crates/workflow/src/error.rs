//! Workflow errors

use thiserror::Error;
use tresor_core::{PayloadError, Role};
use tresor_integrity::IntegrityError;
use tresor_ledger::LedgerError;
use tresor_store::StoreError;

/// Errors from workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Record {id} is {actual}, expected {expected}")]
    InvalidState {
        id: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Record {0} was changed concurrently; reload and retry")]
    StaleState(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Ledger rejected the write: {0}")]
    LedgerEndorsementFailed(String),

    #[error("Ledger did not answer within {timeout_ms}ms for record {id}; outcome unknown")]
    LedgerOutcomeUnknown { id: String, timeout_ms: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{actor} is not allowed to act as {required}")]
    Unauthorized { actor: String, required: Role },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Record store timeout after {0}ms")]
    StoreTimeout(u64),
}

/// Errors from the submission pipeline share the workflow taxonomy
pub type SubmissionError = WorkflowError;

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl WorkflowError {
    /// The action was not applied because the record moved or was busy
    pub fn is_conflict(&self) -> bool {
        matches!(self, WorkflowError::InvalidState { .. } | WorkflowError::StaleState(_))
    }

    /// The ledger refused or could not be reached; nothing was applied
    pub fn is_ledger_failure(&self) -> bool {
        matches!(
            self,
            WorkflowError::LedgerUnavailable(_) | WorkflowError::LedgerEndorsementFailed(_)
        )
    }
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EndorsementFailed(msg) => WorkflowError::LedgerEndorsementFailed(msg),
            LedgerError::Unavailable(msg) => WorkflowError::LedgerUnavailable(msg),
            other => WorkflowError::LedgerUnavailable(other.to_string()),
        }
    }
}

impl From<PayloadError> for WorkflowError {
    fn from(err: PayloadError) -> Self {
        WorkflowError::InvalidPayload(err.to_string())
    }
}

impl From<IntegrityError> for WorkflowError {
    fn from(err: IntegrityError) -> Self {
        match err {
            IntegrityError::HistoryNotFound(id) => {
                WorkflowError::NotFound(format!("ledger history of record {}", id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tresor_core::Amount;

    #[test]
    fn test_ledger_errors_map_by_variant() {
        let err: WorkflowError = LedgerError::EndorsementFailed("policy".to_string()).into();
        assert!(matches!(err, WorkflowError::LedgerEndorsementFailed(_)));

        // Message content plays no part in the mapping
        let err: WorkflowError = LedgerError::Unavailable("failed to endorse".to_string()).into();
        assert!(matches!(err, WorkflowError::LedgerUnavailable(_)));

        let err: WorkflowError = LedgerError::LockPoisoned.into();
        assert!(err.is_ledger_failure());
    }

    #[test]
    fn test_payload_error_is_invalid_payload() {
        let err: WorkflowError = PayloadError::NonPositiveAmount(Amount::ZERO).into();
        assert!(matches!(err, WorkflowError::InvalidPayload(_)));
    }

    #[test]
    fn test_conflict_classification() {
        assert!(WorkflowError::StaleState("PAY-1".to_string()).is_conflict());
        assert!(WorkflowError::InvalidState {
            id: "PAY-1".to_string(),
            expected: "waiting_approval",
            actual: "approved".to_string(),
        }
        .is_conflict());
        assert!(!WorkflowError::NotFound("PAY-1".to_string()).is_conflict());
    }
}
