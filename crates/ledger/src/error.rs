//! Ledger errors

use thiserror::Error;

/// Errors surfaced by a ledger implementation.
///
/// The first two variants are the failure modes the ledger network itself
/// distinguishes: the write never reached the network, or it reached it and
/// was refused by the endorsement policy.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger endorsement failed: {0}")]
    EndorsementFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger state lock poisoned")]
    LockPoisoned,

    #[error("Ledger task failed: {0}")]
    Task(String),
}

impl LedgerError {
    /// The write was refused by policy rather than lost in transit
    pub fn is_endorsement_failure(&self) -> bool {
        matches!(self, LedgerError::EndorsementFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endorsement_classification() {
        assert!(LedgerError::EndorsementFailed("policy".to_string()).is_endorsement_failure());
        assert!(!LedgerError::Unavailable("peer down".to_string()).is_endorsement_failure());
        assert!(!LedgerError::LockPoisoned.is_endorsement_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Ledger unavailable: connection refused");
    }
}
