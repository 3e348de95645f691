//! Verification report

use serde::{Deserialize, Serialize};

/// A stage whose record fields diverge from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrityIssue {
    #[serde(rename = "core data altered")]
    CoreDataAltered,
    #[serde(rename = "TR aggregation altered")]
    TrAggregationAltered,
    #[serde(rename = "CPE validation altered")]
    CpeValidationAltered,
    /// The ledger history itself fails its hash-chain check
    #[serde(rename = "ledger history broken")]
    LedgerChainBroken,
}

impl IntegrityIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityIssue::CoreDataAltered => "core data altered",
            IntegrityIssue::TrAggregationAltered => "TR aggregation altered",
            IntegrityIssue::CpeValidationAltered => "CPE validation altered",
            IntegrityIssue::LedgerChainBroken => "ledger history broken",
        }
    }
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub record_id: String,
    pub all_valid: bool,
    pub issues: Vec<IntegrityIssue>,
    /// Ledger entries examined
    pub history_len: usize,
}

impl VerificationReport {
    pub fn new(record_id: impl Into<String>, issues: Vec<IntegrityIssue>, history_len: usize) -> Self {
        Self {
            record_id: record_id.into(),
            all_valid: issues.is_empty(),
            issues,
            history_len,
        }
    }

    pub fn has(&self, issue: IntegrityIssue) -> bool {
        self.issues.contains(&issue)
    }
}
