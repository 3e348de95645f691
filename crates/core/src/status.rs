//! Workflow statuses
//!
//! Two independent axes:
//! - `SubmissionStatus`: has the record been written to the ledger?
//! - `AggregationStatus`: where is it in the two-tier approval workflow?
//!
//! ```text
//! waiting_approval ──► approved ──► cpe_approved
//!        │                 │
//!        ▼                 ▼
//!     rejected        cpe_rejected
//! ```

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Ledger submission status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Created locally, not yet written to the ledger
    Pending,
    /// Written to the ledger; `ledger_ref` is populated
    Success,
    /// The ledger write failed
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Failed => "failed",
        }
    }
}

/// Approval workflow stage of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AggregationStatus {
    /// Awaiting the Regional Treasurer decision
    WaitingApproval,
    /// Aggregated by the Regional Treasurer, awaiting CPE validation
    Approved,
    /// Rejected by the Regional Treasurer (terminal)
    Rejected,
    /// Validated by the Principal State Accountant (terminal)
    CpeApproved,
    /// Rejected by the Principal State Accountant (terminal)
    CpeRejected,
}

impl AggregationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationStatus::WaitingApproval => "waiting_approval",
            AggregationStatus::Approved => "approved",
            AggregationStatus::Rejected => "rejected",
            AggregationStatus::CpeApproved => "cpe_approved",
            AggregationStatus::CpeRejected => "cpe_rejected",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AggregationStatus::Rejected | AggregationStatus::CpeApproved | AggregationStatus::CpeRejected
        )
    }

    /// Whether `self -> next` is an edge of the workflow graph
    pub fn can_transition_to(&self, next: AggregationStatus) -> bool {
        use AggregationStatus::*;
        matches!(
            (self, next),
            (WaitingApproval, Approved)
                | (WaitingApproval, Rejected)
                | (Approved, CpeApproved)
                | (Approved, CpeRejected)
        )
    }

    /// Status the Regional Treasurer stage left behind.
    ///
    /// The CPE stage overwrites `approved` with `cpe_*`; the TR decision
    /// that preceded it was necessarily `approved`.
    pub fn tr_stage(&self) -> Option<AggregationStatus> {
        match self {
            AggregationStatus::WaitingApproval => None,
            AggregationStatus::Approved
            | AggregationStatus::CpeApproved
            | AggregationStatus::CpeRejected => Some(AggregationStatus::Approved),
            AggregationStatus::Rejected => Some(AggregationStatus::Rejected),
        }
    }

    /// True for the two Regional Treasurer outcomes
    pub fn is_tr_decision(&self) -> bool {
        matches!(self, AggregationStatus::Approved | AggregationStatus::Rejected)
    }

    /// True for the two Principal Accountant outcomes
    pub fn is_cpe_decision(&self) -> bool {
        matches!(self, AggregationStatus::CpeApproved | AggregationStatus::CpeRejected)
    }
}

/// Decision a Regional Treasurer may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrDecision {
    Approved,
    Rejected,
}

impl From<TrDecision> for AggregationStatus {
    fn from(decision: TrDecision) -> Self {
        match decision {
            TrDecision::Approved => AggregationStatus::Approved,
            TrDecision::Rejected => AggregationStatus::Rejected,
        }
    }
}

/// Decision a Principal State Accountant may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CpeDecision {
    CpeApproved,
    CpeRejected,
}

impl From<CpeDecision> for AggregationStatus {
    fn from(decision: CpeDecision) -> Self {
        match decision {
            CpeDecision::CpeApproved => AggregationStatus::CpeApproved,
            CpeDecision::CpeRejected => AggregationStatus::CpeRejected,
        }
    }
}
