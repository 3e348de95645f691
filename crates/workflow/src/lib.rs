//! Tresor Workflow - Submission pipeline and approval state machine
//!
//! ```text
//! register ──► submit ──► aggregate (TR) ──► cpe_validate (CPE)
//!  pending     success     approved/rejected   cpe_approved/cpe_rejected
//! ```
//!
//! Every state change follows the same order:
//! 1. Read the record and check the precondition
//! 2. Write the event to the ledger
//! 3. Compare-and-set the record against the state read in step 1
//!
//! Local state is only committed after the ledger acknowledged the write.
//! A ledger call that times out leaves the outcome unknown; the caller
//! reconciles through `verify`.

pub mod aggregation;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod inflight;
pub mod query;
pub mod registration;
pub mod submission;

#[cfg(test)]
pub(crate) mod fixtures;

pub use batch::{BatchFailure, BatchReport};
pub use config::WorkflowConfig;
pub use engine::Workflow;
pub use error::{SubmissionError, WorkflowError, WorkflowResult};
pub use query::{AggregationCounts, DashboardStats, LedgerAudit, SubmissionCounts};
