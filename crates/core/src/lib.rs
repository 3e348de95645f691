//! Tresor Core - Domain types
//!
//! This crate contains the types shared by every other Tresor crate:
//! - `Amount`: Non-negative decimal wrapper for treasury amounts
//! - `CorePayload`: Payment or revenue domain fields (immutable once on the ledger)
//! - `TransactionRecord`: The mutable, queryable record kept by the Record Store
//! - `SubmissionStatus` / `AggregationStatus`: Ledger submission and approval workflow stages
//! - `Role` / `Actor`: Typed caller identity, resolved once at authentication

pub mod amount;
pub mod payload;
pub mod record;
pub mod role;
pub mod status;

pub use amount::{Amount, AmountError};
pub use payload::{CorePayload, DomainFields, PayloadError, PaymentFields, RevenueFields, TransactionKind};
pub use record::{LedgerRef, RecordState, TransactionRecord};
pub use role::{Actor, Role, RoleError};
pub use status::{AggregationStatus, CpeDecision, SubmissionStatus, TrDecision};
