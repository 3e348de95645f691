//! Tresor Integrity - Record Store vs. Ledger reconciliation
//!
//! The Record Store is mutable and the ledger is not. For each workflow
//! milestone the verifier digests the same field subset from the ledger
//! entry that recorded it and from the current record, and reports every
//! stage whose digests differ.
//!
//! | stage | ledger entry | fields |
//! |---|---|---|
//! | core | first (creation) | domain payload |
//! | TR | first with status `approved`/`rejected` | status, aggregated_by |
//! | CPE | first with status `cpe_*` | status, cpe_validated_by |

pub mod digest;
pub mod report;
pub mod verifier;

pub use digest::{core_digest, cpe_digest, tr_digest};
pub use report::{IntegrityIssue, VerificationReport};
pub use verifier::{IntegrityError, IntegrityVerifier};
