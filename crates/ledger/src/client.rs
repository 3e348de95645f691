//! Ledger client contract

use async_trait::async_trait;
use tresor_core::LedgerRef;

use crate::entry::{LedgerEntry, LedgerPayload};
use crate::error::LedgerError;

/// Append-only, per-record history store.
///
/// A successful `write` is durable and immutable. `read_history` returns a
/// chain's entries in commit order; the first entry is the creation write.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append an entry to the chain identified by `chain_id`
    async fn write(&self, chain_id: &str, payload: LedgerPayload) -> Result<LedgerRef, LedgerError>;

    /// All entries of one chain, oldest first (empty if the chain is unknown)
    async fn read_history(&self, chain_id: &str) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Every entry of every chain in commit order
    async fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Highest committed block, 0 for an empty ledger
    async fn height(&self) -> Result<u64, LedgerError> {
        Ok(self
            .read_all()
            .await?
            .last()
            .map(|e| e.block_number)
            .unwrap_or(0))
    }
}
