//! In-memory ledger for testing
//!
//! Behaves like the real ledger but keeps everything in process memory and
//! lets tests inject the failure modes a ledger network exhibits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tresor_core::LedgerRef;

use crate::client::Ledger;
use crate::entry::{LedgerEntry, LedgerPayload};
use crate::error::LedgerError;

/// Failure to inject on writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable; nothing is committed
    Unavailable,
    /// Endorsement policy refused the write; nothing is committed
    EndorsementFailed,
    /// The write never returns; nothing is committed
    Hang,
    /// The write is committed but the caller never hears back
    CommitThenHang,
}

#[derive(Debug, Clone)]
struct Injection {
    kind: FailureKind,
    /// Restrict the failure to one chain
    chain_id: Option<String>,
}

#[derive(Default)]
struct State {
    entries: Vec<LedgerEntry>,
    heads: HashMap<String, (u64, String)>,
}

/// Mock ledger
pub struct MemoryLedger {
    state: Mutex<State>,
    injection: Mutex<Option<Injection>>,
    write_attempts: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            injection: Mutex::new(None),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent write fail with `kind`
    pub fn fail_writes(&self, kind: FailureKind) {
        if let Ok(mut injection) = self.injection.lock() {
            *injection = Some(Injection {
                kind,
                chain_id: None,
            });
        }
    }

    /// Make writes to one chain fail with `kind`
    pub fn fail_writes_for(&self, chain_id: &str, kind: FailureKind) {
        if let Ok(mut injection) = self.injection.lock() {
            *injection = Some(Injection {
                kind,
                chain_id: Some(chain_id.to_string()),
            });
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut injection) = self.injection.lock() {
            *injection = None;
        }
    }

    /// Number of `write` calls, successful or not
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite a committed entry in place, bypassing the hash chain
    pub fn tamper(&self, chain_id: &str, sequence: u64, f: impl FnOnce(&mut LedgerEntry)) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        match state
            .entries
            .iter_mut()
            .find(|e| e.chain_id == chain_id && e.sequence == sequence)
        {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }

    fn injected_failure(&self, chain_id: &str) -> Result<Option<FailureKind>, LedgerError> {
        let injection = self.injection.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(injection.as_ref().and_then(|inj| match &inj.chain_id {
            Some(target) if target != chain_id => None,
            _ => Some(inj.kind),
        }))
    }

    fn commit(&self, chain_id: &str, payload: LedgerPayload) -> Result<LedgerRef, LedgerError> {
        let mut state = self.state.lock().map_err(|_| LedgerError::LockPoisoned)?;
        let block_number = state.entries.len() as u64 + 1;
        let head = state.heads.get(chain_id).map(|(s, h)| (*s, h.as_str()));
        let entry = LedgerEntry::seal(chain_id, payload, head, block_number);

        state
            .heads
            .insert(chain_id.to_string(), (entry.sequence, entry.hash.clone()));
        let reference = entry.ledger_ref();
        state.entries.push(entry);
        Ok(reference)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn write(&self, chain_id: &str, payload: LedgerPayload) -> Result<LedgerRef, LedgerError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);

        match self.injected_failure(chain_id)? {
            None => self.commit(chain_id, payload),
            Some(FailureKind::Unavailable) => Err(LedgerError::Unavailable(
                "Transaction failed: peer unreachable".to_string(),
            )),
            Some(FailureKind::EndorsementFailed) => Err(LedgerError::EndorsementFailed(
                "failed to endorse transaction".to_string(),
            )),
            Some(FailureKind::Hang) => {
                std::future::pending::<()>().await;
                Err(LedgerError::Unavailable("unreachable".to_string()))
            }
            Some(FailureKind::CommitThenHang) => {
                self.commit(chain_id, payload)?;
                std::future::pending::<()>().await;
                Err(LedgerError::Unavailable("unreachable".to_string()))
            }
        }
    }

    async fn read_history(&self, chain_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.chain_id == chain_id)
            .cloned()
            .collect())
    }

    async fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.entries.clone())
    }
}
