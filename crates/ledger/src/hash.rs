//! Hash chain utilities for ledger integrity

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tresor_core::DomainFields;

use crate::entry::{LedgerEntry, GENESIS};

/// Length-prefixed so that bytes cannot shift between adjacent fields
fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_opt(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            update_field(hasher, v);
        }
        None => hasher.update([0u8]),
    }
}

/// Calculate SHA256 hash of entry content (excluding the hash field itself)
pub fn calculate_entry_hash(entry: &LedgerEntry) -> String {
    let mut hasher = Sha256::new();

    hasher.update(entry.sequence.to_le_bytes());
    update_field(&mut hasher, &entry.chain_id);
    update_field(&mut hasher, &entry.prev_hash);
    update_field(&mut hasher, &entry.timestamp.to_rfc3339());
    update_field(&mut hasher, &entry.event.to_string());
    update_field(&mut hasher, &entry.transaction_id);
    hasher.update(entry.block_number.to_le_bytes());

    let record = &entry.record;
    update_field(&mut hasher, &record.record_id);
    update_field(&mut hasher, record.payload.kind().as_str());
    let fields = record.payload.canonical_fields();
    hasher.update((fields.len() as u64).to_le_bytes());
    for (name, value) in &fields {
        update_field(&mut hasher, name);
        update_field(&mut hasher, value);
    }
    update_field(&mut hasher, record.aggregation_status.as_str());
    update_opt(&mut hasher, record.aggregated_by.as_deref());
    update_opt(&mut hasher, record.aggregated_at.map(|t| t.to_rfc3339()).as_deref());
    update_opt(&mut hasher, record.cpe_validated_by.as_deref());
    update_opt(&mut hasher, record.cpe_validated_at.map(|t| t.to_rfc3339()).as_deref());
    update_field(&mut hasher, &record.created_by);
    update_field(&mut hasher, &record.created_at.to_rfc3339());

    hex::encode(hasher.finalize())
}

/// Verify the hash chain of a single record's history
pub fn verify_chain(entries: &[LedgerEntry]) -> Result<(), ChainError> {
    if entries.is_empty() {
        return Ok(());
    }

    let mut prev_hash = GENESIS.to_string();

    for (i, entry) in entries.iter().enumerate() {
        if entry.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: entry.sequence,
                expected: prev_hash,
                actual: entry.prev_hash.clone(),
            });
        }

        let calculated = calculate_entry_hash(entry);
        if entry.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: entry.sequence,
                expected: calculated,
                actual: entry.hash.clone(),
            });
        }

        let expected_seq = if i == 0 { 1 } else { entries[i - 1].sequence + 1 };
        if entry.sequence != expected_seq {
            return Err(ChainError::InvalidSequence {
                expected: expected_seq,
                actual: entry.sequence,
            });
        }

        prev_hash = entry.hash.clone();
    }

    Ok(())
}

/// Outcome of checking one chain during an audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAudit {
    pub chain_id: String,
    pub entries: usize,
    pub error: Option<ChainError>,
}

impl ChainAudit {
    pub fn is_intact(&self) -> bool {
        self.error.is_none()
    }
}

/// Verify every chain in a full ledger dump.
///
/// Entries are grouped by `chain_id`, keeping commit order inside each
/// chain. One result per chain, sorted by chain id.
pub fn audit_log(entries: &[LedgerEntry]) -> Vec<ChainAudit> {
    let mut chains: BTreeMap<&str, Vec<LedgerEntry>> = BTreeMap::new();
    for entry in entries {
        chains
            .entry(entry.chain_id.as_str())
            .or_default()
            .push(entry.clone());
    }

    chains
        .into_iter()
        .map(|(chain_id, chain)| ChainAudit {
            chain_id: chain_id.to_string(),
            entries: chain.len(),
            error: verify_chain(&chain).err(),
        })
        .collect()
}

/// Errors in hash chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },
    InvalidSequence {
        expected: u64,
        actual: u64,
    },
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::BrokenLink {
                sequence,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Broken link at seq {}: expected prev_hash '{}', got '{}'",
                    sequence, expected, actual
                )
            }
            ChainError::InvalidHash {
                sequence,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Invalid hash at seq {}: expected '{}', got '{}'",
                    sequence, expected, actual
                )
            }
            ChainError::InvalidSequence { expected, actual } => {
                write!(f, "Invalid sequence: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{LedgerEvent, LedgerPayload};
    use rust_decimal_macros::dec;
    use tresor_core::{Amount, CorePayload, RevenueFields, TransactionRecord};

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            CorePayload::Revenue(RevenueFields {
                taxpayer_number: "CTB-001".to_string(),
                full_name: "SARL Delta".to_string(),
                tax_type: "patente".to_string(),
                amount: Amount::new(dec!(250000)).unwrap(),
            }),
            "TMSP_jean",
        )
    }

    fn chain(record: &TransactionRecord, len: u64) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = Vec::new();
        for block in 1..=len {
            let head = entries.last().map(|e| (e.sequence, e.hash.as_str()));
            let entry = LedgerEntry::seal(
                &record.chain_id,
                LedgerPayload::new(LedgerEvent::Created, record),
                head,
                block,
            );
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn test_hash_deterministic() {
        let entries = chain(&record(), 1);
        assert_eq!(calculate_entry_hash(&entries[0]), calculate_entry_hash(&entries[0]));
        assert_eq!(entries[0].hash, calculate_entry_hash(&entries[0]));
    }

    #[test]
    fn test_hash_separates_adjacent_fields() {
        let entry = chain(&record(), 1).remove(0);

        // Move the first byte of prev_hash onto the end of chain_id
        let mut shifted = entry.clone();
        shifted.chain_id.push_str(&entry.prev_hash[..1]);
        shifted.prev_hash = entry.prev_hash[1..].to_string();
        assert_ne!(calculate_entry_hash(&shifted), entry.hash);
    }

    #[test]
    fn test_verify_valid_chain() {
        let entries = chain(&record(), 3);
        assert!(verify_chain(&entries).is_ok());
    }

    #[test]
    fn test_verify_broken_chain() {
        let mut entries = chain(&record(), 2);
        entries[1].prev_hash = "wrong_hash".to_string();
        assert!(matches!(verify_chain(&entries), Err(ChainError::BrokenLink { .. })));
    }

    #[test]
    fn test_tampered_snapshot_detected() {
        let mut entries = chain(&record(), 2);
        *entries[0].record.payload.amount_mut() = Amount::new(dec!(1)).unwrap();
        assert!(matches!(
            verify_chain(&entries),
            Err(ChainError::InvalidHash { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_audit_interleaved_chains() {
        let a = chain(&record(), 2);
        let b = chain(&record(), 3);
        let mixed = vec![a[0].clone(), b[0].clone(), b[1].clone(), a[1].clone(), b[2].clone()];

        let audit = audit_log(&mixed);
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|c| c.is_intact()));
        assert_eq!(audit.iter().map(|c| c.entries).sum::<usize>(), 5);

        let mut tampered = mixed.clone();
        tampered[3].record.aggregated_by = Some("intruder".to_string());
        let audit = audit_log(&tampered);
        let broken: Vec<_> = audit.iter().filter(|c| !c.is_intact()).collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].chain_id, a[0].chain_id);
        assert!(matches!(broken[0].error, Some(ChainError::InvalidHash { sequence: 2, .. })));
    }
}
