//! JSONL ledger - append-only file, one sealed entry per line

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tresor_core::LedgerRef;

use crate::client::Ledger;
use crate::entry::{LedgerEntry, LedgerPayload};
use crate::error::LedgerError;

struct Head {
    file: File,
    chains: HashMap<String, (u64, String)>,
    height: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

struct Shared {
    path: PathBuf,
    head: Mutex<Head>,
}

/// File-backed ledger
///
/// Chain heads and the block height are rebuilt from the file on open, so
/// a reopened ledger keeps extending the same chains. File I/O runs on the
/// blocking pool.
pub struct JsonlLedger {
    shared: Arc<Shared>,
}

impl JsonlLedger {
    /// Open (or create) the ledger file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut chains = HashMap::new();
        let mut height = 0;
        for entry in read_file(&path)? {
            height = height.max(entry.block_number);
            chains.insert(entry.chain_id.clone(), (entry.sequence, entry.hash.clone()));
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), height, chains = chains.len(), "Ledger opened");

        Ok(Self {
            shared: Arc::new(Shared {
                path,
                head: Mutex::new(Head {
                    file,
                    chains,
                    height,
                    poisoned: false,
                }),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    async fn run<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(&Shared) -> Result<T, LedgerError> + Send + 'static,
    {
        let shared = self.shared.clone();
        tokio::task::spawn_blocking(move || f(&shared))
            .await
            .map_err(|e| LedgerError::Task(e.to_string()))?
    }
}

/// An append-only log file that can be cut back after a failed write
trait LogFile: Write {
    fn len(&self) -> io::Result<u64>;

    fn sync(&mut self) -> io::Result<()>;

    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Append `line` in full or leave the file as it was.
///
/// Returns the write error; the inner result is the outcome of the
/// rollback when the write failed.
fn append_line<F: LogFile>(file: &mut F, line: &[u8]) -> Result<(), (io::Error, io::Result<()>)> {
    let len = file.len().map_err(|e| (e, Ok(())))?;
    match file.write_all(line).and_then(|_| file.sync()) {
        Ok(()) => Ok(()),
        Err(e) => Err((e, file.truncate(len))),
    }
}

fn read_file(path: &Path) -> Result<Vec<LedgerEntry>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[async_trait]
impl Ledger for JsonlLedger {
    async fn write(&self, chain_id: &str, payload: LedgerPayload) -> Result<LedgerRef, LedgerError> {
        let chain_id = chain_id.to_string();
        self.run(move |shared| {
            let mut head = shared.head.lock().map_err(|_| LedgerError::LockPoisoned)?;
            if head.poisoned {
                return Err(LedgerError::Unavailable(format!(
                    "ledger file {} needs repair",
                    shared.path.display()
                )));
            }

            let block_number = head.height + 1;
            let prev = head.chains.get(&chain_id).map(|(s, h)| (*s, h.as_str()));
            let entry = LedgerEntry::seal(&chain_id, payload, prev, block_number);

            let mut line = serde_json::to_string(&entry)?;
            line.push('\n');
            if let Err((err, rollback)) = append_line(&mut head.file, line.as_bytes()) {
                if let Err(rollback_err) = rollback {
                    head.poisoned = true;
                    tracing::error!(
                        path = %shared.path.display(),
                        error = %rollback_err,
                        "Could not roll back failed ledger append"
                    );
                }
                return Err(err.into());
            }

            head.height = block_number;
            head.chains
                .insert(chain_id.clone(), (entry.sequence, entry.hash.clone()));

            tracing::debug!(
                chain_id = %chain_id,
                event = %entry.event,
                block = block_number,
                "Ledger entry committed"
            );
            Ok(entry.ledger_ref())
        })
        .await
    }

    async fn read_history(&self, chain_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let chain_id = chain_id.to_string();
        self.run(move |shared| {
            // Hold the lock so a concurrent write is never observed half-written
            let _head = shared.head.lock().map_err(|_| LedgerError::LockPoisoned)?;
            Ok(read_file(&shared.path)?
                .into_iter()
                .filter(|e| e.chain_id == chain_id)
                .collect())
        })
        .await
    }

    async fn read_all(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.run(|shared| {
            let _head = shared.head.lock().map_err(|_| LedgerError::LockPoisoned)?;
            read_file(&shared.path)
        })
        .await
    }

    async fn height(&self) -> Result<u64, LedgerError> {
        let head = self.shared.head.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(head.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LedgerEvent;
    use crate::hash::{audit_log, verify_chain};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;
    use tresor_core::{Amount, CorePayload, RevenueFields, TransactionRecord};

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            CorePayload::Revenue(RevenueFields {
                taxpayer_number: "CTB-001".to_string(),
                full_name: "SARL Delta".to_string(),
                tax_type: "patente".to_string(),
                amount: Amount::new(dec!(250000.50)).unwrap(),
            }),
            "TMSP_jean",
        )
    }

    #[tokio::test]
    async fn test_append_and_read() {
        let dir = tempdir().unwrap();
        let ledger = JsonlLedger::open(dir.path().join("ledger").join("ledger.jsonl")).unwrap();
        let record = record();

        ledger.write(&record.chain_id, LedgerPayload::from(&record)).await.unwrap();
        ledger
            .write(&record.chain_id, LedgerPayload::new(LedgerEvent::Aggregated, &record))
            .await
            .unwrap();

        let history = ledger.read_history(&record.chain_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].record.payload, record.payload);
        assert!(verify_chain(&history).is_ok());
        assert_eq!(ledger.height().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reopen_extends_chains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let a = record();
        let b = record();

        {
            let ledger = JsonlLedger::open(&path).unwrap();
            ledger.write(&a.chain_id, LedgerPayload::from(&a)).await.unwrap();
            ledger.write(&b.chain_id, LedgerPayload::from(&b)).await.unwrap();
        }

        let ledger = JsonlLedger::open(&path).unwrap();
        assert_eq!(ledger.height().await.unwrap(), 2);

        let reference = ledger
            .write(&a.chain_id, LedgerPayload::new(LedgerEvent::Aggregated, &a))
            .await
            .unwrap();
        assert_eq!(reference.block_number, 3);

        let history = ledger.read_history(&a.chain_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sequence, 2);
        assert!(verify_chain(&history).is_ok());

        let all = ledger.read_all().await.unwrap();
        let audit = audit_log(&all);
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|c| c.is_intact()));
    }

    #[tokio::test]
    async fn test_corrupt_line_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        fs::write(&path, "{not json}\n").unwrap();

        assert!(matches!(
            JsonlLedger::open(&path),
            Err(LedgerError::Serialization(_))
        ));
    }

    /// In-memory log whose writes fail after `budget` bytes
    struct FlakyLog {
        data: Vec<u8>,
        budget: usize,
        fail_sync: bool,
    }

    impl Write for FlakyLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogFile for FlakyLog {
        fn len(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync {
                Err(io::Error::new(io::ErrorKind::Other, "EIO"))
            } else {
                Ok(())
            }
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_leaves_log_unchanged() {
        let mut log = FlakyLog {
            data: b"first\n".to_vec(),
            budget: 4,
            fail_sync: false,
        };
        let (err, rollback) = append_line(&mut log, b"second line\n").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(rollback.is_ok());
        assert_eq!(log.data, b"first\n");

        // Written in full but not durable: still rolled back
        log.budget = 64;
        log.fail_sync = true;
        assert!(append_line(&mut log, b"second\n").is_err());
        assert_eq!(log.data, b"first\n");

        log.fail_sync = false;
        append_line(&mut log, b"second\n").unwrap();
        assert_eq!(log.data, b"first\nsecond\n");
    }

    #[tokio::test]
    async fn test_poisoned_ledger_refuses_writes() {
        let dir = tempdir().unwrap();
        let ledger = JsonlLedger::open(dir.path().join("ledger.jsonl")).unwrap();
        let record = record();
        ledger.shared.head.lock().unwrap().poisoned = true;

        let err = ledger
            .write(&record.chain_id, LedgerPayload::from(&record))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));
        assert!(ledger.read_all().await.unwrap().is_empty());
    }
}
