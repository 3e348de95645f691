//! Application context - wires everything together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tresor_ledger::JsonlLedger;
use tresor_store::SqliteRecordStore;
use tresor_workflow::{Workflow, WorkflowConfig};

/// Application context over a data directory
///
/// Layout:
/// - `records.db`: SQLite Record Store
/// - `ledger/ledger.jsonl`: append-only ledger
pub struct AppContext {
    pub workflow: Workflow,
    pub store: Arc<SqliteRecordStore>,
    pub ledger: Arc<JsonlLedger>,
    data_path: PathBuf,
}

impl AppContext {
    /// Open the collaborators under `data_path` with the default configuration
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::with_config(data_path, WorkflowConfig::default())
    }

    pub fn with_config(data_path: impl AsRef<Path>, config: WorkflowConfig) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let store = Arc::new(SqliteRecordStore::new(data_path.join("records.db"))?);
        let ledger = Arc::new(JsonlLedger::open(data_path.join("ledger").join("ledger.jsonl"))?);
        let workflow = Workflow::new(store.clone(), ledger.clone(), config);

        tracing::debug!(data = %data_path.display(), "Application context ready");

        Ok(Self {
            workflow,
            store,
            ledger,
            data_path,
        })
    }

    /// Get data directory path
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Get ledger file path
    pub fn ledger_path(&self) -> &Path {
        self.ledger.path()
    }
}
