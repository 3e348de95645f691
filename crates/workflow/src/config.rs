//! Workflow configuration
//!
//! Timeouts and limits are read from a JSON file; every field is optional.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Caller timeout for ledger writes and reads
    #[serde(default = "default_ledger_timeout_ms")]
    pub ledger_timeout_ms: u64,

    /// Timeout for Record Store calls
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Largest batch accepted by the batch operations
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Also check the hash links of the ledger history during verification
    #[serde(default = "default_verify_ledger_chain")]
    pub verify_ledger_chain: bool,
}

fn default_ledger_timeout_ms() -> u64 {
    30_000
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_max_batch_size() -> usize {
    500
}

fn default_verify_ledger_chain() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            ledger_timeout_ms: default_ledger_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            max_batch_size: default_max_batch_size(),
            verify_ledger_chain: default_verify_ledger_chain(),
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
