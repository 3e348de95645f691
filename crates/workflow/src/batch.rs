//! Batch outcome reporting
//!
//! A batch is not a transaction: each item runs on its own and the report
//! lists which ids went through and why the others did not.

use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug)]
pub struct BatchFailure {
    pub id: String,
    pub error: WorkflowError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one item
    pub fn push<T>(&mut self, id: &str, outcome: WorkflowResult<T>) {
        match outcome {
            Ok(_) => self.succeeded.push(id.to_string()),
            Err(error) => {
                tracing::debug!(record_id = %id, error = %error, "Batch item failed");
                self.failed.push(BatchFailure {
                    id: id.to_string(),
                    error,
                });
            }
        }
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}
