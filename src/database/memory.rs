use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;

use super::{Result, ResultRecord, ResultStore};

/// Keeps records in process memory. Used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    records: Mutex<Vec<ResultRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ResultRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn append(&self, record: &ResultRecord) -> Result<()> {
        info!(
            "💾 Recorded {} result for {} in memory",
            record.round, record.candidate_name
        );
        self.records.lock().push(record.clone());
        Ok(())
    }
}
