use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::domain::BatchRecord;

/// Submitted batches by id, so status lookups hit the chain they were sent on.
#[derive(Debug, Default)]
pub struct BatchRegistry {
    inner: Mutex<HashMap<String, BatchRecord>>,
}

impl BatchRegistry {
    pub fn record(&self, record: BatchRecord) {
        debug!(batch_id = %record.id, chain_id = record.chain_id, "batch recorded");
        lock_or_recover!(self.inner).insert(record.id.to_ascii_lowercase(), record);
    }

    /// Ids are hex hashes and callers are not consistent about case.
    pub fn get(&self, id: &str) -> Option<BatchRecord> {
        lock_or_recover!(self.inner)
            .get(&id.to_ascii_lowercase())
            .cloned()
    }

    pub fn remove(&self, id: &str) -> Option<BatchRecord> {
        lock_or_recover!(self.inner).remove(&id.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        lock_or_recover!(self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
