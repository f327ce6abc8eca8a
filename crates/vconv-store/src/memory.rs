//! In-memory task state.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vconv_models::{ErrorRecord, TaskId};

use crate::error::{StoreError, StoreResult};
use crate::store::TaskStateStore;

/// [`TaskStateStore`] kept in process memory.
///
/// Nothing survives a restart. Each operation can be told to fail, which
/// lets tests drive the processor's bookkeeping error paths.
#[derive(Debug, Default)]
pub struct InMemoryTaskStateStore {
    processed: RwLock<BTreeSet<TaskId>>,
    errors: RwLock<Vec<ErrorRecord>>,
    mark_calls: AtomicUsize,
    fail_is_processed: AtomicBool,
    fail_mark_processed: AtomicBool,
    fail_register_error: AtomicBool,
}

impl InMemoryTaskStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `ids` already marked processed.
    pub fn with_processed(ids: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            processed: RwLock::new(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn fail_is_processed(&self, fail: bool) {
        self.fail_is_processed.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_processed(&self, fail: bool) {
        self.fail_mark_processed.store(fail, Ordering::SeqCst);
    }

    pub fn fail_register_error(&self, fail: bool) {
        self.fail_register_error.store(fail, Ordering::SeqCst);
    }

    /// Ids with a processed record, ascending.
    pub async fn processed_ids(&self) -> Vec<TaskId> {
        self.processed.read().await.iter().copied().collect()
    }

    /// Error records in insertion order.
    pub async fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.read().await.clone()
    }

    /// Error records for one task.
    pub async fn errors_for(&self, task_id: TaskId) -> Vec<ErrorRecord> {
        self.errors
            .read()
            .await
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Successful `mark_processed` calls so far.
    pub fn mark_processed_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskStateStore for InMemoryTaskStateStore {
    async fn is_processed(&self, task_id: TaskId) -> StoreResult<bool> {
        if self.fail_is_processed.load(Ordering::SeqCst) {
            return Err(StoreError::injected("is_processed"));
        }
        Ok(self.processed.read().await.contains(&task_id))
    }

    async fn mark_processed(&self, task_id: TaskId) -> StoreResult<()> {
        if self.fail_mark_processed.load(Ordering::SeqCst) {
            return Err(StoreError::injected("mark_processed"));
        }
        self.processed.write().await.insert(task_id);
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn register_error(&self, record: &ErrorRecord) -> StoreResult<()> {
        if self.fail_register_error.load(Ordering::SeqCst) {
            return Err(StoreError::injected("register_error"));
        }
        self.errors.write().await.push(record.clone());
        Ok(())
    }
}
