//! Task state contract.

use async_trait::async_trait;
use vconv_models::{ErrorRecord, TaskId};

use crate::error::StoreResult;

/// Durable record of finished tasks and of failures.
///
/// Each operation is atomic on its own. The pair `is_processed` followed by
/// a later `mark_processed` is not, so callers must not run the same task id
/// concurrently.
#[async_trait]
pub trait TaskStateStore: Send + Sync {
    /// Whether a processed record exists for `task_id`.
    async fn is_processed(&self, task_id: TaskId) -> StoreResult<bool>;

    /// Write the processed record for `task_id`. Writing it again is a no-op.
    async fn mark_processed(&self, task_id: TaskId) -> StoreResult<()>;

    /// Append an error record.
    async fn register_error(&self, record: &ErrorRecord) -> StoreResult<()>;
}
