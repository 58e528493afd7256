pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::StoreError;
use crate::model::{NewGroup, NewRecord};
use async_trait::async_trait;

/// The four calls the runner makes against persistence.
///
/// Version assignment is read-then-write: the runner reads `max_version` and
/// inserts max + 1. Nothing here makes that atomic across concurrent runs of
/// the same name; a store wanting strict version uniqueness has to reserve
/// versions transactionally itself.
///
/// `save_record` must be safe to call concurrently from multiple workers.
#[async_trait]
pub trait EvalStore: Send + Sync {
    /// Highest version persisted under `name`, or `None` before the first run.
    async fn max_version(&self, name: &str) -> Result<Option<i64>, StoreError>;

    /// Inserts the group row and returns its assigned id.
    async fn create_group(&self, group: NewGroup) -> Result<String, StoreError>;

    async fn save_record(&self, record: NewRecord) -> Result<(), StoreError>;

    /// Called exactly once per run, after the last case has drained.
    async fn update_group_duration(
        &self,
        group_id: &str,
        total_duration_ms: u64,
    ) -> Result<(), StoreError>;
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
