use super::{now_rfc3339, EvalStore};
use crate::errors::StoreError;
use crate::model::{NewGroup, NewRecord, Thresholds};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Group row as held by a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredGroup {
    pub id: String,
    pub name: String,
    pub model: String,
    pub version: i64,
    pub generic_prompt: Option<String>,
    pub thresholds: Option<Thresholds>,
    /// Set once, after the run's last case has drained.
    pub total_duration_ms: Option<u64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub fields: NewRecord,
    pub created_at: String,
}

/// In-memory store for tests and throwaway runs. Cloning shares the backing
/// vectors, so version numbering stays consistent across runners that hold
/// the same instance.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    groups: Vec<StoredGroup>,
    records: Vec<StoredRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> Vec<StoredGroup> {
        self.inner.lock().unwrap().groups.clone()
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    /// Records belonging to one group, in persistence order.
    pub fn records_for(&self, group_id: &str) -> Vec<StoredRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.fields.eval_group_id == group_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EvalStore for MemoryStore {
    async fn max_version(&self, name: &str) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .groups
            .iter()
            .filter(|g| g.name == name)
            .map(|g| g.version)
            .max())
    }

    async fn create_group(&self, group: NewGroup) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().unwrap();
        inner.groups.push(StoredGroup {
            id: id.clone(),
            name: group.name,
            model: group.model,
            version: group.version,
            generic_prompt: group.generic_prompt,
            thresholds: group.thresholds,
            total_duration_ms: None,
            created_at: now_rfc3339(),
        });
        Ok(id)
    }

    async fn save_record(&self, record: NewRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.push(StoredRecord {
            id: Uuid::new_v4().to_string(),
            fields: record,
            created_at: now_rfc3339(),
        });
        Ok(())
    }

    async fn update_group_duration(
        &self,
        group_id: &str,
        total_duration_ms: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.groups.iter_mut().find(|g| g.id == group_id) {
            Some(g) => {
                g.total_duration_ms = Some(total_duration_ms);
                Ok(())
            }
            None => Err(StoreError::Rejected(format!("unknown group id {group_id}"))),
        }
    }
}
