// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Crash Behavior
//
// - All records are lost when the process exits
// - The next run sees every resource as absent and will create it again
//
// ## When to Use
//
// - Tests
// - One-shot runs that create and destroy within the same process

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{RecordStore, StateRecord};

/// In-memory record store
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_record(&self, name: &str) -> Result<Option<StateRecord>, Error> {
        Ok(self.inner.read().await.get(name).cloned())
    }

    async fn set_record(&self, name: &str, record: &StateRecord) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .insert(name.to_string(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, name: &str) -> Result<(), Error> {
        self.inner.write().await.remove(name);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.inner.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
