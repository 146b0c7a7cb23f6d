// # Record Store Trait
//
// Defines the interface for persisting managed records between runs.
//
// ## Purpose
//
// A record store keeps, per managed resource name:
// - The identity of the remote object
// - The last refreshed field values (including the version token)
// - Which deployment mode the record belongs to
//
// Without it every run would see the resource as absent and create it again.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - JSON file: `FileRecordStore`

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::ClientType;

/// Persisted snapshot of one managed resource
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Identity of the remote object
    pub id: String,
    /// Deployment mode the record was written for
    pub client_type: ClientType,
    /// Field values as last written by a refresh
    pub values: Map<String, Value>,
    /// When the values were last written
    pub last_refreshed: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a new state record stamped with the current time
    pub fn new(id: impl Into<String>, client_type: ClientType, values: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            client_type,
            values,
            last_refreshed: chrono::Utc::now(),
        }
    }
}

/// Trait for record store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Stores hold state only; they never talk to the remote API.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the record stored under `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The stored record
    /// - `Ok(None)`: Nothing stored
    /// - `Err(Error)`: Storage error
    async fn get_record(&self, name: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Create or replace the record stored under `name`
    async fn set_record(&self, name: &str, record: &StateRecord) -> Result<(), crate::Error>;

    /// Delete the record stored under `name` (no-op if absent)
    async fn delete_record(&self, name: &str) -> Result<(), crate::Error>;

    /// List all stored names
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
