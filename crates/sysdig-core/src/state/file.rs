// # File Record Store
//
// JSON file implementation of RecordStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: every change goes to a temp file that is then renamed
// - Backup: the previous file is copied to `.backup` before each rename
// - Recovery: an unparseable state file is replaced by its backup
//
// ## File Format
//
// ```json
// {
//   "version": "1",
//   "records": {
//     "ops": {
//       "id": "42",
//       "client_type": "sysdig_monitor",
//       "values": { "name": "ops", "version": 3 },
//       "last_refreshed": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{RecordStore, StateRecord};

const STATE_FILE_VERSION: &str = "1";

type Records = BTreeMap<String, StateRecord>;

/// File-based record store
///
/// Every mutation is written through to disk before the call returns.
///
/// # Example
///
/// ```rust,no_run
/// use sysdig_core::state::FileRecordStore;
/// use sysdig_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/sysdig-tf/state.json").await?;
///     for name in store.list_records().await? {
///         println!("{name}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    records: Arc<RwLock<Records>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateFile {
    version: String,
    records: Records,
}

/// Why a state file could not be loaded
enum LoadFailure {
    /// The file exists but is not a valid state file
    Corrupt(String),
    /// The file could not be read at all
    Unreadable(Error),
}

impl FileRecordStore {
    /// Open a store at `path`, creating parent directories as needed
    ///
    /// A missing file starts an empty store. A corrupted file is recovered
    /// from its backup, or replaced by an empty store if no usable backup
    /// exists.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<Records, Error> {
        let reason = match Self::load(path).await {
            Ok(records) => {
                tracing::debug!(records = records.len(), "loaded state file");
                return Ok(records);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(reason)) => reason,
        };

        tracing::warn!(path = %path.display(), %reason, "state file corrupted, trying backup");

        let backup = Self::backup_path(path);
        if !backup.exists() {
            tracing::warn!("no backup file found, starting with empty state");
            return Ok(Records::new());
        }

        match Self::load(&backup).await {
            Ok(records) => {
                tracing::info!(records = records.len(), "recovered state from backup");
                if let Err(e) = fs::copy(&backup, path).await {
                    tracing::error!(error = %e, "failed to restore state file from backup");
                }
                Ok(records)
            }
            Err(LoadFailure::Corrupt(reason)) => {
                tracing::error!(%reason, "backup also corrupted, starting with empty state");
                Ok(Records::new())
            }
            Err(LoadFailure::Unreadable(e)) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<Records, LoadFailure> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "state file does not exist");
            return Ok(Records::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::state_store(format!(
                "failed to read state file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: StateFile =
            serde_json::from_str(&content).map_err(|e| LoadFailure::Corrupt(e.to_string()))?;

        if file.version != STATE_FILE_VERSION {
            tracing::warn!(
                expected = STATE_FILE_VERSION,
                found = %file.version,
                "state file version mismatch, loading anyway"
            );
        }

        Ok(file.records)
    }

    async fn write(&self, records: &Records) -> Result<(), Error> {
        let file = StateFile {
            version: STATE_FILE_VERSION.to_string(),
            records: records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        let write_err = |e: std::io::Error| {
            Error::state_store(format!(
                "failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        };
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(write_err)?;
            temp.write_all(json.as_bytes()).await.map_err(write_err)?;
            temp.flush().await.map_err(write_err)?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!(error = %e, "failed to create state backup");
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), "state written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        path.with_extension("backup")
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get_record(&self, name: &str) -> Result<Option<StateRecord>, Error> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn set_record(&self, name: &str, record: &StateRecord) -> Result<(), Error> {
        // Hold the write lock across the disk write so writes land in order
        let mut records = self.records.write().await;
        records.insert(name.to_string(), record.clone());
        self.write(&records).await
    }

    async fn delete_record(&self, name: &str) -> Result<(), Error> {
        let mut records = self.records.write().await;
        if records.remove(name).is_none() {
            return Ok(());
        }
        self.write(&records).await
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let records = self.records.read().await;
        self.write(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientType;
    use serde_json::{Map, json};
    use tempfile::tempdir;

    fn record(id: &str, version: i64) -> StateRecord {
        let mut values = Map::new();
        values.insert("name".to_string(), json!("ops"));
        values.insert("version".to_string(), json!(version));
        StateRecord::new(id, ClientType::SysdigMonitor, values)
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileRecordStore::new(&path).await.unwrap();
        assert!(store.list_records().await.unwrap().is_empty());

        store.set_record("ops", &record("42", 1)).await.unwrap();
        assert!(path.exists());

        let reopened = FileRecordStore::new(&path).await.unwrap();
        let stored = reopened.get_record("ops").await.unwrap().unwrap();
        assert_eq!(stored.id, "42");
        assert_eq!(stored.values["version"], json!(1));
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileRecordStore::new(&path).await.unwrap();
        store.set_record("ops", &record("42", 1)).await.unwrap();
        store.delete_record("ops").await.unwrap();
        store.delete_record("missing").await.unwrap();

        let reopened = FileRecordStore::new(&path).await.unwrap();
        assert!(reopened.get_record("ops").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileRecordStore::new(&path).await.unwrap();
        store.set_record("ops", &record("42", 1)).await.unwrap();
        // Second write moves the first one into the backup
        store.set_record("ops", &record("42", 2)).await.unwrap();
        assert!(FileRecordStore::backup_path(&path).exists());

        fs::write(&path, b"not json").await.unwrap();

        let recovered = FileRecordStore::new(&path).await.unwrap();
        let stored = recovered.get_record("ops").await.unwrap().unwrap();
        assert_eq!(stored.values["version"], json!(1));
    }

    #[tokio::test]
    async fn test_file_store_corruption_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{").await.unwrap();

        let store = FileRecordStore::new(&path).await.unwrap();
        assert!(store.list_records().await.unwrap().is_empty());
    }
}
