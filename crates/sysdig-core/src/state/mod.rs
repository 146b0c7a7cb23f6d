// # Record Store Implementations
//
// This module provides implementations of the RecordStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use std::sync::Arc;

use crate::config::StateStoreConfig;
use crate::traits::RecordStore;

/// Open the record store described by `config`
pub async fn from_config(config: &StateStoreConfig) -> Result<Arc<dyn RecordStore>, crate::Error> {
    config.validate()?;

    Ok(match config {
        StateStoreConfig::File { path } => Arc::new(FileRecordStore::new(path).await?),
        StateStoreConfig::Memory => Arc::new(MemoryRecordStore::new()),
    })
}
