//! Subcommand implementations
//!
//! Each command loads the named record from the store, runs one lifecycle
//! operation and writes the outcome back. A record whose identity was
//! cleared by the operation is dropped from the store.

use serde_json::Value;
use tracing::{debug, info};

use sysdig_core::schema::keys;
use sysdig_core::{
    ConfigRecord, Error, MonitorTeamResource, RecordStore, ResourceData, ResourceState, Result,
    StateRecord,
};

/// Create the team declared in `declared`, or update it if `name` is
/// already managed
pub async fn apply(
    resource: &MonitorTeamResource,
    store: &dyn RecordStore,
    name: &str,
    declared: &Value,
) -> Result<StateRecord> {
    let mut d = resource.new_record(declared)?;

    let outcome = match store.get_record(name).await? {
        Some(stored) if !stored.id.is_empty() => {
            debug!(name, id = %stored.id, "updating managed team");
            d.set_id(stored.id.clone());
            d.set_state(ResourceState::Present);
            if let Some(version) = stored.values.get(keys::VERSION) {
                d.set(keys::VERSION, version.clone())?;
            }
            resource.update(&mut d).await
        }
        _ => {
            debug!(name, "creating team");
            resource.create(&mut d).await
        }
    };

    sync(store, name, &d, outcome.is_ok()).await?;
    outcome.map(|()| d.to_state())
}

/// Re-read a managed team from the API
pub async fn refresh(
    resource: &MonitorTeamResource,
    store: &dyn RecordStore,
    name: &str,
) -> Result<StateRecord> {
    let mut d = load(resource, store, name).await?;

    let outcome = resource.read(&mut d).await;
    sync(store, name, &d, outcome.is_ok()).await?;
    outcome.map(|()| d.to_state())
}

/// Delete a managed team and forget it
///
/// The record is kept when the delete call fails.
pub async fn destroy(
    resource: &MonitorTeamResource,
    store: &dyn RecordStore,
    name: &str,
) -> Result<()> {
    let mut d = load(resource, store, name).await?;

    resource.delete(&mut d).await?;
    store.delete_record(name).await?;
    info!(name, id = d.id(), "team destroyed");
    Ok(())
}

/// Adopt an existing team under `name`
pub async fn import(
    resource: &MonitorTeamResource,
    store: &dyn RecordStore,
    name: &str,
    id: &str,
) -> Result<StateRecord> {
    if let Some(stored) = store.get_record(name).await?
        && !stored.id.is_empty()
    {
        return Err(Error::validation(format!(
            "'{}' already manages team {}",
            name, stored.id
        )));
    }

    let mut d = ResourceData::new(resource.schema());
    let outcome = resource.import(&mut d, id).await;
    sync(store, name, &d, outcome.is_ok()).await?;
    outcome.map(|()| d.to_state())
}

/// Managed records sorted by name
pub async fn list(store: &dyn RecordStore) -> Result<Vec<(String, StateRecord)>> {
    let mut names = store.list_records().await?;
    names.sort();

    let mut records = Vec::with_capacity(names.len());
    for name in names {
        if let Some(record) = store.get_record(&name).await? {
            records.push((name, record));
        }
    }
    Ok(records)
}

async fn load(
    resource: &MonitorTeamResource,
    store: &dyn RecordStore,
    name: &str,
) -> Result<ResourceData> {
    let stored = store
        .get_record(name)
        .await?
        .ok_or_else(|| Error::state_store(format!("no managed team named '{}'", name)))?;

    let mut d = ResourceData::from_state(resource.schema(), &stored)?;
    d.set_state(ResourceState::Present);
    Ok(d)
}

async fn sync(store: &dyn RecordStore, name: &str, d: &ResourceData, succeeded: bool) -> Result<()> {
    if d.id().is_empty() {
        debug!(name, "identity cleared, dropping record");
        return store.delete_record(name).await;
    }
    if succeeded {
        store.set_record(name, &d.to_state()).await?;
    }
    Ok(())
}
