//! Schema-checked config record
//!
//! [`ResourceData`] is the in-tree implementation of [`ConfigRecord`]. It is
//! built either from a user declaration (validated, defaults applied) or from
//! a persisted [`StateRecord`], and every write is checked against the
//! resource schema.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::ClientType;
use crate::error::{Error, Result};
use crate::schema::{FieldKind, ResourceSchema};
use crate::traits::{ConfigRecord, ResourceState, StateRecord};

/// State of one managed team as seen by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    schema: Arc<ResourceSchema>,
    id: String,
    values: Map<String, Value>,
    state: ResourceState,
}

impl ResourceData {
    /// Create an empty record
    pub fn new(schema: Arc<ResourceSchema>) -> Self {
        Self {
            schema,
            id: String::new(),
            values: Map::new(),
            state: ResourceState::Absent,
        }
    }

    /// Create a record from a user declaration
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the declaration is not an object or does not
    /// satisfy the schema.
    pub fn from_config(schema: Arc<ResourceSchema>, declared: &Value) -> Result<Self> {
        let declared = declared
            .as_object()
            .ok_or_else(|| Error::validation("resource configuration must be an object"))?;
        let values = schema.normalize(declared)?;

        Ok(Self {
            values,
            ..Self::new(schema)
        })
    }

    /// Rebuild a record from a persisted snapshot
    pub fn from_state(schema: Arc<ResourceSchema>, record: &StateRecord) -> Result<Self> {
        if record.client_type != schema.client_type() {
            return Err(Error::state_store(format!(
                "stored record belongs to {}, provider is configured for {}",
                record.client_type,
                schema.client_type()
            )));
        }

        let mut data = Self::new(schema);
        for (key, value) in &record.values {
            data.set(key, value.clone())?;
        }
        data.set_id(record.id.clone());
        Ok(data)
    }

    /// Snapshot this record for persistence
    pub fn to_state(&self) -> StateRecord {
        StateRecord::new(self.id.clone(), self.client_type(), self.values.clone())
    }

    /// Schema this record is checked against
    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Deployment mode of the schema
    pub fn client_type(&self) -> ClientType {
        self.schema.client_type()
    }

    /// All currently set top-level values
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl ConfigRecord for ResourceData {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;

        for segment in segments {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(block) => block.get(segment)?,
                _ => return None,
            };
        }

        Some(current).filter(|v| !v.is_null())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.schema.check_write(key, &value)?;

        let is_set = matches!(
            self.schema.field(key).map(|f| &f.kind),
            Some(FieldKind::Set(_))
        );

        let value = match value {
            Value::Null => {
                self.values.remove(key);
                return Ok(());
            }
            Value::Array(items) if is_set => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Value::Array(unique)
            }
            value => value,
        };

        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn state(&self) -> ResourceState {
        self.state
    }

    fn set_state(&mut self, state: ResourceState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::keys;
    use serde_json::json;

    fn schema(client_type: ClientType) -> Arc<ResourceSchema> {
        Arc::new(ResourceSchema::monitor_team(client_type))
    }

    #[test]
    fn test_from_config_and_paths() {
        let data = ResourceData::from_config(
            schema(ClientType::SysdigMonitor),
            &json!({
                "name": "ops",
                "entrypoint": [{"type": "Dashboards", "selection": "42"}],
            }),
        )
        .unwrap();

        assert_eq!(data.get_string(keys::NAME), "ops");
        assert_eq!(data.get_string("entrypoint.0.type"), "Dashboards");
        assert_eq!(data.get_ok("entrypoint.0.selection"), Some(&json!("42")));
        assert_eq!(data.get("entrypoint.1.type"), None);
        assert_eq!(data.get("entrypoint.x.type"), None);
        assert_eq!(data.state(), ResourceState::Absent);
        assert!(data.id().is_empty());
    }

    #[test]
    fn test_get_ok_skips_zero_values() {
        let mut data = ResourceData::new(schema(ClientType::SysdigMonitor));
        data.set(keys::FILTER, json!("")).unwrap();
        data.set(keys::DEFAULT_TEAM, json!(false)).unwrap();

        assert!(data.get(keys::FILTER).is_some());
        assert!(data.get_ok(keys::FILTER).is_none());
        assert!(data.get_ok(keys::DEFAULT_TEAM).is_none());
        assert!(!data.get_bool(keys::DEFAULT_TEAM));
        assert_eq!(data.get_int(keys::VERSION), 0);
        assert!(data.get_blocks(keys::USER_ROLES).is_empty());
    }

    #[test]
    fn test_set_rejects_unknown_key_and_wrong_type() {
        let mut data = ResourceData::new(schema(ClientType::SysdigMonitor));

        assert!(matches!(
            data.set(keys::IBM_PLATFORM_METRICS, json!("x")),
            Err(Error::RecordWrite { .. })
        ));
        assert!(matches!(
            data.set(keys::VERSION, json!("three")),
            Err(Error::RecordWrite { .. })
        ));
    }

    #[test]
    fn test_set_null_unsets() {
        let mut data = ResourceData::new(schema(ClientType::IbmMonitor));
        data.set(keys::IBM_PLATFORM_METRICS, json!("a")).unwrap();
        data.set(keys::IBM_PLATFORM_METRICS, Value::Null).unwrap();

        assert!(data.get(keys::IBM_PLATFORM_METRICS).is_none());
        assert!(!data.values().contains_key(keys::IBM_PLATFORM_METRICS));
    }

    #[test]
    fn test_set_collapses_duplicate_set_elements() {
        let mut data = ResourceData::new(schema(ClientType::SysdigMonitor));
        let role = json!({"email": "dev@example.com", "role": "ROLE_TEAM_EDIT"});
        data.set(keys::USER_ROLES, json!([role.clone(), role])).unwrap();

        assert_eq!(data.get_blocks(keys::USER_ROLES).len(), 1);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut data = ResourceData::from_config(
            schema(ClientType::IbmMonitor),
            &json!({
                "name": "ops",
                "entrypoint": [{"type": "Explore"}],
                "ibm_platform_metrics": "foo",
            }),
        )
        .unwrap();
        data.set_id("42".to_string());
        data.set(keys::VERSION, json!(3)).unwrap();

        let state = data.to_state();
        let restored = ResourceData::from_state(schema(ClientType::IbmMonitor), &state).unwrap();

        assert_eq!(restored.id(), "42");
        assert_eq!(restored.values(), data.values());

        // A record written for the other deployment mode is refused
        assert!(ResourceData::from_state(schema(ClientType::SysdigMonitor), &state).is_err());
    }
}
