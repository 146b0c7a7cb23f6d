//! Declarative schema of the Monitor team resource
//!
//! The schema drives three things:
//! - defaults and validation of a user declaration (before any network call)
//! - type checks on every write into a [`ResourceData`](crate::ResourceData)
//! - which fields exist for a given [`ClientType`]; the IBM variant is a
//!   superset of the standard one

use crate::config::ClientType;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Field names of the team resource
pub mod keys {
    pub const THEME: &str = "theme";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const SCOPE_BY: &str = "scope_by";
    pub const FILTER: &str = "filter";
    pub const ENABLE_IBM_PLATFORM_METRICS: &str = "enable_ibm_platform_metrics";
    pub const IBM_PLATFORM_METRICS: &str = "ibm_platform_metrics";
    pub const CAN_USE_SYSDIG_CAPTURE: &str = "can_use_sysdig_capture";
    pub const CAN_SEE_INFRASTRUCTURE_EVENTS: &str = "can_see_infrastructure_events";
    pub const CAN_USE_AWS_DATA: &str = "can_use_aws_data";
    pub const USER_ROLES: &str = "user_roles";
    pub const USER_ROLES_EMAIL: &str = "email";
    pub const USER_ROLES_ROLE: &str = "role";
    pub const ENTRYPOINT: &str = "entrypoint";
    pub const ENTRYPOINT_TYPE: &str = "type";
    pub const ENTRYPOINT_SELECTION: &str = "selection";
    pub const DEFAULT_TEAM: &str = "default_team";
    pub const VERSION: &str = "version";
}

/// Roles a user can be given inside a team
pub const TEAM_ROLES: &[&str] = &[
    "ROLE_TEAM_STANDARD",
    "ROLE_TEAM_EDIT",
    "ROLE_TEAM_READ",
    "ROLE_TEAM_MANAGER",
];

/// Modules a team can land on
pub const ENTRYPOINT_MODULES: &[&str] = &["Explore", "Dashboards", "Events", "Alerts", "Settings"];

const DEFAULT_THEME: &str = "#05C391";
const DEFAULT_SCOPE_BY: &str = "host";
const DEFAULT_ROLE: &str = "ROLE_TEAM_STANDARD";

/// Value type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Bool,
    Int,
    /// Unordered collection of blocks; duplicates collapse
    Set(Vec<FieldSchema>),
    /// Ordered collection of blocks
    List(Vec<FieldSchema>),
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Set(_) => "set",
            FieldKind::List(_) => "list",
        }
    }

    fn elem(&self) -> Option<&[FieldSchema]> {
        match self {
            FieldKind::Set(elem) | FieldKind::List(elem) => Some(elem),
            _ => None,
        }
    }
}

/// One field of a resource or nested block
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Assigned by the server, never accepted from a declaration
    pub computed: bool,
    pub default: Option<Value>,
    pub allowed: Option<&'static [&'static str]>,
    pub max_items: Option<usize>,
}

impl FieldSchema {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            computed: false,
            default: None,
            allowed: None,
            max_items: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn set(name: &'static str, elem: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Set(elem))
    }

    pub fn list(name: &'static str, elem: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::List(elem))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// Schema of a whole resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    client_type: ClientType,
    fields: Vec<FieldSchema>,
}

impl ResourceSchema {
    /// Schema of `sysdig_monitor_team` for the given deployment mode
    pub fn monitor_team(client_type: ClientType) -> Self {
        let mut fields = vec![
            FieldSchema::string(keys::THEME).default(DEFAULT_THEME),
            FieldSchema::string(keys::NAME).required(),
            FieldSchema::string(keys::DESCRIPTION),
            FieldSchema::string(keys::SCOPE_BY).default(DEFAULT_SCOPE_BY),
            FieldSchema::string(keys::FILTER),
            FieldSchema::bool(keys::CAN_USE_SYSDIG_CAPTURE).default(false),
            FieldSchema::bool(keys::CAN_SEE_INFRASTRUCTURE_EVENTS).default(false),
            FieldSchema::bool(keys::CAN_USE_AWS_DATA).default(false),
            FieldSchema::set(
                keys::USER_ROLES,
                vec![
                    FieldSchema::string(keys::USER_ROLES_EMAIL).required(),
                    FieldSchema::string(keys::USER_ROLES_ROLE)
                        .default(DEFAULT_ROLE)
                        .one_of(TEAM_ROLES),
                ],
            ),
            FieldSchema::list(
                keys::ENTRYPOINT,
                vec![
                    FieldSchema::string(keys::ENTRYPOINT_TYPE)
                        .required()
                        .one_of(ENTRYPOINT_MODULES),
                    FieldSchema::string(keys::ENTRYPOINT_SELECTION),
                ],
            )
            .required()
            .max_items(1),
            FieldSchema::bool(keys::DEFAULT_TEAM).default(false),
            FieldSchema::int(keys::VERSION).computed(),
        ];

        if client_type.is_platform_specific() {
            fields.push(FieldSchema::bool(keys::ENABLE_IBM_PLATFORM_METRICS));
            fields.push(FieldSchema::string(keys::IBM_PLATFORM_METRICS));
        }

        Self {
            client_type,
            fields,
        }
    }

    /// Deployment mode this schema was built for
    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    /// Look up a top-level field
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All top-level fields
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Check that `value` may be stored under `key`
    ///
    /// `Null` is always accepted and means "unset".
    pub fn check_write(&self, key: &str, value: &Value) -> Result<()> {
        let field = self
            .field(key)
            .ok_or_else(|| Error::record_write(key, "unknown key"))?;

        check_kind(&field.kind, value).map_err(|reason| Error::record_write(key, reason))
    }

    /// Validate a user declaration and fill in defaults
    ///
    /// Rejects unknown and computed keys, type mismatches, missing required
    /// fields and values outside their allowed set.
    pub fn normalize(&self, declared: &Map<String, Value>) -> Result<Map<String, Value>> {
        for key in declared.keys() {
            match self.field(key) {
                None => return Err(Error::validation(format!("{}: unknown field", key))),
                Some(field) if field.computed => {
                    return Err(Error::validation(format!(
                        "{}: computed field cannot be set in configuration",
                        key
                    )));
                }
                Some(_) => {}
            }
        }

        normalize_block(&self.fields, declared, "")
    }
}

fn normalize_block(
    fields: &[FieldSchema],
    declared: &Map<String, Value>,
    prefix: &str,
) -> Result<Map<String, Value>> {
    let mut out = Map::new();

    for key in declared.keys() {
        if !fields.iter().any(|f| f.name == key) {
            return Err(Error::validation(format!("{}{}: unknown field", prefix, key)));
        }
    }

    for field in fields.iter().filter(|f| !f.computed) {
        let path = format!("{}{}", prefix, field.name);
        let value = match declared.get(field.name) {
            Some(Value::Null) | None => field.default.clone(),
            Some(value) => Some(value.clone()),
        };

        let Some(value) = value else {
            if field.required {
                return Err(Error::validation(format!("{}: required field is missing", path)));
            }
            continue;
        };

        check_kind(&field.kind, &value)
            .map_err(|reason| Error::validation(format!("{}: {}", path, reason)))?;

        if let (Some(allowed), Some(s)) = (field.allowed, value.as_str())
            && !allowed.contains(&s)
        {
            return Err(Error::validation(format!(
                "{}: expected one of {:?}, got '{}'",
                path, allowed, s
            )));
        }

        let value = match (field.kind.elem(), value) {
            (Some(elem), Value::Array(items)) => {
                let is_set = matches!(field.kind, FieldKind::Set(_));
                if field.required && items.is_empty() {
                    return Err(Error::validation(format!(
                        "{}: at least one element is required",
                        path
                    )));
                }
                if let Some(max) = field.max_items
                    && items.len() > max
                {
                    return Err(Error::validation(format!(
                        "{}: at most {} element(s) allowed, got {}",
                        path,
                        max,
                        items.len()
                    )));
                }

                let mut normalized = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let block = item.as_object().ok_or_else(|| {
                        Error::validation(format!("{}.{}: expected a block", path, i))
                    })?;
                    let item = Value::Object(normalize_block(elem, block, &format!("{}.{}.", path, i))?);
                    if is_set && normalized.contains(&item) {
                        continue;
                    }
                    normalized.push(item);
                }
                Value::Array(normalized)
            }
            (_, value) => value,
        };

        out.insert(field.name.to_string(), value);
    }

    Ok(out)
}

/// Structural type check; the reason is returned for the caller to wrap
fn check_kind(kind: &FieldKind, value: &Value) -> std::result::Result<(), String> {
    let ok = match (kind, value) {
        (_, Value::Null) => true,
        (FieldKind::String, Value::String(_)) => true,
        (FieldKind::Bool, Value::Bool(_)) => true,
        (FieldKind::Int, Value::Number(n)) => n.is_i64(),
        (FieldKind::Set(elem) | FieldKind::List(elem), Value::Array(items)) => {
            for item in items {
                let Value::Object(block) = item else {
                    return Err("expected a list of blocks".to_string());
                };
                for (key, value) in block {
                    let field = elem
                        .iter()
                        .find(|f| f.name == key)
                        .ok_or_else(|| format!("unknown nested key '{}'", key))?;
                    check_kind(&field.kind, value).map_err(|e| format!("{}: {}", key, e))?;
                }
            }
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(format!("expected {}, got {}", kind.describe(), json_type(value)))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declared(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_platform_fields_only_in_ibm_schema() {
        let standard = ResourceSchema::monitor_team(ClientType::SysdigMonitor);
        let ibm = ResourceSchema::monitor_team(ClientType::IbmMonitor);

        assert!(standard.field(keys::IBM_PLATFORM_METRICS).is_none());
        assert!(ibm.field(keys::IBM_PLATFORM_METRICS).is_some());
        assert!(ibm.field(keys::ENABLE_IBM_PLATFORM_METRICS).is_some());
        assert_eq!(ibm.fields().len(), standard.fields().len() + 2);
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);
        let values = schema
            .normalize(&declared(json!({
                "name": "ops",
                "entrypoint": [{"type": "Explore"}],
                "user_roles": [{"email": "dev@example.com"}],
            })))
            .unwrap();

        assert_eq!(values[keys::THEME], json!("#05C391"));
        assert_eq!(values[keys::SCOPE_BY], json!("host"));
        assert_eq!(values[keys::CAN_USE_AWS_DATA], json!(false));
        assert_eq!(values[keys::USER_ROLES][0]["role"], json!("ROLE_TEAM_STANDARD"));
        assert!(values.get(keys::VERSION).is_none());
    }

    #[test]
    fn test_normalize_rejects_missing_name() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);
        let err = schema
            .normalize(&declared(json!({"entrypoint": [{"type": "Explore"}]})))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(ref msg) if msg.starts_with("name")));
    }

    #[test]
    fn test_normalize_rejects_bad_enums() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);

        let bad_module = json!({"name": "ops", "entrypoint": [{"type": "Nowhere"}]});
        assert!(schema.normalize(&declared(bad_module)).is_err());

        let bad_role = json!({
            "name": "ops",
            "entrypoint": [{"type": "Alerts"}],
            "user_roles": [{"email": "a@example.com", "role": "ROLE_ROOT"}],
        });
        assert!(schema.normalize(&declared(bad_role)).is_err());
    }

    #[test]
    fn test_normalize_rejects_version_and_unknown_keys() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);

        let with_version = json!({"name": "ops", "entrypoint": [{"type": "Explore"}], "version": 3});
        assert!(schema.normalize(&declared(with_version)).is_err());

        // Platform fields are unknown to the standard variant
        let with_ibm = json!({
            "name": "ops",
            "entrypoint": [{"type": "Explore"}],
            "ibm_platform_metrics": "x",
        });
        assert!(schema.normalize(&declared(with_ibm)).is_err());
    }

    #[test]
    fn test_entrypoint_requires_exactly_one_element() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);

        let none = json!({"name": "ops", "entrypoint": []});
        assert!(schema.normalize(&declared(none)).is_err());

        let two = json!({"name": "ops", "entrypoint": [{"type": "Explore"}, {"type": "Alerts"}]});
        assert!(schema.normalize(&declared(two)).is_err());
    }

    #[test]
    fn test_user_roles_collapse_duplicates() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);
        let values = schema
            .normalize(&declared(json!({
                "name": "ops",
                "entrypoint": [{"type": "Explore"}],
                "user_roles": [
                    {"email": "dev@example.com"},
                    {"email": "dev@example.com", "role": "ROLE_TEAM_STANDARD"},
                ],
            })))
            .unwrap();

        assert_eq!(values[keys::USER_ROLES].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_check_write() {
        let schema = ResourceSchema::monitor_team(ClientType::SysdigMonitor);

        assert!(schema.check_write(keys::VERSION, &json!(4)).is_ok());
        assert!(schema.check_write(keys::NAME, &Value::Null).is_ok());
        assert!(matches!(
            schema.check_write("bogus", &json!("x")),
            Err(Error::RecordWrite { .. })
        ));
        assert!(schema.check_write(keys::DEFAULT_TEAM, &json!("yes")).is_err());
        assert!(
            schema
                .check_write(keys::USER_ROLES, &json!([{"email": "a@example.com", "admin": true}]))
                .is_err()
        );
    }
}
