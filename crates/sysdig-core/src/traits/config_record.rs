// # Config Record Trait
//
// Defines the accessor the mapper and the lifecycle controller use to read
// the declared state of one managed resource and to write the refreshed
// state back.
//
// ## Implementations
//
// - `ResourceData`: schema-checked record in `crate::record`
//
// ## Usage
//
// ```rust,ignore
// use sysdig_core::ConfigRecord;
//
// let name = record.get_string("name");
// if let Some(selection) = record.get_ok("entrypoint.0.selection") {
//     // only present when explicitly set
// }
// record.set("version", serde_json::json!(4))?;
// ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a managed resource is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// No remote object is known
    #[default]
    Absent,
    /// Create was issued, no identity yet
    Pending,
    /// Remote object exists and the record mirrors it
    Present,
    /// Delete succeeded
    Deleted,
}

/// Accessor over the declared and refreshed state of one resource
///
/// Paths use dots to address nested blocks, e.g. `entrypoint.0.type`.
/// Writes only accept top-level keys that the schema knows about.
pub trait ConfigRecord: Send {
    /// Opaque identity of the remote object, empty when unknown
    fn id(&self) -> &str;

    /// Replace the identity; an empty string clears it
    fn set_id(&mut self, id: String);

    /// Raw value at `path`, if present
    fn get(&self, path: &str) -> Option<&Value>;

    /// Write `value` under `key`
    ///
    /// # Errors
    ///
    /// `Error::RecordWrite` if the key is unknown or the value has the wrong
    /// type. `Value::Null` unsets the key.
    fn set(&mut self, key: &str, value: Value) -> Result<(), crate::Error>;

    /// Current lifecycle state
    fn state(&self) -> ResourceState;

    /// Record a lifecycle transition
    fn set_state(&mut self, state: ResourceState);

    /// Value at `path` if present and not the zero value of its type
    fn get_ok(&self, path: &str) -> Option<&Value> {
        self.get(path).filter(|v| !is_zero_value(v))
    }

    /// String at `path`, or `""`
    fn get_string(&self, path: &str) -> String {
        self.get(path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Bool at `path`, or `false`
    fn get_bool(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Integer at `path`, or `0`
    fn get_int(&self, path: &str) -> i64 {
        self.get(path).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Blocks of a set or list at `path`, or an empty slice
    fn get_blocks(&self, path: &str) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Terraform-style zero value check used by [`ConfigRecord::get_ok`]
pub fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
