//! Remote representation of a Monitor team
//!
//! These types mirror the JSON the teams API accepts and returns. Capability
//! flags are `Option<bool>` so that "not sent" and "false" stay distinct on
//! the wire.

use serde::{Deserialize, Serialize};

/// Product tag every team managed by this provider carries
pub const MONITOR_PRODUCT: &str = "SDC";

/// Team as stored by the remote platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Server-assigned identifier (0 until created)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,

    /// Optimistic concurrency token, bumped by the server on every write
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: i64,

    #[serde(default)]
    pub theme: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Scope the team is bound to (`host`, `container`, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub show: String,

    /// Scope filter expression
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filter: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_sysdig_capture: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_custom_events: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_aws_metrics: Option<bool>,

    /// Platform metrics capability (IBM Cloud Monitoring only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_beacon_metrics: Option<bool>,

    #[serde(default, rename = "default", skip_serializing_if = "is_false")]
    pub default_team: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_roles: Vec<UserRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<EntryPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_filters: Option<NamespaceFilters>,
}

/// Membership of a user in a team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// User login, which is the email address
    #[serde(default, rename = "userName")]
    pub email: String,

    pub role: String,

    /// Admins are members of every team implicitly
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin: bool,
}

impl UserRole {
    /// Create a non-admin role entry
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: email.into(),
            role: role.into(),
            admin: false,
        }
    }
}

/// Landing page for members of the team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub module: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

/// Platform-specific namespace filters
///
/// Fields this crate does not manage are kept in `other` so a merge never
/// drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibm_platform_metrics: Option<String>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl NamespaceFilters {
    /// Merge `update` into `self`, only touching fields `update` sets
    pub fn merge(&mut self, update: NamespaceFilters) {
        if update.ibm_platform_metrics.is_some() {
            self.ibm_platform_metrics = update.ibm_platform_metrics;
        }
        self.other.extend(update.other);
    }
}

/// Envelope the teams API wraps single teams in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamWrapper {
    pub team: Team,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}
