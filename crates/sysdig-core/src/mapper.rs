//! Translation between a config record and the remote team
//!
//! Both directions are pure apart from reads and writes on the record:
//!
//! ```text
//! ConfigRecord ──team_from_record──▶ Team ──TeamClient──▶ API
//! ConfigRecord ◀──team_to_record──── Team ◀─────────────── API
//! ```
//!
//! Neither direction touches the ID or version on the way out; the lifecycle
//! controller overlays them for updates.

use serde_json::{Map, Value, json};

use crate::config::ClientType;
use crate::error::Result;
use crate::schema::keys;
use crate::team::{EntryPoint, NamespaceFilters, Team, UserRole};
use crate::traits::ConfigRecord;

/// Build the remote team described by `d`
pub fn team_from_record<R: ConfigRecord + ?Sized>(d: &R, client_type: ClientType) -> Team {
    let mut team = Team::default();
    apply_record_to_team(d, client_type, &mut team);
    team
}

/// Overwrite the fields of `team` that `d` manages
///
/// Fields the record does not manage (ID, version, products, unknown
/// namespace filters) are left as they are.
pub fn apply_record_to_team<R: ConfigRecord + ?Sized>(
    d: &R,
    client_type: ClientType,
    team: &mut Team,
) {
    team.theme = d.get_string(keys::THEME);
    team.name = d.get_string(keys::NAME);
    team.description = d.get_string(keys::DESCRIPTION);
    team.show = d.get_string(keys::SCOPE_BY);
    team.filter = d.get_string(keys::FILTER);
    team.can_use_sysdig_capture = Some(d.get_bool(keys::CAN_USE_SYSDIG_CAPTURE));
    team.can_use_custom_events = Some(d.get_bool(keys::CAN_SEE_INFRASTRUCTURE_EVENTS));
    team.can_use_aws_metrics = Some(d.get_bool(keys::CAN_USE_AWS_DATA));
    team.can_use_beacon_metrics = Some(false);
    team.default_team = d.get_bool(keys::DEFAULT_TEAM);

    team.user_roles = d
        .get_blocks(keys::USER_ROLES)
        .iter()
        .map(|block| {
            UserRole::new(
                block_str(block, keys::USER_ROLES_EMAIL),
                block_str(block, keys::USER_ROLES_ROLE),
            )
        })
        .collect();

    // A missing entrypoint block reads as empty rather than failing
    let entrypoint_type = format!("{}.0.{}", keys::ENTRYPOINT, keys::ENTRYPOINT_TYPE);
    let entrypoint_selection = format!("{}.0.{}", keys::ENTRYPOINT, keys::ENTRYPOINT_SELECTION);
    team.entry_point = Some(EntryPoint {
        module: d.get_string(&entrypoint_type),
        selection: d
            .get_ok(&entrypoint_selection)
            .and_then(Value::as_str)
            .map(str::to_string),
    });

    if client_type.is_platform_specific() {
        apply_platform_fields(d, team);
    }
}

fn apply_platform_fields<R: ConfigRecord + ?Sized>(d: &R, team: &mut Team) {
    team.can_use_beacon_metrics = Some(d.get_bool(keys::ENABLE_IBM_PLATFORM_METRICS));

    if let Some(metrics) = d.get_ok(keys::IBM_PLATFORM_METRICS).and_then(Value::as_str) {
        team.namespace_filters = Some(update_namespace_filters(
            team.namespace_filters.take(),
            NamespaceFilters {
                ibm_platform_metrics: Some(metrics.to_string()),
                ..Default::default()
            },
        ));
    }
}

/// Merge `update` into `filters`, creating the block if needed
pub fn update_namespace_filters(
    filters: Option<NamespaceFilters>,
    update: NamespaceFilters,
) -> NamespaceFilters {
    let mut filters = filters.unwrap_or_default();
    filters.merge(update);
    filters
}

/// Write the remote team back into `d`
///
/// All writes are staged on a copy of the record and committed together, so
/// a failing write leaves `d` untouched.
///
/// # Errors
///
/// `Error::RecordWrite` from the first write the record rejects.
pub fn team_to_record<R: ConfigRecord + Clone>(
    d: &mut R,
    client_type: ClientType,
    team: &Team,
) -> Result<()> {
    let mut staged = d.clone();
    write_team(&mut staged, client_type, team)?;
    *d = staged;
    Ok(())
}

fn write_team<R: ConfigRecord + ?Sized>(d: &mut R, client_type: ClientType, team: &Team) -> Result<()> {
    d.set_id(team.id.to_string());

    d.set(keys::VERSION, json!(team.version))?;
    d.set(keys::THEME, json!(team.theme))?;
    d.set(keys::NAME, json!(team.name))?;
    d.set(keys::DESCRIPTION, json!(team.description))?;
    d.set(keys::SCOPE_BY, json!(team.show))?;
    d.set(keys::FILTER, json!(team.filter))?;
    d.set(
        keys::CAN_USE_SYSDIG_CAPTURE,
        json!(team.can_use_sysdig_capture.unwrap_or(false)),
    )?;
    d.set(
        keys::CAN_SEE_INFRASTRUCTURE_EVENTS,
        json!(team.can_use_custom_events.unwrap_or(false)),
    )?;
    d.set(keys::CAN_USE_AWS_DATA, json!(team.can_use_aws_metrics.unwrap_or(false)))?;
    d.set(keys::DEFAULT_TEAM, json!(team.default_team))?;
    d.set(keys::USER_ROLES, user_roles_to_set(&team.user_roles))?;
    d.set(keys::ENTRYPOINT, entrypoint_to_list(team.entry_point.as_ref()))?;

    if client_type.is_platform_specific() {
        write_platform_fields(d, team)?;
    }

    Ok(())
}

fn write_platform_fields<R: ConfigRecord + ?Sized>(d: &mut R, team: &Team) -> Result<()> {
    let platform_metrics = team
        .namespace_filters
        .as_ref()
        .and_then(|f| f.ibm_platform_metrics.clone());

    d.set(
        keys::ENABLE_IBM_PLATFORM_METRICS,
        json!(team.can_use_beacon_metrics.unwrap_or(false)),
    )?;
    d.set(
        keys::IBM_PLATFORM_METRICS,
        platform_metrics.map(Value::String).unwrap_or(Value::Null),
    )
}

/// Admins are members of every team by default and are not user-managed
fn user_roles_to_set(user_roles: &[UserRole]) -> Value {
    Value::Array(
        user_roles
            .iter()
            .filter(|role| !role.admin)
            .map(|role| {
                json!({
                    keys::USER_ROLES_EMAIL: role.email,
                    keys::USER_ROLES_ROLE: role.role,
                })
            })
            .collect(),
    )
}

fn entrypoint_to_list(entry_point: Option<&EntryPoint>) -> Value {
    let Some(entry_point) = entry_point else {
        return Value::Array(Vec::new());
    };

    let mut block = Map::new();
    block.insert(keys::ENTRYPOINT_TYPE.to_string(), json!(entry_point.module));
    if let Some(selection) = &entry_point.selection {
        block.insert(keys::ENTRYPOINT_SELECTION.to_string(), json!(selection));
    }
    Value::Array(vec![Value::Object(block)])
}

fn block_str(block: &Value, key: &str) -> String {
    block
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
