//! Test doubles and common utilities for contract tests
//!
//! [`MockTeamClient`] keeps an in-memory team server with version checks,
//! records every call and can be told to fail the next call of a kind.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use sysdig_core::config::{ClientConfig, ClientType, ProviderConfig, TimeoutConfig};
use sysdig_core::error::{Error, Result};
use sysdig_core::traits::{TeamClient, TeamClientFactory};
use sysdig_core::{ClientRegistry, MonitorTeamResource, Team, UserRole};

/// Email of the admin the mock server adds to every created team
pub const SERVER_ADMIN: &str = "admin@example.com";

/// A call received by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    Update { id: i64, version: i64 },
    Get(i64),
    Delete(i64),
}

/// Kind of call a fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Update,
    Get,
    Delete,
}

/// Failure injected into the next call of an [`Op`]
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    NotFound,
    Conflict,
    Status(u16),
}

impl Fault {
    fn into_error(self) -> Error {
        match self {
            Fault::NotFound => Error::not_found("team not found"),
            Fault::Conflict => Error::conflict("version mismatch"),
            Fault::Status(status) => Error::api(status, "injected failure"),
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    teams: HashMap<i64, Team>,
    next_id: i64,
    calls: Vec<Call>,
    faults: HashMap<Op, Fault>,
    last_created: Option<Team>,
    last_updated: Option<Team>,
    delay: Option<Duration>,
}

/// In-memory teams API shared by every client built from one factory
#[derive(Debug, Clone)]
pub struct MockTeamClient {
    state: Arc<Mutex<ServerState>>,
    client_type: ClientType,
}

impl MockTeamClient {
    /// Create a server whose first created team gets `first_id`
    pub fn new(first_id: i64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                next_id: first_id,
                ..Default::default()
            })),
            client_type: ClientType::SysdigMonitor,
        }
    }

    fn sharing_state_with(other: &Self, client_type: ClientType) -> Self {
        Self {
            state: Arc::clone(&other.state),
            client_type,
        }
    }

    /// Fail the next call of `op` with `fault`
    pub fn fail_next(&self, op: Op, fault: Fault) {
        self.state.lock().unwrap().faults.insert(op, fault);
    }

    /// Delay every call by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Store a team as if it had been created out of band
    pub fn insert(&self, team: Team) {
        self.state.lock().unwrap().teams.insert(team.id, team);
    }

    /// Remove a team as if it had been deleted out of band
    pub fn forget(&self, id: i64) {
        self.state.lock().unwrap().teams.remove(&id);
    }

    /// Bump a team's version as if it had been edited out of band
    pub fn touch(&self, id: i64) {
        if let Some(team) = self.state.lock().unwrap().teams.get_mut(&id) {
            team.version += 1;
        }
    }

    pub fn team(&self, id: i64) -> Option<Team> {
        self.state.lock().unwrap().teams.get(&id).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_created(&self) -> Option<Team> {
        self.state.lock().unwrap().last_created.clone()
    }

    pub fn last_updated(&self) -> Option<Team> {
        self.state.lock().unwrap().last_updated.clone()
    }

    async fn enter(&self, op: Op, call: Call) -> Result<()> {
        let (fault, delay) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            (state.faults.remove(&op), state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match fault {
            Some(fault) => Err(fault.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl TeamClient for MockTeamClient {
    async fn create_team(&self, mut team: Team) -> Result<Team> {
        self.enter(Op::Create, Call::Create).await?;

        let mut state = self.state.lock().unwrap();
        state.last_created = Some(team.clone());

        team.id = state.next_id;
        team.version = 1;
        team.user_roles.push(UserRole {
            user_id: Some(1),
            admin: true,
            ..UserRole::new(SERVER_ADMIN, "ROLE_TEAM_MANAGER")
        });

        state.next_id += 1;
        state.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn update_team(&self, mut team: Team) -> Result<Team> {
        self.enter(
            Op::Update,
            Call::Update {
                id: team.id,
                version: team.version,
            },
        )
        .await?;

        let mut state = self.state.lock().unwrap();
        state.last_updated = Some(team.clone());

        let current = state
            .teams
            .get(&team.id)
            .ok_or_else(|| Error::not_found(format!("team {} not found", team.id)))?;
        if current.version != team.version {
            return Err(Error::conflict(format!(
                "team {} is at version {}, got {}",
                team.id, current.version, team.version
            )));
        }

        let admins: Vec<UserRole> = current.user_roles.iter().filter(|r| r.admin).cloned().collect();
        team.user_roles.extend(admins);
        team.version += 1;
        state.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn get_team_by_id(&self, id: i64) -> Result<Team> {
        self.enter(Op::Get, Call::Get(id)).await?;

        self.state
            .lock()
            .unwrap()
            .teams
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("team {} not found", id)))
    }

    async fn delete_team(&self, id: i64) -> Result<()> {
        self.enter(Op::Delete, Call::Delete(id)).await?;

        self.state
            .lock()
            .unwrap()
            .teams
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("team {} not found", id)))
    }

    fn client_type(&self) -> ClientType {
        self.client_type
    }
}

/// Factory handing out clients that share one mock server
pub struct MockTeamClientFactory {
    server: MockTeamClient,
    builds: Option<ClientType>,
}

impl TeamClientFactory for MockTeamClientFactory {
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn TeamClient>> {
        Ok(Box::new(MockTeamClient::sharing_state_with(
            &self.server,
            self.builds.unwrap_or(config.client_type()),
        )))
    }
}

pub fn sysdig_client_config() -> ClientConfig {
    ClientConfig::SysdigMonitor {
        url: "https://app.sysdigcloud.com".to_string(),
        api_token: "test-token".to_string(),
        insecure_tls: false,
        extra_headers: HashMap::new(),
    }
}

pub fn ibm_client_config() -> ClientConfig {
    ClientConfig::IbmMonitor {
        url: "https://us-south.monitoring.cloud.ibm.com".to_string(),
        iam_token: "test-iam-token".to_string(),
        instance_id: "00000000-0000-0000-0000-000000000000".to_string(),
        insecure_tls: false,
    }
}

pub fn client_config(client_type: ClientType) -> ClientConfig {
    match client_type {
        ClientType::SysdigMonitor => sysdig_client_config(),
        ClientType::IbmMonitor => ibm_client_config(),
    }
}

/// Controller for `client_type` wired to a fresh mock server
pub fn controller(client_type: ClientType) -> (MonitorTeamResource, MockTeamClient) {
    controller_with(client_type, TimeoutConfig::default())
}

pub fn controller_with(
    client_type: ClientType,
    timeouts: TimeoutConfig,
) -> (MonitorTeamResource, MockTeamClient) {
    let server = MockTeamClient::new(42);

    let registry = Arc::new(ClientRegistry::new());
    for t in [ClientType::SysdigMonitor, ClientType::IbmMonitor] {
        registry.register(
            t,
            Box::new(MockTeamClientFactory {
                server: server.clone(),
                builds: None,
            }),
        );
    }

    let mut config = ProviderConfig::new(client_config(client_type));
    config.timeouts = timeouts;

    (MonitorTeamResource::new(&config, registry), server)
}

/// Controller whose standard-mode factory hands out platform clients
pub fn misrouted_controller() -> (MonitorTeamResource, MockTeamClient) {
    let server = MockTeamClient::new(42);

    let registry = Arc::new(ClientRegistry::new());
    registry.register(
        ClientType::SysdigMonitor,
        Box::new(MockTeamClientFactory {
            server: server.clone(),
            builds: Some(ClientType::IbmMonitor),
        }),
    );

    let config = ProviderConfig::new(sysdig_client_config());
    (MonitorTeamResource::new(&config, registry), server)
}

/// A typical declared team
pub fn ops_team() -> Value {
    json!({
        "name": "ops",
        "description": "Operations",
        "scope_by": "container",
        "filter": "kubernetes.namespace.name = \"prod\"",
        "can_use_sysdig_capture": true,
        "user_roles": [
            {"email": "dev@example.com", "role": "ROLE_TEAM_EDIT"},
            {"email": "lead@example.com", "role": "ROLE_TEAM_MANAGER"},
        ],
        "entrypoint": [{"type": "Dashboards", "selection": "101"}],
    })
}
