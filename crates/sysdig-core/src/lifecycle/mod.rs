//! Lifecycle controller for monitor teams
//!
//! [`MonitorTeamResource`] drives Create/Read/Update/Delete for one team
//! through the mapper and the team client of the configured deployment
//! mode.
//!
//! ## State Machine
//!
//! ```text
//!            create            read (ok)
//!  Absent ──────────▶ Pending ──────────▶ Present ◀──┐ read / update
//!    ▲                   │                   │ ──────┘
//!    │  create failed    │                   │ delete
//!    └───────────────────┘                   ▼
//!    ▲                                    Deleted
//!    │  read failed (identity cleared)
//!    └──────────────────────── Present
//! ```
//!
//! ## Bookkeeping
//!
//! - The client is resolved once per operation through the registry.
//! - Create and Update finish with a Read so computed fields (version,
//!   server-normalized values) land in the record.
//! - Update overlays the stored ID and version onto the mapped team; a
//!   version mismatch surfaces as `Error::Conflict` and is never retried.
//! - Each operation is bounded by its timeout. For Create and Update the
//!   budget covers the write and the follow-up Read together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ClientType, ProviderConfig, TimeoutConfig};
use crate::error::{Error, Result};
use crate::mapper::{team_from_record, team_to_record};
use crate::record::ResourceData;
use crate::registry::ClientRegistry;
use crate::schema::{ResourceSchema, keys};
use crate::team::MONITOR_PRODUCT;
use crate::traits::{ConfigRecord, ResourceState, TeamClient};

/// Lifecycle controller for the monitor team resource
pub struct MonitorTeamResource {
    client_config: ClientConfig,
    registry: Arc<ClientRegistry>,
    schema: Arc<ResourceSchema>,
    timeouts: TimeoutConfig,
}

impl MonitorTeamResource {
    /// Create a controller for the configured deployment mode
    pub fn new(config: &ProviderConfig, registry: Arc<ClientRegistry>) -> Self {
        let client_type = config.client.client_type();
        Self {
            client_config: config.client.clone(),
            registry,
            schema: Arc::new(ResourceSchema::monitor_team(client_type)),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Deployment mode this controller manages teams for
    pub fn client_type(&self) -> ClientType {
        self.client_config.client_type()
    }

    /// Schema records for this controller must satisfy
    pub fn schema(&self) -> Arc<ResourceSchema> {
        Arc::clone(&self.schema)
    }

    /// Build a record from a user declaration
    pub fn new_record(&self, declared: &Value) -> Result<ResourceData> {
        ResourceData::from_config(self.schema(), declared)
    }

    /// Create the team described by `d`
    ///
    /// On success `d` carries the assigned identity and is `Present`. On
    /// failure of the create call `d` stays `Absent` with no identity.
    pub async fn create<R: ConfigRecord + Clone>(&self, d: &mut R) -> Result<()> {
        let deadline = Instant::now() + self.timeouts.create();
        let client = self.client()?;

        let mut team = team_from_record(d, self.client_type());
        team.products = vec![MONITOR_PRODUCT.to_string()];

        d.set_state(ResourceState::Pending);
        let created = match self
            .bounded("create", remaining(deadline), client.create_team(team))
            .await
        {
            Ok(created) => created,
            Err(e) => {
                d.set_state(ResourceState::Absent);
                return Err(e);
            }
        };

        info!(id = created.id, name = %created.name, "created team");
        d.set_id(created.id.to_string());
        d.set_state(ResourceState::Present);

        self.read_with(client.as_ref(), d, remaining(deadline)).await
    }

    /// Refresh `d` from the remote team
    ///
    /// Any failure clears the identity and leaves `d` `Absent`.
    pub async fn read<R: ConfigRecord + Clone>(&self, d: &mut R) -> Result<()> {
        let client = self.client()?;
        self.read_with(client.as_ref(), d, self.timeouts.read()).await
    }

    /// Push the desired state in `d` to the remote team
    pub async fn update<R: ConfigRecord + Clone>(&self, d: &mut R) -> Result<()> {
        let deadline = Instant::now() + self.timeouts.update();
        let client = self.client()?;

        let mut team = team_from_record(d, self.client_type());
        team.products = vec![MONITOR_PRODUCT.to_string()];
        team.version = d.get_int(keys::VERSION);
        team.id = parse_identity(d.id());

        let updated = self
            .bounded("update", remaining(deadline), client.update_team(team))
            .await?;
        info!(id = updated.id, version = updated.version, "updated team");

        self.read_with(client.as_ref(), d, remaining(deadline)).await
    }

    /// Delete the remote team
    ///
    /// The identity is kept, including on failure.
    pub async fn delete<R: ConfigRecord>(&self, d: &mut R) -> Result<()> {
        let client = self.client()?;
        let id = parse_identity(d.id());

        self.bounded("delete", self.timeouts.delete(), client.delete_team(id))
            .await?;

        info!(id, "deleted team");
        d.set_state(ResourceState::Deleted);
        Ok(())
    }

    /// Adopt an existing remote team by ID
    pub async fn import<R: ConfigRecord + Clone>(&self, d: &mut R, id: &str) -> Result<()> {
        d.set_id(id.to_string());
        d.set_state(ResourceState::Present);
        self.read(d).await
    }

    fn client(&self) -> Result<Box<dyn TeamClient>> {
        let client = self.registry.create_client(&self.client_config)?;
        if client.client_type() != self.client_type() {
            return Err(Error::config(format!(
                "factory for {} built a {} client",
                self.client_type(),
                client.client_type()
            )));
        }
        Ok(client)
    }

    async fn read_with<R: ConfigRecord + Clone>(
        &self,
        client: &dyn TeamClient,
        d: &mut R,
        timeout: Duration,
    ) -> Result<()> {
        let id = parse_identity(d.id());

        let team = match self
            .bounded("read", timeout, client.get_team_by_id(id))
            .await
        {
            Ok(team) => team,
            Err(e) => {
                if e.is_not_found() {
                    warn!(id, "team no longer exists");
                } else {
                    warn!(id, error = %e, "failed to read team");
                }
                d.set_id(String::new());
                d.set_state(ResourceState::Absent);
                return Err(e);
            }
        };

        if let Err(e) = team_to_record(d, self.client_type(), &team) {
            warn!(id, error = %e, "failed to store team");
            d.set_id(String::new());
            d.set_state(ResourceState::Absent);
            return Err(e);
        }
        d.set_state(ResourceState::Present);
        debug!(id = team.id, version = team.version, "refreshed team");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        limit: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(limit, call).await.map_err(|_| {
            Error::timeout(format!(
                "{} did not finish within {}s",
                operation,
                limit.as_secs()
            ))
        })?
    }
}

impl std::fmt::Debug for MonitorTeamResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorTeamResource")
            .field("client", &self.client_config)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Parse a stored identity
///
/// A non-numeric identity becomes 0 so the remote call reports the missing
/// team instead of the controller failing locally.
fn parse_identity(id: &str) -> i64 {
    match id.parse() {
        Ok(id) => id,
        Err(_) => {
            warn!(identity = id, "stored identity is not numeric, using 0");
            0
        }
    }
}
