// # Team Client Trait
//
// Defines the interface for CRUD calls against the teams API.
//
// ## Implementations
//
// - Sysdig Monitor: `SysdigMonitorClient` in the `sysdig-client-http` crate
// - IBM Cloud Monitoring: `IbmMonitorClient` in the same crate
//
// ## Usage
//
// ```rust,ignore
// use sysdig_core::TeamClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let client = /* TeamClient implementation */;
//
//     let created = client.create_team(team).await?;
//     let fetched = client.get_team_by_id(created.id).await?;
//     client.delete_team(fetched.id).await?;
//
//     Ok(())
// }
// ```

use crate::config::{ClientConfig, ClientType};
use crate::team::Team;
use async_trait::async_trait;

/// Trait for remote team clients
///
/// Each method performs exactly one request and returns the server's view of
/// the team. Implementations must be usable across async tasks.
///
/// ## Constraints
///
/// - No retries or backoff. A failure is returned to the lifecycle controller
///   as-is and the caller decides what to do.
/// - A version mismatch on update surfaces as `Error::Conflict`.
/// - A missing team surfaces as `Error::NotFound`.
/// - Credentials never appear in logs or error messages.
///
/// Cancellation is the caller's: dropping the future aborts the request.
#[async_trait]
pub trait TeamClient: Send + Sync {
    /// Create a team; the returned team carries the assigned ID and version
    async fn create_team(&self, team: Team) -> Result<Team, crate::Error>;

    /// Update a team in place
    ///
    /// `team.id` selects the object and `team.version` must match the
    /// server's current version.
    async fn update_team(&self, team: Team) -> Result<Team, crate::Error>;

    /// Fetch a team
    async fn get_team_by_id(&self, id: i64) -> Result<Team, crate::Error>;

    /// Delete a team
    async fn delete_team(&self, id: i64) -> Result<(), crate::Error>;

    /// Deployment mode this client talks to
    fn client_type(&self) -> ClientType;
}

/// Helper trait for constructing team clients from configuration
pub trait TeamClientFactory: Send + Sync {
    /// Create a TeamClient instance from configuration
    ///
    /// # Returns
    ///
    /// A boxed TeamClient trait object, or `Error::Config` when the
    /// configuration does not fit this factory or the client cannot be built
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn TeamClient>, crate::Error>;
}
