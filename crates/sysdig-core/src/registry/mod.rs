//! Client registry
//!
//! The registry maps each deployment mode to the factory that builds its
//! team client, so the lifecycle controller never branches on the mode to
//! pick a client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sysdig_core::registry::ClientRegistry;
//! use sysdig_core::config::ClientConfig;
//!
//! let registry = ClientRegistry::new();
//!
//! // In the sysdig-client-http crate
//! sysdig_client_http::register(&registry);
//!
//! let client = registry.create_client(&config)?;
//! ```

use crate::config::{ClientConfig, ClientType};
use crate::error::{Error, Result};
use crate::traits::{TeamClient, TeamClientFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of team client factories keyed by deployment mode
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientType, Box<dyn TeamClientFactory>>>,
}

impl ClientRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for a deployment mode
    ///
    /// A later registration for the same mode replaces the earlier one.
    pub fn register(&self, client_type: ClientType, factory: Box<dyn TeamClientFactory>) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(client_type, factory);
    }

    /// Create a team client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn TeamClient>)`: Created client
    /// - `Err(Error)`: If no factory is registered for the mode or creation fails
    pub fn create_client(&self, config: &ClientConfig) -> Result<Box<dyn TeamClient>> {
        let client_type = config.client_type();
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);

        let factory = clients
            .get(&client_type)
            .ok_or_else(|| Error::config(format!("no client registered for {}", client_type)))?;

        factory.create(config)
    }

    /// Check if a deployment mode has a registered factory
    pub fn has_client(&self, client_type: ClientType) -> bool {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.contains_key(&client_type)
    }

    /// List all registered deployment modes
    pub fn list_clients(&self) -> Vec<ClientType> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<ClientType> = clients.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.list_clients())
            .finish()
    }
}
