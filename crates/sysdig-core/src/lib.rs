// # sysdig-core
//
// Core library for managing Sysdig Monitor teams declaratively.
//
// ## Architecture Overview
//
// - **ConfigRecord**: Typed access to the declared and computed state of one team
// - **TeamClient**: Trait for CRUD calls against the teams API
// - **mapper**: Translation between a config record and the remote team
// - **MonitorTeamResource**: Lifecycle controller driving Create/Read/Update/Delete
// - **ClientRegistry**: Maps each deployment mode to the factory building its client
// - **RecordStore**: Persistence of managed records between runs
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Mapping and lifecycle logic never touch HTTP
// 2. **Plugin-Based**: Clients are registered per deployment mode, no type switches
// 3. **Library-First**: The CLI is a thin shell over this crate
// 4. **Explicit Nullability**: Capability flags are tri-state on the wire

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod record;
pub mod registry;
pub mod schema;
pub mod state;
pub mod team;
pub mod traits;

// Re-export core types for convenience
pub use config::{ClientConfig, ClientType, ProviderConfig, StateStoreConfig, TimeoutConfig};
pub use error::{Error, Result};
pub use lifecycle::MonitorTeamResource;
pub use record::ResourceData;
pub use registry::ClientRegistry;
pub use schema::ResourceSchema;
pub use state::{FileRecordStore, MemoryRecordStore};
pub use team::{EntryPoint, NamespaceFilters, Team, UserRole};
pub use traits::{ConfigRecord, RecordStore, ResourceState, StateRecord, TeamClient, TeamClientFactory};
