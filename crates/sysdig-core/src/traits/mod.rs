//! Core traits for the team provider
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`TeamClient`]: CRUD calls against the teams API
//! - [`ConfigRecord`]: Typed access to the state of one managed resource
//! - [`RecordStore`]: Persistence of managed records between runs

pub mod config_record;
pub mod record_store;
pub mod team_client;

pub use config_record::{ConfigRecord, ResourceState};
pub use record_store::{RecordStore, StateRecord};
pub use team_client::{TeamClient, TeamClientFactory};
