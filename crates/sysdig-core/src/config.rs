//! Configuration types for the team provider
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Default Sysdig Monitor endpoint
pub const DEFAULT_SYSDIG_MONITOR_URL: &str = "https://app.sysdigcloud.com";

/// Main provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Remote client configuration
    pub client: ClientConfig,

    /// Per-operation timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Where managed records are persisted between runs
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

impl ProviderConfig {
    /// Create a configuration for the given client with defaults elsewhere
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            timeouts: TimeoutConfig::default(),
            state_store: StateStoreConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.client.validate()?;
        self.timeouts.validate()?;
        self.state_store.validate()?;
        Ok(())
    }
}

/// Deployment mode of the remote platform
///
/// `IbmMonitor` is the platform-specific variant: it uses its own client and
/// exposes the platform metrics fields on the team schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Standard Sysdig Monitor
    SysdigMonitor,
    /// IBM Cloud Monitoring
    IbmMonitor,
}

impl ClientType {
    /// Whether this is the platform-specific variant
    pub fn is_platform_specific(self) -> bool {
        matches!(self, ClientType::IbmMonitor)
    }

    /// Stable name used in configuration and logs
    pub fn as_str(self) -> &'static str {
        match self {
            ClientType::SysdigMonitor => "sysdig_monitor",
            ClientType::IbmMonitor => "ibm_monitor",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClientType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sysdig_monitor" | "sysdig" | "monitor" => Ok(ClientType::SysdigMonitor),
            "ibm_monitor" | "ibm" => Ok(ClientType::IbmMonitor),
            other => Err(crate::Error::config(format!(
                "Unknown client type '{}'. Supported: sysdig_monitor, ibm_monitor",
                other
            ))),
        }
    }
}

/// Remote client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientConfig {
    /// Standard Sysdig Monitor API
    SysdigMonitor {
        /// API endpoint
        #[serde(default = "default_sysdig_monitor_url")]
        url: String,
        /// Sysdig Monitor API token
        api_token: String,
        /// Skip TLS certificate verification
        #[serde(default)]
        insecure_tls: bool,
        /// Headers added to every request
        #[serde(default)]
        extra_headers: HashMap<String, String>,
    },

    /// IBM Cloud Monitoring
    IbmMonitor {
        /// Regional API endpoint
        url: String,
        /// Pre-issued IAM access token
        iam_token: String,
        /// Monitoring instance GUID
        instance_id: String,
        /// Skip TLS certificate verification
        #[serde(default)]
        insecure_tls: bool,
    },
}

// Tokens are redacted
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientConfig::SysdigMonitor {
                url,
                insecure_tls,
                extra_headers,
                ..
            } => f
                .debug_struct("SysdigMonitor")
                .field("url", url)
                .field("api_token", &"<REDACTED>")
                .field("insecure_tls", insecure_tls)
                .field("extra_headers", &extra_headers.keys().collect::<Vec<_>>())
                .finish(),
            ClientConfig::IbmMonitor {
                url,
                instance_id,
                insecure_tls,
                ..
            } => f
                .debug_struct("IbmMonitor")
                .field("url", url)
                .field("iam_token", &"<REDACTED>")
                .field("instance_id", instance_id)
                .field("insecure_tls", insecure_tls)
                .finish(),
        }
    }
}

impl ClientConfig {
    /// Validate the client configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ClientConfig::SysdigMonitor { url, api_token, .. } => {
                validate_url(url)?;
                if api_token.is_empty() {
                    return Err(crate::Error::config("Sysdig Monitor API token cannot be empty"));
                }
                Ok(())
            }
            ClientConfig::IbmMonitor {
                url,
                iam_token,
                instance_id,
                ..
            } => {
                validate_url(url)?;
                if iam_token.is_empty() {
                    return Err(crate::Error::config("IBM IAM token cannot be empty"));
                }
                if instance_id.is_empty() {
                    return Err(crate::Error::config("IBM instance ID cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Deployment mode this configuration targets
    pub fn client_type(&self) -> ClientType {
        match self {
            ClientConfig::SysdigMonitor { .. } => ClientType::SysdigMonitor,
            ClientConfig::IbmMonitor { .. } => ClientType::IbmMonitor,
        }
    }

    /// API endpoint
    pub fn url(&self) -> &str {
        match self {
            ClientConfig::SysdigMonitor { url, .. } | ClientConfig::IbmMonitor { url, .. } => url,
        }
    }
}

fn validate_url(url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config("API URL cannot be empty"));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "API URL must use HTTP or HTTPS scheme. Got: {}",
            url
        )));
    }
    Ok(())
}

fn default_sysdig_monitor_url() -> String {
    DEFAULT_SYSDIG_MONITOR_URL.to_string()
}

/// Per-operation timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Create timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub create_secs: u64,

    /// Read timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub read_secs: u64,

    /// Update timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub update_secs: u64,

    /// Delete timeout (in seconds)
    ///
    /// Removing a team is noticeably slower than the other operations.
    #[serde(default = "default_timeout_secs")]
    pub delete_secs: u64,
}

impl TimeoutConfig {
    /// Same timeout for every operation
    pub fn uniform(secs: u64) -> Self {
        Self {
            create_secs: secs,
            read_secs: secs,
            update_secs: secs,
            delete_secs: secs,
        }
    }

    /// Validate the timeouts
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (name, secs) in [
            ("create", self.create_secs),
            ("read", self.read_secs),
            ("update", self.update_secs),
            ("delete", self.delete_secs),
        ] {
            if secs == 0 {
                return Err(crate::Error::config(format!("{} timeout must be > 0", name)));
            }
        }
        Ok(())
    }

    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::uniform(default_timeout_secs())
    }
}

fn default_timeout_secs() -> u64 {
    300
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based record store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory record store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults_url() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "type": "sysdig_monitor",
            "api_token": "token",
        }))
        .unwrap();

        assert_eq!(config.url(), DEFAULT_SYSDIG_MONITOR_URL);
        assert_eq!(config.client_type(), ClientType::SysdigMonitor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ibm_config_requires_instance_id() {
        let config = ClientConfig::IbmMonitor {
            url: "https://us-south.monitoring.cloud.ibm.com".to_string(),
            iam_token: "iam".to_string(),
            instance_id: String::new(),
            insecure_tls: false,
        };

        assert!(config.client_type().is_platform_specific());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_scheme_checked() {
        let config = ClientConfig::SysdigMonitor {
            url: "ftp://example.com".to_string(),
            api_token: "token".to_string(),
            insecure_tls: false,
            extra_headers: HashMap::new(),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = ClientConfig::IbmMonitor {
            url: "https://example.com".to_string(),
            iam_token: "super-secret-iam".to_string(),
            instance_id: "guid".to_string(),
            insecure_tls: false,
        };

        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-iam"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_timeouts_default_to_five_minutes() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.delete(), Duration::from_secs(300));
        assert!(TimeoutConfig::uniform(0).validate().is_err());
    }

    #[test]
    fn test_client_type_parsing() {
        assert_eq!("ibm_monitor".parse::<ClientType>().unwrap(), ClientType::IbmMonitor);
        assert_eq!("SYSDIG_MONITOR".parse::<ClientType>().unwrap(), ClientType::SysdigMonitor);
        assert!("route53".parse::<ClientType>().is_err());
    }
}
