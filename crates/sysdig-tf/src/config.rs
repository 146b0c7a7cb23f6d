//! Environment configuration
//!
//! Credentials and endpoints are read from environment variables only:
//!
//! - `SYSDIG_CLIENT_TYPE`: `sysdig_monitor` (default) or `ibm_monitor`
//! - `SYSDIG_MONITOR_URL`, `SYSDIG_MONITOR_API_TOKEN`
//! - `SYSDIG_MONITOR_INSECURE_TLS`: skip certificate checks (`true`/`false`)
//! - `IBM_MONITOR_URL`, `IBM_MONITOR_IAM_TOKEN`, `IBM_MONITOR_INSTANCE_ID`
//! - `SYSDIG_STATE_PATH`: state file; in-memory state when unset
//! - `SYSDIG_TIMEOUT_SECS`: per-operation timeout, default 300

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use sysdig_core::config::{
    ClientConfig, ClientType, DEFAULT_SYSDIG_MONITOR_URL, ProviderConfig, StateStoreConfig,
    TimeoutConfig,
};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings read from the environment
pub struct Config {
    pub client_type: ClientType,
    pub sysdig_url: String,
    pub sysdig_api_token: Option<String>,
    pub insecure_tls: bool,
    pub ibm_url: Option<String>,
    pub ibm_iam_token: Option<String>,
    pub ibm_instance_id: Option<String>,
    pub state_path: Option<String>,
    pub timeout_secs: u64,
}

// Tokens are redacted
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_type", &self.client_type)
            .field("sysdig_url", &self.sysdig_url)
            .field("insecure_tls", &self.insecure_tls)
            .field("ibm_url", &self.ibm_url)
            .field("ibm_instance_id", &self.ibm_instance_id)
            .field("state_path", &self.state_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_type = match var("SYSDIG_CLIENT_TYPE") {
            Some(value) => value
                .parse()
                .with_context(|| "SYSDIG_CLIENT_TYPE is not valid")?,
            None => ClientType::SysdigMonitor,
        };

        let insecure_tls = match var("SYSDIG_MONITOR_INSECURE_TLS") {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("SYSDIG_MONITOR_INSECURE_TLS '{}' is not a boolean", value))?,
            None => false,
        };

        let timeout_secs = match var("SYSDIG_TIMEOUT_SECS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("SYSDIG_TIMEOUT_SECS '{}' is not a number", value))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            client_type,
            sysdig_url: var("SYSDIG_MONITOR_URL")
                .unwrap_or_else(|| DEFAULT_SYSDIG_MONITOR_URL.to_string()),
            sysdig_api_token: var("SYSDIG_MONITOR_API_TOKEN"),
            insecure_tls,
            ibm_url: var("IBM_MONITOR_URL"),
            ibm_iam_token: var("IBM_MONITOR_IAM_TOKEN"),
            ibm_instance_id: var("IBM_MONITOR_INSTANCE_ID"),
            state_path: var("SYSDIG_STATE_PATH"),
            timeout_secs,
        })
    }

    /// Validate and convert into the provider configuration
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let client = match self.client_type {
            ClientType::SysdigMonitor => ClientConfig::SysdigMonitor {
                url: self.sysdig_url.clone(),
                api_token: self.sysdig_api_token.clone().context(
                    "SYSDIG_MONITOR_API_TOKEN is required. \
                    Set it via: export SYSDIG_MONITOR_API_TOKEN=your_token",
                )?,
                insecure_tls: self.insecure_tls,
                extra_headers: HashMap::new(),
            },
            ClientType::IbmMonitor => ClientConfig::IbmMonitor {
                url: self
                    .ibm_url
                    .clone()
                    .context("IBM_MONITOR_URL is required for ibm_monitor")?,
                iam_token: self
                    .ibm_iam_token
                    .clone()
                    .context("IBM_MONITOR_IAM_TOKEN is required for ibm_monitor")?,
                instance_id: self
                    .ibm_instance_id
                    .clone()
                    .context("IBM_MONITOR_INSTANCE_ID is required for ibm_monitor")?,
                insecure_tls: self.insecure_tls,
            },
        };

        let mut config = ProviderConfig::new(client);
        config.timeouts = TimeoutConfig::uniform(self.timeout_secs);
        config.state_store = match &self.state_path {
            Some(path) => StateStoreConfig::File { path: path.clone() },
            None => StateStoreConfig::Memory,
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("SYSDIG_MONITOR_API_TOKEN", "token")])).unwrap();

        assert_eq!(config.client_type, ClientType::SysdigMonitor);
        assert_eq!(config.sysdig_url, DEFAULT_SYSDIG_MONITOR_URL);
        assert_eq!(config.timeout_secs, 300);
        assert!(!config.insecure_tls);

        let provider = config.provider_config().unwrap();
        assert_eq!(provider.client.client_type(), ClientType::SysdigMonitor);
        assert!(matches!(provider.state_store, StateStoreConfig::Memory));
        assert_eq!(provider.timeouts.update().as_secs(), 300);
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        let err = config.provider_config().unwrap_err();
        assert!(err.to_string().contains("SYSDIG_MONITOR_API_TOKEN"));
    }

    #[test]
    fn test_ibm_requires_instance_id() {
        let config = Config::from_lookup(lookup(&[
            ("SYSDIG_CLIENT_TYPE", "ibm_monitor"),
            ("IBM_MONITOR_URL", "https://us-south.monitoring.cloud.ibm.com"),
            ("IBM_MONITOR_IAM_TOKEN", "iam"),
        ]))
        .unwrap();

        assert_eq!(config.client_type, ClientType::IbmMonitor);
        let err = config.provider_config().unwrap_err();
        assert!(err.to_string().contains("IBM_MONITOR_INSTANCE_ID"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("SYSDIG_CLIENT_TYPE", "gcp")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SYSDIG_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SYSDIG_MONITOR_INSECURE_TLS", "maybe")])).is_err());

        let config = Config::from_lookup(lookup(&[
            ("SYSDIG_MONITOR_API_TOKEN", "token"),
            ("SYSDIG_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert!(config.provider_config().is_err());
    }

    #[test]
    fn test_state_path_selects_file_store() {
        let config = Config::from_lookup(lookup(&[
            ("SYSDIG_MONITOR_API_TOKEN", "token"),
            ("SYSDIG_STATE_PATH", "/tmp/sysdig-tf/state.json"),
            ("SYSDIG_MONITOR_INSECURE_TLS", "true"),
        ]))
        .unwrap();

        let provider = config.provider_config().unwrap();
        assert!(matches!(provider.state_store, StateStoreConfig::File { ref path } if path == "/tmp/sysdig-tf/state.json"));
        assert!(config.insecure_tls);
    }

    #[test]
    fn test_debug_hides_tokens() {
        let config = Config::from_lookup(lookup(&[("SYSDIG_MONITOR_API_TOKEN", "very-secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
