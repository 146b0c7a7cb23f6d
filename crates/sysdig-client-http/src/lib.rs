// # Sysdig Monitor Team Clients
//
// HTTP implementations of `TeamClient` for both deployment modes:
//
// - `SysdigMonitorClient`: Sysdig Monitor SaaS or on-prem, bearer API token
// - `IbmMonitorClient`: IBM Cloud Monitoring, bearer IAM token plus the
//   monitoring instance GUID in the `IBMInstanceID` header
//
// Both speak the same teams API and share one request path.
//
// ## Constraints
//
// - One HTTP request per trait call
// - No retries or backoff; errors are mapped and returned
// - 30 second HTTP timeout
// - Tokens never appear in logs, errors or `Debug` output
//
// ## API Reference
//
// - Create: POST `/api/teams`
// - Get: GET `/api/teams/:id`
// - Update: PUT `/api/teams/:id`
// - Delete: DELETE `/api/teams/:id`
//
// Single teams are returned wrapped as `{"team": {...}}`.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use sysdig_core::config::{ClientConfig, ClientType};
use sysdig_core::team::{Team, TeamWrapper};
use sysdig_core::traits::{TeamClient, TeamClientFactory};
use sysdig_core::{ClientRegistry, Error, Result};

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the IBM Cloud Monitoring instance GUID
const IBM_INSTANCE_ID_HEADER: &str = "IBMInstanceID";

const TEAMS_PATH: &str = "/api/teams";

/// Shared request path for both clients
struct TeamsApi {
    base_url: String,
    client: reqwest::Client,
}

impl TeamsApi {
    fn new(url: &str, headers: HeaderMap, insecure_tls: bool) -> Result<Self> {
        if insecure_tls {
            tracing::warn!(url, "TLS certificate verification is disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .default_headers(headers)
            .danger_accept_invalid_certs(insecure_tls)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn team_url(&self, id: i64) -> String {
        format!("{}{}/{}", self.base_url, TEAMS_PATH, id)
    }

    async fn create(&self, team: &Team) -> Result<Team> {
        let url = format!("{}{}", self.base_url, TEAMS_PATH);
        let body = self
            .send(Method::POST, &url, Some(team), &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        unwrap_team(&body)
    }

    async fn get(&self, id: i64) -> Result<Team> {
        let body = self
            .send(Method::GET, &self.team_url(id), None, &[StatusCode::OK])
            .await?;
        unwrap_team(&body)
    }

    async fn update(&self, team: &Team) -> Result<Team> {
        let body = self
            .send(Method::PUT, &self.team_url(team.id), Some(team), &[StatusCode::OK])
            .await?;
        unwrap_team(&body)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.send(
            Method::DELETE,
            &self.team_url(id),
            None,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        team: Option<&Team>,
        accepted: &[StatusCode],
    ) -> Result<String> {
        tracing::debug!(%method, url, "sending teams API request");

        let mut request = self.client.request(method, url);
        if let Some(team) = team {
            request = request.json(team);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("request to {} failed: {}", url, e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if accepted.contains(&status) {
            return Ok(body);
        }

        Err(map_status(status, &body))
    }
}

fn unwrap_team(body: &str) -> Result<Team> {
    let wrapper: TeamWrapper = serde_json::from_str(body)?;
    Ok(wrapper.team)
}

/// Map a rejected response onto the error taxonomy
fn map_status(status: StatusCode, body: &str) -> Error {
    let message = error_message(body);
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "invalid token or insufficient permissions ({}): {}",
            status, message
        )),
        404 => Error::not_found(message),
        409 => Error::conflict(message),
        429 => Error::rate_limited(message),
        code => Error::api(code, message),
    }
}

/// Pull a readable message out of an API error body
///
/// The API answers with either `{"message": "..."}` or
/// `{"errors": [{"message": "..."}]}`; anything else is returned as-is.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .or_else(|| v.pointer("/errors/0/message").and_then(Value::as_str))
    });

    match message {
        Some(message) => message.to_string(),
        None => body.trim().to_string(),
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| Error::config("token contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    Ok(value)
}

fn header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::config(format!("invalid header name: {}", name)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("invalid value for header {}", name)))?;
    Ok((name, value))
}

/// Team client for Sysdig Monitor
pub struct SysdigMonitorClient {
    url: String,
    api: TeamsApi,
}

// Token is redacted
impl std::fmt::Debug for SysdigMonitorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysdigMonitorClient")
            .field("url", &self.url)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

impl SysdigMonitorClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty, a header is invalid or the
    /// HTTP client cannot be built.
    pub fn new(
        url: &str,
        api_token: &str,
        insecure_tls: bool,
        extra_headers: &HashMap<String, String>,
    ) -> Result<Self> {
        if api_token.is_empty() {
            return Err(Error::config("Sysdig Monitor API token is required"));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in extra_headers {
            let (name, value) = header(name, value)?;
            headers.insert(name, value);
        }
        headers.insert(AUTHORIZATION, bearer(api_token)?);

        Ok(Self {
            url: url.to_string(),
            api: TeamsApi::new(url, headers, insecure_tls)?,
        })
    }
}

#[async_trait]
impl TeamClient for SysdigMonitorClient {
    async fn create_team(&self, team: Team) -> Result<Team> {
        self.api.create(&team).await
    }

    async fn update_team(&self, team: Team) -> Result<Team> {
        self.api.update(&team).await
    }

    async fn get_team_by_id(&self, id: i64) -> Result<Team> {
        self.api.get(id).await
    }

    async fn delete_team(&self, id: i64) -> Result<()> {
        self.api.delete(id).await
    }

    fn client_type(&self) -> ClientType {
        ClientType::SysdigMonitor
    }
}

/// Team client for IBM Cloud Monitoring
pub struct IbmMonitorClient {
    url: String,
    instance_id: String,
    api: TeamsApi,
}

// Token is redacted
impl std::fmt::Debug for IbmMonitorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IbmMonitorClient")
            .field("url", &self.url)
            .field("instance_id", &self.instance_id)
            .field("iam_token", &"<REDACTED>")
            .finish()
    }
}

impl IbmMonitorClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token or instance ID is empty or the HTTP
    /// client cannot be built.
    pub fn new(url: &str, iam_token: &str, instance_id: &str, insecure_tls: bool) -> Result<Self> {
        if iam_token.is_empty() {
            return Err(Error::config("IBM IAM token is required"));
        }
        if instance_id.is_empty() {
            return Err(Error::config("IBM monitoring instance ID is required"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(iam_token)?);
        let (name, value) = header(IBM_INSTANCE_ID_HEADER, instance_id)?;
        headers.insert(name, value);

        Ok(Self {
            url: url.to_string(),
            instance_id: instance_id.to_string(),
            api: TeamsApi::new(url, headers, insecure_tls)?,
        })
    }
}

#[async_trait]
impl TeamClient for IbmMonitorClient {
    async fn create_team(&self, team: Team) -> Result<Team> {
        self.api.create(&team).await
    }

    async fn update_team(&self, team: Team) -> Result<Team> {
        self.api.update(&team).await
    }

    async fn get_team_by_id(&self, id: i64) -> Result<Team> {
        self.api.get(id).await
    }

    async fn delete_team(&self, id: i64) -> Result<()> {
        self.api.delete(id).await
    }

    fn client_type(&self) -> ClientType {
        ClientType::IbmMonitor
    }
}

/// Factory for Sysdig Monitor clients
pub struct SysdigMonitorFactory;

impl TeamClientFactory for SysdigMonitorFactory {
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn TeamClient>> {
        match config {
            ClientConfig::SysdigMonitor {
                url,
                api_token,
                insecure_tls,
                extra_headers,
            } => Ok(Box::new(SysdigMonitorClient::new(
                url,
                api_token,
                *insecure_tls,
                extra_headers,
            )?)),
            _ => Err(Error::config("invalid config for Sysdig Monitor client")),
        }
    }
}

/// Factory for IBM Cloud Monitoring clients
pub struct IbmMonitorFactory;

impl TeamClientFactory for IbmMonitorFactory {
    fn create(&self, config: &ClientConfig) -> Result<Box<dyn TeamClient>> {
        match config {
            ClientConfig::IbmMonitor {
                url,
                iam_token,
                instance_id,
                insecure_tls,
            } => Ok(Box::new(IbmMonitorClient::new(
                url,
                iam_token,
                instance_id,
                *insecure_tls,
            )?)),
            _ => Err(Error::config("invalid config for IBM Monitor client")),
        }
    }
}

/// Register both clients with a registry
///
/// # Example
///
/// ```rust
/// use sysdig_core::ClientRegistry;
/// use sysdig_core::config::ClientType;
///
/// let registry = ClientRegistry::new();
/// sysdig_client_http::register(&registry);
/// assert!(registry.has_client(ClientType::IbmMonitor));
/// ```
pub fn register(registry: &ClientRegistry) {
    registry.register(ClientType::SysdigMonitor, Box::new(SysdigMonitorFactory));
    registry.register(ClientType::IbmMonitor, Box::new(IbmMonitorFactory));
}
