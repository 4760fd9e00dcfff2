//! Controller API Client
//!
//! A thin HTTP client for the three Controller endpoints an inventory build
//! needs: inventory lookup by name, the inventory script export, and the
//! server configuration used for metadata. Every request uses HTTP basic
//! authentication.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::error::{ControllerError, ControllerResult};
use crate::config::ControllerConfig;
use crate::inventory::ControllerMetadata;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const INVENTORIES_PATH: &str = "/api/v2/inventories/";
const CONFIG_PATH: &str = "/api/v2/config/";

/// Longest error body excerpt kept in error messages
const MAX_ERROR_DETAIL: usize = 200;

/// Prefix `https://` when the host carries no scheme.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Configuration for the Controller client
#[derive(Clone)]
pub struct ControllerClientConfig {
    /// Controller base URL, with or without scheme
    pub host: String,
    pub username: String,
    pub password: String,
    /// Request timeout
    pub timeout: Duration,
    /// Whether to verify TLS certificates
    pub validate_certs: bool,
    /// User agent string
    pub user_agent: String,
}

impl Default for ControllerClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            validate_certs: true,
            user_agent: format!("controllerx/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ControllerClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClientConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("validate_certs", &self.validate_certs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for creating a ControllerClient
#[derive(Debug, Default)]
pub struct ControllerClientBuilder {
    config: ControllerClientConfig,
}

impl ControllerClientBuilder {
    /// Create a new builder for the given Controller host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: ControllerClientConfig {
                host: host.into(),
                ..Default::default()
            },
        }
    }

    /// Set the basic auth credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Verify TLS certificates (on by default)
    pub fn validate_certs(mut self, validate: bool) -> Self {
        self.config.validate_certs = validate;
        self
    }

    /// Set the user agent string
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the ControllerClient
    pub fn build(self) -> ControllerResult<ControllerClient> {
        ControllerClient::from_config(self.config)
    }
}

/// HTTP client for the Controller REST API
pub struct ControllerClient {
    /// The underlying HTTP client
    client: Client,
    /// Parsed base URL
    base_url: Url,
    /// Client configuration
    config: ControllerClientConfig,
}

impl fmt::Debug for ControllerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerClient")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

impl ControllerClient {
    /// Create a client from resolved plugin configuration
    pub fn new(config: &ControllerConfig) -> ControllerResult<Self> {
        Self::builder(&config.host)
            .credentials(&config.username, &config.password)
            .validate_certs(config.validate_certs)
            .timeout(config.timeout)
            .build()
    }

    /// Create a new builder
    pub fn builder(host: impl Into<String>) -> ControllerClientBuilder {
        ControllerClientBuilder::new(host)
    }

    fn from_config(config: ControllerClientConfig) -> ControllerResult<Self> {
        let raw = normalize_host(&config.host);
        let base_url = Url::parse(&raw).map_err(|source| ControllerError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if !config.validate_certs {
            warn!("TLS certificate verification is disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| ControllerError::HttpError {
            message: "failed to create HTTP client".to_string(),
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the Controller base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ControllerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| ControllerError::InvalidUrl {
                url: format!("{}{}", self.base_url, path.trim_start_matches('/')),
                source,
            })
    }

    /// GET a JSON document with basic auth
    async fn get_json(&self, url: Url) -> ControllerResult<Value> {
        debug!("GET {}", url);
        let timeout_secs = self.config.timeout.as_secs();

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| ControllerError::from_transport(e, timeout_secs))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ControllerError::from_transport(e, timeout_secs))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ControllerError::AuthenticationFailed {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        if !status.is_success() {
            return Err(ControllerError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ControllerError::InvalidJson {
            url: url.to_string(),
            source,
        })
    }

    /// Look up the primary key of an inventory by name.
    ///
    /// When no inventory carries that name and the name is all digits, it is
    /// taken to be the ID itself.
    pub async fn resolve_inventory_id(&self, name: &str) -> ControllerResult<String> {
        let mut url = self.endpoint(INVENTORIES_PATH)?;
        url.query_pairs_mut().append_pair("name", name);

        let body = self.get_json(url.clone()).await?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ControllerError::unexpected_response(url.as_str(), "missing 'results' list"))?;

        if results.len() > 1 {
            warn!(
                "{} inventories are named '{}'; using the first one",
                results.len(),
                name
            );
        }

        match results.first() {
            Some(first) => match first.get("id") {
                Some(Value::Number(id)) => Ok(id.to_string()),
                Some(Value::String(id)) if !id.trim_matches('/').is_empty() => {
                    Ok(id.trim_matches('/').to_string())
                }
                _ => Err(ControllerError::unexpected_response(
                    url.as_str(),
                    "inventory record has no usable 'id'",
                )),
            },
            None if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) => {
                debug!("no inventory named '{}'; treating it as an ID", name);
                Ok(name.to_string())
            }
            None => Err(ControllerError::InventoryNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Fetch the inventory script export, host variables included.
    pub async fn fetch_script(&self, inventory_id: &str) -> ControllerResult<Value> {
        let mut url = self.endpoint(&format!("{}{}/script/", INVENTORIES_PATH, inventory_id))?;
        url.query_pairs_mut()
            .append_pair("hostvars", "1")
            .append_pair("controllervars", "1")
            .append_pair("all", "1");

        self.get_json(url).await
    }

    /// Fetch Controller metadata from the configuration endpoint.
    pub async fn fetch_metadata(&self) -> ControllerResult<ControllerMetadata> {
        let url = self.endpoint(CONFIG_PATH)?;
        let body = self.get_json(url).await?;
        Ok(ControllerMetadata::from_config_document(&body))
    }
}

/// Pull the `detail` field out of an API error body, or fall back to a
/// trimmed excerpt of the raw text.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_DETAIL) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
