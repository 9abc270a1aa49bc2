//! DigitalOcean API client
//!
//! Implements [`CloudProvider`] over the DigitalOcean v2 REST API:
//!
//! - `POST /account/keys` registers the lab SSH key
//! - `POST /droplets` creates a droplet
//! - `GET /droplets/{id}` is polled until the droplet reports a public IPv4
//!
//! # Authentication
//!
//! A personal access token is read from `DIGITALOCEAN_TOKEN` and sent as a
//! bearer token.
//!
//! Failed requests are not retried. Polling for an address is bounded by
//! the configured `address_timeout`.

use super::provider::{CloudProvider, Droplet, SshKey};
use super::{DropletSpec, SshKeySpec};
use crate::config::{ProviderSettings, DEFAULT_API_URL};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Environment variable holding the API token
pub const TOKEN_ENV_VAR: &str = "DIGITALOCEAN_TOKEN";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the DigitalOcean client
#[derive(Debug, Clone)]
pub struct DigitalOceanConfig {
    /// API base URL
    pub api_url: String,
    /// API token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Delay between droplet polls
    pub poll_interval: Duration,
    /// Overall wait for a droplet address
    pub address_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for DigitalOceanConfig {
    fn default() -> Self {
        let settings = ProviderSettings::default();
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: settings.poll_interval,
            address_timeout: settings.address_timeout,
            user_agent: format!("kubelab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for creating a DigitalOcean client
pub struct DigitalOceanBuilder {
    config: DigitalOceanConfig,
}

impl DigitalOceanBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: DigitalOceanConfig::default(),
        }
    }

    /// Set the API base URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the delay between droplet polls
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set how long to wait for a droplet address
    pub fn address_timeout(mut self, timeout: Duration) -> Self {
        self.config.address_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<DigitalOcean> {
        DigitalOcean::from_config(self.config)
    }
}

impl Default for DigitalOceanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// DigitalOcean provider
#[derive(Debug)]
pub struct DigitalOcean {
    client: Client,
    base: Url,
    config: DigitalOceanConfig,
}

impl DigitalOcean {
    /// Create a client from stack provider settings and `DIGITALOCEAN_TOKEN`
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::MissingConfig(TOKEN_ENV_VAR.to_string()))?;

        Self::builder()
            .api_url(settings.api_url.clone())
            .token(token)
            .poll_interval(settings.poll_interval)
            .address_timeout(settings.address_timeout)
            .build()
    }

    /// Create a new builder
    pub fn builder() -> DigitalOceanBuilder {
        DigitalOceanBuilder::new()
    }

    fn from_config(config: DigitalOceanConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(Error::MissingConfig(TOKEN_ENV_VAR.to_string()));
        }

        // Url::join drops the last path segment unless the base ends in '/'.
        let mut api_url = config.api_url.clone();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let base = Url::parse(&api_url)
            .map_err(|e| Error::invalid_config("api_url", e.to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// API base URL
    pub fn api_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::invalid_config("api_url", e.to_string()))
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn decode<R: DeserializeOwned>(path: &str, response: Response) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(Error::Api {
                endpoint: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CloudProvider for DigitalOcean {
    fn name(&self) -> &str {
        "digitalocean"
    }

    async fn create_ssh_key(&self, spec: &SshKeySpec) -> Result<SshKey> {
        let body = CreateSshKey {
            name: &spec.name,
            public_key: &spec.public_key,
        };
        let envelope: SshKeyEnvelope = self.post("account/keys", &body).await?;
        info!("Created SSH key '{}' ({})", envelope.ssh_key.name, envelope.ssh_key.id);
        Ok(envelope.ssh_key)
    }

    async fn create_droplet(&self, spec: &DropletSpec, ssh_key_ids: &[u64]) -> Result<Droplet> {
        let body = CreateDroplet {
            name: &spec.name,
            region: &spec.region,
            size: &spec.size,
            image: &spec.image,
            ssh_keys: ssh_key_ids,
            tags: &spec.tags,
        };
        let envelope: DropletEnvelope = self.post("droplets", &body).await?;
        info!(
            "Created droplet '{}' ({}) in {}",
            envelope.droplet.name, envelope.droplet.id, spec.region
        );
        Ok(Droplet {
            id: envelope.droplet.id,
            name: envelope.droplet.name,
        })
    }

    async fn droplet_ipv4(&self, droplet: &Droplet) -> Result<String> {
        let deadline = Instant::now() + self.config.address_timeout;
        let path = format!("droplets/{}", droplet.id);

        loop {
            let envelope: DropletEnvelope = self.get(&path).await?;
            if let Some(address) = envelope.droplet.public_ipv4() {
                info!("Droplet '{}' is reachable at {}", droplet.name, address);
                return Ok(address.to_string());
            }

            if Instant::now() >= deadline {
                return Err(Error::AddressTimeout {
                    name: droplet.name.clone(),
                    timeout_secs: self.config.address_timeout.as_secs(),
                });
            }

            debug!(
                "Droplet '{}' is {}, waiting {:?} for an address",
                droplet.name, envelope.droplet.status, self.config.poll_interval
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[derive(Serialize)]
struct CreateSshKey<'a> {
    name: &'a str,
    public_key: &'a str,
}

#[derive(Serialize)]
struct CreateDroplet<'a> {
    name: &'a str,
    region: &'a str,
    size: &'a str,
    image: &'a str,
    ssh_keys: &'a [u64],
    tags: &'a [String],
}

#[derive(Deserialize)]
struct SshKeyEnvelope {
    ssh_key: SshKey,
}

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: DropletBody,
}

#[derive(Deserialize)]
struct DropletBody {
    id: u64,
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    networks: Networks,
}

impl DropletBody {
    fn public_ipv4(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|n| n.kind == "public" && !n.ip_address.is_empty())
            .map(|n| n.ip_address.as_str())
    }
}

#[derive(Deserialize, Default)]
struct Networks {
    #[serde(default)]
    v4: Vec<NetworkV4>,
}

#[derive(Deserialize)]
struct NetworkV4 {
    ip_address: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}
