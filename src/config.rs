//! Stack configuration for kubelab
//!
//! Configuration is read once, before any resource is declared, into an
//! immutable [`LabConfig`]. Values are layered from:
//! - Built-in defaults
//! - The stack configuration file (`Kubelab.<stack>.yaml`)
//! - Environment variables (`KUBELAB_NODE_COUNT`, `KUBELAB_REGION`, ...)
//!
//! The stack file mirrors the layout Pulumi uses for its own stack files:
//!
//! ```yaml
//! config:
//!   kubelab:node_count: 3
//!   kubelab:region: nyc3
//!   kubelab:instance_size: s-2vcpu-2gb
//!   kubelab:ssh_public_key: ssh-ed25519 AAAA... lab@example
//! provider:
//!   poll_interval: 5s
//!   address_timeout: 5m
//! ```
//!
//! Keys may also be written without the `kubelab:` namespace.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Namespace prefix accepted on configuration keys
pub const CONFIG_NAMESPACE: &str = "kubelab";

/// Default number of nodes (one master plus workers)
pub const DEFAULT_NODE_COUNT: u32 = 3;

/// Default DigitalOcean region
pub const DEFAULT_REGION: &str = "nyc3";

/// Default droplet size
pub const DEFAULT_INSTANCE_SIZE: &str = "s-2vcpu-2gb";

/// Default droplet image
pub const DEFAULT_IMAGE: &str = "ubuntu-22-04-x64";

/// Default DigitalOcean API endpoint
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com/v2";

/// Environment variable overrides, as (variable, key) pairs
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("KUBELAB_NODE_COUNT", "node_count"),
    ("KUBELAB_REGION", "region"),
    ("KUBELAB_INSTANCE_SIZE", "instance_size"),
    ("KUBELAB_IMAGE", "image"),
    ("KUBELAB_SSH_PUBLIC_KEY", "ssh_public_key"),
];

/// Path of the stack configuration file for a stack name
pub fn stack_config_path(stack: &str) -> PathBuf {
    PathBuf::from(format!("Kubelab.{}.yaml", stack))
}

/// Provider connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the DigitalOcean API
    pub api_url: String,

    /// Delay between droplet status polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long to wait for a droplet to report its address
    #[serde(with = "humantime_serde")]
    pub address_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(5),
            address_timeout: Duration::from_secs(300),
        }
    }
}

/// On-disk layout of a stack configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StackConfigFile {
    config: IndexMap<String, serde_yaml::Value>,
    provider: ProviderSettings,
}

/// Raw key-value configuration for a stack
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    values: IndexMap<String, String>,
    provider: ProviderSettings,
}

impl ConfigSource {
    /// Create an empty configuration source
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a stack configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let file: StackConfigFile = match extension {
            "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        }
        .map_err(|message| Error::ConfigLoad {
            path: path.to_path_buf(),
            message,
        })?;

        let mut source = Self {
            values: IndexMap::new(),
            provider: file.provider,
        };
        for (key, value) in file.config {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => continue,
                other => {
                    return Err(Error::ConfigLoad {
                        path: path.to_path_buf(),
                        message: format!("value for '{}' must be a scalar, got {:?}", key, other),
                    })
                }
            };
            source.set(&key, text);
        }

        Ok(source)
    }

    /// Set a value, dropping any namespace prefix from the key
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(Self::bare_key(key).to_string(), value.into());
    }

    /// Replace the provider settings
    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.provider = provider;
        self
    }

    /// Get a value, treating blank strings as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(Self::bare_key(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Get an integer value
    pub fn get_int(&self, key: &str) -> Result<Option<u32>> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Error::invalid_config(key, format!("expected an integer, got '{}'", raw))),
            None => Ok(None),
        }
    }

    /// Get a value that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::MissingConfig(format!("{}:{}", CONFIG_NAMESPACE, key)))
    }

    /// Apply `KUBELAB_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                debug!("Config override {} from {}", key, var);
                self.set(key, value);
            }
        }

        // KUBELAB_API_URL
        if let Ok(url) = std::env::var("KUBELAB_API_URL") {
            self.provider.api_url = url;
        }
    }

    fn bare_key(key: &str) -> &str {
        key.strip_prefix(CONFIG_NAMESPACE)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(key)
    }
}

/// Immutable configuration for one provisioning run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabConfig {
    /// Total number of droplets, master included
    pub node_count: u32,

    /// Region slug
    pub region: String,

    /// Droplet size slug
    pub instance_size: String,

    /// Droplet image slug
    pub image: String,

    /// Public key installed on every droplet
    pub ssh_public_key: String,

    /// Provider connection settings
    pub provider: ProviderSettings,
}

impl LabConfig {
    /// Load configuration for a stack.
    ///
    /// An explicit `path` must exist. Without one, `Kubelab.<stack>.yaml` is
    /// used when present.
    pub fn load(path: Option<&Path>, stack: &str) -> Result<Self> {
        let mut source = match path {
            Some(path) => ConfigSource::from_file(path)?,
            None => {
                let default_path = stack_config_path(stack);
                if default_path.exists() {
                    ConfigSource::from_file(&default_path)?
                } else {
                    debug!(
                        "No stack configuration at {}, using defaults",
                        default_path.display()
                    );
                    ConfigSource::new()
                }
            }
        };

        source.apply_env_overrides();
        Self::from_source(&source)
    }

    /// Build the configuration from raw values, applying defaults.
    ///
    /// Fails when `ssh_public_key` is missing or `node_count` is zero.
    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let node_count = source.get_int("node_count")?.unwrap_or(DEFAULT_NODE_COUNT);
        if node_count < 1 {
            return Err(Error::invalid_config(
                "node_count",
                "at least one node (the master) is required",
            ));
        }

        let ssh_public_key = source.require("ssh_public_key")?.to_string();

        Ok(Self {
            node_count,
            region: source.get("region").unwrap_or(DEFAULT_REGION).to_string(),
            instance_size: source
                .get("instance_size")
                .unwrap_or(DEFAULT_INSTANCE_SIZE)
                .to_string(),
            image: source.get("image").unwrap_or(DEFAULT_IMAGE).to_string(),
            ssh_public_key,
            provider: source.provider.clone(),
        })
    }

    /// Number of worker droplets
    pub fn worker_count(&self) -> u32 {
        self.node_count.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source_with_key() -> ConfigSource {
        let mut source = ConfigSource::new();
        source.set("ssh_public_key", "ssh-ed25519 AAAA test");
        source
    }

    #[test]
    fn test_defaults() {
        let config = LabConfig::from_source(&source_with_key()).unwrap();
        assert_eq!(config.node_count, 3);
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.region, "nyc3");
        assert_eq!(config.instance_size, "s-2vcpu-2gb");
        assert_eq!(config.image, "ubuntu-22-04-x64");
        assert_eq!(config.provider, ProviderSettings::default());
    }

    #[test]
    fn test_missing_public_key_fails() {
        let err = LabConfig::from_source(&ConfigSource::new()).unwrap_err();
        assert!(matches!(err, Error::MissingConfig(ref key) if key == "kubelab:ssh_public_key"));
    }

    #[test]
    fn test_blank_public_key_is_missing() {
        let mut source = ConfigSource::new();
        source.set("ssh_public_key", "   ");
        assert!(matches!(
            LabConfig::from_source(&source),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let mut source = source_with_key();
        source.set("node_count", "0");
        assert!(matches!(
            LabConfig::from_source(&source),
            Err(Error::InvalidConfig { ref key, .. }) if key == "node_count"
        ));
    }

    #[test]
    fn test_non_numeric_node_count() {
        let mut source = source_with_key();
        source.set("kubelab:node_count", "three");
        assert!(LabConfig::from_source(&source).is_err());
    }

    #[test]
    fn test_namespaced_keys() {
        let mut source = source_with_key();
        source.set("kubelab:region", "ams3");
        assert_eq!(source.get("region"), Some("ams3"));
        assert_eq!(source.get("kubelab:region"), Some("ams3"));
    }

    #[test]
    fn test_yaml_stack_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"config:
  kubelab:node_count: 5
  kubelab:region: fra1
  ssh_public_key: ssh-rsa AAAA lab
provider:
  poll_interval: 2s
  address_timeout: 1m
"#
        )
        .unwrap();

        let source = ConfigSource::from_file(file.path()).unwrap();
        let config = LabConfig::from_source(&source).unwrap();
        assert_eq!(config.node_count, 5);
        assert_eq!(config.region, "fra1");
        assert_eq!(config.ssh_public_key, "ssh-rsa AAAA lab");
        assert_eq!(config.provider.poll_interval, Duration::from_secs(2));
        assert_eq!(config.provider.address_timeout, Duration::from_secs(60));
        assert_eq!(config.provider.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_toml_stack_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"[config]
"kubelab:instance_size" = "s-4vcpu-8gb"
ssh_public_key = "ssh-rsa AAAA lab"
"#
        )
        .unwrap();

        let source = ConfigSource::from_file(file.path()).unwrap();
        let config = LabConfig::from_source(&source).unwrap();
        assert_eq!(config.instance_size, "s-4vcpu-8gb");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = LabConfig::load(Some(Path::new("/nonexistent/Kubelab.dev.yaml")), "dev")
            .unwrap_err();
        assert!(matches!(err, Error::ConfigLoad { .. }));
    }
}
