//! The seam between resource declaration and a cloud API.

use super::{DropletSpec, SshKeySpec};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An SSH key registered with the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    /// Provider-assigned id
    pub id: u64,
    /// Key name
    pub name: String,
    /// Key fingerprint
    #[serde(default)]
    pub fingerprint: String,
}

/// A droplet the provider has accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Droplet {
    /// Provider-assigned id
    pub id: u64,
    /// Droplet name
    pub name: String,
}

/// Operations kubelab needs from a cloud provider
#[async_trait]
pub trait CloudProvider: Send + Sync + fmt::Debug {
    /// Provider name
    fn name(&self) -> &str;

    /// Register an SSH key
    async fn create_ssh_key(&self, spec: &SshKeySpec) -> Result<SshKey>;

    /// Create a droplet with the given SSH keys installed
    async fn create_droplet(&self, spec: &DropletSpec, ssh_key_ids: &[u64]) -> Result<Droplet>;

    /// Wait until the droplet has a public IPv4 address and return it
    async fn droplet_ipv4(&self, droplet: &Droplet) -> Result<String>;
}
