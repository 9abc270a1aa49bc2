//! Resource declaration for the lab.
//!
//! A [`StackPlan`] lists every resource a lab needs: one SSH key, one master
//! droplet and `node_count - 1` worker droplets. Declaring a plan is pure;
//! [`deploy`] hands it to a [`CloudProvider`] and wires the resulting
//! addresses into the stack outputs.
//!
//! ```text
//!   ssh key ──┬──> k8s-master ───────> master_ip ──┐
//!             ├──> k8s-worker-1 ──┐                ├──> ansible_inventory
//!             └──> k8s-worker-N ──┴──> worker_ips ─┘
//! ```

pub mod deploy;
pub mod digitalocean;
pub mod output;
pub mod provider;

pub use deploy::deploy;
pub use digitalocean::DigitalOcean;
pub use output::Output;
pub use provider::{CloudProvider, Droplet, SshKey};

use crate::config::LabConfig;
use crate::error::{Error, Result};
use crate::inventory::{worker_hostname, MASTER_HOSTNAME};
use serde::Serialize;
use std::fmt;

/// Name of the SSH key resource
pub const SSH_KEY_NAME: &str = "kubernetes-lab-key";

/// Tag carried by every lab droplet
pub const CLUSTER_TAG: &str = "kubernetes";

/// Role of a droplet in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Control-plane node
    Master,
    /// Worker node
    Worker,
}

impl Role {
    /// Tag naming this role
    pub fn tag(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Desired SSH key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshKeySpec {
    /// Key name at the provider
    pub name: String,
    /// OpenSSH public key
    pub public_key: String,
}

/// Desired droplet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropletSpec {
    /// Droplet name, also used as its hostname
    pub name: String,
    /// Cluster role
    pub role: Role,
    /// Size slug
    pub size: String,
    /// Image slug
    pub image: String,
    /// Region slug
    pub region: String,
    /// Tags applied at creation
    pub tags: Vec<String>,
}

impl DropletSpec {
    fn new(name: String, role: Role, config: &LabConfig) -> Self {
        Self {
            name,
            role,
            size: config.instance_size.clone(),
            image: config.image.clone(),
            region: config.region.clone(),
            tags: vec![CLUSTER_TAG.to_string(), role.tag().to_string()],
        }
    }
}

/// Every resource of one lab, in creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackPlan {
    /// Key installed on every droplet
    pub ssh_key: SshKeySpec,
    /// The single master
    pub master: DropletSpec,
    /// Workers, numbered from 1
    pub workers: Vec<DropletSpec>,
}

impl StackPlan {
    /// Declare the resources for a configuration.
    ///
    /// No resource is declared unless a public key is present.
    pub fn declare(config: &LabConfig) -> Result<Self> {
        if config.ssh_public_key.trim().is_empty() {
            return Err(Error::MissingConfig("kubelab:ssh_public_key".to_string()));
        }
        if config.node_count < 1 {
            return Err(Error::invalid_config(
                "node_count",
                "at least one node (the master) is required",
            ));
        }

        let ssh_key = SshKeySpec {
            name: SSH_KEY_NAME.to_string(),
            public_key: config.ssh_public_key.clone(),
        };

        let master = DropletSpec::new(MASTER_HOSTNAME.to_string(), Role::Master, config);

        let workers = (1..config.node_count as usize)
            .map(|i| DropletSpec::new(worker_hostname(i), Role::Worker, config))
            .collect();

        Ok(Self {
            ssh_key,
            master,
            workers,
        })
    }

    /// All droplets, master first
    pub fn droplets(&self) -> impl Iterator<Item = &DropletSpec> {
        std::iter::once(&self.master).chain(self.workers.iter())
    }

    /// Number of resources in the plan, SSH key included
    pub fn resource_count(&self) -> usize {
        1 + 1 + self.workers.len()
    }
}
