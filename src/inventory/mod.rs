//! Ansible inventory document for the lab.
//!
//! The inventory has three top-level groups:
//! - `all`: connection defaults shared by every host
//! - `masters`: exactly one host, `k8s-master`
//! - `workers`: `k8s-worker-1 .. k8s-worker-N` in address order
//!
//! [`project`] is the only place that shape is built. The provisioning path
//! uses it to publish the `ansible_inventory` stack output and the
//! materializer uses it when that output is missing, so both always agree.

pub mod group;
pub mod host;

pub use group::{AllGroup, HostGroup};
pub use host::{
    worker_hostname, ConnectionVars, HostVars, DEFAULT_ANSIBLE_USER, DEFAULT_PRIVATE_KEY_FILE,
    MASTER_HOSTNAME, WORKER_HOSTNAME_PREFIX,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The inventory document consumed by Ansible
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    /// Variables for every host
    pub all: AllGroup,

    /// Control-plane hosts
    pub masters: HostGroup,

    /// Worker hosts
    pub workers: HostGroup,
}

impl InventoryDocument {
    /// Address of the master, if present
    pub fn master_address(&self) -> Option<&str> {
        self.masters
            .get(MASTER_HOSTNAME)
            .map(|h| h.ansible_host.as_str())
    }

    /// Worker addresses in hostname order
    pub fn worker_addresses(&self) -> Vec<&str> {
        self.workers
            .hosts
            .values()
            .map(|h| h.ansible_host.as_str())
            .collect()
    }

    /// Serialize as 2-space indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Build the inventory from the master address and the ordered worker addresses.
///
/// Workers are numbered from 1 in the order given.
pub fn project<S: AsRef<str>>(master: &str, workers: &[S]) -> InventoryDocument {
    let mut masters = HostGroup::new();
    masters.add_host(MASTER_HOSTNAME, HostVars::new(master));

    let mut worker_group = HostGroup::new();
    for (i, address) in workers.iter().enumerate() {
        worker_group.add_host(worker_hostname(i + 1), HostVars::new(address.as_ref()));
    }

    InventoryDocument {
        all: AllGroup::default(),
        masters,
        workers: worker_group,
    }
}
