//! Host entries for the lab inventory.
//!
//! This module provides the per-host variables written into the inventory
//! and the naming rules for lab machines.

use serde::{Deserialize, Serialize};

/// Hostname of the single control-plane node.
pub const MASTER_HOSTNAME: &str = "k8s-master";

/// Prefix shared by all worker hostnames.
pub const WORKER_HOSTNAME_PREFIX: &str = "k8s-worker";

/// Remote user Ansible connects as on every lab host.
pub const DEFAULT_ANSIBLE_USER: &str = "root";

/// Private key Ansible uses for every lab host.
pub const DEFAULT_PRIVATE_KEY_FILE: &str = "~/.ssh/id_rsa";

/// Hostname of the worker at a 1-based position.
///
/// ```
/// assert_eq!(kubelab::inventory::worker_hostname(2), "k8s-worker-2");
/// ```
pub fn worker_hostname(index: usize) -> String {
    format!("{}-{}", WORKER_HOSTNAME_PREFIX, index)
}

/// Variables attached to a single host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVars {
    /// Address Ansible connects to
    pub ansible_host: String,
}

impl HostVars {
    /// Create host variables pointing at an address
    pub fn new(ansible_host: impl Into<String>) -> Self {
        Self {
            ansible_host: ansible_host.into(),
        }
    }
}

/// Connection defaults applied to every host through `all.vars`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionVars {
    /// Remote user
    pub ansible_user: String,

    /// Path to the private key on the control machine
    pub ansible_ssh_private_key_file: String,
}

impl Default for ConnectionVars {
    fn default() -> Self {
        Self {
            ansible_user: DEFAULT_ANSIBLE_USER.to_string(),
            ansible_ssh_private_key_file: DEFAULT_PRIVATE_KEY_FILE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_hostnames_are_one_based() {
        assert_eq!(worker_hostname(1), "k8s-worker-1");
        assert_eq!(worker_hostname(10), "k8s-worker-10");
    }

    #[test]
    fn test_connection_defaults() {
        let vars = ConnectionVars::default();
        assert_eq!(vars.ansible_user, "root");
        assert_eq!(vars.ansible_ssh_private_key_file, "~/.ssh/id_rsa");
    }
}
