//! Host groups of the lab inventory.
//!
//! Groups keep their hosts in insertion order so that worker numbering in
//! the serialized document follows the order addresses were assigned.

use super::host::{ConnectionVars, HostVars};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A group of hosts in the inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    /// Hosts keyed by hostname, in insertion order
    #[serde(default)]
    pub hosts: IndexMap<String, HostVars>,
}

impl HostGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host, replacing any previous entry with the same name
    pub fn add_host(&mut self, name: impl Into<String>, vars: HostVars) {
        self.hosts.insert(name.into(), vars);
    }

    /// Get a host's variables
    pub fn get(&self, name: &str) -> Option<&HostVars> {
        self.hosts.get(name)
    }

    /// Number of hosts in this group
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Host names in insertion order
    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}

/// The implicit `all` group, which only carries variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllGroup {
    /// Variables inherited by every host
    pub vars: ConnectionVars,
}
