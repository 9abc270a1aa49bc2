//! Stack state for kubelab
//!
//! A stack's realized outputs are the only thing shared between
//! `kubelab up` and the inventory materializer. They are persisted as
//! JSON under the state directory and printed by `kubelab stack output`
//! in the same shape `pulumi stack output --json` produces:
//!
//! ```json
//! {
//!   "master_ip": "10.0.0.1",
//!   "worker_ips": ["10.0.0.2", "10.0.0.3"],
//!   "ansible_inventory": "{\n  \"all\": ...}",
//!   "ssh_key_id": "512189"
//! }
//! ```

pub mod persistence;

pub use persistence::StateStore;

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Name of the master address output
pub const OUTPUT_MASTER_IP: &str = "master_ip";

/// Name of the worker address list output
pub const OUTPUT_WORKER_IPS: &str = "worker_ips";

/// Name of the JSON-encoded inventory output
pub const OUTPUT_ANSIBLE_INVENTORY: &str = "ansible_inventory";

/// Name of the SSH key id output
pub const OUTPUT_SSH_KEY_ID: &str = "ssh_key_id";

/// Named outputs published by a provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutputs {
    /// Public address of the master droplet
    pub master_ip: String,

    /// Public addresses of the worker droplets, in declaration order
    pub worker_ips: Vec<String>,

    /// Inventory document, encoded as 2-space indented JSON
    pub ansible_inventory: String,

    /// Provider id of the lab SSH key
    pub ssh_key_id: String,
}

impl StackOutputs {
    /// All outputs as a JSON object
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// A single output by name
    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            OUTPUT_MASTER_IP => Some(self.master_ip.clone().into()),
            OUTPUT_WORKER_IPS => Some(self.worker_ips.clone().into()),
            OUTPUT_ANSIBLE_INVENTORY => Some(self.ansible_inventory.clone().into()),
            OUTPUT_SSH_KEY_ID => Some(self.ssh_key_id.clone().into()),
            _ => None,
        }
    }
}

/// Persisted record of a stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackState {
    /// Stack name
    pub stack: String,

    /// When the outputs were recorded
    pub updated_at: DateTime<Utc>,

    /// Realized outputs
    pub outputs: StackOutputs,
}

impl StackState {
    /// Record outputs for a stack at the current time
    pub fn new(stack: impl Into<String>, outputs: StackOutputs) -> Self {
        Self {
            stack: stack.into(),
            updated_at: Utc::now(),
            outputs,
        }
    }
}

/// Replace `path` with `contents` without ever exposing a partial file.
///
/// The data goes to a temporary file in the same directory, which is then
/// renamed over the target. An existing target keeps its permissions, and a
/// symlink keeps pointing at the replaced file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    // A symlinked target keeps its link; the file it points at is replaced.
    let target = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    };
    let existing = fs::metadata(&target).ok().map(|meta| meta.permissions());

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = temp_file_in(dir)?;
    tmp.write_all(contents)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// New files are world-readable, subject to the umask
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o644))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new_in(dir)
}
