//! JSON file persistence for stack state.
//!
//! Each stack lives in its own file, `<root>/stacks/<stack>.json`.

use super::{write_atomic, StackState};
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default state directory, relative to the working directory
pub const DEFAULT_STATE_DIR: &str = ".kubelab";

/// File-backed store of stack states
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Create a store rooted at `root`. Nothing is created until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the state file for a stack
    pub fn stack_path(&self, stack: &str) -> PathBuf {
        self.root.join("stacks").join(format!("{}.json", stack))
    }

    /// Load a stack's state, if it has been recorded
    pub fn load(&self, stack: &str) -> Result<Option<StackState>> {
        let path = self.stack_path(stack);
        if !path.exists() {
            debug!("No state recorded at {}", path.display());
            return Ok(None);
        }

        let file = File::open(&path)?;
        let state: StackState = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(state))
    }

    /// Load a stack's state, failing when it has not been recorded
    pub fn require(&self, stack: &str) -> Result<StackState> {
        self.load(stack)?
            .ok_or_else(|| Error::StackNotFound(stack.to_string()))
    }

    /// Persist a stack's state, replacing any previous record
    pub fn save(&self, state: &StackState) -> Result<PathBuf> {
        let path = self.stack_path(&state.stack);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &json)?;
        debug!("Saved state for stack '{}' to {}", state.stack, path.display());
        Ok(path)
    }

    /// Outputs of a stack as a JSON object.
    ///
    /// A stack without recorded state yields `{}`, matching what
    /// `pulumi stack output --json` prints for a stack with no outputs.
    pub fn outputs_json(&self, stack: &str) -> Result<serde_json::Value> {
        match self.load(stack)? {
            Some(state) => state.outputs.to_value(),
            None => Ok(serde_json::Value::Object(serde_json::Map::new())),
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_DIR)
    }
}
