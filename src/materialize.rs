//! Inventory materializer
//!
//! Turns the realized outputs of a stack into the `dynamic.json` file that
//! Ansible reads. The outputs are fetched by running
//! `<tool> stack output --json` in the provisioning project's directory
//! (`../pulumi` by default); `kubelab` itself answers that command too.
//!
//! Resolution rules:
//! - an empty answer (`{}`, `null`, `""`, ...) is a failure
//! - `ansible_inventory`, when present, is decoded and written as-is
//! - otherwise the inventory is rebuilt from `master_ip` and `worker_ips`
//!   with [`inventory::project`]
//!
//! The file is only touched once a complete document exists.

use crate::error::{Error, Result};
use crate::inventory;
use crate::state::{write_atomic, OUTPUT_ANSIBLE_INVENTORY, OUTPUT_MASTER_IP, OUTPUT_WORKER_IPS};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Provisioning tool invoked by default
pub const DEFAULT_TOOL: &str = "pulumi";

/// Provisioning project directory, relative to the working directory
pub const DEFAULT_PROJECT_DIR: &str = "../pulumi";

/// Inventory file written by default
pub const DEFAULT_OUTPUT_FILE: &str = "dynamic.json";

/// Where stack outputs come from
pub trait StackOutputSource {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Fetch the outputs as parsed JSON
    fn fetch(&self) -> Result<Value>;
}

/// Runs `<program> stack output --json` as a child process
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    project_dir: PathBuf,
    stack: Option<String>,
}

impl ToolCommand {
    /// Invoke `program` in the default project directory
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            project_dir: PathBuf::from(DEFAULT_PROJECT_DIR),
            stack: None,
        }
    }

    /// Set the directory the tool runs in
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// Select a stack explicitly instead of the tool's current one
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    /// Arguments passed to the tool
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stack".to_string(),
            "output".to_string(),
            "--json".to_string(),
        ];
        if let Some(ref stack) = self.stack {
            args.push("--stack".to_string());
            args.push(stack.clone());
        }
        args
    }

    /// Resolve the program to run.
    ///
    /// Bare names are looked up on `PATH` up front so a missing tool is
    /// reported as such rather than as a spawn error.
    fn resolve_program(&self) -> Result<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return std::fs::canonicalize(program).map_err(|e| {
                Error::tool_failed(&self.program, format!("cannot locate program: {}", e))
            });
        }

        which::which(&self.program)
            .map_err(|e| Error::tool_failed(&self.program, format!("not found in PATH: {}", e)))
    }
}

impl StackOutputSource for ToolCommand {
    fn describe(&self) -> String {
        format!(
            "{} {} (in {})",
            self.program,
            self.args().join(" "),
            self.project_dir.display()
        )
    }

    fn fetch(&self) -> Result<Value> {
        if !self.project_dir.is_dir() {
            return Err(Error::tool_failed(
                &self.program,
                format!(
                    "project directory '{}' does not exist",
                    self.project_dir.display()
                ),
            ));
        }

        let program = self.resolve_program()?;
        debug!("Running {}", self.describe());

        let output = Command::new(&program)
            .args(self.args())
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::tool_failed(&self.program, format!("failed to execute: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match (output.status.code(), stderr.trim()) {
                (Some(code), "") => format!("exited with status {}", code),
                (Some(code), err) => format!("exited with status {}: {}", code, err),
                (None, _) => "terminated by signal".to_string(),
            };
            return Err(Error::tool_failed(&self.program, message));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::MalformedOutputs(format!("output is not UTF-8: {}", e)))?;

        serde_json::from_str(&stdout).map_err(|e| Error::MalformedOutputs(e.to_string()))
    }
}

/// How the inventory document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryOrigin {
    /// Decoded from the `ansible_inventory` output
    Prebuilt,
    /// Rebuilt from `master_ip` and `worker_ips`
    Reconstructed,
}

/// An inventory ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInventory {
    /// The document
    pub document: Value,
    /// Which path produced it
    pub origin: InventoryOrigin,
}

/// Python-style truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are empty.
fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Decide which inventory to write for a set of stack outputs
pub fn resolve_inventory(outputs: &Value) -> Result<ResolvedInventory> {
    if is_empty_response(outputs) {
        return Err(Error::EmptyOutputs);
    }

    let map = outputs.as_object().ok_or_else(|| {
        Error::MalformedOutputs(format!("expected a JSON object, got {}", outputs))
    })?;

    if let Some(prebuilt) = map.get(OUTPUT_ANSIBLE_INVENTORY) {
        let document = match prebuilt {
            Value::String(text) => serde_json::from_str(text).map_err(|e| {
                Error::MalformedOutputs(format!("'{}' is not valid JSON: {}", OUTPUT_ANSIBLE_INVENTORY, e))
            })?,
            Value::Object(_) => prebuilt.clone(),
            other => {
                return Err(Error::MalformedOutputs(format!(
                    "'{}' must be a JSON string, got {}",
                    OUTPUT_ANSIBLE_INVENTORY, other
                )))
            }
        };
        return Ok(ResolvedInventory {
            document,
            origin: InventoryOrigin::Prebuilt,
        });
    }

    let master = match map.get(OUTPUT_MASTER_IP) {
        None | Some(Value::Null) => "",
        Some(Value::String(address)) => address.as_str(),
        Some(other) => {
            return Err(Error::MalformedOutputs(format!(
                "'{}' must be a string, got {}",
                OUTPUT_MASTER_IP, other
            )))
        }
    };

    let workers: Vec<&str> = match map.get(OUTPUT_WORKER_IPS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    Error::MalformedOutputs(format!(
                        "'{}' must contain only strings, got {}",
                        OUTPUT_WORKER_IPS, item
                    ))
                })
            })
            .collect::<Result<_>>()?,
        Some(other) => {
            return Err(Error::MalformedOutputs(format!(
                "'{}' must be a list, got {}",
                OUTPUT_WORKER_IPS, other
            )))
        }
    };

    Ok(ResolvedInventory {
        document: inventory::project(master, &workers).to_value()?,
        origin: InventoryOrigin::Reconstructed,
    })
}

/// Write a document as 2-space indented JSON, replacing the file
pub fn write_inventory(path: &Path, document: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(document)?;
    write_atomic(path, text.as_bytes())
}

/// Fetches outputs from a source and writes the inventory file
#[derive(Debug)]
pub struct Materializer<S> {
    source: S,
    output_path: PathBuf,
}

impl<S: StackOutputSource> Materializer<S> {
    /// Write to `dynamic.json` in the working directory
    pub fn new(source: S) -> Self {
        Self {
            source,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }

    /// Set the inventory file path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Inventory file path
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Fetch, resolve and write. Nothing is written on failure.
    pub fn run(&self) -> Result<ResolvedInventory> {
        info!("Fetching stack outputs: {}", self.source.describe());
        let outputs = self.source.fetch()?;

        let resolved = resolve_inventory(&outputs)?;
        match resolved.origin {
            InventoryOrigin::Prebuilt => info!("Using the inventory published by the stack"),
            InventoryOrigin::Reconstructed => {
                info!("No published inventory, rebuilding it from host addresses")
            }
        }

        write_inventory(&self.output_path, &resolved.document)?;
        info!("Wrote {}", self.output_path.display());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_responses() {
        for value in [json!({}), json!(null), json!(""), json!([]), json!(0), json!(false)] {
            assert!(
                matches!(resolve_inventory(&value), Err(Error::EmptyOutputs)),
                "{} should be empty",
                value
            );
        }
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            resolve_inventory(&json!(["10.0.0.1"])),
            Err(Error::MalformedOutputs(_))
        ));
    }

    #[test]
    fn test_prebuilt_wins() {
        let outputs = json!({
            "ansible_inventory": "{\"custom\": {\"hosts\": {}}}",
            "master_ip": "10.0.0.1",
        });
        let resolved = resolve_inventory(&outputs).unwrap();
        assert_eq!(resolved.origin, InventoryOrigin::Prebuilt);
        assert_eq!(resolved.document, json!({"custom": {"hosts": {}}}));
    }

    #[test]
    fn test_prebuilt_invalid_json() {
        let outputs = json!({"ansible_inventory": "{not json"});
        assert!(matches!(
            resolve_inventory(&outputs),
            Err(Error::MalformedOutputs(_))
        ));
    }

    #[test]
    fn test_reconstruct_defaults() {
        let resolved = resolve_inventory(&json!({"ssh_key_id": "1"})).unwrap();
        assert_eq!(resolved.origin, InventoryOrigin::Reconstructed);
        assert_eq!(
            resolved.document["masters"]["hosts"]["k8s-master"]["ansible_host"],
            json!("")
        );
        assert_eq!(resolved.document["workers"]["hosts"], json!({}));
    }

    #[test]
    fn test_reconstruct_rejects_non_string_workers() {
        let outputs = json!({"master_ip": "10.0.0.1", "worker_ips": ["10.0.0.2", 3]});
        assert!(matches!(
            resolve_inventory(&outputs),
            Err(Error::MalformedOutputs(_))
        ));
    }

    #[test]
    fn test_tool_args() {
        let tool = ToolCommand::new("pulumi");
        assert_eq!(tool.args(), vec!["stack", "output", "--json"]);

        let tool = tool.with_stack(Some("prod".to_string()));
        assert_eq!(tool.args(), vec!["stack", "output", "--json", "--stack", "prod"]);
    }

    #[test]
    fn test_missing_project_dir() {
        let tool = ToolCommand::new("pulumi").with_project_dir("/nonexistent/kubelab/pulumi");
        assert!(matches!(tool.fetch(), Err(Error::ToolFailed { .. })));
    }

    #[test]
    fn test_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ToolCommand::new("kubelab-definitely-not-installed").with_project_dir(dir.path());
        let err = tool.fetch().unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }
}
