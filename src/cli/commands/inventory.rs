//! Inventory command - write the Ansible inventory file
//!
//! This module implements the `inventory` subcommand. It runs the
//! provisioning tool's `stack output --json`, resolves the inventory and
//! writes it to `dynamic.json`.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use kubelab::materialize::{
    InventoryOrigin, Materializer, ToolCommand, DEFAULT_OUTPUT_FILE, DEFAULT_PROJECT_DIR,
    DEFAULT_TOOL,
};
use std::path::PathBuf;

/// Arguments for the inventory command
#[derive(Parser, Debug, Clone)]
pub struct InventoryArgs {
    /// Provisioning tool to query (`pulumi` or `kubelab`)
    #[arg(long, env = "KUBELAB_TOOL", default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Directory the provisioning tool runs in
    #[arg(long, default_value = DEFAULT_PROJECT_DIR)]
    pub project_dir: PathBuf,

    /// Inventory file to write
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Ask the tool for this stack instead of its currently selected one
    #[arg(long)]
    pub tool_stack: Option<String>,
}

impl InventoryArgs {
    /// Execute the inventory command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let source = ToolCommand::new(&self.tool)
            .with_project_dir(&self.project_dir)
            .with_stack(self.tool_stack.clone());
        let materializer = Materializer::new(source).with_output_path(&self.output);

        match materializer.run() {
            Ok(resolved) => {
                if resolved.origin == InventoryOrigin::Reconstructed {
                    ctx.output.warning(
                        "Stack has no ansible_inventory output; rebuilt from host addresses",
                    );
                }
                ctx.output
                    .info(&format!("Wrote {}", materializer.output_path().display()));
                ctx.output.success("Inventory generated successfully!");
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(e.exit_code())
            }
        }
    }
}

#[async_trait::async_trait]
impl Runnable for InventoryArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_defaults() {
        let args = InventoryArgs::try_parse_from(["inventory"]).unwrap();
        assert_eq!(args.project_dir, PathBuf::from("../pulumi"));
        assert_eq!(args.output, PathBuf::from("dynamic.json"));
        assert!(args.tool_stack.is_none());
    }

    #[test]
    fn test_inventory_overrides() {
        let args = InventoryArgs::try_parse_from([
            "inventory",
            "--tool",
            "kubelab",
            "--project-dir",
            "../infra",
            "-o",
            "hosts.json",
        ])
        .unwrap();
        assert_eq!(args.tool, "kubelab");
        assert_eq!(args.project_dir, PathBuf::from("../infra"));
        assert_eq!(args.output, PathBuf::from("hosts.json"));
    }
}
