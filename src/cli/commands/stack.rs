//! Stack commands - inspect recorded stack state
//!
//! `kubelab stack output --json` prints outputs in the same shape as
//! `pulumi stack output --json`, so the inventory materializer can use
//! kubelab as its provisioning tool.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::{Parser, Subcommand};
use kubelab::Error;
use tracing::debug;

/// Arguments for the stack command
#[derive(Parser, Debug, Clone)]
pub struct StackArgs {
    /// Stack subcommand
    #[command(subcommand)]
    pub command: StackCommands,
}

/// Stack subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum StackCommands {
    /// Show the outputs of the stack
    Output(OutputArgs),
}

/// Arguments for `stack output`
#[derive(Parser, Debug, Clone)]
pub struct OutputArgs {
    /// Show only this output
    pub name: Option<String>,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

impl StackArgs {
    /// Execute the stack command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        match &self.command {
            StackCommands::Output(args) => args.execute(ctx),
        }
    }
}

impl OutputArgs {
    fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let outputs = ctx.state.outputs_json(&ctx.stack)?;
        debug!(
            stack = %ctx.stack,
            state_dir = %ctx.state.root().display(),
            outputs = outputs.as_object().map_or(0, |m| m.len()),
            "Loaded stack outputs"
        );

        if let Some(ref name) = self.name {
            let value = outputs.get(name).ok_or_else(|| Error::OutputNotFound {
                stack: ctx.stack.clone(),
                output: name.clone(),
            })?;

            match value {
                serde_json::Value::String(s) if !self.json => println!("{}", s),
                other => println!("{}", serde_json::to_string_pretty(other)?),
            }
            return Ok(0);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outputs)?);
            return Ok(0);
        }

        let map = outputs.as_object().cloned().unwrap_or_default();
        println!("Current stack outputs ({}):", map.len());
        if map.is_empty() {
            println!("    No output values currently in this stack");
            return Ok(0);
        }

        println!("    {:<20} {}", "OUTPUT", "VALUE");
        for (key, value) in &map {
            let shown = match value {
                serde_json::Value::String(s) => s.lines().next().unwrap_or_default().to_string(),
                other => other.to_string(),
            };
            println!("    {:<20} {}", key, shown);
        }

        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for StackArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_args_parsing() {
        let args = StackArgs::try_parse_from(["stack", "output", "--json"]).unwrap();
        let StackCommands::Output(output) = args.command;
        assert!(output.json);
        assert!(output.name.is_none());
    }

    #[test]
    fn test_named_output() {
        let args = StackArgs::try_parse_from(["stack", "output", "master_ip"]).unwrap();
        let StackCommands::Output(output) = args.command;
        assert_eq!(output.name.as_deref(), Some("master_ip"));
    }
}
