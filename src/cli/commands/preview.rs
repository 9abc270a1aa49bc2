//! Preview command - show the declared resources
//!
//! This module implements the `preview` subcommand. It loads the stack
//! configuration and declares the plan without contacting the provider.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use kubelab::provision::StackPlan;

/// Arguments for the preview command
#[derive(Parser, Debug, Clone)]
pub struct PreviewArgs {
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl PreviewArgs {
    /// Execute the preview command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let config = ctx.load_config()?;
        let plan = StackPlan::declare(&config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(0);
        }

        ctx.output.banner(&format!("PREVIEW: {}", ctx.stack));
        ctx.output.plan(&plan);
        ctx.output.section("Summary");
        ctx.output.field("resources", &plan.resource_count().to_string());
        ctx.output.field("workers", &plan.workers.len().to_string());
        ctx.output.info("Run 'kubelab up' to create these resources.");

        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for PreviewArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
