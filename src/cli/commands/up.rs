//! Up command - create the lab
//!
//! This module implements the `up` subcommand: declare the plan, create the
//! resources on DigitalOcean, and record the stack outputs.

use super::{CommandContext, Runnable};
use anyhow::{Context, Result};
use clap::Parser;
use kubelab::provision::{deploy, CloudProvider, DigitalOcean, StackPlan};
use kubelab::state::StackState;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Arguments for the up command
#[derive(Parser, Debug, Clone)]
pub struct UpArgs {
    /// Print the recorded outputs as JSON when done
    #[arg(long)]
    pub json: bool,
}

impl UpArgs {
    /// Execute the up command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let start_time = Instant::now();

        // Configuration problems must surface before anything is created.
        let config = ctx.load_config()?;
        let plan = StackPlan::declare(&config)?;
        let client = DigitalOcean::new(&config.provider)?;
        debug!(api = client.api_url(), "Using DigitalOcean API");
        let provider: Arc<dyn CloudProvider> = Arc::new(client);

        ctx.output.banner(&format!("UP: {}", ctx.stack));
        ctx.output.plan(&plan);
        ctx.output.info(&format!(
            "Creating {} resources in {}",
            plan.resource_count(),
            config.region
        ));

        let outputs = deploy(&plan, provider)
            .await
            .context("Failed to create lab resources")?;

        let state = StackState::new(ctx.stack.clone(), outputs);
        let path = ctx
            .state
            .save(&state)
            .context("Resources were created but their outputs could not be recorded")?;
        ctx.output
            .info(&format!("Recorded outputs in {}", path.display()));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state.outputs)?);
        } else {
            ctx.output.section("Outputs");
            ctx.output.field("master_ip", &state.outputs.master_ip);
            ctx.output
                .field("worker_ips", &state.outputs.worker_ips.join(", "));
            ctx.output.field("ssh_key_id", &state.outputs.ssh_key_id);
            ctx.output.success(&format!(
                "Lab '{}' is up ({:.1}s)",
                ctx.stack,
                start_time.elapsed().as_secs_f64()
            ));
        }

        Ok(0)
    }
}

#[async_trait::async_trait]
impl Runnable for UpArgs {
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx).await
    }
}
