//! Subcommands module for kubelab CLI
//!
//! This module contains all the subcommand implementations.

pub mod inventory;
pub mod preview;
pub mod stack;
pub mod up;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use kubelab::config::LabConfig;
use kubelab::state::StateStore;
use std::path::PathBuf;

/// Common context shared between commands
pub struct CommandContext {
    /// Selected stack
    pub stack: String,
    /// Explicit stack configuration file
    pub config_path: Option<PathBuf>,
    /// Recorded stack state
    pub state: StateStore,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.verbosity());

        Self {
            stack: cli.stack.clone(),
            config_path: cli.config.clone(),
            state: StateStore::new(&cli.state_dir),
            output,
        }
    }

    /// Load the configuration for the selected stack
    pub fn load_config(&self) -> Result<LabConfig> {
        Ok(LabConfig::load(self.config_path.as_deref(), &self.stack)?)
    }
}

/// Trait for runnable commands
#[async_trait::async_trait]
pub trait Runnable {
    /// Execute the command, returning the process exit code
    async fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}
