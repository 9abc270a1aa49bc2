//! CLI module for kubelab
//!
//! This module provides the command-line interface for kubelab, including
//! argument parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kubelab - A Kubernetes lab on DigitalOcean
///
/// Declares the lab droplets, creates them, and generates the Ansible
/// inventory for the kubeadm playbooks.
#[derive(Parser, Debug, Clone)]
#[command(name = "kubelab")]
#[command(author = "Kubelab Contributors")]
#[command(version)]
#[command(about = "Provision a Kubernetes lab and generate its Ansible inventory", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Stack to operate on
    #[arg(short = 's', long, global = true, env = "KUBELAB_STACK", default_value = "dev")]
    pub stack: String,

    /// Path to the stack configuration file (default: Kubelab.<stack>.yaml)
    #[arg(short = 'c', long, global = true, env = "KUBELAB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding recorded stack state
    #[arg(long, global = true, env = "KUBELAB_STATE_DIR", default_value = ".kubelab")]
    pub state_dir: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the resources that would be created, without calling the provider
    Preview(commands::preview::PreviewArgs),

    /// Create the lab resources and record their outputs
    Up(commands::up::UpArgs),

    /// Stack operations
    Stack(commands::stack::StackArgs),

    /// Generate the Ansible inventory file from stack outputs
    Inventory(commands::inventory::InventoryArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["kubelab", "up"]).unwrap();
        assert!(matches!(cli.command, Commands::Up(_)));
        assert_eq!(cli.stack, "dev");
        assert_eq!(cli.state_dir, PathBuf::from(".kubelab"));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["kubelab", "-vvvvv", "preview"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_global_stack_after_subcommand() {
        let cli = Cli::try_parse_from(["kubelab", "preview", "--stack", "prod"]).unwrap();
        assert_eq!(cli.stack, "prod");
    }
}
