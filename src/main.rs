//! kubelab - A Kubernetes lab on DigitalOcean
//!
//! This is the main entry point for the kubelab CLI.

mod cli;

use anyhow::Result;
use cli::commands::{CommandContext, Runnable};
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    if cli.verbosity() >= 2 {
        eprintln!("kubelab v{}", VERSION);
    }

    let mut ctx = CommandContext::new(&cli);

    let exit_code = match dispatch(&cli.command, &mut ctx).await {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            match e.downcast_ref::<kubelab::Error>() {
                Some(err) => {
                    if err.is_config_error() {
                        let source = ctx
                            .config_path
                            .clone()
                            .unwrap_or_else(|| kubelab::config::stack_config_path(&ctx.stack));
                        ctx.output.warning(&format!(
                            "Nothing was created; check {} or the KUBELAB_* environment",
                            source.display()
                        ));
                    }
                    err.exit_code()
                }
                None => 1,
            }
        }
    };

    std::process::exit(exit_code);
}

async fn dispatch(command: &Commands, ctx: &mut CommandContext) -> Result<i32> {
    match command {
        Commands::Preview(args) => args.run(ctx).await,
        Commands::Up(args) => args.run(ctx).await,
        Commands::Stack(args) => args.run(ctx).await,
        Commands::Inventory(args) => args.run(ctx).await,
    }
}

/// Initialize logging based on verbosity level.
///
/// Logs go to stderr; stdout carries command output.
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}
