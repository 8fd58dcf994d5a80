//! pinball-bot - Train and inspect a tabular flipper agent
//!
//! This CLI provides:
//! - Training the agent on the simulated table, resuming from a saved policy
//! - Inspecting a saved policy

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinball-bot")]
#[command(version, about = "Tabular reinforcement learning for pinball flippers", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the agent on the simulated table
    Train(Box<pinball_bot::cli::commands::train::TrainArgs>),

    /// Summarize a saved policy
    Inspect(pinball_bot::cli::commands::inspect::InspectArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// First Ctrl-C asks the training loop to stop and save; a second one
/// exits immediately.
fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::Relaxed) {
            std::process::exit(130);
        }
        tracing::warn!("interrupt received, stopping after the current tick");
    })
    .context("failed to install the Ctrl-C handler")?;
    Ok(stop)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Train(args) => {
            let stop = install_stop_handler()?;
            pinball_bot::cli::commands::train::execute_until(*args, stop)
        }
        Commands::Inspect(args) => pinball_bot::cli::commands::inspect::execute(args),
    }
}
