mod cli;
mod commands;
mod completions;
mod error;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use gonggan_core::{GongganConfig, paths};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    let _guard = init_logging(cli.verbose)?;
    let config = GongganConfig::load();
    let format = cli.format;

    match cli.command {
        Commands::Completions { .. } => Ok(()),
        Commands::Inspect(args) => commands::inspect::run(args, format).await,
        Commands::Repack(args) => commands::repack::run(&config, args, format).await,
        Commands::Chat(args) => commands::chat::run(&config, args, format).await,
        Commands::Regenerate(args) => commands::chat::regenerate(&config, args, format).await,
        Commands::Images(args) => commands::images::run(&config, args, format).await,
        Commands::Note { command } => commands::note::run(&config, command, format).await,
        Commands::Config { command } => commands::config::run(&config, command, format),
    }
}

/// Log to a daily file under the data directory; stdout stays clean for output.
fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths::logs_dir()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "gonggan.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(guard)
}
