//! threads - command-line client for the Threads API

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use threads::CancelToken;
use threads::cli::errors::{EXIT_OK, exit_code, format_error};
use threads::cli::{self, Cli, Context};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            let friendly = format_error(&err);
            eprintln!("{friendly}");
            debug!(cause = %friendly.cause, "Command failed");
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let mut ctx = Context::load(&cli, cancel)?;
    init_tracing(cli.debug || ctx.config.debug);
    cli::run(cli, &mut ctx).await
}

/// Logs go to stderr so JSON output stays clean (RUST_LOG overrides)
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "threads=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
