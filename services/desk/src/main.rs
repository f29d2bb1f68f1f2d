use anyhow::Result;
use clap::Parser;
use common::AppConfig;
use common::telemetry::init_tracing;
use std::process;
use tracing::info;

mod cli;
mod commands;
mod context;
mod output;
mod router;

use cli::Cli;
use context::AppContext;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?;

    info!("Opening {}", cli.command.route());
    commands::run(&ctx, cli.command).await
}
