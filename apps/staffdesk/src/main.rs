use std::{io, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod prompt;

use commands::Resource;
use config::load_settings;
use prompt::stdin_prompt;

#[derive(Parser, Debug)]
#[command(name = "staffdesk", about = "Manage positions and teachers over the directory API")]
struct Cli {
    /// TOML settings file; defaults to ./staffdesk.toml or the user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    resource: Resource,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    debug!(api_base_url = %settings.api_base_url, "settings loaded");

    let prompt = stdin_prompt();
    let mut stdout = io::stdout().lock();
    commands::run(cli.resource, &settings, &prompt, &mut stdout).await?;
    Ok(())
}
