use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digestr::config::Config;

#[derive(Parser, Debug)]
#[command(name = "digestr")]
#[command(author, version, about = "Weekly development digest emails from a workspace database", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "DIGESTR_CONFIG", default_value = "digestr.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Render the report and print the HTML instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let the process environment override it
    let mut config = Config::load(&cli.config)?;
    config.apply_env();

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting digestr v{}", env!("CARGO_PKG_VERSION"));

    // Fail before any network call if required settings are missing
    config.validate(cli.dry_run)?;

    digestr::report::run(&config, cli.dry_run).await
}
