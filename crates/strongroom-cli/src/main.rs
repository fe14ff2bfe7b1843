//! Strongroom CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strongroom_cli::{effective_config, run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    // RUST_LOG wins over the configured filter; logs go to stderr so stdout
    // stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    run(cli.command, &config, stdout.lock())?;
    Ok(())
}
