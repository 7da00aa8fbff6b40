mod cli;
mod prelude;

use anyhow::Result;
use clap::Parser;
use dynamap::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(prefix) = &cli.global.prefix {
        config.table_prefix = prefix.clone();
    }

    let filter = if cli.global.is_verbose() {
        "dynamap=debug,dynamap_core=debug".to_string()
    } else {
        config.log_filter.clone()
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run(cli, config)
}
