//! Command line interface.

mod accounts;
mod table;

use anyhow::Result;
use dynamap::config::Config;
use dynamap::connection::Connection;

use crate::prelude::*;

pub use accounts::AccountsCommand;
pub use table::TableCommand;

/// Manage DynamoDB tables and sample records through dynamap
#[derive(Debug, clap::Parser)]
#[command(name = "dynamap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Silence the command output
    #[clap(long, global = true)]
    pub silent: bool,

    /// Enable verbose output
    #[clap(long, global = true)]
    pub verbose: bool,

    /// Use process-local tables instead of DynamoDB
    #[clap(long, global = true)]
    pub in_memory: bool,

    /// Prefix applied to every table name
    #[clap(long, global = true, env = "DYNAMAP_TABLE_PREFIX")]
    pub prefix: Option<String>,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Create, delete and inspect tables
    Table(TableCommand),

    /// Work with the sample accounts table
    Accounts(AccountsCommand),
}

/// Opens the connection selected by the global flags.
fn connect(config: &Config, global: &Global) -> Result<Connection> {
    let connection = if global.in_memory {
        Connection::in_memory(config)?
    } else {
        Connection::from_config(config)?
    };

    if !global.is_silent() {
        let target = if global.in_memory {
            "In-memory tables".to_string()
        } else {
            config.target_display()
        };
        aprintln!("{} {}", p_b("Target:"), target);
        if !connection.prefix().is_empty() {
            aprintln!("{} {}", p_b("Prefix:"), connection.prefix());
        }
        aprintln!();
    }

    Ok(connection)
}

/// Main entry point for the CLI.
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let connection = connect(&config, &cli.global)?;

    match cli.command {
        Commands::Table(cmd) => table::run(cmd, &connection, &cli.global),
        Commands::Accounts(cmd) => accounts::run(cmd, &connection, &cli.global),
    }
}
