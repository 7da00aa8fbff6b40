use std::time::Duration;

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use dynamap::connection::Connection;
use dynamap::{CreateTable, DeleteTable, IsTableActive, KeyAttributeType, KeySchema, TableExists};

use super::Global;
use crate::prelude::*;

/// Create, delete and inspect tables.
#[derive(Debug, clap::Parser)]
pub struct TableCommand {
    #[command(subcommand)]
    pub action: TableAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum TableAction {
    /// Create a table keyed by a single hash attribute.
    Create(CreateArgs),

    /// Delete a table and all of its items.
    Delete(DeleteArgs),

    /// Report whether a table exists.
    Exists(NameArgs),

    /// Wait until a table becomes active.
    Wait(WaitArgs),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KeyType {
    /// String
    S,
    /// Number
    N,
    /// Binary
    B,
}

impl From<KeyType> for KeyAttributeType {
    fn from(value: KeyType) -> Self {
        match value {
            KeyType::S => KeyAttributeType::String,
            KeyType::N => KeyAttributeType::Number,
            KeyType::B => KeyAttributeType::Binary,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct NameArgs {
    /// Table name, without prefix.
    #[arg(long)]
    pub name: String,
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// Table name, without prefix.
    #[arg(long)]
    pub name: String,

    /// Key attribute name.
    #[arg(long)]
    pub key: String,

    /// Key attribute type.
    #[arg(long, value_enum, default_value = "s")]
    pub key_type: KeyType,

    /// Wait for the table to become active.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    /// Table name, without prefix.
    #[arg(long)]
    pub name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, clap::Args)]
pub struct WaitArgs {
    /// Table name, without prefix.
    #[arg(long)]
    pub name: String,

    /// Give up after this many seconds.
    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,
}

pub fn run(cmd: TableCommand, connection: &Connection, global: &Global) -> Result<()> {
    let db = connection.blocking();

    match cmd.action {
        TableAction::Create(args) => {
            let key = KeySchema::new(&args.key, args.key_type.into());
            db.run(CreateTable::new(&args.name, key))
                .with_context(|| format!("Failed to create table {}", args.name))?;

            if args.wait {
                wait_active(connection, &args.name, Duration::from_secs(60))?;
            }
            if !global.is_silent() {
                aprintln!("{} {}", p_g("Created table"), args.name);
            }
        }
        TableAction::Delete(args) => {
            if !args.force {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete {}? ALL DATA WILL BE LOST",
                        args.name
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    bail!("Cancelled by user");
                }
            }

            db.run(DeleteTable::new(&args.name))
                .with_context(|| format!("Failed to delete table {}", args.name))?;
            if !global.is_silent() {
                aprintln!("{} {}", p_r("Deleted table"), args.name);
            }
        }
        TableAction::Exists(args) => {
            let exists = db.run(TableExists::new(&args.name))?;
            if !global.is_silent() {
                let status = if exists { p_g("exists") } else { p_y("does not exist") };
                aprintln!("{} {}", args.name, status);
            }
        }
        TableAction::Wait(args) => {
            wait_active(connection, &args.name, Duration::from_secs(args.timeout_secs))?;
            if !global.is_silent() {
                aprintln!("{} {}", args.name, p_g("is active"));
            }
        }
    }

    Ok(())
}

/// Polls until `name` is active. The blocking call outlives the poll deadline
/// slightly so the operation reports its own timeout.
fn wait_active(connection: &Connection, name: &str, deadline: Duration) -> Result<()> {
    connection
        .blocking()
        .execute(
            IsTableActive::new(name, deadline),
            deadline + Duration::from_secs(5),
        )
        .with_context(|| format!("Table {} did not become active", name))
}
