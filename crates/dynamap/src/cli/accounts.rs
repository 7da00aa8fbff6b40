use std::sync::Arc;

use anyhow::{Context, Result};
use dynamap::connection::Connection;
use dynamap::models::account::{self, Account, AccountMapping};
use dynamap::{CreateTable, IsTableActive, ItemMapping, Save, Scan, TableExists};

use super::Global;
use crate::prelude::*;

/// Work with the sample accounts table.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Work with the sample accounts table.

Accounts are stored in the `accounts` table (plus any prefix), keyed by
their string id. The table is created on first use.")]
pub struct AccountsCommand {
    #[command(subcommand)]
    pub action: AccountsAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum AccountsAction {
    /// Create or overwrite an account.
    Seed {
        /// Account id.
        #[arg(long)]
        id: String,

        /// Opening balance.
        #[arg(long)]
        balance: f64,
    },

    /// Move money between two existing accounts.
    Transfer {
        /// Account to debit.
        #[arg(long)]
        from: String,

        /// Account to credit.
        #[arg(long)]
        to: String,

        /// Amount to move.
        #[arg(long)]
        amount: f64,
    },

    /// List accounts.
    List {
        /// Stop after this many accounts.
        #[arg(long)]
        limit: Option<usize>,

        /// Print accounts as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Seed two accounts and transfer between them.
    Demo,
}

pub fn run(cmd: AccountsCommand, connection: &Connection, global: &Global) -> Result<()> {
    let mapping = Arc::new(Account::record_mapping()?);
    ensure_table(connection, &mapping, global)?;
    let db = connection.blocking();

    match cmd.action {
        AccountsAction::Seed { id, balance } => {
            let saved = db.run(Save::new(Arc::clone(&mapping), Account::new(id, balance)))?;
            if !global.is_silent() {
                aprintln!("{} {} = {:.2}", p_g("Saved"), saved.id, saved.balance);
            }
        }
        AccountsAction::Transfer { from, to, amount } => {
            let transfer =
                account::transfer(&connection.non_blocking(), &mapping, &from, &to, amount);
            let (debited, credited) = transfer
                .wait(db.timeout())
                .with_context(|| format!("Transfer from {} to {} failed", from, to))?;
            if !global.is_silent() {
                print_account(&debited);
                print_account(&credited);
            }
        }
        AccountsAction::List { limit, json } => {
            let scan = match limit {
                Some(limit) => Scan::new(Arc::clone(&mapping)).limit(limit),
                None => Scan::new(Arc::clone(&mapping)),
            };
            let accounts = db.run(scan)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else if !global.is_silent() {
                for account in &accounts {
                    print_account(account);
                }
                aprintln!("{} account(s)", accounts.len());
            }
        }
        AccountsAction::Demo => {
            db.run(Save::new(Arc::clone(&mapping), Account::new("acct-1", 100.0)))?;
            db.run(Save::new(Arc::clone(&mapping), Account::new("acct-2", 0.0)))?;
            let (debited, credited) =
                account::transfer_blocking(&db, &mapping, "acct-1", "acct-2", 30.0)?;
            if !global.is_silent() {
                aprintln!("{}", p_y("Transferred 30.00 from acct-1 to acct-2"));
                print_account(&debited);
                print_account(&credited);
            }
        }
    }

    Ok(())
}

/// Creates the accounts table if it does not exist yet.
fn ensure_table(connection: &Connection, mapping: &AccountMapping, global: &Global) -> Result<()> {
    let db = connection.blocking();
    if db.run(TableExists::for_mapping(mapping))? {
        return Ok(());
    }

    if global.is_verbose() {
        aprintln!("{} {}", p_c("Creating table"), mapping.table(connection.prefix()));
    }
    db.run(CreateTable::for_mapping(mapping))?;
    db.execute(
        IsTableActive::for_mapping(mapping, db.timeout()),
        db.timeout() * 2,
    )
    .context("Accounts table did not become active")?;
    Ok(())
}

fn print_account(account: &Account) {
    aprintln!("  {:<12} {:>12.2}", account.id, account.balance);
}
