//! Bank accounts and balance transfers.

use std::sync::Arc;

use serde::Serialize;

use dynamap_core::error::{DatabaseError, Error, Result};
use dynamap_core::mapping::ItemMapping;
use dynamap_core::ops::{Read, Save};
use dynamap_core::record::RecordMapping;
use dynamap_core::record_mapping;

use crate::exec::{Blocking, DbFuture, NonBlocking};

/// An account balance keyed by account id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub balance: f64,
}

record_mapping!(Account => "accounts" { key id: String, balance: f64 });

pub type AccountMapping = RecordMapping<Account, String>;

impl Account {
    pub fn new(id: impl Into<String>, balance: f64) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }
}

/// Balances after moving `amount` from `source` to `target`.
fn apply_transfer(source: Account, target: Account, amount: f64) -> (Account, Account) {
    let debited = Account {
        balance: source.balance - amount,
        ..source
    };
    let credited = Account {
        balance: target.balance + amount,
        ..target
    };
    (debited, credited)
}

fn same_account(id: &str) -> Error {
    Error::InvalidRequest(format!("cannot transfer from account {id} to itself"))
}

fn not_found(mapping: &AccountMapping, prefix: &str, id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        table: mapping.table(prefix),
        key: id.to_string(),
    }
}

/// Moves `amount` between two existing accounts without blocking.
///
/// Reads both accounts concurrently, then saves both new balances. Assumes
/// no concurrent writer touches either account meanwhile. Fails with
/// [`Error::InvalidRequest`] when `from` and `to` are the same account.
pub fn transfer(
    db: &NonBlocking,
    mapping: &Arc<AccountMapping>,
    from: &str,
    to: &str,
    amount: f64,
) -> DbFuture<(Account, Account)> {
    if from == to {
        return db.failed(same_account(from));
    }

    let reads = db
        .execute(Read::new(Arc::clone(mapping), from.to_string()))
        .zip(db.execute(Read::new(Arc::clone(mapping), to.to_string())));

    let db = db.clone();
    let mapping = Arc::clone(mapping);
    let (from, to) = (from.to_string(), to.to_string());

    reads.and_then(move |accounts| {
        let (source, target) = match accounts {
            (Some(source), Some(target)) => (source, target),
            (None, _) => return db.failed(not_found(&mapping, db.prefix(), &from)),
            (_, None) => return db.failed(not_found(&mapping, db.prefix(), &to)),
        };

        tracing::debug!(from = %from, to = %to, amount, "Applying transfer");
        let (debited, credited) = apply_transfer(source, target, amount);

        db.execute(Save::new(Arc::clone(&mapping), debited).replace_only())
            .zip(db.execute(Save::new(mapping, credited).replace_only()))
    })
}

/// Blocking counterpart of [`transfer`], one call at a time.
pub fn transfer_blocking(
    db: &Blocking,
    mapping: &Arc<AccountMapping>,
    from: &str,
    to: &str,
    amount: f64,
) -> Result<(Account, Account)> {
    if from == to {
        return Err(same_account(from));
    }

    let source = db
        .run(Read::new(Arc::clone(mapping), from.to_string()))?
        .ok_or_else(|| not_found(mapping, db.prefix(), from))?;
    let target = db
        .run(Read::new(Arc::clone(mapping), to.to_string()))?
        .ok_or_else(|| not_found(mapping, db.prefix(), to))?;

    let (debited, credited) = apply_transfer(source, target, amount);

    let debited = db.run(Save::new(Arc::clone(mapping), debited).replace_only())?;
    let credited = db.run(Save::new(Arc::clone(mapping), credited).replace_only())?;
    Ok((debited, credited))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dynamap_core::ops::CreateTable;

    use super::*;
    use crate::config::Config;
    use crate::connection::Connection;

    fn connection() -> (Connection, Arc<AccountMapping>) {
        let config = Config {
            pool_size: 2,
            table_prefix: String::new(),
            log_filter: "dynamap=debug".to_string(),
            endpoint_url: None,
            region: "us-east-1".to_string(),
            timeout_ms: 2_000,
        };
        let connection = Connection::in_memory(&config).unwrap();
        let mapping = Arc::new(Account::record_mapping().unwrap());

        let db = connection.blocking();
        db.run(CreateTable::for_mapping(mapping.as_ref())).unwrap();
        db.run(Save::new(Arc::clone(&mapping), Account::new("acct-1", 100.0)))
            .unwrap();
        db.run(Save::new(Arc::clone(&mapping), Account::new("acct-2", 5.0)))
            .unwrap();

        (connection, mapping)
    }

    fn balance(db: &Blocking, mapping: &Arc<AccountMapping>, id: &str) -> Option<f64> {
        db.run(Read::new(Arc::clone(mapping), id.to_string()))
            .unwrap()
            .map(|account| account.balance)
    }

    #[test]
    fn test_generated_mapping() {
        let mapping = Account::record_mapping().unwrap();

        assert_eq!(mapping.table_name(), "accounts");
        assert_eq!(mapping.field_names(), vec!["id", "balance"]);
    }

    #[test]
    fn test_transfer_blocking() {
        let (connection, mapping) = connection();
        let db = connection.blocking();

        let (from, to) = transfer_blocking(&db, &mapping, "acct-1", "acct-2", 30.0).unwrap();

        assert_eq!(from, Account::new("acct-1", 70.0));
        assert_eq!(to, Account::new("acct-2", 35.0));
        assert_eq!(balance(&db, &mapping, "acct-1"), Some(70.0));
        assert_eq!(balance(&db, &mapping, "acct-2"), Some(35.0));
    }

    #[test]
    fn test_transfer_chained() {
        let (connection, mapping) = connection();

        let result = transfer(&connection.non_blocking(), &mapping, "acct-1", "acct-2", 30.0)
            .wait(Duration::from_secs(2));

        assert!(result.is_ok());
        let db = connection.blocking();
        assert_eq!(balance(&db, &mapping, "acct-1"), Some(70.0));
        assert_eq!(balance(&db, &mapping, "acct-2"), Some(35.0));
    }

    #[test]
    fn test_transfer_from_missing_account_changes_nothing() {
        let (connection, mapping) = connection();

        let result = transfer(&connection.non_blocking(), &mapping, "acct-9", "acct-2", 30.0)
            .wait(Duration::from_secs(2));

        assert_eq!(
            result,
            Err(Error::Database(DatabaseError::NotFound {
                table: "accounts".to_string(),
                key: "acct-9".to_string(),
            }))
        );
        assert_eq!(balance(&connection.blocking(), &mapping, "acct-2"), Some(5.0));
    }

    #[test]
    fn test_transfer_to_same_account_is_rejected_blocking() {
        let (connection, mapping) = connection();
        let db = connection.blocking();

        let result = transfer_blocking(&db, &mapping, "acct-1", "acct-1", 30.0);

        assert_eq!(
            result,
            Err(Error::InvalidRequest(
                "cannot transfer from account acct-1 to itself".to_string()
            ))
        );
        assert_eq!(balance(&db, &mapping, "acct-1"), Some(100.0));
    }

    #[test]
    fn test_transfer_to_same_account_is_rejected_chained() {
        let (connection, mapping) = connection();

        let result = transfer(&connection.non_blocking(), &mapping, "acct-1", "acct-1", 30.0)
            .wait(Duration::from_secs(2));

        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(balance(&connection.blocking(), &mapping, "acct-1"), Some(100.0));
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(Account::new("acct-1", 12.5)).unwrap();

        assert_eq!(json, serde_json::json!({ "id": "acct-1", "balance": 12.5 }));
    }
}
