//! Table administration operations.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::client::{TableClient, TableStatus};
use crate::error::{Error, Result};
use crate::mapping::{ItemMapping, KeySchema};

use super::Operation;

/// Default delay between `DescribeTable` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Creates a table keyed by a single hash attribute, billed on demand.
#[derive(Debug, Clone)]
pub struct CreateTable {
    table: String,
    key: KeySchema,
}

impl CreateTable {
    pub fn new(table: impl Into<String>, key: KeySchema) -> Self {
        Self {
            table: table.into(),
            key,
        }
    }

    /// Creates the table described by a mapping.
    pub fn for_mapping<M: ItemMapping + ?Sized>(mapping: &M) -> Self {
        Self::new(mapping.table_name(), mapping.key_schema())
    }
}

#[async_trait]
impl Operation for CreateTable {
    type Output = ();
    const NAME: &'static str = "CreateTable";

    fn target_table(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<()> {
        let table = self.target_table(prefix);
        client.create_table(&table, &self.key).await?;
        tracing::info!(table = %table, key = %self.key.name, "Table created");
        Ok(())
    }
}

/// Deletes a table.
#[derive(Debug, Clone)]
pub struct DeleteTable {
    table: String,
}

impl DeleteTable {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn for_mapping<M: ItemMapping + ?Sized>(mapping: &M) -> Self {
        Self::new(mapping.table_name())
    }
}

#[async_trait]
impl Operation for DeleteTable {
    type Output = ();
    const NAME: &'static str = "DeleteTable";

    fn target_table(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<()> {
        let table = self.target_table(prefix);
        client.delete_table(&table).await?;
        tracing::info!(table = %table, "Table deleted");
        Ok(())
    }
}

/// Checks whether a table exists.
#[derive(Debug, Clone)]
pub struct TableExists {
    table: String,
}

impl TableExists {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn for_mapping<M: ItemMapping + ?Sized>(mapping: &M) -> Self {
        Self::new(mapping.table_name())
    }
}

#[async_trait]
impl Operation for TableExists {
    type Output = bool;
    const NAME: &'static str = "TableExists";

    fn target_table(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<bool> {
        let table = self.target_table(prefix);
        Ok(client.describe_table(&table).await?.is_some())
    }
}

/// Waits until a table reports `Active`.
///
/// Polls every `poll_interval` and once more at the deadline. Fails with
/// [`Error::Timeout`] if the table is still not active then, or if a single
/// describe call runs past the deadline. A table that does not exist yet is
/// polled like any other non-active table.
#[derive(Debug, Clone)]
pub struct IsTableActive {
    table: String,
    deadline: Duration,
    poll_interval: Duration,
}

impl IsTableActive {
    pub fn new(table: impl Into<String>, deadline: Duration) -> Self {
        Self {
            table: table.into(),
            deadline,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn for_mapping<M: ItemMapping + ?Sized>(mapping: &M, deadline: Duration) -> Self {
        Self::new(mapping.table_name(), deadline)
    }

    /// Sets the delay between polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl Operation for IsTableActive {
    type Output = ();
    const NAME: &'static str = "IsTableActive";

    fn target_table(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<()> {
        let table = self.target_table(prefix);
        let deadline = Instant::now() + self.deadline;
        let timed_out = || Error::Timeout {
            after: self.deadline,
        };

        loop {
            let status = tokio::time::timeout_at(deadline, client.describe_table(&table))
                .await
                .map_err(|_| timed_out())??;
            if status == Some(TableStatus::Active) {
                return Ok(());
            }
            tracing::debug!(table = %table, ?status, "Waiting for table to become active");

            // The last poll happens at the deadline itself.
            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out());
            }
            tokio::time::sleep_until((now + self.poll_interval).min(deadline)).await;
        }
    }
}
