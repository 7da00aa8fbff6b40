//! Item operations: save, read, delete and scan.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::{ScanRequest, TableClient, WriteCondition};
use crate::error::{DatabaseError, Result};
use crate::mapping::{self, ItemKey, ItemMapping};

use super::Operation;

/// How a save treats an existing item with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Insert or overwrite.
    #[default]
    Upsert,
    /// Fail with `AlreadyExists` if the key is taken.
    CreateOnly,
    /// Fail with `NotFound` if the key is free.
    ReplaceOnly,
}

impl SaveMode {
    fn condition(self) -> WriteCondition {
        match self {
            SaveMode::Upsert => WriteCondition::Always,
            SaveMode::CreateOnly => WriteCondition::KeyAbsent,
            SaveMode::ReplaceOnly => WriteCondition::KeyPresent,
        }
    }
}

/// Maps a failed write precondition to the error the caller asked for.
fn condition_error(condition: WriteCondition, table: &str, key: &ItemKey) -> DatabaseError {
    match condition {
        WriteCondition::KeyAbsent => DatabaseError::AlreadyExists {
            table: table.to_string(),
            key: key.describe(),
        },
        WriteCondition::KeyPresent => DatabaseError::NotFound {
            table: table.to_string(),
            key: key.describe(),
        },
        WriteCondition::Always => DatabaseError::ConditionFailed(table.to_string()),
    }
}

/// Writes an item (PutItem).
pub struct Save<M: ItemMapping> {
    mapping: Arc<M>,
    item: M::Item,
    mode: SaveMode,
}

impl<M: ItemMapping> Save<M> {
    pub fn new(mapping: Arc<M>, item: M::Item) -> Self {
        Self {
            mapping,
            item,
            mode: SaveMode::Upsert,
        }
    }

    /// Sets the save mode.
    pub fn mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Only insert; fail if the key already exists.
    pub fn create_only(self) -> Self {
        self.mode(SaveMode::CreateOnly)
    }

    /// Only overwrite; fail if the key does not exist.
    pub fn replace_only(self) -> Self {
        self.mode(SaveMode::ReplaceOnly)
    }
}

#[async_trait]
impl<M: ItemMapping> Operation for Save<M> {
    type Output = M::Item;
    const NAME: &'static str = "Save";

    fn target_table(&self, prefix: &str) -> String {
        self.mapping.table(prefix)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<M::Item> {
        let table = self.target_table(prefix);
        let key = self.mapping.key(&self.mapping.key_of(&self.item))?;
        let attributes = mapping::encode(self.mapping.as_ref(), &self.item)?;
        let condition = self.mode.condition();

        client
            .put_item(&table, &key.name, attributes, condition)
            .await
            .map_err(|e| match e {
                DatabaseError::ConditionFailed(_) => condition_error(condition, &table, &key),
                other => other,
            })?;

        Ok(self.item)
    }
}

/// Reads an item by key (GetItem). Absent items are `None`, not an error.
pub struct Read<M: ItemMapping> {
    mapping: Arc<M>,
    key: M::Key,
    consistent: bool,
}

impl<M: ItemMapping> Read<M> {
    /// Strongly consistent read of `key`.
    pub fn new(mapping: Arc<M>, key: M::Key) -> Self {
        Self {
            mapping,
            key,
            consistent: true,
        }
    }

    /// Uses an eventually consistent read instead.
    pub fn eventually_consistent(mut self) -> Self {
        self.consistent = false;
        self
    }
}

#[async_trait]
impl<M: ItemMapping> Operation for Read<M> {
    type Output = Option<M::Item>;
    const NAME: &'static str = "Read";

    fn target_table(&self, prefix: &str) -> String {
        self.mapping.table(prefix)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<Option<M::Item>> {
        let table = self.target_table(prefix);
        let key = self.mapping.key(&self.key)?;

        match client.get_item(&table, &key, self.consistent).await? {
            Some(item) => Ok(Some(mapping::decode(self.mapping.as_ref(), &item)?)),
            None => Ok(None),
        }
    }
}

/// Deletes an item by key (DeleteItem).
///
/// Deleting a missing key succeeds unless [`DeleteById::require_existing`] is set.
pub struct DeleteById<M: ItemMapping> {
    mapping: Arc<M>,
    key: M::Key,
    require_existing: bool,
}

impl<M: ItemMapping> DeleteById<M> {
    pub fn new(mapping: Arc<M>, key: M::Key) -> Self {
        Self {
            mapping,
            key,
            require_existing: false,
        }
    }

    /// Fail with `NotFound` if there is nothing to delete.
    pub fn require_existing(mut self) -> Self {
        self.require_existing = true;
        self
    }
}

#[async_trait]
impl<M: ItemMapping> Operation for DeleteById<M> {
    type Output = ();
    const NAME: &'static str = "DeleteById";

    fn target_table(&self, prefix: &str) -> String {
        self.mapping.table(prefix)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<()> {
        let table = self.target_table(prefix);
        let key = self.mapping.key(&self.key)?;
        let condition = if self.require_existing {
            WriteCondition::KeyPresent
        } else {
            WriteCondition::Always
        };

        client
            .delete_item(&table, &key, condition)
            .await
            .map_err(|e| match e {
                DatabaseError::ConditionFailed(_) => condition_error(condition, &table, &key),
                other => other,
            })?;

        Ok(())
    }
}

/// Scans a table, following pages until the limit or the end of the table.
pub struct Scan<M: ItemMapping> {
    mapping: Arc<M>,
    limit: Option<usize>,
    page_size: Option<i32>,
}

impl<M: ItemMapping> Scan<M> {
    /// Scans the whole table.
    pub fn new(mapping: Arc<M>) -> Self {
        Self {
            mapping,
            limit: None,
            page_size: None,
        }
    }

    /// Stops after `limit` items.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Maximum number of items evaluated per remote call.
    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    fn next_page_limit(&self, fetched: usize) -> Option<i32> {
        let remaining = self
            .limit
            .map(|limit| i32::try_from(limit - fetched).unwrap_or(i32::MAX));
        match (remaining, self.page_size) {
            (Some(remaining), Some(page)) => Some(remaining.min(page)),
            (remaining, page) => remaining.or(page),
        }
    }
}

#[async_trait]
impl<M: ItemMapping> Operation for Scan<M> {
    type Output = Vec<M::Item>;
    const NAME: &'static str = "Scan";

    fn target_table(&self, prefix: &str) -> String {
        self.mapping.table(prefix)
    }

    async fn execute(self, client: &dyn TableClient, prefix: &str) -> Result<Vec<M::Item>> {
        let table = self.target_table(prefix);
        let mut items = Vec::new();
        let mut start_key = None;
        let mut pages = 0usize;

        loop {
            if self.limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }

            let request = ScanRequest {
                limit: self.next_page_limit(items.len()),
                exclusive_start_key: start_key.take(),
            };
            let page = client.scan_page(&table, request).await?;
            pages += 1;

            for raw in &page.items {
                if self.limit.is_some_and(|limit| items.len() >= limit) {
                    break;
                }
                items.push(mapping::decode(self.mapping.as_ref(), raw)?);
            }

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        tracing::debug!(table = %table, pages, items = items.len(), "Scan finished");
        Ok(items)
    }
}
