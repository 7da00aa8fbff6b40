use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::mapping::{AttributeMap, ItemKey, KeySchema};

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteCondition {
    /// Unconditional write.
    #[default]
    Always,
    /// The item must not exist yet.
    KeyAbsent,
    /// The item must already exist.
    KeyPresent,
}

/// Lifecycle status of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    /// Archived or otherwise unusable.
    Unavailable,
}

/// Parameters for a single scan page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub limit: Option<i32>,
    pub exclusive_start_key: Option<AttributeMap>,
}

/// One page of scan results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<AttributeMap>,
    pub last_evaluated_key: Option<AttributeMap>,
}

/// Remote calls available to operations.
///
/// Table names passed here are already prefixed.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Writes an item.
    async fn put_item(
        &self,
        table: &str,
        key_name: &str,
        item: AttributeMap,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError>;

    /// Reads an item by key.
    async fn get_item(
        &self,
        table: &str,
        key: &ItemKey,
        consistent: bool,
    ) -> Result<Option<AttributeMap>, DatabaseError>;

    /// Deletes an item by key.
    async fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError>;

    /// Fetches a single scan page.
    async fn scan_page(&self, table: &str, request: ScanRequest)
        -> Result<ScanPage, DatabaseError>;

    /// Creates a table with the given hash key.
    async fn create_table(&self, table: &str, key: &KeySchema) -> Result<(), DatabaseError>;

    /// Deletes a table.
    async fn delete_table(&self, table: &str) -> Result<(), DatabaseError>;

    /// Returns the table status, or `None` if the table does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, DatabaseError>;
}
