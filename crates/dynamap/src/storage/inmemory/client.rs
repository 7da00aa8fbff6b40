//! In-memory table client.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynamap_core::client::{ScanPage, ScanRequest, TableClient, TableStatus, WriteCondition};
use dynamap_core::codec::attribute_kind;
use dynamap_core::error::DatabaseError;
use dynamap_core::mapping::{AttributeMap, ItemKey, KeySchema};
use dynamap_core::AttributeValue;

#[derive(Debug)]
struct Table {
    key: KeySchema,
    items: BTreeMap<String, AttributeMap>,
    /// Describe calls left before a new table reports `Active`.
    pending_polls: u32,
}

/// In-memory storage backend for testing.
///
/// Behaves like a single-region DynamoDB with strongly consistent reads.
/// Data is not persisted and will be lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    latency: Option<Duration>,
    activation_polls: u32,
}

impl InMemoryClient {
    /// Creates a new client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// New tables report `Creating` for the first `polls` describe calls.
    pub fn with_activation_polls(mut self, polls: u32) -> Self {
        self.activation_polls = polls;
        self
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

/// Stable map key for an attribute value.
fn storage_key(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) => format!("S:{s}"),
        AttributeValue::N(n) => format!("N:{}", normalize_number(n)),
        AttributeValue::B(b) => format!("B:{:?}", b.as_ref()),
        other => format!("{}:{:?}", attribute_kind(other), other),
    }
}

/// DynamoDB compares numbers by value, so "1.50" and "1.5" address the same item.
fn normalize_number(n: &str) -> String {
    match n.parse::<f64>() {
        Ok(parsed) if n.contains(['.', 'e', 'E']) => parsed.to_string(),
        _ => n.to_string(),
    }
}

fn item_key(table: &Table, item: &AttributeMap) -> Result<String, DatabaseError> {
    match item.get(&table.key.name) {
        Some(value) if table.key.attribute_type.matches(value) => Ok(storage_key(value)),
        _ => Err(DatabaseError::RequestFailed(format!(
            "ValidationException: missing or mistyped key attribute {}",
            table.key.name
        ))),
    }
}

fn check_condition(
    condition: WriteCondition,
    exists: bool,
    table: &str,
) -> Result<(), DatabaseError> {
    match (condition, exists) {
        (WriteCondition::KeyAbsent, true) | (WriteCondition::KeyPresent, false) => {
            Err(DatabaseError::ConditionFailed(table.to_string()))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl TableClient for InMemoryClient {
    async fn put_item(
        &self,
        table: &str,
        _key_name: &str,
        item: AttributeMap,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let key = item_key(stored, &item)?;
        check_condition(condition, stored.items.contains_key(&key), table)?;
        stored.items.insert(key, item);
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: &ItemKey,
        _consistent: bool,
    ) -> Result<Option<AttributeMap>, DatabaseError> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let stored = tables
            .get(table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let key = item_key(stored, &key.to_map())?;
        Ok(stored.items.get(&key).cloned())
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let key = item_key(stored, &key.to_map())?;
        check_condition(condition, stored.items.contains_key(&key), table)?;
        stored.items.remove(&key);
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &str,
        request: ScanRequest,
    ) -> Result<ScanPage, DatabaseError> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let stored = tables
            .get(table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))?;

        let start = match &request.exclusive_start_key {
            Some(start) => Some(item_key(stored, start)?),
            None => None,
        };
        let limit = request
            .limit
            .map(|l| usize::try_from(l.max(1)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let mut remaining = stored
            .items
            .iter()
            .filter(|(key, _)| start.as_ref().is_none_or(|start| *key > start));

        let items: Vec<AttributeMap> = remaining
            .by_ref()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect();
        let more = remaining.next().is_some();

        let last_evaluated_key = match items.last() {
            Some(last) if more => last
                .get(&stored.key.name)
                .map(|value| HashMap::from([(stored.key.name.clone(), value.clone())])),
            _ => None,
        };

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn create_table(&self, table: &str, key: &KeySchema) -> Result<(), DatabaseError> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Err(DatabaseError::TableInUse(table.to_string()));
        }
        tables.insert(
            table.to_string(),
            Table {
                key: key.clone(),
                items: BTreeMap::new(),
                pending_polls: self.activation_polls,
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), DatabaseError> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;
        tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, DatabaseError> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;
        Ok(tables.get_mut(table).map(|stored| {
            if stored.pending_polls > 0 {
                stored.pending_polls -= 1;
                TableStatus::Creating
            } else {
                TableStatus::Active
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynamap_core::error::{Error, MappingError};
    use dynamap_core::mapping::KeyAttributeType;
    use dynamap_core::ops::{
        CreateTable, DeleteById, DeleteTable, IsTableActive, Operation, Read, Save, Scan,
        TableExists,
    };
    use dynamap_core::record::RecordMapping;
    use dynamap_core::record_mapping;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: String,
        balance: f64,
    }

    record_mapping!(Account => "accounts" { key id: String, balance: f64 });

    fn account(id: &str, balance: f64) -> Account {
        Account {
            id: id.to_string(),
            balance,
        }
    }

    async fn setup() -> (InMemoryClient, Arc<RecordMapping<Account, String>>) {
        let client = InMemoryClient::new();
        let mapping = Arc::new(Account::record_mapping().unwrap());
        CreateTable::for_mapping(mapping.as_ref())
            .execute(&client, "")
            .await
            .unwrap();
        (client, mapping)
    }

    #[tokio::test]
    async fn test_read_of_unsaved_key_is_absent() {
        let (client, mapping) = setup().await;

        let result = Read::new(mapping, "nobody".to_string())
            .execute(&client, "")
            .await
            .unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let (client, mapping) = setup().await;

        let saved = Save::new(Arc::clone(&mapping), account("acct-1", 100.0))
            .execute(&client, "")
            .await
            .unwrap();
        let read = Read::new(mapping, "acct-1".to_string())
            .execute(&client, "")
            .await
            .unwrap();

        assert_eq!(read, Some(saved));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (client, mapping) = setup().await;

        for balance in [100.0, 70.0] {
            Save::new(Arc::clone(&mapping), account("acct-1", balance))
                .execute(&client, "")
                .await
                .unwrap();
        }

        let read = Read::new(mapping, "acct-1".to_string())
            .execute(&client, "")
            .await
            .unwrap();
        assert_eq!(read.map(|a| a.balance), Some(70.0));
    }

    #[tokio::test]
    async fn test_create_only_rejects_existing_key() {
        let (client, mapping) = setup().await;

        Save::new(Arc::clone(&mapping), account("acct-1", 100.0))
            .create_only()
            .execute(&client, "")
            .await
            .unwrap();
        let result = Save::new(mapping, account("acct-1", 5.0))
            .create_only()
            .execute(&client, "")
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::Database(DatabaseError::AlreadyExists {
                table: "accounts".to_string(),
                key: "acct-1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_replace_only_rejects_missing_key() {
        let (client, mapping) = setup().await;

        let result = Save::new(mapping, account("acct-9", 1.0))
            .replace_only()
            .execute(&client, "")
            .await;

        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_unless_required() {
        let (client, mapping) = setup().await;

        Save::new(Arc::clone(&mapping), account("acct-1", 100.0))
            .execute(&client, "")
            .await
            .unwrap();
        DeleteById::new(Arc::clone(&mapping), "acct-1".to_string())
            .execute(&client, "")
            .await
            .unwrap();
        DeleteById::new(Arc::clone(&mapping), "acct-1".to_string())
            .execute(&client, "")
            .await
            .unwrap();

        let result = DeleteById::new(Arc::clone(&mapping), "acct-1".to_string())
            .require_existing()
            .execute(&client, "")
            .await;
        assert!(matches!(
            result,
            Err(Error::Database(DatabaseError::NotFound { .. }))
        ));

        let read = Read::new(mapping, "acct-1".to_string())
            .execute(&client, "")
            .await
            .unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn test_scan_follows_pages_and_honors_limit() {
        let (client, mapping) = setup().await;
        for i in 0..7 {
            Save::new(Arc::clone(&mapping), account(&format!("acct-{i}"), i as f64))
                .execute(&client, "")
                .await
                .unwrap();
        }

        let all = Scan::new(Arc::clone(&mapping))
            .page_size(2)
            .execute(&client, "")
            .await
            .unwrap();
        assert_eq!(all.len(), 7);

        let limited = Scan::new(Arc::clone(&mapping))
            .page_size(2)
            .limit(5)
            .execute(&client, "")
            .await
            .unwrap();
        assert_eq!(limited.len(), 5);
        assert_eq!(limited, all[..5].to_vec());

        let nothing = Scan::new(mapping)
            .limit(0)
            .execute(&client, "")
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_scan_surfaces_decoding_errors() {
        let (client, mapping) = setup().await;
        let mut broken = AttributeMap::new();
        broken.insert("id".to_string(), AttributeValue::S("acct-x".to_string()));
        broken.insert("balance".to_string(), AttributeValue::S("lots".to_string()));
        client
            .put_item("accounts", "id", broken, WriteCondition::Always)
            .await
            .unwrap();

        let result = Scan::new(mapping).execute(&client, "").await;

        assert!(matches!(
            result,
            Err(Error::Mapping(MappingError::InvalidAttribute { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_table() {
        let client = InMemoryClient::new();
        let mapping = Arc::new(Account::record_mapping().unwrap());

        let result = Read::new(mapping, "acct-1".to_string())
            .execute(&client, "")
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::Database(DatabaseError::TableNotFound("accounts".to_string()))
        );
    }

    #[tokio::test]
    async fn test_prefix_selects_table() {
        let client = InMemoryClient::new();
        let mapping = Arc::new(Account::record_mapping().unwrap());
        CreateTable::for_mapping(mapping.as_ref())
            .execute(&client, "dev-")
            .await
            .unwrap();

        assert!(TableExists::new("accounts")
            .execute(&client, "dev-")
            .await
            .unwrap());
        assert!(!TableExists::new("accounts")
            .execute(&client, "")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_table_lifecycle() {
        let client = InMemoryClient::new().with_activation_polls(2);
        let key = KeySchema::new("id", KeyAttributeType::String);

        CreateTable::new("ledger", key.clone())
            .execute(&client, "")
            .await
            .unwrap();
        let again = CreateTable::new("ledger", key).execute(&client, "").await;
        assert!(matches!(
            again,
            Err(Error::Database(DatabaseError::TableInUse(_)))
        ));

        IsTableActive::new("ledger", Duration::from_secs(1))
            .poll_interval(Duration::from_millis(5))
            .execute(&client, "")
            .await
            .unwrap();

        DeleteTable::new("ledger").execute(&client, "").await.unwrap();
        assert!(!TableExists::new("ledger")
            .execute(&client, "")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_is_table_active_times_out() {
        let client = InMemoryClient::new().with_activation_polls(u32::MAX);
        CreateTable::new("slow", KeySchema::new("id", KeyAttributeType::String))
            .execute(&client, "")
            .await
            .unwrap();

        let result = IsTableActive::new("slow", Duration::from_millis(30))
            .poll_interval(Duration::from_millis(5))
            .execute(&client, "")
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::Timeout {
                after: Duration::from_millis(30)
            }
        );
    }

    #[tokio::test]
    async fn test_numeric_keys_compare_by_value() {
        let client = InMemoryClient::new();
        client
            .create_table("n", &KeySchema::new("k", KeyAttributeType::Number))
            .await
            .unwrap();
        let item = HashMap::from([("k".to_string(), AttributeValue::N("1.50".to_string()))]);
        client
            .put_item("n", "k", item, WriteCondition::Always)
            .await
            .unwrap();

        let key = ItemKey {
            name: "k".to_string(),
            value: AttributeValue::N("1.5".to_string()),
        };
        assert!(client.get_item("n", &key, true).await.unwrap().is_some());
    }
}
