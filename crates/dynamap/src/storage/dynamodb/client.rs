//! DynamoDB table client.
//!
//! Implements [`TableClient`] on top of `aws-sdk-dynamodb`.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;

use dynamap_core::client::{ScanPage, ScanRequest, TableClient, TableStatus, WriteCondition};
use dynamap_core::error::DatabaseError;
use dynamap_core::mapping::{AttributeMap, ItemKey, KeyAttributeType, KeySchema};

use super::error::{
    map_create_table_error, map_delete_item_error, map_delete_table_error,
    map_describe_table_error, map_get_item_error, map_put_item_error, map_scan_error,
};
use crate::config::Config;

/// Placeholder for the key attribute in condition expressions.
const KEY_PLACEHOLDER: &str = "#k";

/// DynamoDB-backed table client.
#[derive(Debug, Clone)]
pub struct DynamoDbClient {
    client: Client,
}

impl DynamoDbClient {
    /// Wraps an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a client from configuration.
    ///
    /// Uses the AWS SDK default credential chain. When `endpoint_url` is set
    /// (e.g. DynamoDB Local) requests go there instead of AWS.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        tracing::debug!(target_env = %config.target_display(), "DynamoDB client configured");
        Self::new(Client::new(&sdk_config))
    }

    /// The underlying SDK client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Condition expression for a write precondition.
fn condition_expression(condition: WriteCondition) -> Option<&'static str> {
    match condition {
        WriteCondition::Always => None,
        WriteCondition::KeyAbsent => Some("attribute_not_exists(#k)"),
        WriteCondition::KeyPresent => Some("attribute_exists(#k)"),
    }
}

fn to_scalar_type(attribute_type: KeyAttributeType) -> ScalarAttributeType {
    match attribute_type {
        KeyAttributeType::String => ScalarAttributeType::S,
        KeyAttributeType::Number => ScalarAttributeType::N,
        KeyAttributeType::Binary => ScalarAttributeType::B,
    }
}

fn to_table_status(status: Option<&aws_sdk_dynamodb::types::TableStatus>) -> TableStatus {
    use aws_sdk_dynamodb::types::TableStatus as Sdk;

    match status {
        Some(Sdk::Active) => TableStatus::Active,
        Some(Sdk::Creating) => TableStatus::Creating,
        Some(Sdk::Updating) => TableStatus::Updating,
        Some(Sdk::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Unavailable,
    }
}

#[async_trait]
impl TableClient for DynamoDbClient {
    async fn put_item(
        &self,
        table: &str,
        key_name: &str,
        item: AttributeMap,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError> {
        let mut request = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item));

        if let Some(expression) = condition_expression(condition) {
            request = request
                .condition_expression(expression)
                .expression_attribute_names(KEY_PLACEHOLDER, key_name);
        }

        request
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table))?;
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: &ItemKey,
        consistent: bool,
    ) -> Result<Option<AttributeMap>, DatabaseError> {
        let result = self
            .client
            .get_item()
            .table_name(table)
            .key(&key.name, key.value.clone())
            .consistent_read(consistent)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table))?;

        Ok(result.item)
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
        condition: WriteCondition,
    ) -> Result<(), DatabaseError> {
        let mut request = self
            .client
            .delete_item()
            .table_name(table)
            .key(&key.name, key.value.clone());

        if let Some(expression) = condition_expression(condition) {
            request = request
                .condition_expression(expression)
                .expression_attribute_names(KEY_PLACEHOLDER, &key.name);
        }

        request
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table))?;
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &str,
        request: ScanRequest,
    ) -> Result<ScanPage, DatabaseError> {
        let result = self
            .client
            .scan()
            .table_name(table)
            .set_limit(request.limit)
            .set_exclusive_start_key(request.exclusive_start_key)
            .send()
            .await
            .map_err(|e| map_scan_error(e, table))?;

        Ok(ScanPage {
            items: result.items.unwrap_or_default(),
            last_evaluated_key: result.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn create_table(&self, table: &str, key: &KeySchema) -> Result<(), DatabaseError> {
        let key_schema = KeySchemaElement::builder()
            .attribute_name(&key.name)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| DatabaseError::RequestFailed(e.to_string()))?;

        let attribute_definition = AttributeDefinition::builder()
            .attribute_name(&key.name)
            .attribute_type(to_scalar_type(key.attribute_type))
            .build()
            .map_err(|e| DatabaseError::RequestFailed(e.to_string()))?;

        self.client
            .create_table()
            .table_name(table)
            .key_schema(key_schema)
            .attribute_definitions(attribute_definition)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|e| map_create_table_error(e, table))?;
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), DatabaseError> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table))?;
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, DatabaseError> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(response) => Ok(Some(to_table_status(
                response.table().and_then(|t| t.table_status()),
            ))),
            Err(err) => match map_describe_table_error(err) {
                None => Ok(None),
                Some(err) => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_expressions() {
        assert_eq!(condition_expression(WriteCondition::Always), None);
        assert_eq!(
            condition_expression(WriteCondition::KeyAbsent),
            Some("attribute_not_exists(#k)")
        );
        assert_eq!(
            condition_expression(WriteCondition::KeyPresent),
            Some("attribute_exists(#k)")
        );
    }

    #[test]
    fn test_key_types_map_to_scalar_types() {
        assert_eq!(to_scalar_type(KeyAttributeType::String), ScalarAttributeType::S);
        assert_eq!(to_scalar_type(KeyAttributeType::Number), ScalarAttributeType::N);
        assert_eq!(to_scalar_type(KeyAttributeType::Binary), ScalarAttributeType::B);
    }

    #[test]
    fn test_table_status_mapping() {
        use aws_sdk_dynamodb::types::TableStatus as Sdk;

        assert_eq!(to_table_status(Some(&Sdk::Active)), TableStatus::Active);
        assert_eq!(to_table_status(Some(&Sdk::Creating)), TableStatus::Creating);
        assert_eq!(
            to_table_status(Some(&Sdk::Archived)),
            TableStatus::Unavailable
        );
        assert_eq!(to_table_status(None), TableStatus::Unavailable);
    }
}
