//! Storage backends implementing [`TableClient`](dynamap_core::TableClient).
//!
//! - [`dynamodb`]: AWS DynamoDB through `aws-sdk-dynamodb`
//! - [`inmemory`]: process-local tables for tests and demos

pub mod dynamodb;
pub mod inmemory;

pub use dynamodb::DynamoDbClient;
pub use inmemory::InMemoryClient;
