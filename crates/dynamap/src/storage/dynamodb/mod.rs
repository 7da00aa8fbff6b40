//! DynamoDB storage backend.
//!
//! Provides a [`TableClient`](dynamap_core::TableClient) backed by
//! `aws-sdk-dynamodb`. Credentials come from the SDK default chain.

mod client;
mod error;

pub use client::DynamoDbClient;
