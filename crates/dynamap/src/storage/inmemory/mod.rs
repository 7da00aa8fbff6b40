//! In-memory storage backend for testing.
//!
//! This module provides an in-memory [`TableClient`](dynamap_core::TableClient)
//! that keeps every table in a `HashMap` wrapped in `Arc<RwLock<_>>`. Useful for
//! tests and for trying the CLI without a DynamoDB endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamap::storage::inmemory::InMemoryClient;
//!
//! let client = InMemoryClient::new().with_activation_polls(1);
//! ```

mod client;

pub use client::InMemoryClient;
