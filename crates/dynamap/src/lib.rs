//! dynamap: typed DynamoDB items with blocking and non-blocking execution.
//!
//! Mappings and operation descriptors live in [`dynamap_core`] and are
//! re-exported here. This crate adds the storage backends, the worker pool
//! and the two execution strategies.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dynamap::{config::Config, connection::Connection, Read};
//!
//! let connection = Connection::from_config(&Config::from_env())?;
//! let mapping = Arc::new(Account::record_mapping()?);
//! let account = connection.blocking().run(Read::new(mapping, "acct-1".to_string()))?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod exec;
pub mod models;
pub mod pool;
pub mod storage;

pub use dynamap_core::{
    record_mapping, AttributeCodec, AttributeMap, AttributeValue, Blob, CreateTable,
    DatabaseError, DecodingError, DeleteById, DeleteTable, EncodingError, Error, IsTableActive,
    ItemKey, ItemMapping, KeyAttributeType, KeySchema, MappingError, Operation, Read, Record,
    RecordMapping, Result, Save, SaveMode, Scan, TableClient, TableExists, TableStatus,
    UnsupportedShapeError,
};

pub use connection::Connection;
pub use exec::{Blocking, DbFuture, NonBlocking};
