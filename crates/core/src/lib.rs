//! Core of dynamap.
//!
//! Everything here is independent of how operations reach DynamoDB:
//!
//! - [`codec`]: primitive values to and from wire attributes
//! - [`mapping`]: the per-type [`ItemMapping`] contract
//! - [`record`]: mappings generated from a record's field list
//! - [`client`]: the [`TableClient`] seam implemented by storage backends
//! - [`ops`]: operation descriptors executed against a `TableClient`

pub mod client;
pub mod codec;
pub mod error;
pub mod mapping;
pub mod ops;
pub mod record;

pub use client::{ScanPage, ScanRequest, TableClient, TableStatus, WriteCondition};
pub use codec::AttributeCodec;
pub use error::{
    DatabaseError, DecodingError, EncodingError, Error, MappingError, Result,
    UnsupportedShapeError,
};
pub use mapping::{AttributeMap, ItemKey, ItemMapping, KeyAttributeType, KeySchema};
pub use ops::{
    CreateTable, DeleteById, DeleteTable, IsTableActive, Operation, Read, Save, SaveMode, Scan,
    TableExists,
};
pub use record::{Record, RecordMapping};

// Re-exported so downstream crates and macro users share the SDK types.
pub use aws_sdk_dynamodb::primitives::Blob;
pub use aws_sdk_dynamodb::types::AttributeValue;
