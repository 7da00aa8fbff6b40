use std::time::Duration;

use thiserror::Error;

/// Errors raised while converting a value into an attribute.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Cannot encode non-finite number: {0}")]
    NonFiniteNumber(f64),
    #[error("Number {0} is outside the range DynamoDB can store")]
    NumberOutOfRange(f64),
    #[error("Cannot encode an empty {kind} set")]
    EmptySet { kind: &'static str },
}

/// Errors raised while converting an attribute back into a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("Expected attribute of type {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid number {value}: {reason}")]
    InvalidNumber { value: String, reason: String },
    #[error("Invalid {kind} {value}: {reason}")]
    InvalidText {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised by a mapping contract while building or reading an item.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MappingError {
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),
    #[error("Missing key attribute: {0}")]
    MissingKey(String),
    #[error("Invalid attribute {name}: {source}")]
    InvalidAttribute {
        name: String,
        #[source]
        source: DecodingError,
    },
    #[error("Failed to encode attribute {name}: {source}")]
    Encoding {
        name: String,
        #[source]
        source: EncodingError,
    },
}

/// Errors raised when a record mapping cannot be derived from its field list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnsupportedShapeError {
    #[error("Table name must not be empty")]
    EmptyTableName,
    #[error("Record has no fields")]
    NoFields,
    #[error("The key must be the first registered field, found {0} first")]
    KeyNotFirst(String),
    #[error("Key attribute {0} was registered more than once")]
    DuplicateKey(String),
    #[error("Field {0} cannot be used as a key (only string, number and binary are allowed)")]
    UnsupportedKeyType(String),
    #[error("Field {0} was registered more than once")]
    DuplicateField(String),
    #[error("Registered fields {found:?} do not match the declared fields {expected:?}")]
    FieldMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Record has {count} fields, at most {max} are supported")]
    TooManyFields { count: usize, max: usize },
}

/// Errors reported by the remote service or the machinery that reaches it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Table already exists or is in use: {0}")]
    TableInUse(String),
    #[error("Item not found in {table}: {key}")]
    NotFound { table: String, key: String },
    #[error("Item already exists in {table}: {key}")]
    AlreadyExists { table: String, key: String },
    #[error("Condition check failed on {0}")]
    ConditionFailed(String),
    #[error("Throughput exceeded: {0}")]
    Throttled(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Worker task failed: {0}")]
    TaskFailed(String),
}

/// Top-level error for every operation.
///
/// Codec failures always reach callers wrapped in [`MappingError`], which
/// names the attribute that failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    UnsupportedShape(#[from] UnsupportedShapeError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Operation timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Returns true if the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// Result type for operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_display() {
        let error = EncodingError::EmptySet { kind: "string" };
        assert_eq!(error.to_string(), "Cannot encode an empty string set");

        let error = EncodingError::NumberOutOfRange(1e200);
        assert_eq!(
            error.to_string(),
            format!("Number {} is outside the range DynamoDB can store", 1e200)
        );
    }

    #[test]
    fn test_decoding_error_display() {
        let error = DecodingError::TypeMismatch {
            expected: "S",
            found: "N",
        };
        assert_eq!(error.to_string(), "Expected attribute of type S, found N");
    }

    #[test]
    fn test_mapping_error_display() {
        let error = MappingError::InvalidAttribute {
            name: "balance".to_string(),
            source: DecodingError::InvalidNumber {
                value: "abc".to_string(),
                reason: "invalid float literal".to_string(),
            },
        };
        assert_eq!(
            error.to_string(),
            "Invalid attribute balance: Invalid number abc: invalid float literal"
        );
    }

    #[test]
    fn test_database_error_display() {
        let error = DatabaseError::NotFound {
            table: "accounts".to_string(),
            key: "acct-1".to_string(),
        };
        assert_eq!(error.to_string(), "Item not found in accounts: acct-1");
    }

    #[test]
    fn test_error_is_transparent() {
        let error: Error = DatabaseError::TableNotFound("accounts".to_string()).into();
        assert_eq!(error.to_string(), "Table not found: accounts");
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_timeout_display() {
        let error = Error::Timeout {
            after: Duration::from_millis(250),
        };
        assert_eq!(error.to_string(), "Operation timed out after 250ms");
        assert!(error.is_timeout());
    }
}
