//! Object mapping contract.
//!
//! An [`ItemMapping`] describes how a domain type maps onto a table: its name,
//! its key and the conversions to and from an attribute map. Mappings are
//! plain values and are passed explicitly to every operation.

use std::collections::HashMap;
use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::codec::AttributeCodec;
use crate::error::MappingError;

/// A DynamoDB item.
pub type AttributeMap = HashMap<String, AttributeValue>;

/// Scalar types allowed for key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAttributeType {
    String,
    Number,
    Binary,
}

impl KeyAttributeType {
    /// Returns the wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAttributeType::String => "S",
            KeyAttributeType::Number => "N",
            KeyAttributeType::Binary => "B",
        }
    }

    /// Returns true if the attribute carries this type's wire tag.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (KeyAttributeType::String, AttributeValue::S(_))
                | (KeyAttributeType::Number, AttributeValue::N(_))
                | (KeyAttributeType::Binary, AttributeValue::B(_))
        )
    }
}

impl fmt::Display for KeyAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash key definition of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub name: String,
    pub attribute_type: KeyAttributeType,
}

impl KeySchema {
    pub fn new(name: impl Into<String>, attribute_type: KeyAttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }
}

/// A fully encoded primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemKey {
    pub name: String,
    pub value: AttributeValue,
}

impl ItemKey {
    /// Human readable form of the key value, used in errors and logs.
    pub fn describe(&self) -> String {
        describe_value(&self.value)
    }

    /// The key as a single-attribute map.
    pub fn to_map(&self) -> AttributeMap {
        HashMap::from([(self.name.clone(), self.value.clone())])
    }
}

pub(crate) fn describe_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => s.clone(),
        AttributeValue::B(b) => format!("<{} bytes>", b.as_ref().len()),
        other => format!("{:?}", other),
    }
}

/// Describes how a domain type is stored in a table.
pub trait ItemMapping: Send + Sync + 'static {
    /// The domain type.
    type Item: Send + Sync + 'static;

    /// The type of the hash key value.
    type Key: AttributeCodec + Send + Sync + 'static;

    /// Unprefixed table name.
    fn table_name(&self) -> &str;

    /// Table name with the environment prefix applied.
    fn table(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.table_name())
    }

    /// Name and wire type of the hash key.
    fn key_schema(&self) -> KeySchema;

    /// Extracts the key value from an item.
    fn key_of(&self, item: &Self::Item) -> Self::Key;

    /// Encodes a key value.
    fn key(&self, key: &Self::Key) -> Result<ItemKey, MappingError> {
        let schema = self.key_schema();
        let value = key.to_attribute().map_err(|source| MappingError::Encoding {
            name: schema.name.clone(),
            source,
        })?;
        Ok(ItemKey {
            name: schema.name,
            value,
        })
    }

    /// Converts an item to its attribute map.
    fn to_item(&self, item: &Self::Item) -> Result<AttributeMap, MappingError>;

    /// Converts an attribute map back into an item.
    fn from_item(&self, item: &AttributeMap) -> Result<Self::Item, MappingError>;
}

/// Encodes an item and checks that the key attribute is present.
pub fn encode<M: ItemMapping + ?Sized>(
    mapping: &M,
    item: &M::Item,
) -> Result<AttributeMap, MappingError> {
    let attributes = mapping.to_item(item)?;
    ensure_key(mapping, &attributes)?;
    Ok(attributes)
}

/// Checks that the key attribute is present, then decodes the item.
pub fn decode<M: ItemMapping + ?Sized>(
    mapping: &M,
    attributes: &AttributeMap,
) -> Result<M::Item, MappingError> {
    ensure_key(mapping, attributes)?;
    mapping.from_item(attributes)
}

fn ensure_key<M: ItemMapping + ?Sized>(
    mapping: &M,
    attributes: &AttributeMap,
) -> Result<(), MappingError> {
    let schema = mapping.key_schema();
    match attributes.get(&schema.name) {
        Some(value) if schema.attribute_type.matches(value) => Ok(()),
        _ => Err(MappingError::MissingKey(schema.name)),
    }
}

/// Reads a required attribute.
///
/// Types with an absent value (such as `Option<T>`) decode to it when the
/// attribute is missing; every other type fails.
pub fn get_required<T: AttributeCodec>(item: &AttributeMap, name: &str) -> Result<T, MappingError> {
    match item.get(name) {
        Some(value) => T::from_attribute(value).map_err(|source| MappingError::InvalidAttribute {
            name: name.to_string(),
            source,
        }),
        None => T::from_absent().ok_or_else(|| MappingError::MissingAttribute(name.to_string())),
    }
}

/// Reads an optional attribute. A present but malformed attribute is an error.
pub fn get_optional<T: AttributeCodec>(
    item: &AttributeMap,
    name: &str,
) -> Result<Option<T>, MappingError> {
    get_required::<Option<T>>(item, name)
}

/// Encodes a value and inserts it under `name`.
pub fn put<T: AttributeCodec>(
    item: &mut AttributeMap,
    name: &str,
    value: &T,
) -> Result<(), MappingError> {
    let attribute = value.to_attribute().map_err(|source| MappingError::Encoding {
        name: name.to_string(),
        source,
    })?;
    item.insert(name.to_string(), attribute);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodingError, Error};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: String,
        balance: f64,
        nickname: Option<String>,
    }

    struct AccountMapping;

    impl ItemMapping for AccountMapping {
        type Item = Account;
        type Key = String;

        fn table_name(&self) -> &str {
            "accounts"
        }

        fn key_schema(&self) -> KeySchema {
            KeySchema::new("id", KeyAttributeType::String)
        }

        fn key_of(&self, item: &Account) -> String {
            item.id.clone()
        }

        fn to_item(&self, account: &Account) -> Result<AttributeMap, MappingError> {
            let mut item = AttributeMap::new();
            put(&mut item, "id", &account.id)?;
            put(&mut item, "balance", &account.balance)?;
            put(&mut item, "nickname", &account.nickname)?;
            Ok(item)
        }

        fn from_item(&self, item: &AttributeMap) -> Result<Account, MappingError> {
            Ok(Account {
                id: get_required(item, "id")?,
                balance: get_required(item, "balance")?,
                nickname: get_optional(item, "nickname")?,
            })
        }
    }

    fn sample_account() -> Account {
        Account {
            id: "acct-1".to_string(),
            balance: 100.0,
            nickname: Some("checking".to_string()),
        }
    }

    #[test]
    fn test_table_prefix() {
        assert_eq!(AccountMapping.table(""), "accounts");
        assert_eq!(AccountMapping.table("dev-"), "dev-accounts");
    }

    #[test]
    fn test_round_trip() {
        let account = sample_account();
        let item = encode(&AccountMapping, &account).unwrap();
        assert_eq!(decode(&AccountMapping, &item).unwrap(), account);

        let anonymous = Account {
            nickname: None,
            ..sample_account()
        };
        let item = encode(&AccountMapping, &anonymous).unwrap();
        assert_eq!(decode(&AccountMapping, &item).unwrap(), anonymous);
    }

    #[test]
    fn test_key_encoding() {
        let key = AccountMapping.key(&"acct-1".to_string()).unwrap();
        assert_eq!(key.name, "id");
        assert_eq!(key.value, AttributeValue::S("acct-1".to_string()));
        assert_eq!(key.describe(), "acct-1");
        assert_eq!(key.to_map().len(), 1);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut item = encode(&AccountMapping, &sample_account()).unwrap();
        item.remove("id");
        assert_eq!(
            decode(&AccountMapping, &item),
            Err(MappingError::MissingKey("id".to_string()))
        );
    }

    #[test]
    fn test_wrong_key_type_is_rejected() {
        let mut item = encode(&AccountMapping, &sample_account()).unwrap();
        item.insert("id".to_string(), AttributeValue::N("1".to_string()));
        assert!(matches!(
            decode(&AccountMapping, &item),
            Err(MappingError::MissingKey(_))
        ));
    }

    #[test]
    fn test_missing_attribute_is_rejected() {
        let mut item = encode(&AccountMapping, &sample_account()).unwrap();
        item.remove("balance");
        assert_eq!(
            decode(&AccountMapping, &item),
            Err(MappingError::MissingAttribute("balance".to_string()))
        );
    }

    #[test]
    fn test_malformed_attribute_is_rejected() {
        let mut item = encode(&AccountMapping, &sample_account()).unwrap();
        item.insert("balance".to_string(), AttributeValue::S("lots".to_string()));
        assert!(matches!(
            decode(&AccountMapping, &item),
            Err(MappingError::InvalidAttribute { ref name, .. }) if name == "balance"
        ));

        // An optional attribute that is present must still decode.
        let mut item = encode(&AccountMapping, &sample_account()).unwrap();
        item.insert("nickname".to_string(), AttributeValue::Bool(true));
        assert!(decode(&AccountMapping, &item).is_err());
    }

    #[test]
    fn test_encoding_failure_names_the_attribute() {
        let account = Account {
            balance: f64::INFINITY,
            ..sample_account()
        };
        assert!(matches!(
            encode(&AccountMapping, &account),
            Err(MappingError::Encoding { ref name, .. }) if name == "balance"
        ));
    }

    #[test]
    fn test_out_of_range_balance_surfaces_as_mapping_error() {
        let account = Account {
            balance: 1e200,
            ..sample_account()
        };

        let error = Error::from(encode(&AccountMapping, &account).unwrap_err());

        assert_eq!(
            error,
            Error::Mapping(MappingError::Encoding {
                name: "balance".to_string(),
                source: EncodingError::NumberOutOfRange(1e200),
            })
        );
    }

    #[test]
    fn test_key_attribute_type_matching() {
        assert!(KeyAttributeType::String.matches(&AttributeValue::S("a".to_string())));
        assert!(!KeyAttributeType::Number.matches(&AttributeValue::S("1".to_string())));
        assert_eq!(KeyAttributeType::Binary.to_string(), "B");
    }
}
