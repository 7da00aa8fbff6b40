//! Record mapping generator.
//!
//! Builds an [`ItemMapping`] from an ordered list of fields. The first field
//! is always the hash key; every field goes through the attribute codec of
//! its declared type. The builder is validated against the record's declared
//! field list, so a mapping that would silently drop or reorder fields is
//! rejected with an [`UnsupportedShapeError`].
//!
//! For plain structs the [`record_mapping!`](crate::record_mapping) macro
//! generates both the field list and the builder call.

use std::collections::HashSet;
use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::codec::AttributeCodec;
use crate::error::{EncodingError, MappingError, UnsupportedShapeError};
use crate::mapping::{self, AttributeMap, ItemMapping, KeySchema};

/// Largest number of fields a record mapping supports.
pub const MAX_RECORD_ARITY: usize = 22;

/// A type with a statically declared table and field list.
pub trait Record: Sized + Send + Sync + 'static {
    const TABLE: &'static str;
    const FIELDS: &'static [&'static str];
}

type Accessor<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;
type Encoder<T> = Box<dyn Fn(&T) -> Result<AttributeValue, EncodingError> + Send + Sync>;
type Constructor<T> = Box<dyn Fn(&FieldReader<'_>) -> Result<T, MappingError> + Send + Sync>;

struct Field<T> {
    name: String,
    encode: Encoder<T>,
}

/// Read access to an item's attributes while constructing a record.
pub struct FieldReader<'a> {
    item: &'a AttributeMap,
}

impl FieldReader<'_> {
    /// Decodes the named field.
    pub fn get<V: AttributeCodec>(&self, name: &str) -> Result<V, MappingError> {
        mapping::get_required(self.item, name)
    }
}

/// Mapping generated from a record's field list.
pub struct RecordMapping<T, K> {
    table: String,
    key: KeySchema,
    key_of: Accessor<T, K>,
    fields: Vec<Field<T>>,
    construct: Constructor<T>,
}

impl<T, K> RecordMapping<T, K>
where
    T: Send + Sync + 'static,
    K: AttributeCodec + Send + Sync + 'static,
{
    /// Starts building a mapping for `table`.
    pub fn builder(table: impl Into<String>) -> RecordMappingBuilder<T, K> {
        RecordMappingBuilder {
            table: table.into(),
            key: None,
            fields: Vec::new(),
            error: None,
        }
    }

    /// Names of the mapped fields, key first.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl<T, K> std::fmt::Debug for RecordMapping<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordMapping")
            .field("table", &self.table)
            .field("key", &self.key)
            .field(
                "fields",
                &self.fields.iter().map(|f| &f.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T, K> ItemMapping for RecordMapping<T, K>
where
    T: Send + Sync + 'static,
    K: AttributeCodec + Send + Sync + 'static,
{
    type Item = T;
    type Key = K;

    fn table_name(&self) -> &str {
        &self.table
    }

    fn key_schema(&self) -> KeySchema {
        self.key.clone()
    }

    fn key_of(&self, item: &T) -> K {
        (self.key_of)(item)
    }

    fn to_item(&self, value: &T) -> Result<AttributeMap, MappingError> {
        let mut item = AttributeMap::with_capacity(self.fields.len());
        for field in &self.fields {
            let attribute = (field.encode)(value).map_err(|source| MappingError::Encoding {
                name: field.name.clone(),
                source,
            })?;
            item.insert(field.name.clone(), attribute);
        }
        Ok(item)
    }

    fn from_item(&self, item: &AttributeMap) -> Result<T, MappingError> {
        (self.construct)(&FieldReader { item })
    }
}

/// Builder for [`RecordMapping`].
pub struct RecordMappingBuilder<T, K> {
    table: String,
    key: Option<(KeySchema, Accessor<T, K>)>,
    fields: Vec<Field<T>>,
    error: Option<UnsupportedShapeError>,
}

impl<T, K> RecordMappingBuilder<T, K>
where
    T: Send + Sync + 'static,
    K: AttributeCodec + Send + Sync + 'static,
{
    /// Registers the key field. Must be called before any other field.
    pub fn key<F>(mut self, name: &str, accessor: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if self.key.is_some() {
            self.error = Some(UnsupportedShapeError::DuplicateKey(name.to_string()));
            return self;
        }
        if let Some(first) = self.fields.first() {
            self.error = Some(UnsupportedShapeError::KeyNotFirst(first.name.clone()));
            return self;
        }
        let Some(attribute_type) = K::key_type() else {
            self.error = Some(UnsupportedShapeError::UnsupportedKeyType(name.to_string()));
            return self;
        };

        let accessor: Accessor<T, K> = Arc::new(accessor);
        let encode_accessor = Arc::clone(&accessor);
        self.fields.push(Field {
            name: name.to_string(),
            encode: Box::new(move |value: &T| encode_accessor(value).to_attribute()),
        });
        self.key = Some((KeySchema::new(name, attribute_type), accessor));
        self
    }

    /// Registers a non-key field.
    pub fn field<V, F>(mut self, name: &str, accessor: F) -> Self
    where
        V: AttributeCodec,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if self.key.is_none() {
            self.error = Some(UnsupportedShapeError::KeyNotFirst(name.to_string()));
            return self;
        }
        self.fields.push(Field {
            name: name.to_string(),
            encode: Box::new(move |value: &T| accessor(value).to_attribute()),
        });
        self
    }

    /// Validates the registered fields against `declared` and builds the mapping.
    pub fn build<C>(
        self,
        declared: &[&str],
        construct: C,
    ) -> Result<RecordMapping<T, K>, UnsupportedShapeError>
    where
        C: Fn(&FieldReader<'_>) -> Result<T, MappingError> + Send + Sync + 'static,
    {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.table.trim().is_empty() {
            return Err(UnsupportedShapeError::EmptyTableName);
        }
        if declared.len() > MAX_RECORD_ARITY {
            return Err(UnsupportedShapeError::TooManyFields {
                count: declared.len(),
                max: MAX_RECORD_ARITY,
            });
        }
        let Some((key, key_of)) = self.key else {
            return Err(UnsupportedShapeError::NoFields);
        };

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(UnsupportedShapeError::DuplicateField(field.name.clone()));
            }
        }

        let registered: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        if registered != declared {
            return Err(UnsupportedShapeError::FieldMismatch {
                expected: declared.iter().map(|s| s.to_string()).collect(),
                found: registered.iter().map(|s| s.to_string()).collect(),
            });
        }

        Ok(RecordMapping {
            table: self.table,
            key,
            key_of,
            fields: self.fields,
            construct: Box::new(construct),
        })
    }
}

/// Generates a [`Record`] impl and a `record_mapping()` constructor for a struct.
///
/// The first listed field is the key. Every struct field must be listed:
/// the generated constructor builds the struct literal, so a missing field
/// fails to compile.
///
/// ```ignore
/// struct Account { id: String, balance: f64 }
///
/// record_mapping!(Account => "accounts" { key id: String, balance: f64 });
///
/// let mapping = Account::record_mapping()?;
/// ```
#[macro_export]
macro_rules! record_mapping {
    (
        $record:ident => $table:literal {
            key $key:ident : $key_ty:ty
            $(, $field:ident : $field_ty:ty)* $(,)?
        }
    ) => {
        impl $crate::record::Record for $record {
            const TABLE: &'static str = $table;
            const FIELDS: &'static [&'static str] = &[stringify!($key) $(, stringify!($field))*];
        }

        impl $record {
            /// Mapping generated from the declared field list.
            pub fn record_mapping() -> ::std::result::Result<
                $crate::record::RecordMapping<$record, $key_ty>,
                $crate::error::UnsupportedShapeError,
            > {
                $crate::record::RecordMapping::<$record, $key_ty>::builder(
                    <$record as $crate::record::Record>::TABLE,
                )
                .key(stringify!($key), |r: &$record| -> $key_ty {
                    ::std::clone::Clone::clone(&r.$key)
                })
                $(
                    .field(stringify!($field), |r: &$record| -> $field_ty {
                        ::std::clone::Clone::clone(&r.$field)
                    })
                )*
                .build(<$record as $crate::record::Record>::FIELDS, |fields| {
                    ::std::result::Result::Ok($record {
                        $key: fields.get(stringify!($key))?,
                        $($field: fields.get(stringify!($field))?,)*
                    })
                })
            }
        }
    };
}
