//! Attribute codec.
//!
//! Pure conversions between Rust values and DynamoDB `AttributeValue`s.

use std::collections::{BTreeSet, HashSet};

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{DecodingError, EncodingError};
use crate::mapping::KeyAttributeType;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A value that converts to and from a single wire attribute.
pub trait AttributeCodec: Sized {
    /// Encodes the value.
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError>;

    /// Decodes a value, failing if the wire tag does not match.
    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError>;

    /// Value to use when the attribute is missing from an item.
    ///
    /// `None` means the attribute is required.
    fn from_absent() -> Option<Self> {
        None
    }

    /// Key attribute type, if values of this type can be used as a table key.
    fn key_type() -> Option<KeyAttributeType> {
        None
    }
}

/// Short wire tag of an attribute, used in error messages.
pub fn attribute_kind(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        AttributeValue::M(_) => "M",
        AttributeValue::L(_) => "L",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        _ => "UNKNOWN",
    }
}

fn mismatch(expected: &'static str, found: &AttributeValue) -> DecodingError {
    DecodingError::TypeMismatch {
        expected,
        found: attribute_kind(found),
    }
}

fn expect_s(value: &AttributeValue) -> Result<&String, DecodingError> {
    value.as_s().map_err(|v| mismatch("S", v))
}

fn expect_n(value: &AttributeValue) -> Result<&String, DecodingError> {
    value.as_n().map_err(|v| mismatch("N", v))
}

fn parse_number<T>(text: &str) -> Result<T, DecodingError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>().map_err(|e| DecodingError::InvalidNumber {
        value: text.to_string(),
        reason: e.to_string(),
    })
}

/// Non-zero magnitudes DynamoDB can store: 1e-130 up to just under 1e126.
const NUMBER_MAGNITUDE: std::ops::Range<f64> = 1e-130..1e126;

fn check_number_range(value: f64) -> Result<(), EncodingError> {
    let magnitude = value.abs();
    if magnitude == 0.0 || NUMBER_MAGNITUDE.contains(&magnitude) {
        Ok(())
    } else {
        Err(EncodingError::NumberOutOfRange(value))
    }
}

fn invalid_text(kind: &'static str, value: &str, reason: impl ToString) -> DecodingError {
    DecodingError::InvalidText {
        kind,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl AttributeCodec for String {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::S(self.clone()))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        expect_s(value).cloned()
    }

    fn key_type() -> Option<KeyAttributeType> {
        Some(KeyAttributeType::String)
    }
}

macro_rules! integer_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttributeCodec for $ty {
                fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
                    Ok(AttributeValue::N(self.to_string()))
                }

                fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
                    parse_number(expect_n(value)?)
                }

                fn key_type() -> Option<KeyAttributeType> {
                    Some(KeyAttributeType::Number)
                }
            }
        )*
    };
}

integer_codec!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AttributeCodec for $ty {
                fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
                    if !self.is_finite() {
                        return Err(EncodingError::NonFiniteNumber(f64::from(*self)));
                    }
                    check_number_range(f64::from(*self))?;
                    Ok(AttributeValue::N(self.to_string()))
                }

                fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
                    parse_number(expect_n(value)?)
                }

                fn key_type() -> Option<KeyAttributeType> {
                    Some(KeyAttributeType::Number)
                }
            }
        )*
    };
}

float_codec!(f32, f64);

impl AttributeCodec for bool {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::Bool(*self))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        value.as_bool().copied().map_err(|v| mismatch("BOOL", v))
    }
}

impl AttributeCodec for Blob {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::B(self.clone()))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        value.as_b().cloned().map_err(|v| mismatch("B", v))
    }

    fn key_type() -> Option<KeyAttributeType> {
        Some(KeyAttributeType::Binary)
    }
}

impl AttributeCodec for Uuid {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::S(self.to_string()))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        let s = expect_s(value)?;
        Uuid::parse_str(s).map_err(|e| invalid_text("uuid", s, e))
    }

    fn key_type() -> Option<KeyAttributeType> {
        Some(KeyAttributeType::String)
    }
}

impl AttributeCodec for NaiveDate {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::S(self.format(DATE_FORMAT).to_string()))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        let s = expect_s(value)?;
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| invalid_text("date", s, e))
    }

    fn key_type() -> Option<KeyAttributeType> {
        Some(KeyAttributeType::String)
    }
}

impl AttributeCodec for DateTime<Utc> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        Ok(AttributeValue::S(self.to_rfc3339()))
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        let s = expect_s(value)?;
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| invalid_text("datetime", s, e))
    }

    fn key_type() -> Option<KeyAttributeType> {
        Some(KeyAttributeType::String)
    }
}

impl<T: AttributeCodec> AttributeCodec for Option<T> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        match self {
            Some(value) => value.to_attribute(),
            None => Ok(AttributeValue::Null(true)),
        }
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        match value {
            AttributeValue::Null(_) => Ok(None),
            other => T::from_attribute(other).map(Some),
        }
    }

    fn from_absent() -> Option<Self> {
        Some(None)
    }
}

fn encode_string_set<'a>(
    values: impl ExactSizeIterator<Item = &'a String>,
) -> Result<AttributeValue, EncodingError> {
    if values.len() == 0 {
        return Err(EncodingError::EmptySet { kind: "string" });
    }
    Ok(AttributeValue::Ss(values.cloned().collect()))
}

fn encode_number_set<'a>(
    values: impl ExactSizeIterator<Item = &'a i64>,
) -> Result<AttributeValue, EncodingError> {
    if values.len() == 0 {
        return Err(EncodingError::EmptySet { kind: "number" });
    }
    Ok(AttributeValue::Ns(values.map(|n| n.to_string()).collect()))
}

fn decode_number_set<C: FromIterator<i64>>(value: &AttributeValue) -> Result<C, DecodingError> {
    value
        .as_ns()
        .map_err(|v| mismatch("NS", v))?
        .iter()
        .map(|n| parse_number::<i64>(n))
        .collect()
}

impl AttributeCodec for HashSet<String> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        encode_string_set(self.iter())
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        let values = value.as_ss().map_err(|v| mismatch("SS", v))?;
        Ok(values.iter().cloned().collect())
    }
}

impl AttributeCodec for BTreeSet<String> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        encode_string_set(self.iter())
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        let values = value.as_ss().map_err(|v| mismatch("SS", v))?;
        Ok(values.iter().cloned().collect())
    }
}

impl AttributeCodec for HashSet<i64> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        encode_number_set(self.iter())
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        decode_number_set(value)
    }
}

impl AttributeCodec for BTreeSet<i64> {
    fn to_attribute(&self) -> Result<AttributeValue, EncodingError> {
        encode_number_set(self.iter())
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self, DecodingError> {
        decode_number_set(value)
    }
}
