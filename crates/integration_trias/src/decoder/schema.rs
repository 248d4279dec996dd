//! Schema contracts for decodable TRIAS responses
//!
//! A response kind implements [`ResponseSchema`] and names one repeated
//! record type implementing [`PayloadSchema`]. The decoder only ever talks
//! to a document through these two traits.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// A leaf tag addressed through its enclosing parent tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    /// Qualified name of the enclosing element
    pub parent: &'static str,
    /// Qualified name of the leaf element
    pub child: &'static str,
}

/// Key of a settable payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// A leaf tag that is unique within its record
    Leaf(&'static str),
    /// A leaf tag reused under several parents, addressed by its parent
    Scoped(ScopedKey),
}

impl FieldKey {
    /// Create a bare leaf key
    #[must_use]
    pub const fn leaf(name: &'static str) -> Self {
        Self::Leaf(name)
    }

    /// Create a key scoped to a parent element
    #[must_use]
    pub const fn scoped(parent: &'static str, child: &'static str) -> Self {
        Self::Scoped(ScopedKey { parent, child })
    }

    /// Returns true if this is the bare leaf key for `name`
    #[must_use]
    pub fn is_leaf(&self, name: &str) -> bool {
        matches!(self, Self::Leaf(leaf) if *leaf == name)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(name) => write!(f, "{name}"),
            Self::Scoped(ScopedKey { parent, child }) => write!(f, "{parent}>{child}"),
        }
    }
}

/// One repeated record inside a response's delivery payload
pub trait PayloadSchema: Default + fmt::Debug {
    /// Qualified tag that opens and closes one record
    const ELEMENT_NAME: &'static str;

    /// Every key this record accepts in [`set_value`](Self::set_value)
    fn property_keys() -> &'static [FieldKey];

    /// Assign the text of a closed element to the field behind `key`
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownKey`] for an undeclared key and
    /// [`DecodeError::TypeMismatch`] when the text does not convert.
    fn set_value(&mut self, key: FieldKey, value: &str) -> Result<(), DecodeError>;
}

/// The outer response document
pub trait ResponseSchema: Default + fmt::Debug {
    /// Record type collected from the delivery payload
    type Payload: PayloadSchema;

    /// Service delivery header of this response
    fn header(&self) -> &ServiceHeader;

    /// Mutable service delivery header
    fn header_mut(&mut self) -> &mut ServiceHeader;

    /// Records in document order
    fn payloads(&self) -> &[Self::Payload];

    /// Append-only access used while decoding
    fn payloads_mut(&mut self) -> &mut Vec<Self::Payload>;
}

/// Scalar fields every TRIAS service delivery carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHeader {
    /// `siri:ResponseTimestamp`
    pub timestamp: String,
    /// `siri:ProducerRef`
    pub reference: String,
    /// `trias:Language`
    pub language: String,
    /// `siri:Status`
    pub status: bool,
    /// `trias:CalcTime` in milliseconds
    pub calc_time: i64,
}

/// Fixed outer tags mapped onto [`ServiceHeader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// `siri:ResponseTimestamp`
    Timestamp,
    /// `siri:ProducerRef`
    Reference,
    /// `siri:Status`
    Status,
    /// `trias:Language`
    Language,
    /// `trias:CalcTime`
    CalcTime,
}

impl HeaderField {
    /// Look up the header field for a qualified tag name
    #[must_use]
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "siri:ResponseTimestamp" => Some(Self::Timestamp),
            "siri:ProducerRef" => Some(Self::Reference),
            "siri:Status" => Some(Self::Status),
            "trias:Language" => Some(Self::Language),
            "trias:CalcTime" => Some(Self::CalcTime),
            _ => None,
        }
    }
}

impl ServiceHeader {
    /// Assign raw text to a header field
    ///
    /// Never fails: a non-`"true"` status reads as false and an unparsable
    /// calc time reads as zero.
    pub fn assign(&mut self, field: HeaderField, text: &str) {
        match field {
            HeaderField::Timestamp => self.timestamp = text.to_string(),
            HeaderField::Reference => self.reference = text.to_string(),
            HeaderField::Status => self.status = text == "true",
            HeaderField::Language => self.language = text.to_string(),
            HeaderField::CalcTime => self.calc_time = text.parse().unwrap_or(0),
        }
    }
}

/// Convert field text to `f64`
///
/// # Errors
///
/// Returns [`DecodeError::TypeMismatch`] if the text is not a number.
pub fn parse_f64(key: FieldKey, value: &str) -> Result<f64, DecodeError> {
    value
        .parse()
        .map_err(|_| DecodeError::type_mismatch(key, "f64", value))
}

/// Convert field text to `bool` using the XML Schema lexical forms
///
/// # Errors
///
/// Returns [`DecodeError::TypeMismatch`] for anything but `true`, `false`,
/// `1` or `0`.
pub fn parse_bool(key: FieldKey, value: &str) -> Result<bool, DecodeError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(DecodeError::type_mismatch(key, "bool", value)),
    }
}

/// Convert field text to a UTC timestamp
///
/// # Errors
///
/// Returns [`DecodeError::TypeMismatch`] if the text is not RFC 3339.
pub fn parse_timestamp(key: FieldKey, value: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::type_mismatch(key, "RFC 3339 timestamp", value))
}
