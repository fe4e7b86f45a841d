//! Raw host results and the typed values decoded from them
//!
//! The script host answers with dynamically typed values. [`decode`] maps the
//! accepted shapes onto the closed [`DecodedValue`] variant and rejects every
//! other shape with [`BridgeError::InvalidResultType`]; nothing falls through
//! to a default.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value as Json;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{LngLat, LngLatBounds, ScreenPoint};

/// Storage type recorded on a boxed host number
///
/// Some hosts box booleans and numbers in the same container. The tag is the
/// only reliable way to tell `true` apart from `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberTag {
    /// Boxed boolean
    Boolean,
    /// Boxed signed or unsigned integer
    Integer,
    /// Boxed floating-point number
    Double,
}

/// Number as delivered by the host, with its storage tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxedNumber {
    /// Storage tag
    pub tag: NumberTag,
    /// Numeric payload
    pub value: f64,
}

impl BoxedNumber {
    /// A boxed double
    pub fn double(value: f64) -> Self {
        Self {
            tag: NumberTag::Double,
            value,
        }
    }

    /// A boxed integer
    pub fn integer(value: i64) -> Self {
        Self {
            tag: NumberTag::Integer,
            value: value as f64,
        }
    }

    /// A boolean boxed as a number
    pub fn boolean(flag: bool) -> Self {
        Self {
            tag: NumberTag::Boolean,
            value: if flag { 1.0 } else { 0.0 },
        }
    }
}

/// Untyped answer produced by the script host
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// Host string
    String(String),
    /// Boxed host number (may be a boxed boolean)
    Number(BoxedNumber),
    /// Native host boolean
    Boolean(bool),
    /// Keyed collection; keys are not guaranteed to be strings
    Dictionary(Vec<(RawResult, RawResult)>),
    /// Ordered collection
    Array(Vec<RawResult>),
    /// Host date object, seconds since the Unix epoch
    Date(f64),
    /// Explicit host null
    Null,
    /// No value at all
    Absent,
}

impl RawResult {
    /// Convert a JSON value reported by the host
    pub fn from_json(value: Json) -> Self {
        match value {
            Json::Null => RawResult::Null,
            Json::Bool(flag) => RawResult::Boolean(flag),
            Json::Number(num) => match num.as_i64() {
                Some(int) => RawResult::Number(BoxedNumber::integer(int)),
                None => RawResult::Number(BoxedNumber::double(num.as_f64().unwrap_or(f64::NAN))),
            },
            Json::String(text) => RawResult::String(text),
            Json::Array(items) => {
                RawResult::Array(items.into_iter().map(RawResult::from_json).collect())
            }
            Json::Object(entries) => RawResult::Dictionary(
                entries
                    .into_iter()
                    .map(|(key, value)| (RawResult::String(key), RawResult::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Parse the JSON text some hosts hand back from script evaluation
    ///
    /// Empty text and the literal `undefined` are treated as [`RawResult::Absent`].
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "undefined" {
            return Ok(RawResult::Absent);
        }
        serde_json::from_str(trimmed).map(RawResult::from_json)
    }

    /// Short description of the value's shape, used in error reasons
    pub fn describe(&self) -> String {
        match self {
            RawResult::String(_) => "string".to_string(),
            RawResult::Number(num) => format!("{:?}-tagged number {}", num.tag, num.value),
            RawResult::Boolean(flag) => format!("boolean {flag}"),
            RawResult::Dictionary(entries) => format!("dictionary of {} entries", entries.len()),
            RawResult::Array(items) => format!("array of {} elements", items.len()),
            RawResult::Date(secs) => format!("date {secs}"),
            RawResult::Null => "null".to_string(),
            RawResult::Absent => "absent".to_string(),
        }
    }
}

/// Typed value decoded from a host result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DecodedValue {
    /// Text
    String(String),
    /// Number
    Double(f64),
    /// Boolean
    Bool(bool),
    /// String-keyed numeric mapping
    Map(BTreeMap<String, f64>),
    /// The host produced a value the transport cannot represent
    UnsupportedType,
    /// No value
    Null,
}

impl DecodedValue {
    /// Name of the active variant
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedValue::String(_) => "string",
            DecodedValue::Double(_) => "double",
            DecodedValue::Bool(_) => "bool",
            DecodedValue::Map(_) => "map",
            DecodedValue::UnsupportedType => "unsupported type",
            DecodedValue::Null => "null",
        }
    }

    /// Whether the value carries nothing meaningful
    pub fn is_empty(&self) -> bool {
        matches!(self, DecodedValue::Null | DecodedValue::UnsupportedType)
    }

    /// Numeric view
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Double(num) => Some(*num),
            _ => None,
        }
    }

    /// Boolean view
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Mapping view
    pub fn as_map(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            DecodedValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::String(text) => write!(f, "{text:?}"),
            DecodedValue::Double(num) => write!(f, "{num}"),
            DecodedValue::Bool(flag) => write!(f, "{flag}"),
            DecodedValue::Map(map) => write!(f, "{map:?}"),
            DecodedValue::UnsupportedType => f.write_str("<unsupported>"),
            DecodedValue::Null => f.write_str("null"),
        }
    }
}

/// Decode a raw host result
pub fn decode(raw: RawResult) -> BridgeResult<DecodedValue> {
    match raw {
        RawResult::String(text) => Ok(DecodedValue::String(text)),
        RawResult::Boolean(flag) => Ok(DecodedValue::Bool(flag)),
        RawResult::Number(num) => decode_number(num),
        RawResult::Dictionary(entries) => decode_mapping(entries),
        RawResult::Null | RawResult::Absent => Ok(DecodedValue::Null),
        other @ (RawResult::Array(_) | RawResult::Date(_)) => {
            Err(BridgeError::InvalidResultType(other.describe()))
        }
    }
}

fn decode_number(num: BoxedNumber) -> BridgeResult<DecodedValue> {
    match num.tag {
        // The tag must be checked before the numeric payload: a boxed `true`
        // also reads as 1.0.
        NumberTag::Boolean => {
            if num.value == 0.0 {
                Ok(DecodedValue::Bool(false))
            } else if num.value == 1.0 {
                Ok(DecodedValue::Bool(true))
            } else {
                Err(BridgeError::InvalidResultType(format!(
                    "boolean-tagged number {}",
                    num.value
                )))
            }
        }
        NumberTag::Integer | NumberTag::Double => Ok(DecodedValue::Double(num.value)),
    }
}

fn decode_mapping(entries: Vec<(RawResult, RawResult)>) -> BridgeResult<DecodedValue> {
    let total = entries.len();
    let mut map = BTreeMap::new();

    for (key, value) in entries {
        let key = match key {
            RawResult::String(key) => key,
            other => {
                return Err(BridgeError::InvalidResultType(format!(
                    "dictionary of {total} entries with {} key",
                    other.describe()
                )));
            }
        };

        let number = match value {
            RawResult::Number(num) if num.tag != NumberTag::Boolean => num.value,
            other => {
                return Err(BridgeError::InvalidResultType(format!(
                    "dictionary of {total} entries with {} value for key {key:?}",
                    other.describe()
                )));
            }
        };

        if map.insert(key.clone(), number).is_some() {
            return Err(BridgeError::InvalidResultType(format!(
                "dictionary of {total} entries with duplicate key {key:?}"
            )));
        }
    }

    Ok(DecodedValue::Map(map))
}

/// Conversion from a decoded value into a command's output type
pub trait FromDecoded: Sized {
    /// Convert, failing with [`BridgeError::UnsupportedReturnType`] on a shape mismatch
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self>;
}

fn mismatch(expected: &str, value: &DecodedValue) -> BridgeError {
    BridgeError::UnsupportedReturnType(format!("expected {expected}, got {}", value.kind()))
}

fn map_field(map: &BTreeMap<String, f64>, key: &str, expected: &str) -> BridgeResult<f64> {
    map.get(key).copied().ok_or_else(|| {
        BridgeError::UnsupportedReturnType(format!("expected {expected}, missing key {key:?}"))
    })
}

impl FromDecoded for DecodedValue {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        Ok(value)
    }
}

impl FromDecoded for f64 {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("double", &value))
    }
}

impl FromDecoded for bool {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl FromDecoded for String {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        match value {
            DecodedValue::String(text) => Ok(text),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromDecoded for BTreeMap<String, f64> {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        match value {
            DecodedValue::Map(map) => Ok(map),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl FromDecoded for LngLat {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        let map = value.as_map().ok_or_else(|| mismatch("coordinate", &value))?;
        Ok(LngLat::new(
            map_field(map, "lng", "coordinate")?,
            map_field(map, "lat", "coordinate")?,
        ))
    }
}

impl FromDecoded for ScreenPoint {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        let map = value.as_map().ok_or_else(|| mismatch("point", &value))?;
        Ok(ScreenPoint::new(
            map_field(map, "x", "point")?,
            map_field(map, "y", "point")?,
        ))
    }
}

impl FromDecoded for LngLatBounds {
    fn from_decoded(value: DecodedValue) -> BridgeResult<Self> {
        let map = value.as_map().ok_or_else(|| mismatch("bounds", &value))?;
        Ok(LngLatBounds {
            west: map_field(map, "west", "bounds")?,
            south: map_field(map, "south", "bounds")?,
            east: map_field(map, "east", "bounds")?,
            north: map_field(map, "north", "bounds")?,
        })
    }
}
