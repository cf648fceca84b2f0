//! Typed value adapters.
//!
//! Every field owns one adapter. The adapter holds the current value
//! (initially the default), converts raw strings from the environment or the
//! command line into it, and renders it back for reports.
//!
//! A failed [`FlagValue::set`] leaves the previous value untouched.

use std::any::Any;
use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::vec::Vec;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ParseError;

/// Separator used by [`StringListValue`].
pub const LIST_DELIMITER: char = ',';

/// Object-safe conversion interface shared by all adapters.
pub trait FlagValue: core::fmt::Debug + 'static {
    /// Convert `raw` and store it.
    fn set(&mut self, raw: &str) -> Result<(), ParseError>;

    /// Render the current value. An empty string means "no value".
    fn render(&self) -> String;

    /// Short type name used in messages, e.g. `"int"`.
    fn type_name(&self) -> &'static str;

    /// Boolean flags may be given on the command line without a value.
    fn is_bool_flag(&self) -> bool {
        false
    }

    /// Access to the concrete adapter for typed reads.
    fn as_any(&self) -> &dyn Any;
}

/// A [`FlagValue`] with a known Rust value type.
pub trait Adapter: FlagValue + Sized {
    /// The value produced by this adapter.
    type Value;

    /// The current value.
    fn value(&self) -> &Self::Value;
}

macro_rules! impl_adapter {
    ($ty:ty, $value:ty) => {
        impl Adapter for $ty {
            type Value = $value;

            fn value(&self) -> &Self::Value {
                &self.0
            }
        }
    };
}

// ============================================================================
// Scalars
// ============================================================================

/// A plain string. Accepts any input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValue(pub String);

impl StringValue {
    /// Create with a default.
    pub fn new(default: impl Into<String>) -> Self {
        Self(default.into())
    }
}

impl FlagValue for StringValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = raw.to_string();
        Ok(())
    }

    fn render(&self) -> String {
        self.0.clone()
    }

    fn type_name(&self) -> &'static str {
        "string"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(StringValue, String);

/// A boolean, using the conventional flag vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolValue(pub bool);

impl BoolValue {
    /// Create with a default.
    pub fn new(default: bool) -> Self {
        Self(default)
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl FlagValue for BoolValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        match parse_bool(raw) {
            Some(b) => {
                self.0 = b;
                Ok(())
            }
            None => Err(ParseError::new(raw, self.type_name(), "expected true or false")),
        }
    }

    fn render(&self) -> String {
        self.0.to_string()
    }

    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn is_bool_flag(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(BoolValue, bool);

/// A signed 64-bit integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntValue(pub i64);

impl IntValue {
    /// Create with a default.
    pub fn new(default: i64) -> Self {
        Self(default)
    }
}

impl FlagValue for IntValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        let parsed = raw
            .parse::<i64>()
            .map_err(|e| ParseError::new(raw, self.type_name(), e.to_string()))?;
        self.0 = parsed;
        Ok(())
    }

    fn render(&self) -> String {
        self.0.to_string()
    }

    fn type_name(&self) -> &'static str {
        "int"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(IntValue, i64);

/// A point in time. Accepts RFC 3339 or integer unix seconds; renders RFC 3339 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampValue(pub Option<DateTime<Utc>>);

impl TimestampValue {
    /// Create with a default.
    pub fn new(default: Option<DateTime<Utc>>) -> Self {
        Self(default)
    }
}

impl FlagValue for TimestampValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        let parsed = if let Ok(secs) = raw.parse::<i64>() {
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| ParseError::new(raw, self.type_name(), "timestamp out of range"))?
        } else {
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| ParseError::new(raw, self.type_name(), e.to_string()))?
                .with_timezone(&Utc)
        };
        self.0 = Some(parsed);
        Ok(())
    }

    fn render(&self) -> String {
        self.0
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    }

    fn type_name(&self) -> &'static str {
        "timestamp"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(TimestampValue, Option<DateTime<Utc>>);

// ============================================================================
// Composites
// ============================================================================

/// An ordered list of strings, separated by [`LIST_DELIMITER`].
///
/// Elements that themselves contain the delimiter do not survive a
/// render/parse round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringListValue(pub Vec<String>);

impl StringListValue {
    /// Create with a default.
    pub fn new<I, S>(default: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(default.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(LIST_DELIMITER).map(str::to_string).collect()
}

impl FlagValue for StringListValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        self.0 = split_list(raw);
        Ok(())
    }

    fn render(&self) -> String {
        let mut sep = [0u8; 4];
        self.0.join(LIST_DELIMITER.encode_utf8(&mut sep))
    }

    fn type_name(&self) -> &'static str {
        "string list"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(StringListValue, Vec<String>);

/// A string-to-string map, written as a flat JSON object.
///
/// Entry order is not preserved; rendering sorts keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMapValue(pub BTreeMap<String, String>);

impl StringMapValue {
    /// Create with a default.
    pub fn new<I, K, V>(default: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            default
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl FlagValue for StringMapValue {
    fn set(&mut self, raw: &str) -> Result<(), ParseError> {
        let parsed: BTreeMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| ParseError::new(raw, self.type_name(), e.to_string()))?;
        self.0 = parsed;
        Ok(())
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    fn type_name(&self) -> &'static str {
        "string map"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_adapter!(StringMapValue, BTreeMap<String, String>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_accepts_anything() {
        let mut v = StringValue::new("x");
        v.set("").unwrap();
        assert_eq!(v.value(), "");
        v.set("a,b=c").unwrap();
        assert_eq!(v.render(), "a,b=c");
    }

    #[test]
    fn test_bool_vocabulary() {
        let mut v = BoolValue::default();
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            v.set(raw).unwrap();
            assert!(*v.value(), "{raw} should be true");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            v.set(raw).unwrap();
            assert!(!*v.value(), "{raw} should be false");
        }
        assert!(v.is_bool_flag());
    }

    #[test]
    fn test_bool_rejects_yes() {
        let mut v = BoolValue::new(true);
        let err = v.set("yes").unwrap_err();
        assert_eq!(err.type_name, "bool");
        assert!(*v.value(), "failed set must keep the old value");
    }

    #[test]
    fn test_int_parse() {
        let mut v = IntValue::new(-1);
        assert_eq!(v.render(), "-1");
        v.set("42").unwrap();
        assert_eq!(*v.value(), 42);
        let err = v.set("bad-int").unwrap_err();
        assert_eq!(err.value, "bad-int");
        assert_eq!(*v.value(), 42);
    }

    #[test]
    fn test_timestamp_unix_and_rfc3339() {
        let mut v = TimestampValue::default();
        assert_eq!(v.render(), "");
        v.set("0").unwrap();
        assert_eq!(v.render(), "1970-01-01T00:00:00Z");
        v.set("2024-05-06T07:08:09+02:00").unwrap();
        assert_eq!(v.render(), "2024-05-06T05:08:09Z");
        assert!(v.set("yesterday").is_err());
        assert_eq!(v.render(), "2024-05-06T05:08:09Z");
    }

    #[test]
    fn test_list_empty_input_is_empty_list() {
        let mut v = StringListValue::new(["keep"]);
        v.set("").unwrap();
        assert!(v.value().is_empty());
        assert_eq!(v.render(), "");
    }

    #[test]
    fn test_list_round_trip_keeps_order() {
        let v = StringListValue::new(["x", "y", "z"]);
        let rendered = v.render();
        assert_eq!(rendered, "x,y,z");

        let mut back = StringListValue::default();
        back.set(&rendered).unwrap();
        assert_eq!(back.value(), &vec!["x".to_string(), "y".into(), "z".into()]);
    }

    #[test]
    fn test_list_delimiter_in_element_is_lossy() {
        let v = StringListValue::new(["a,b"]);
        let mut back = StringListValue::default();
        back.set(&v.render()).unwrap();
        assert_eq!(back.value().len(), 2);
    }

    #[test]
    fn test_map_parse_and_render() {
        let mut v = StringMapValue::default();
        assert_eq!(v.render(), "");
        v.set(r#"{"b":"2","a":"1"}"#).unwrap();
        assert_eq!(v.value().get("a").map(String::as_str), Some("1"));
        assert_eq!(v.render(), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn test_map_rejects_malformed() {
        let mut v = StringMapValue::new([("k", "v")]);
        assert!(v.set("{not json").is_err());
        assert!(v.set(r#"{"n": 1}"#).is_err());
        assert!(v.set(r#"["a"]"#).is_err());
        assert_eq!(v.value().len(), 1);
    }
}
