//! Optional data attached to a log call
//!
//! A payload is one of three shapes, and the shape (not the runtime type of
//! whatever the caller passed in) decides how the record is rendered:
//! - `Absent`: nothing attached
//! - `FlatRecord`: up to [`MAX_INLINE_FIELDS`] scalar fields, in caller order
//! - `Structured`: any other JSON tree, including arrays of any size

use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Largest number of keys a record may carry and still render inline
pub const MAX_INLINE_FIELDS: usize = 4;

/// Scalar value of a flat record field
///
/// `Null` and `Undefined` are kept apart so a reader can tell a field that
/// was present but empty from one that was never set.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    /// Unsigned values beyond `i64::MAX`
    UInt(u64),
    Float(f64),
    Bool(bool),
    Null,
    Undefined,
}

impl FieldValue {
    /// Convert a JSON scalar; objects and arrays are not field values
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Number(n) => Some(match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => FieldValue::Int(i),
                (None, Some(u)) => FieldValue::UInt(u),
                (None, None) => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert to a JSON value; `Undefined` has no JSON form
    #[must_use]
    pub fn to_json_value(&self) -> Option<Value> {
        match self {
            FieldValue::String(s) => Some(Value::String(s.clone())),
            FieldValue::Int(i) => Some(Value::Number((*i).into())),
            FieldValue::UInt(u) => Some(Value::Number((*u).into())),
            FieldValue::Float(f) => Some(
                serde_json::Number::from_f64(*f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            FieldValue::Bool(b) => Some(Value::Bool(*b)),
            FieldValue::Null => Some(Value::Null),
            FieldValue::Undefined => None,
        }
    }
}

/// Inline rendering: strings are quoted and escaped so the record stays on one line
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => match serde_json::to_string(s) {
                Ok(quoted) => f.write_str(&quoted),
                Err(_) => write!(f, "{:?}", s),
            },
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
            FieldValue::Undefined => f.write_str("undefined"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => FieldValue::Int(i),
            Err(_) => FieldValue::UInt(u),
        }
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// `None` means the field was never set
impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Undefined, Into::into)
    }
}

/// Ordered scalar key-value fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, FieldValue)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field; an existing key keeps its position and takes the new value
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.add_field(key, value);
        self
    }

    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Format fields as `k=v` pairs separated by spaces
    ///
    /// Keys that are not plain identifiers are JSON-quoted, so neither a key
    /// nor a value can break the line or the `k=v` list.
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", inline_key(k), v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// JSON object form; `Undefined` fields are left out
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .filter_map(|(k, v)| v.to_json_value().map(|v| (k.clone(), v)))
            .collect();
        Value::Object(map)
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn inline_key(key: &str) -> Cow<'_, str> {
    if is_plain_key(key) {
        return Cow::Borrowed(key);
    }
    match serde_json::to_string(key) {
        Ok(quoted) => Cow::Owned(quoted),
        Err(_) => Cow::Owned(format!("{:?}", key)),
    }
}

/// Optional data attached to a log entry
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    Absent,
    FlatRecord(FlatRecord),
    Structured(Value),
}

impl Payload {
    /// Serialize any value into a payload
    ///
    /// Values that fail to serialize fall back to their `Debug` text so the
    /// log call itself never fails.
    pub fn serialize<T>(value: &T) -> Self
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(json) => Self::from(json),
            Err(_) => Payload::Structured(Value::String(format!("{:?}", value))),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    /// JSON view of the payload, `None` when absent
    #[must_use]
    pub fn to_json_value(&self) -> Option<Value> {
        match self {
            Payload::Absent => None,
            Payload::FlatRecord(record) => Some(record.to_json_value()),
            Payload::Structured(value) => Some(value.clone()),
        }
    }
}

/// Objects with at most four scalar values become flat records; every other
/// value, arrays included, stays structured.
impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map)
                if map.len() <= MAX_INLINE_FIELDS
                    && map.values().all(|v| !v.is_object() && !v.is_array()) =>
            {
                let mut record = FlatRecord::new();
                for (key, value) in &map {
                    if let Some(field) = FieldValue::from_json(value) {
                        record.add_field(key.clone(), field);
                    }
                }
                Payload::FlatRecord(record)
            }
            other => Payload::Structured(other),
        }
    }
}

impl From<FlatRecord> for Payload {
    fn from(record: FlatRecord) -> Self {
        if record.len() > MAX_INLINE_FIELDS {
            Payload::Structured(record.to_json_value())
        } else {
            Payload::FlatRecord(record)
        }
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_small_flat_object_is_flat_record() {
        let payload = Payload::from(json!({"a": 1, "b": "two", "c": null, "d": true}));
        match payload {
            Payload::FlatRecord(record) => {
                let keys: Vec<&str> = record.fields().iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["a", "b", "c", "d"]);
            }
            other => panic!("Expected flat record, got {:?}", other),
        }
    }

    #[test]
    fn test_key_order_follows_definition() {
        let payload = Payload::from(json!({"zeta": 1, "alpha": 2}));
        match payload {
            Payload::FlatRecord(record) => assert_eq!(record.format_fields(), "zeta=1 alpha=2"),
            other => panic!("Expected flat record, got {:?}", other),
        }
    }

    #[test]
    fn test_five_keys_is_structured() {
        let payload = Payload::from(json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5}));
        assert!(matches!(payload, Payload::Structured(_)));
    }

    #[test]
    fn test_nested_value_is_structured() {
        assert!(matches!(
            Payload::from(json!({"a": {"b": 1}})),
            Payload::Structured(_)
        ));
        assert!(matches!(
            Payload::from(json!({"ids": [1, 2]})),
            Payload::Structured(_)
        ));
    }

    #[test]
    fn test_arrays_are_always_structured() {
        assert!(matches!(Payload::from(json!([])), Payload::Structured(_)));
        assert!(matches!(Payload::from(json!([1, 2])), Payload::Structured(_)));
    }

    #[test]
    fn test_scalars_are_structured() {
        assert!(matches!(Payload::from(json!("text")), Payload::Structured(_)));
        assert!(matches!(Payload::from(json!(42)), Payload::Structured(_)));
    }

    #[test]
    fn test_empty_object_is_flat() {
        assert_eq!(
            Payload::from(json!({})),
            Payload::FlatRecord(FlatRecord::new())
        );
    }

    #[test]
    fn test_record_promotes_past_four_fields() {
        let record = FlatRecord::new()
            .with_field("a", 1)
            .with_field("b", 2)
            .with_field("c", 3)
            .with_field("d", 4)
            .with_field("e", 5);
        assert!(matches!(Payload::from(record), Payload::Structured(_)));
    }

    #[test]
    fn test_field_replacement_keeps_position() {
        let record = FlatRecord::new()
            .with_field("a", 1)
            .with_field("b", 2)
            .with_field("a", 3);
        assert_eq!(record.format_fields(), "a=3 b=2");
    }

    #[test]
    fn test_null_and_undefined_are_distinct() {
        let record = FlatRecord::new()
            .with_field("empty", FieldValue::Null)
            .with_field("missing", None::<String>);
        assert_eq!(record.format_fields(), "empty=null missing=undefined");

        // undefined has no JSON form and is omitted from the tree view
        assert_eq!(record.to_json_value(), json!({"empty": null}));
    }

    #[test]
    fn test_string_values_are_quoted_and_escaped() {
        let value = FieldValue::from("line one\nline \"two\"");
        assert_eq!(value.to_string(), r#""line one\nline \"two\"""#);
    }

    #[test]
    fn test_unusual_keys_are_quoted() {
        let record = FlatRecord::new()
            .with_field("task_id", 1)
            .with_field("a\nERROR: forged", 2)
            .with_field("has space", 3)
            .with_field("", 4);
        assert_eq!(
            record.format_fields(),
            r#"task_id=1 "a\nERROR: forged"=2 "has space"=3 ""=4"#
        );
    }

    #[test]
    fn test_large_unsigned_keeps_precision() {
        let payload = Payload::from(json!({"id": u64::MAX}));
        match payload {
            Payload::FlatRecord(record) => {
                assert_eq!(record.fields()[0].1, FieldValue::UInt(u64::MAX));
                assert_eq!(record.format_fields(), "id=18446744073709551615");
                assert_eq!(record.to_json_value(), json!({"id": u64::MAX}));
            }
            other => panic!("Expected flat record, got {:?}", other),
        }

        assert_eq!(FieldValue::from(7u64), FieldValue::Int(7));
        assert_eq!(FieldValue::from(u64::MAX), FieldValue::UInt(u64::MAX));
    }

    #[test]
    fn test_serialize_struct() {
        #[derive(Debug, Serialize)]
        struct TaskRef {
            id: u32,
            title: &'static str,
        }

        let payload = Payload::serialize(&TaskRef { id: 7, title: "Write docs" });
        match payload {
            Payload::FlatRecord(record) => assert_eq!(record.format_fields(), r#"id=7 title="Write docs""#),
            other => panic!("Expected flat record, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_failure_falls_back_to_debug_text() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut map: HashMap<(u8, u8), u8> = HashMap::new();
        map.insert((1, 2), 3);

        match Payload::serialize(&map) {
            Payload::Structured(Value::String(text)) => assert!(text.contains("(1, 2)")),
            other => panic!("Expected string fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_option_payload() {
        assert!(Payload::from(None::<Value>).is_absent());
        assert!(!Payload::from(Some(json!({"a": 1}))).is_absent());
    }
}
