//! DataValue: the snapshot form of a document element
//!
//! A `DataValue` is what array inserts, property adds and whole-value sets
//! carry: a tree of values where every node has its own element id, so
//! later operations can target nested elements directly.

use crate::ElementId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of value held by an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    String,
    Number,
    Boolean,
    Date,
    Array,
    Object,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Array => "array",
            ValueType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Element value snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    /// Element id of this node
    pub id: ElementId,

    /// The value itself
    pub value: DataValueKind,
}

/// Value payload of a [`DataValue`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValueKind {
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Array(Vec<DataValue>),
    Object(BTreeMap<String, DataValue>),
}

impl DataValueKind {
    pub fn value_type(&self) -> ValueType {
        match self {
            DataValueKind::Null => ValueType::Null,
            DataValueKind::String(_) => ValueType::String,
            DataValueKind::Number(_) => ValueType::Number,
            DataValueKind::Boolean(_) => ValueType::Boolean,
            DataValueKind::Date(_) => ValueType::Date,
            DataValueKind::Array(_) => ValueType::Array,
            DataValueKind::Object(_) => ValueType::Object,
        }
    }
}

impl DataValue {
    pub fn new(id: impl Into<ElementId>, value: DataValueKind) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    pub fn null(id: impl Into<ElementId>) -> Self {
        Self::new(id, DataValueKind::Null)
    }

    pub fn string(id: impl Into<ElementId>, value: impl Into<String>) -> Self {
        Self::new(id, DataValueKind::String(value.into()))
    }

    pub fn number(id: impl Into<ElementId>, value: f64) -> Self {
        Self::new(id, DataValueKind::Number(value))
    }

    pub fn boolean(id: impl Into<ElementId>, value: bool) -> Self {
        Self::new(id, DataValueKind::Boolean(value))
    }

    pub fn date(id: impl Into<ElementId>, value: DateTime<Utc>) -> Self {
        Self::new(id, DataValueKind::Date(value))
    }

    pub fn array(id: impl Into<ElementId>, values: Vec<DataValue>) -> Self {
        Self::new(id, DataValueKind::Array(values))
    }

    pub fn object(id: impl Into<ElementId>, values: BTreeMap<String, DataValue>) -> Self {
        Self::new(id, DataValueKind::Object(values))
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Visit this node and all of its descendants, parents first
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a DataValue)) {
        f(self);
        match &self.value {
            DataValueKind::Array(items) => items.iter().for_each(|item| item.visit(f)),
            DataValueKind::Object(fields) => fields.values().for_each(|item| item.visit(f)),
            _ => {}
        }
    }

    /// Build a value tree from JSON, assigning fresh ids
    pub fn from_json(json: &serde_json::Value, ids: &mut IdGenerator) -> Self {
        use serde_json::Value as JsonValue;

        let id = ids.next_id();
        let value = match json {
            JsonValue::Null => DataValueKind::Null,
            JsonValue::Bool(b) => DataValueKind::Boolean(*b),
            JsonValue::Number(n) => DataValueKind::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => DataValueKind::String(s.clone()),
            JsonValue::Array(items) => DataValueKind::Array(
                items.iter().map(|item| DataValue::from_json(item, ids)).collect(),
            ),
            JsonValue::Object(fields) => DataValueKind::Object(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), DataValue::from_json(item, ids)))
                    .collect(),
            ),
        };
        Self { id, value }
    }

    /// Export as plain JSON (ids dropped, dates as RFC 3339 strings)
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as JsonValue;

        match &self.value {
            DataValueKind::Null => JsonValue::Null,
            DataValueKind::String(s) => JsonValue::String(s.clone()),
            DataValueKind::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DataValueKind::Boolean(b) => JsonValue::Bool(*b),
            DataValueKind::Date(d) => {
                JsonValue::String(d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            DataValueKind::Array(items) => {
                JsonValue::Array(items.iter().map(DataValue::to_json).collect())
            }
            DataValueKind::Object(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), item.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Generates element ids of the form `{prefix}:{counter}`
///
/// The prefix is normally the session id, which keeps ids created by
/// different sessions disjoint without coordination.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    counter: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> ElementId {
        self.counter += 1;
        format!("{}:{}", self.prefix, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_shape() {
        let mut ids = IdGenerator::new("s1");
        let json = json!({"title": "hello", "tags": ["a", "b"], "count": 3.0, "done": false});
        let value = DataValue::from_json(&json, &mut ids);

        assert_eq!(value.value_type(), ValueType::Object);
        assert_eq!(value.id, "s1:1");
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdGenerator::new("s1");
        let value = DataValue::from_json(&json!([[1, 2], {"a": [3]}]), &mut ids);

        let mut seen = std::collections::HashSet::new();
        value.visit(&mut |node| assert!(seen.insert(node.id.clone())));
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_date_to_json() {
        let date = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = DataValue::date("d", date);
        assert_eq!(value.to_json(), json!("2024-05-01T12:00:00.000Z"));
    }

    #[test]
    fn test_serde_shape() {
        let value = DataValue::string("s1:1", "hi");
        let encoded = serde_json::to_value(&value).unwrap();
        assert_eq!(
            encoded,
            json!({"id": "s1:1", "value": {"type": "string", "value": "hi"}})
        );
        let decoded: DataValue = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, value);
    }
}
