//! Local mutation intents
//!
//! A [`Mutation`] says what the user wants to do to one element. The
//! controller turns it into a discrete operation against the current
//! document, capturing old values along the way.

use crate::error::{OtError, Result};
use crate::model::{DataValue, DataValueKind, Model};
use crate::ot::ops::{
    ArrayInsertOperation, ArrayMoveOperation, ArrayRemoveOperation, ArrayReplaceOperation,
    ArraySetOperation, BooleanSetOperation, DateSetOperation, DiscreteOperation,
    NumberDeltaOperation, NumberSetOperation, ObjectAddPropertyOperation,
    ObjectRemovePropertyOperation, ObjectSetOperation, ObjectSetPropertyOperation,
    StringInsertOperation, StringRemoveOperation, StringSetOperation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    ArrayInsert { index: usize, value: DataValue },
    ArrayRemove { index: usize },
    ArrayReplace { index: usize, value: DataValue },
    ArrayMove { from_index: usize, to_index: usize },
    ArraySet { values: Vec<DataValue> },
    /// Adds the property, or replaces it when it already exists
    ObjectSet { key: String, value: DataValue },
    ObjectRemove { key: String },
    ObjectSetAll { values: BTreeMap<String, DataValue> },
    StringInsert { index: usize, value: String },
    StringRemove { index: usize, length: usize },
    StringSet { value: String },
    NumberAdd { delta: f64 },
    NumberSet { value: f64 },
    BooleanSet { value: bool },
    DateSet { value: DateTime<Utc> },
}

impl Mutation {
    /// Build the operation for `element` against the current `model`
    pub(crate) fn to_operation(&self, element: &str, model: &Model) -> Result<DiscreteOperation> {
        let current = model
            .get(element)
            .ok_or_else(|| OtError::ElementNotFound(element.to_string()))?;
        let id = element.to_string();

        let op: DiscreteOperation = match (self, current.value) {
            (Mutation::ArrayInsert { index, value }, DataValueKind::Array(_)) => {
                ArrayInsertOperation::new(id, *index, value.clone()).into()
            }
            (Mutation::ArrayRemove { index }, DataValueKind::Array(items)) => {
                let old_value = items.get(*index).cloned();
                ArrayRemoveOperation::new(id, *index, old_value).into()
            }
            (Mutation::ArrayReplace { index, value }, DataValueKind::Array(items)) => {
                let old_value = items.get(*index).cloned();
                ArrayReplaceOperation::new(id, *index, value.clone(), old_value).into()
            }
            (Mutation::ArrayMove { from_index, to_index }, DataValueKind::Array(_)) => {
                ArrayMoveOperation::new(id, *from_index, *to_index).into()
            }
            (Mutation::ArraySet { values }, DataValueKind::Array(items)) => {
                ArraySetOperation::new(id, values.clone(), Some(items)).into()
            }
            (Mutation::ObjectSet { key, value }, DataValueKind::Object(mut fields)) => {
                match fields.remove(key) {
                    Some(old_value) => ObjectSetPropertyOperation::new(
                        id,
                        key.clone(),
                        value.clone(),
                        Some(old_value),
                    )
                    .into(),
                    None => ObjectAddPropertyOperation::new(id, key.clone(), value.clone()).into(),
                }
            }
            (Mutation::ObjectRemove { key }, DataValueKind::Object(mut fields)) => {
                let old_value = fields.remove(key).ok_or_else(|| {
                    OtError::invalid(format!("property '{}' does not exist on {}", key, element))
                })?;
                ObjectRemovePropertyOperation::new(id, key.clone(), Some(old_value)).into()
            }
            (Mutation::ObjectSetAll { values }, DataValueKind::Object(fields)) => {
                ObjectSetOperation::new(id, values.clone(), Some(fields)).into()
            }
            (Mutation::StringInsert { index, value }, DataValueKind::String(_)) => {
                StringInsertOperation::new(id, *index, value.clone()).into()
            }
            (Mutation::StringRemove { index, length }, DataValueKind::String(text)) => {
                let len = text.chars().count();
                if index.checked_add(*length).map_or(true, |end| end > len) {
                    return Err(OtError::invalid(format!(
                        "string remove of {} chars at {} out of range for length {}",
                        length, index, len
                    )));
                }
                let removed: String = text.chars().skip(*index).take(*length).collect();
                StringRemoveOperation::new(id, *index, removed).into()
            }
            (Mutation::StringSet { value }, DataValueKind::String(text)) => {
                StringSetOperation::new(id, value.clone(), Some(text)).into()
            }
            (Mutation::NumberAdd { delta }, DataValueKind::Number(_)) => {
                NumberDeltaOperation::new(id, *delta).into()
            }
            (Mutation::NumberSet { value }, DataValueKind::Number(old)) => {
                NumberSetOperation::new(id, *value, Some(old)).into()
            }
            (Mutation::BooleanSet { value }, DataValueKind::Boolean(old)) => {
                BooleanSetOperation::new(id, *value, Some(old)).into()
            }
            (Mutation::DateSet { value }, DataValueKind::Date(old)) => {
                DateSetOperation::new(id, *value, Some(old)).into()
            }
            (mutation, actual) => {
                return Err(OtError::invalid(format!(
                    "{} can not be applied to {} element {}",
                    mutation.name(),
                    actual.value_type(),
                    element
                )));
            }
        };

        Ok(op)
    }

    fn name(&self) -> &'static str {
        match self {
            Mutation::ArrayInsert { .. } => "array insert",
            Mutation::ArrayRemove { .. } => "array remove",
            Mutation::ArrayReplace { .. } => "array replace",
            Mutation::ArrayMove { .. } => "array move",
            Mutation::ArraySet { .. } => "array set",
            Mutation::ObjectSet { .. } => "object set",
            Mutation::ObjectRemove { .. } => "object remove",
            Mutation::ObjectSetAll { .. } => "object set all",
            Mutation::StringInsert { .. } => "string insert",
            Mutation::StringRemove { .. } => "string remove",
            Mutation::StringSet { .. } => "string set",
            Mutation::NumberAdd { .. } => "number add",
            Mutation::NumberSet { .. } => "number set",
            Mutation::BooleanSet { .. } => "boolean set",
            Mutation::DateSet { .. } => "date set",
        }
    }
}
