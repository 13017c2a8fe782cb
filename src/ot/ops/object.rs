//! Object operations

use crate::model::DataValue;
use crate::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Adds a property that must not exist yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAddPropertyOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub key: String,
    pub value: DataValue,
}

impl ObjectAddPropertyOperation {
    pub fn new(id: impl Into<ElementId>, key: impl Into<String>, value: DataValue) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            key: key.into(),
            value,
        }
    }
}

/// Replaces the value of an existing property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSetPropertyOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub key: String,
    pub value: DataValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<DataValue>,
}

impl ObjectSetPropertyOperation {
    pub fn new(
        id: impl Into<ElementId>,
        key: impl Into<String>,
        value: DataValue,
        old_value: Option<DataValue>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            key: key.into(),
            value,
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<DataValue>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRemovePropertyOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<DataValue>,
}

impl ObjectRemovePropertyOperation {
    pub fn new(
        id: impl Into<ElementId>,
        key: impl Into<String>,
        old_value: Option<DataValue>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            key: key.into(),
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<DataValue>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

/// Replaces every property of the object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub values: BTreeMap<String, DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_values: Option<BTreeMap<String, DataValue>>,
}

impl ObjectSetOperation {
    pub fn new(
        id: impl Into<ElementId>,
        values: BTreeMap<String, DataValue>,
        old_values: Option<BTreeMap<String, DataValue>>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            values,
            old_values,
        }
    }

    pub fn with_old_values(&self, old_values: Option<BTreeMap<String, DataValue>>) -> Self {
        Self {
            old_values,
            ..self.clone()
        }
    }
}

super::discrete_operation_common!(
    ObjectAddPropertyOperation,
    ObjectSetPropertyOperation,
    ObjectRemovePropertyOperation,
    ObjectSetOperation,
);
