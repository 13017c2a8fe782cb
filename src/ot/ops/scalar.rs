//! Number, boolean and date operations

use crate::ElementId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Adds `delta` to a number; concurrent deltas always commute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberDeltaOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub delta: f64,
}

impl NumberDeltaOperation {
    pub fn new(id: impl Into<ElementId>, delta: f64) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            delta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberSetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<f64>,
}

impl NumberSetOperation {
    pub fn new(id: impl Into<ElementId>, value: f64, old_value: Option<f64>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            value,
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<f64>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanSetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<bool>,
}

impl BooleanSetOperation {
    pub fn new(id: impl Into<ElementId>, value: bool, old_value: Option<bool>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            value,
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<bool>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub value: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<DateTime<Utc>>,
}

impl DateSetOperation {
    pub fn new(
        id: impl Into<ElementId>,
        value: DateTime<Utc>,
        old_value: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            value,
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<DateTime<Utc>>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

super::discrete_operation_common!(
    NumberDeltaOperation,
    NumberSetOperation,
    BooleanSetOperation,
    DateSetOperation,
);
