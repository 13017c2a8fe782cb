//! Array operations
//!
//! Array indices address elements. Inserts place the new element before the
//! element currently at `index` (or at the end when `index == len`). A move
//! removes the element at `from_index` and reinserts it so that it ends up at
//! `to_index`.

use crate::model::DataValue;
use crate::ElementId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayInsertOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub index: usize,
    pub value: DataValue,
}

impl ArrayInsertOperation {
    pub fn new(id: impl Into<ElementId>, index: usize, value: DataValue) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            index,
            value,
        }
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRemoveOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<DataValue>,
}

impl ArrayRemoveOperation {
    pub fn new(id: impl Into<ElementId>, index: usize, old_value: Option<DataValue>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            index,
            old_value,
        }
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
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
pub struct ArrayReplaceOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub index: usize,
    pub value: DataValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<DataValue>,
}

impl ArrayReplaceOperation {
    pub fn new(
        id: impl Into<ElementId>,
        index: usize,
        value: DataValue,
        old_value: Option<DataValue>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            index,
            value,
            old_value,
        }
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    pub fn with_old_value(&self, old_value: Option<DataValue>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

/// Direction an array move travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMoveOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub from_index: usize,
    pub to_index: usize,
}

impl ArrayMoveOperation {
    pub fn new(id: impl Into<ElementId>, from_index: usize, to_index: usize) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            from_index,
            to_index,
        }
    }

    pub fn with_from_index(&self, from_index: usize) -> Self {
        Self {
            from_index,
            ..self.clone()
        }
    }

    pub fn with_to_index(&self, to_index: usize) -> Self {
        Self {
            to_index,
            ..self.clone()
        }
    }

    pub fn with_indices(&self, from_index: usize, to_index: usize) -> Self {
        Self {
            from_index,
            to_index,
            ..self.clone()
        }
    }

    pub fn direction(&self) -> MoveDirection {
        use std::cmp::Ordering;
        match self.from_index.cmp(&self.to_index) {
            Ordering::Less => MoveDirection::Forward,
            Ordering::Greater => MoveDirection::Backward,
            Ordering::Equal => MoveDirection::Identity,
        }
    }

    /// Closed span `[min, max]` of positions the move shifts
    pub fn span(&self) -> (usize, usize) {
        (
            self.from_index.min(self.to_index),
            self.from_index.max(self.to_index),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub values: Vec<DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_values: Option<Vec<DataValue>>,
}

impl ArraySetOperation {
    pub fn new(
        id: impl Into<ElementId>,
        values: Vec<DataValue>,
        old_values: Option<Vec<DataValue>>,
    ) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            values,
            old_values,
        }
    }

    pub fn with_old_values(&self, old_values: Option<Vec<DataValue>>) -> Self {
        Self {
            old_values,
            ..self.clone()
        }
    }
}

super::discrete_operation_common!(
    ArrayInsertOperation,
    ArrayRemoveOperation,
    ArrayReplaceOperation,
    ArrayMoveOperation,
    ArraySetOperation,
);
