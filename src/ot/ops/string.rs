//! String operations
//!
//! Indices and lengths count `char`s, not bytes.

use crate::ElementId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringInsertOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub index: usize,
    pub value: String,
}

impl StringInsertOperation {
    pub fn new(id: impl Into<ElementId>, index: usize, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            index,
            value: value.into(),
        }
    }

    /// Number of chars inserted
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

/// Removes `old_value` starting at `index`
///
/// The removed text is part of the operation (not just its length) so that
/// overlapping removals can be trimmed to the text that is still present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRemoveOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub index: usize,
    pub old_value: String,
}

impl StringRemoveOperation {
    pub fn new(id: impl Into<ElementId>, index: usize, old_value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            index,
            old_value: old_value.into(),
        }
    }

    /// Number of chars removed
    pub fn len(&self) -> usize {
        self.old_value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.old_value.is_empty()
    }

    /// End of the removed range (exclusive), saturating at `usize::MAX`
    pub fn end(&self) -> usize {
        self.index.saturating_add(self.len())
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    /// Copy with a different removed text; an empty text leaves nothing to do
    pub fn with_old_value(&self, old_value: impl Into<String>) -> Self {
        let old_value = old_value.into();
        Self {
            no_op: self.no_op || old_value.is_empty(),
            old_value,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSetOperation {
    pub id: ElementId,
    #[serde(default)]
    pub no_op: bool,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
}

impl StringSetOperation {
    pub fn new(id: impl Into<ElementId>, value: impl Into<String>, old_value: Option<String>) -> Self {
        Self {
            id: id.into(),
            no_op: false,
            value: value.into(),
            old_value,
        }
    }

    pub fn with_old_value(&self, old_value: Option<String>) -> Self {
        Self {
            old_value,
            ..self.clone()
        }
    }
}

super::discrete_operation_common!(
    StringInsertOperation,
    StringRemoveOperation,
    StringSetOperation,
);
