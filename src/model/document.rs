//! Model: the element tree operations are applied to
//!
//! Elements are stored flat, indexed by id, with containers holding the ids
//! of their children. Applying an operation validates it against the current
//! state first and only then mutates, so a rejected operation leaves the
//! model untouched.

use super::value::{DataValue, DataValueKind, IdGenerator, ValueType};
use crate::error::{OtError, Result};
use crate::ot::ops::DiscreteOperation;
use crate::ElementId;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Array(Vec<ElementId>),
    Object(BTreeMap<String, ElementId>),
}

impl Node {
    fn value_type(&self) -> ValueType {
        match self {
            Node::Null => ValueType::Null,
            Node::String(_) => ValueType::String,
            Node::Number(_) => ValueType::Number,
            Node::Boolean(_) => ValueType::Boolean,
            Node::Date(_) => ValueType::Date,
            Node::Array(_) => ValueType::Array,
            Node::Object(_) => ValueType::Object,
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    parent: Option<ElementId>,
    node: Node,
}

/// Outcome of applying one discrete operation
#[derive(Debug, Clone, PartialEq)]
pub struct ElementChange {
    /// The operation as applied, old values filled in from the document
    pub operation: DiscreteOperation,

    /// Elements that left the document, descendants included
    pub detached: Vec<ElementId>,
}

/// In-memory document
#[derive(Debug, Clone)]
pub struct Model {
    root: ElementId,
    elements: HashMap<ElementId, Element>,
}

impl Model {
    /// Create a model from its root value, which must be an object
    pub fn new(root: DataValue) -> Result<Self> {
        if root.value_type() != ValueType::Object {
            return Err(OtError::invalid(format!(
                "the root element must be an object, got {}",
                root.value_type()
            )));
        }

        let mut model = Self {
            root: root.id.clone(),
            elements: HashMap::new(),
        };
        model.check_new_ids([&root], &HashSet::new())?;
        model.attach(&root, None);
        Ok(model)
    }

    pub fn from_json(json: &serde_json::Value, ids: &mut IdGenerator) -> Result<Self> {
        Self::new(DataValue::from_json(json, ids))
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    /// Snapshot of the whole document
    pub fn root(&self) -> DataValue {
        self.get(&self.root)
            .unwrap_or_else(|| DataValue::null(self.root.clone()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.root().to_json()
    }

    /// Snapshot of one element and its descendants
    pub fn get(&self, id: &str) -> Option<DataValue> {
        let element = self.elements.get(id)?;
        let value = match &element.node {
            Node::Null => DataValueKind::Null,
            Node::String(s) => DataValueKind::String(s.clone()),
            Node::Number(n) => DataValueKind::Number(*n),
            Node::Boolean(b) => DataValueKind::Boolean(*b),
            Node::Date(d) => DataValueKind::Date(*d),
            Node::Array(children) => {
                DataValueKind::Array(children.iter().filter_map(|child| self.get(child)).collect())
            }
            Node::Object(fields) => DataValueKind::Object(
                fields
                    .iter()
                    .filter_map(|(key, child)| Some((key.clone(), self.get(child)?)))
                    .collect(),
            ),
        };
        Some(DataValue::new(id, value))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of elements, the root included
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn value_type(&self, id: &str) -> Option<ValueType> {
        self.elements.get(id).map(|element| element.node.value_type())
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.elements.get(id)?.parent.as_deref()
    }

    /// Apply one operation
    ///
    /// Returns `None` for no-ops and for operations on elements that are not
    /// part of the model (they were detached by a concurrent change).
    pub fn apply(&mut self, op: &DiscreteOperation) -> Result<Option<ElementChange>> {
        op.check_bounds()?;
        if op.is_no_op() || !self.contains(op.id()) {
            return Ok(None);
        }

        use DiscreteOperation as D;
        let mut detached = Vec::new();
        let applied: DiscreteOperation = match op {
            D::ArrayInsert(op) => {
                let len = self.array(&op.id)?.len();
                if op.index > len {
                    return Err(out_of_range("array insert", op.index, len));
                }
                self.check_new_ids([&op.value], &HashSet::new())?;
                self.attach(&op.value, Some(op.id.as_str()));
                self.array_mut(&op.id)?.insert(op.index, op.value.id.clone());
                op.clone().into()
            }
            D::ArrayRemove(op) => {
                let child = self.array_child(&op.id, op.index)?;
                let old_value = self.get(&child);
                self.array_mut(&op.id)?.remove(op.index);
                self.detach(&child, &mut detached);
                op.with_old_value(old_value).into()
            }
            D::ArrayReplace(op) => {
                let child = self.array_child(&op.id, op.index)?;
                let released = self.subtree_ids(&child);
                self.check_new_ids([&op.value], &released)?;
                let old_value = self.get(&child);
                self.detach(&child, &mut detached);
                self.attach(&op.value, Some(op.id.as_str()));
                self.array_mut(&op.id)?[op.index] = op.value.id.clone();
                op.with_old_value(old_value).into()
            }
            D::ArrayMove(op) => {
                let len = self.array(&op.id)?.len();
                if op.from_index >= len || op.to_index >= len {
                    return Err(OtError::invalid(format!(
                        "array move {} -> {} out of range for length {}",
                        op.from_index, op.to_index, len
                    )));
                }
                let items = self.array_mut(&op.id)?;
                let item = items.remove(op.from_index);
                items.insert(op.to_index, item);
                op.clone().into()
            }
            D::ArraySet(op) => {
                let children = self.array(&op.id)?.clone();
                let released = self.subtrees_ids(&children);
                self.check_new_ids(&op.values, &released)?;
                let old_values = children.iter().filter_map(|child| self.get(child)).collect();
                for child in &children {
                    self.detach(child, &mut detached);
                }
                for value in &op.values {
                    self.attach(value, Some(op.id.as_str()));
                }
                *self.array_mut(&op.id)? = op.values.iter().map(|v| v.id.clone()).collect();
                op.with_old_values(Some(old_values)).into()
            }
            D::ObjectAddProperty(op) => {
                if self.object(&op.id)?.contains_key(&op.key) {
                    return Err(OtError::invalid(format!(
                        "property '{}' already exists on {}",
                        op.key, op.id
                    )));
                }
                self.check_new_ids([&op.value], &HashSet::new())?;
                self.attach(&op.value, Some(op.id.as_str()));
                self.object_mut(&op.id)?
                    .insert(op.key.clone(), op.value.id.clone());
                op.clone().into()
            }
            D::ObjectSetProperty(op) => {
                let child = self.property(&op.id, &op.key)?;
                let released = self.subtree_ids(&child);
                self.check_new_ids([&op.value], &released)?;
                let old_value = self.get(&child);
                self.detach(&child, &mut detached);
                self.attach(&op.value, Some(op.id.as_str()));
                self.object_mut(&op.id)?
                    .insert(op.key.clone(), op.value.id.clone());
                op.with_old_value(old_value).into()
            }
            D::ObjectRemoveProperty(op) => {
                let child = self.property(&op.id, &op.key)?;
                let old_value = self.get(&child);
                self.object_mut(&op.id)?.remove(&op.key);
                self.detach(&child, &mut detached);
                op.with_old_value(old_value).into()
            }
            D::ObjectSet(op) => {
                let fields = self.object(&op.id)?.clone();
                let children: Vec<ElementId> = fields.values().cloned().collect();
                let released = self.subtrees_ids(&children);
                self.check_new_ids(op.values.values(), &released)?;
                let old_values = fields
                    .iter()
                    .filter_map(|(key, child)| Some((key.clone(), self.get(child)?)))
                    .collect();
                for child in &children {
                    self.detach(child, &mut detached);
                }
                for value in op.values.values() {
                    self.attach(value, Some(op.id.as_str()));
                }
                *self.object_mut(&op.id)? = op
                    .values
                    .iter()
                    .map(|(key, value)| (key.clone(), value.id.clone()))
                    .collect();
                op.with_old_values(Some(old_values)).into()
            }
            D::StringInsert(op) => {
                let text = self.string_mut(&op.id)?;
                let len = text.chars().count();
                if op.index > len {
                    return Err(out_of_range("string insert", op.index, len));
                }
                let offset = byte_offset(text, op.index);
                text.insert_str(offset, &op.value);
                op.clone().into()
            }
            D::StringRemove(op) => {
                let text = self.string_mut(&op.id)?;
                let len = text.chars().count();
                if op.end() > len {
                    return Err(out_of_range("string remove", op.end(), len));
                }
                let start = byte_offset(text, op.index);
                let end = byte_offset(text, op.end());
                if text[start..end] != op.old_value {
                    return Err(OtError::invalid(format!(
                        "removed text {:?} does not match {:?} at {} of {}",
                        op.old_value,
                        &text[start..end],
                        op.index,
                        op.id
                    )));
                }
                text.replace_range(start..end, "");
                op.clone().into()
            }
            D::StringSet(op) => {
                let text = self.string_mut(&op.id)?;
                let old_value = std::mem::replace(text, op.value.clone());
                op.with_old_value(Some(old_value)).into()
            }
            D::NumberDelta(op) => {
                *self.number_mut(&op.id)? += op.delta;
                op.clone().into()
            }
            D::NumberSet(op) => {
                let number = self.number_mut(&op.id)?;
                let old_value = std::mem::replace(number, op.value);
                op.with_old_value(Some(old_value)).into()
            }
            D::BooleanSet(op) => {
                let old_value = match self.node_mut(&op.id)? {
                    Node::Boolean(b) => std::mem::replace(b, op.value),
                    other => return Err(wrong_kind(&op.id, ValueType::Boolean, other)),
                };
                op.with_old_value(Some(old_value)).into()
            }
            D::DateSet(op) => {
                let old_value = match self.node_mut(&op.id)? {
                    Node::Date(d) => std::mem::replace(d, op.value),
                    other => return Err(wrong_kind(&op.id, ValueType::Date, other)),
                };
                op.with_old_value(Some(old_value)).into()
            }
        };

        // Ids reused by the new value are still attached
        detached.retain(|id| !self.elements.contains_key(id));

        Ok(Some(ElementChange {
            operation: applied,
            detached,
        }))
    }

    /// Apply a sequence of operations atomically
    ///
    /// Either every operation is applied or, on the first error, none is.
    pub fn apply_all<'a>(
        &mut self,
        ops: impl IntoIterator<Item = &'a DiscreteOperation>,
    ) -> Result<Vec<ElementChange>> {
        let mut scratch = self.clone();
        let mut changes = Vec::new();
        for op in ops {
            if let Some(change) = scratch.apply(op)? {
                changes.push(change);
            }
        }
        *self = scratch;
        Ok(changes)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    fn node(&self, id: &str) -> Result<&Node> {
        self.elements
            .get(id)
            .map(|element| &element.node)
            .ok_or_else(|| OtError::ElementNotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.elements
            .get_mut(id)
            .map(|element| &mut element.node)
            .ok_or_else(|| OtError::ElementNotFound(id.to_string()))
    }

    fn array(&self, id: &str) -> Result<&Vec<ElementId>> {
        match self.node(id)? {
            Node::Array(items) => Ok(items),
            other => Err(wrong_kind(id, ValueType::Array, other)),
        }
    }

    fn array_mut(&mut self, id: &str) -> Result<&mut Vec<ElementId>> {
        match self.node_mut(id)? {
            Node::Array(items) => Ok(items),
            other => Err(wrong_kind(id, ValueType::Array, other)),
        }
    }

    fn array_child(&self, id: &str, index: usize) -> Result<ElementId> {
        let items = self.array(id)?;
        items
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range("array index", index, items.len()))
    }

    fn object(&self, id: &str) -> Result<&BTreeMap<String, ElementId>> {
        match self.node(id)? {
            Node::Object(fields) => Ok(fields),
            other => Err(wrong_kind(id, ValueType::Object, other)),
        }
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut BTreeMap<String, ElementId>> {
        match self.node_mut(id)? {
            Node::Object(fields) => Ok(fields),
            other => Err(wrong_kind(id, ValueType::Object, other)),
        }
    }

    fn property(&self, id: &str, key: &str) -> Result<ElementId> {
        self.object(id)?
            .get(key)
            .cloned()
            .ok_or_else(|| OtError::invalid(format!("property '{}' does not exist on {}", key, id)))
    }

    fn string_mut(&mut self, id: &str) -> Result<&mut String> {
        match self.node_mut(id)? {
            Node::String(text) => Ok(text),
            other => Err(wrong_kind(id, ValueType::String, other)),
        }
    }

    fn number_mut(&mut self, id: &str) -> Result<&mut f64> {
        match self.node_mut(id)? {
            Node::Number(n) => Ok(n),
            other => Err(wrong_kind(id, ValueType::Number, other)),
        }
    }

    // ── Tree maintenance ──────────────────────────────────────────────────

    /// Reject values whose ids collide with each other or with live elements
    ///
    /// Ids in `released` belong to subtrees the same operation removes.
    fn check_new_ids<'a>(
        &self,
        values: impl IntoIterator<Item = &'a DataValue>,
        released: &HashSet<ElementId>,
    ) -> Result<()> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut duplicate: Option<ElementId> = None;

        for value in values {
            value.visit(&mut |node: &'a DataValue| {
                let in_use = self.elements.contains_key(&node.id) && !released.contains(&node.id);
                if duplicate.is_none() && (!seen.insert(node.id.as_str()) || in_use) {
                    duplicate = Some(node.id.clone());
                }
            });
        }

        match duplicate {
            Some(id) => Err(OtError::invalid(format!("element id {} is already in use", id))),
            None => Ok(()),
        }
    }

    fn attach(&mut self, value: &DataValue, parent: Option<&str>) {
        let node = match &value.value {
            DataValueKind::Null => Node::Null,
            DataValueKind::String(s) => Node::String(s.clone()),
            DataValueKind::Number(n) => Node::Number(*n),
            DataValueKind::Boolean(b) => Node::Boolean(*b),
            DataValueKind::Date(d) => Node::Date(*d),
            DataValueKind::Array(items) => {
                for item in items {
                    self.attach(item, Some(value.id.as_str()));
                }
                Node::Array(items.iter().map(|item| item.id.clone()).collect())
            }
            DataValueKind::Object(fields) => {
                for item in fields.values() {
                    self.attach(item, Some(value.id.as_str()));
                }
                Node::Object(
                    fields
                        .iter()
                        .map(|(key, item)| (key.clone(), item.id.clone()))
                        .collect(),
                )
            }
        };

        self.elements.insert(
            value.id.clone(),
            Element {
                parent: parent.map(str::to_string),
                node,
            },
        );
    }

    /// Drop an element and its descendants, recording their ids parents first
    fn detach(&mut self, id: &str, detached: &mut Vec<ElementId>) {
        let Some(element) = self.elements.remove(id) else {
            return;
        };
        detached.push(id.to_string());
        match element.node {
            Node::Array(children) => {
                for child in children {
                    self.detach(&child, detached);
                }
            }
            Node::Object(fields) => {
                for child in fields.into_values() {
                    self.detach(&child, detached);
                }
            }
            _ => {}
        }
    }

    fn subtree_ids(&self, id: &str) -> HashSet<ElementId> {
        self.subtrees_ids(std::slice::from_ref(&id.to_string()))
    }

    fn subtrees_ids(&self, roots: &[ElementId]) -> HashSet<ElementId> {
        let mut ids = HashSet::new();
        let mut stack: Vec<&str> = roots.iter().map(String::as_str).collect();
        while let Some(id) = stack.pop() {
            let Some(element) = self.elements.get(id) else {
                continue;
            };
            ids.insert(id.to_string());
            match &element.node {
                Node::Array(children) => stack.extend(children.iter().map(String::as_str)),
                Node::Object(fields) => stack.extend(fields.values().map(String::as_str)),
                _ => {}
            }
        }
        ids
    }
}

/// Byte offset of char `index`; `index == char count` maps to the end
fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

fn out_of_range(what: &str, index: usize, len: usize) -> OtError {
    OtError::invalid(format!("{} index {} out of range for length {}", what, index, len))
}

fn wrong_kind(id: &str, expected: ValueType, actual: &Node) -> OtError {
    OtError::invalid(format!(
        "element {} is a {}, expected a {}",
        id,
        actual.value_type(),
        expected
    ))
}
