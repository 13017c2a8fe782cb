//! Model references: transient pointers shared between sessions
//!
//! A reference marks something in the document without being part of it: a
//! caret (Index), a selection (Range), a highlighted property (Property) or a
//! set of selected elements (Element). References are owned by one session,
//! attached to one source (an element, or the whole model when the source is
//! `None`) and keyed by `(session_id, key)` within their [`ReferenceManager`].
//!
//! Values are empty until first set. Disposal is terminal: a disposed
//! reference rejects every further change.

mod manager;

pub use manager::ReferenceManager;

use crate::error::{OtError, Result};
use crate::util::IndexRange;
use crate::{ElementId, SessionId};
use serde::{Deserialize, Serialize};

/// Kind of value a reference holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Index,
    Range,
    Property,
    Element,
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Values of a reference, tagged with the reference type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ReferenceValues {
    Index(Vec<usize>),
    Range(Vec<IndexRange>),
    Property(Vec<String>),
    Element(Vec<ElementId>),
}

impl ReferenceValues {
    pub fn empty(reference_type: ReferenceType) -> Self {
        match reference_type {
            ReferenceType::Index => ReferenceValues::Index(Vec::new()),
            ReferenceType::Range => ReferenceValues::Range(Vec::new()),
            ReferenceType::Property => ReferenceValues::Property(Vec::new()),
            ReferenceType::Element => ReferenceValues::Element(Vec::new()),
        }
    }

    pub fn reference_type(&self) -> ReferenceType {
        match self {
            ReferenceValues::Index(_) => ReferenceType::Index,
            ReferenceValues::Range(_) => ReferenceType::Range,
            ReferenceValues::Property(_) => ReferenceType::Property,
            ReferenceValues::Element(_) => ReferenceType::Element,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceValues::Index(v) => v.len(),
            ReferenceValues::Range(v) => v.len(),
            ReferenceValues::Property(v) => v.len(),
            ReferenceValues::Element(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single reference with values of type `V`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReference<V> {
    key: String,
    source: Option<ElementId>,
    session_id: SessionId,
    local: bool,
    values: Vec<V>,
    disposed: bool,
}

impl<V: Clone> ModelReference<V> {
    pub fn new(
        key: impl Into<String>,
        source: Option<ElementId>,
        session_id: impl Into<SessionId>,
        local: bool,
    ) -> Self {
        Self {
            key: key.into(),
            source,
            session_id: session_id.into(),
            local,
            values: Vec::new(),
            disposed: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Element the reference is attached to, `None` for the model itself
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// First value, for references that only ever hold one
    pub fn value(&self) -> Option<&V> {
        self.values.first()
    }

    pub fn is_set(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            Err(OtError::ReferenceDisposed {
                key: self.key.clone(),
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn set(&mut self, values: Vec<V>) -> Result<()> {
        self.ensure_live()?;
        self.values = values;
        Ok(())
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.values.clear();
        Ok(())
    }

    /// Returns false when the reference was already disposed
    pub(crate) fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.values.clear();
        true
    }
}

/// A reference of any type, as stored by the [`ReferenceManager`]
#[derive(Debug, Clone, PartialEq)]
pub enum AnyReference {
    Index(ModelReference<usize>),
    Range(ModelReference<IndexRange>),
    Property(ModelReference<String>),
    Element(ModelReference<ElementId>),
}

macro_rules! each_reference {
    ($value:expr, $r:ident => $body:expr) => {
        match $value {
            AnyReference::Index($r) => $body,
            AnyReference::Range($r) => $body,
            AnyReference::Property($r) => $body,
            AnyReference::Element($r) => $body,
        }
    };
}

impl AnyReference {
    pub fn new(
        reference_type: ReferenceType,
        key: impl Into<String>,
        source: Option<ElementId>,
        session_id: impl Into<SessionId>,
        local: bool,
    ) -> Self {
        match reference_type {
            ReferenceType::Index => {
                AnyReference::Index(ModelReference::new(key, source, session_id, local))
            }
            ReferenceType::Range => {
                AnyReference::Range(ModelReference::new(key, source, session_id, local))
            }
            ReferenceType::Property => {
                AnyReference::Property(ModelReference::new(key, source, session_id, local))
            }
            ReferenceType::Element => {
                AnyReference::Element(ModelReference::new(key, source, session_id, local))
            }
        }
    }

    pub fn reference_type(&self) -> ReferenceType {
        match self {
            AnyReference::Index(_) => ReferenceType::Index,
            AnyReference::Range(_) => ReferenceType::Range,
            AnyReference::Property(_) => ReferenceType::Property,
            AnyReference::Element(_) => ReferenceType::Element,
        }
    }

    pub fn key(&self) -> &str {
        each_reference!(self, r => r.key())
    }

    pub fn source(&self) -> Option<&str> {
        each_reference!(self, r => r.source())
    }

    pub fn session_id(&self) -> &str {
        each_reference!(self, r => r.session_id())
    }

    pub fn is_local(&self) -> bool {
        each_reference!(self, r => r.is_local())
    }

    pub fn is_set(&self) -> bool {
        each_reference!(self, r => r.is_set())
    }

    pub fn is_disposed(&self) -> bool {
        each_reference!(self, r => r.is_disposed())
    }

    /// Snapshot of the current values
    pub fn values(&self) -> ReferenceValues {
        match self {
            AnyReference::Index(r) => ReferenceValues::Index(r.values().to_vec()),
            AnyReference::Range(r) => ReferenceValues::Range(r.values().to_vec()),
            AnyReference::Property(r) => ReferenceValues::Property(r.values().to_vec()),
            AnyReference::Element(r) => ReferenceValues::Element(r.values().to_vec()),
        }
    }

    pub fn as_index(&self) -> Option<&ModelReference<usize>> {
        match self {
            AnyReference::Index(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&ModelReference<IndexRange>> {
        match self {
            AnyReference::Range(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&ModelReference<String>> {
        match self {
            AnyReference::Property(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ModelReference<ElementId>> {
        match self {
            AnyReference::Element(r) => Some(r),
            _ => None,
        }
    }

    /// Replace the values; their type must match the reference type
    pub(crate) fn set(&mut self, values: ReferenceValues) -> Result<()> {
        match (self, values) {
            (AnyReference::Index(r), ReferenceValues::Index(v)) => r.set(v),
            (AnyReference::Range(r), ReferenceValues::Range(v)) => r.set(v),
            (AnyReference::Property(r), ReferenceValues::Property(v)) => r.set(v),
            (AnyReference::Element(r), ReferenceValues::Element(v)) => r.set(v),
            (r, _) => Err(OtError::ReferenceTypeMismatch {
                session_id: r.session_id().to_string(),
                key: r.key().to_string(),
            }),
        }
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        each_reference!(self, r => r.clear())
    }

    pub(crate) fn dispose(&mut self) -> bool {
        each_reference!(self, r => r.dispose())
    }
}

/// Change to a reference, reported alongside model changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReferenceEvent {
    Set {
        source: Option<ElementId>,
        session_id: SessionId,
        key: String,
        local: bool,
        values: ReferenceValues,
    },
    Cleared {
        source: Option<ElementId>,
        session_id: SessionId,
        key: String,
        local: bool,
    },
    Disposed {
        source: Option<ElementId>,
        session_id: SessionId,
        key: String,
        local: bool,
    },
}

impl ReferenceEvent {
    pub(crate) fn set(reference: &AnyReference) -> Self {
        ReferenceEvent::Set {
            source: reference.source().map(str::to_string),
            session_id: reference.session_id().to_string(),
            key: reference.key().to_string(),
            local: reference.is_local(),
            values: reference.values(),
        }
    }

    pub(crate) fn cleared(reference: &AnyReference) -> Self {
        ReferenceEvent::Cleared {
            source: reference.source().map(str::to_string),
            session_id: reference.session_id().to_string(),
            key: reference.key().to_string(),
            local: reference.is_local(),
        }
    }

    pub(crate) fn disposed(reference: &AnyReference) -> Self {
        ReferenceEvent::Disposed {
            source: reference.source().map(str::to_string),
            session_id: reference.session_id().to_string(),
            key: reference.key().to_string(),
            local: reference.is_local(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ReferenceEvent::Set { key, .. }
            | ReferenceEvent::Cleared { key, .. }
            | ReferenceEvent::Disposed { key, .. } => key,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            ReferenceEvent::Set { session_id, .. }
            | ReferenceEvent::Cleared { session_id, .. }
            | ReferenceEvent::Disposed { session_id, .. } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_empty_until_set() {
        let mut reference = AnyReference::new(ReferenceType::Index, "caret", None, "s1", true);
        assert!(!reference.is_set());
        assert_eq!(reference.values(), ReferenceValues::Index(vec![]));

        reference.set(ReferenceValues::Index(vec![4])).unwrap();
        assert!(reference.is_set());
        assert_eq!(reference.as_index().and_then(|r| r.value()), Some(&4));
    }

    #[test]
    fn test_type_mismatch() {
        let mut reference = AnyReference::new(ReferenceType::Range, "sel", None, "s1", true);
        let err = reference
            .set(ReferenceValues::Property(vec!["title".to_string()]))
            .unwrap_err();
        assert_eq!(
            err,
            OtError::ReferenceTypeMismatch {
                session_id: "s1".to_string(),
                key: "sel".to_string()
            }
        );
    }

    #[test]
    fn test_disposal_is_terminal() {
        let mut reference = AnyReference::new(ReferenceType::Index, "caret", None, "s1", true);
        reference.set(ReferenceValues::Index(vec![1])).unwrap();

        assert!(reference.dispose());
        assert!(!reference.dispose());
        assert!(reference.is_disposed());
        assert!(reference.set(ReferenceValues::Index(vec![2])).is_err());
        assert!(reference.clear().is_err());
    }

    #[test]
    fn test_values_serde_shape() {
        let values = ReferenceValues::Range(vec![IndexRange::new(1, 3)]);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json["type"], "range");
        assert_eq!(json["values"][0]["start"], 1);
    }
}
