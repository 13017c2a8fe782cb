//! Reference registry for one source
//!
//! Tracks every session's references on one element (or on the model), keys
//! them by `(session_id, key)` and moves their values along with the
//! operations applied to the source.

use super::{AnyReference, ReferenceEvent, ReferenceType, ReferenceValues};
use crate::error::{OtError, Result};
use crate::ot::ops::DiscreteOperation;
use crate::ot::ReferenceTransformer;
use crate::{ElementId, SessionId};
use std::collections::{BTreeMap, HashSet};

/// References attached to one source
#[derive(Debug, Clone, Default)]
pub struct ReferenceManager {
    source: Option<ElementId>,
    references: BTreeMap<(SessionId, String), AnyReference>,
}

impl ReferenceManager {
    /// Create a manager for `source` (`None` for model level references)
    pub fn new(source: Option<ElementId>) -> Self {
        Self {
            source,
            references: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Register a reference
    ///
    /// Creating a reference that already exists with the same type returns
    /// the existing one; a disposed reference under the same key is replaced.
    pub fn create(
        &mut self,
        session_id: &str,
        key: &str,
        reference_type: ReferenceType,
        local: bool,
    ) -> Result<&AnyReference> {
        let entry_key = (session_id.to_string(), key.to_string());

        let replace = match self.references.get(&entry_key) {
            Some(existing) if existing.is_disposed() => true,
            Some(existing) if existing.reference_type() != reference_type => {
                return Err(OtError::ReferenceTypeMismatch {
                    session_id: session_id.to_string(),
                    key: key.to_string(),
                });
            }
            Some(_) => false,
            None => true,
        };

        if replace {
            let reference =
                AnyReference::new(reference_type, key, self.source.clone(), session_id, local);
            self.references.insert(entry_key.clone(), reference);
        }

        self.references
            .get(&entry_key)
            .ok_or_else(|| not_found(session_id, key))
    }

    /// Look up a reference, disposed ones included
    pub fn get(&self, session_id: &str, key: &str) -> Option<&AnyReference> {
        self.references
            .get(&(session_id.to_string(), key.to_string()))
    }

    /// Live references
    pub fn references(&self) -> impl Iterator<Item = &AnyReference> {
        self.references.values().filter(|r| !r.is_disposed())
    }

    pub fn len(&self) -> usize {
        self.references().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_mut(&mut self, session_id: &str, key: &str) -> Result<&mut AnyReference> {
        self.references
            .get_mut(&(session_id.to_string(), key.to_string()))
            .ok_or_else(|| not_found(session_id, key))
    }

    pub fn set(
        &mut self,
        session_id: &str,
        key: &str,
        values: ReferenceValues,
    ) -> Result<ReferenceEvent> {
        let reference = self.entry_mut(session_id, key)?;
        reference.set(values)?;
        Ok(ReferenceEvent::set(reference))
    }

    pub fn clear(&mut self, session_id: &str, key: &str) -> Result<ReferenceEvent> {
        let reference = self.entry_mut(session_id, key)?;
        reference.clear()?;
        Ok(ReferenceEvent::cleared(reference))
    }

    /// Dispose one reference; `None` if it is unknown or already disposed
    pub fn dispose(&mut self, session_id: &str, key: &str) -> Option<ReferenceEvent> {
        let reference = self.entry_mut(session_id, key).ok()?;
        reference.dispose().then(|| ReferenceEvent::disposed(reference))
    }

    /// Dispose every reference owned by `session_id`
    pub fn dispose_session(&mut self, session_id: &str) -> Vec<ReferenceEvent> {
        self.dispose_where(|reference| reference.session_id() == session_id)
    }

    /// Dispose every reference, used when the source leaves the document
    pub fn dispose_all(&mut self) -> Vec<ReferenceEvent> {
        self.dispose_where(|_| true)
    }

    fn dispose_where(&mut self, mut pred: impl FnMut(&AnyReference) -> bool) -> Vec<ReferenceEvent> {
        self.references
            .values_mut()
            .filter(|reference| pred(reference))
            .filter_map(|reference| {
                reference
                    .dispose()
                    .then(|| ReferenceEvent::disposed(reference))
            })
            .collect()
    }

    /// Move reference values along with an operation applied to the source
    pub fn apply_operation(&mut self, op: &DiscreteOperation) -> Vec<ReferenceEvent> {
        if self.source.as_deref() != Some(op.id()) || op.is_no_op() {
            return Vec::new();
        }

        let mut events = Vec::new();
        for reference in self.references.values_mut() {
            if reference.is_disposed() || !reference.is_set() {
                continue;
            }

            let values = reference.values();
            match ReferenceTransformer::transform(op, &values) {
                Some(updated) if updated == values => {}
                Some(updated) => {
                    let cleared = updated.is_empty();
                    if reference.set(updated).is_ok() {
                        events.push(if cleared {
                            ReferenceEvent::cleared(reference)
                        } else {
                            ReferenceEvent::set(reference)
                        });
                    }
                }
                None => {
                    if reference.dispose() {
                        events.push(ReferenceEvent::disposed(reference));
                    }
                }
            }
        }

        if !events.is_empty() {
            tracing::debug!(
                source = ?self.source,
                operation = %op.operation_type(),
                changed = events.len(),
                "Updated references"
            );
        }
        events
    }

    /// Drop detached elements from Element references
    pub fn remove_elements(&mut self, detached: &HashSet<ElementId>) -> Vec<ReferenceEvent> {
        let mut events = Vec::new();
        for reference in self.references.values_mut() {
            let AnyReference::Element(element_reference) = &mut *reference else {
                continue;
            };
            if element_reference.is_disposed()
                || !element_reference.values().iter().any(|id| detached.contains(id))
            {
                continue;
            }

            let remaining: Vec<ElementId> = element_reference
                .values()
                .iter()
                .filter(|id| !detached.contains(*id))
                .cloned()
                .collect();
            let cleared = remaining.is_empty();
            if element_reference.set(remaining).is_ok() {
                events.push(if cleared {
                    ReferenceEvent::cleared(reference)
                } else {
                    ReferenceEvent::set(reference)
                });
            }
        }
        events
    }
}

fn not_found(session_id: &str, key: &str) -> OtError {
    OtError::ReferenceNotFound {
        session_id: session_id.to_string(),
        key: key.to_string(),
    }
}
