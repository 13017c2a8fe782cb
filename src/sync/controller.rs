//! Optimistic local copy of a server ordered document
//!
//! The server assigns every operation a version. The controller tracks the
//! version its copy is at, the local operations the server has not
//! acknowledged yet, and every reference on the model.
//!
//! A remote operation made against version `v` arrives while local operations
//! are still queued. It is transformed against every queued operation, oldest
//! first: the remote side of each pair moves on to the next queued operation
//! and the local side replaces the queued one. What is left of the remote
//! operation is applied on top of the optimistic state.

use super::Mutation;
use crate::config::{InvalidRemotePolicy, SyncSettings};
use crate::error::{OtError, Result};
use crate::model::{ElementChange, Model, ModelEvent};
use crate::ot::ops::{CompoundOperation, DiscreteOperation, Operation};
use crate::ot::{transform, ReferenceTransformer};
use crate::reference::{
    AnyReference, ReferenceEvent, ReferenceManager, ReferenceType, ReferenceValues,
};
use crate::{ElementId, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No local operation is waiting for acknowledgment
    Synchronized,
    /// At least one local operation is waiting for acknowledgment
    PendingLocal,
    /// Synchronization stopped; the copy is read only
    Detached,
}

/// Local operation to send to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingOperation {
    /// Position in this controller's local history, starting at 0
    pub seq_no: u64,
    /// Version the operation was made against
    pub context_version: u64,
    pub operation: Operation,
}

/// Operation the server ordered for another session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOperation {
    pub session_id: SessionId,
    /// Version the server applied the operation at
    pub version: u64,
    pub operation: Operation,
}

/// Reference activity of another session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RemoteReferenceEvent {
    Published {
        session_id: SessionId,
        source: Option<ElementId>,
        key: String,
        reference_type: ReferenceType,
    },
    Set {
        session_id: SessionId,
        source: Option<ElementId>,
        key: String,
        values: ReferenceValues,
    },
    Cleared {
        session_id: SessionId,
        source: Option<ElementId>,
        key: String,
    },
    Unpublished {
        session_id: SessionId,
        source: Option<ElementId>,
        key: String,
    },
    /// The session closed the model
    SessionLeft { session_id: SessionId },
}

/// Result of a local mutation
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedLocal {
    pub outgoing: OutgoingOperation,
    pub events: Vec<ModelEvent>,
}

/// Result of a remote operation
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRemote {
    /// The remote operation after rebasing over the pending local operations
    pub operation: Operation,
    pub events: Vec<ModelEvent>,
}

/// Client side synchronization state for one model
#[derive(Debug)]
pub struct LocalSyncController {
    settings: SyncSettings,
    model: Model,
    version: u64,
    next_seq_no: u64,
    pending: VecDeque<OutgoingOperation>,
    detached: Option<String>,
    /// Events of a detachment caused by a failed call
    undelivered: Vec<ModelEvent>,
    model_references: ReferenceManager,
    element_references: HashMap<ElementId, ReferenceManager>,
}

impl LocalSyncController {
    /// Start synchronizing `model`, which is at server version `version`
    pub fn new(model: Model, version: u64, settings: SyncSettings) -> Self {
        tracing::debug!(
            session_id = %settings.session_id,
            version,
            elements = model.len(),
            "Opened model"
        );
        Self {
            settings,
            model,
            version,
            next_seq_no: 0,
            pending: VecDeque::new(),
            detached: None,
            undelivered: Vec::new(),
            model_references: ReferenceManager::new(None),
            element_references: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn session_id(&self) -> &str {
        &self.settings.session_id
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Last server version included in the local copy
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> SyncState {
        if self.detached.is_some() {
            SyncState::Detached
        } else if self.pending.is_empty() {
            SyncState::Synchronized
        } else {
            SyncState::PendingLocal
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.is_some()
    }

    pub fn detached_reason(&self) -> Option<&str> {
        self.detached.as_deref()
    }

    /// Local operations waiting for acknowledgment, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &OutgoingOperation> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Events of a detachment that happened inside a call returning an error
    pub fn take_undelivered_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.undelivered)
    }

    // ── Local operations ──────────────────────────────────────────────────

    /// Apply a local mutation to `element` and queue it for the server
    pub fn apply(&mut self, element: &str, mutation: Mutation) -> Result<AppliedLocal> {
        self.check_local()?;

        let op = mutation.to_operation(element, &self.model)?;
        let change = self
            .model
            .apply(&op)?
            .ok_or_else(|| OtError::ElementNotFound(element.to_string()))?;

        let operation = change.operation.clone().into();
        Ok(self.commit_local(operation, vec![change]))
    }

    /// Apply several mutations as one compound operation
    ///
    /// Each mutation sees the state left by the ones before it. If any of them
    /// fails nothing is applied.
    pub fn apply_batch<I>(&mut self, mutations: I) -> Result<AppliedLocal>
    where
        I: IntoIterator<Item = (ElementId, Mutation)>,
    {
        self.check_local()?;

        let mut scratch = self.model.clone();
        let mut changes = Vec::new();
        for (element, mutation) in mutations {
            let op = mutation.to_operation(&element, &scratch)?;
            let change = scratch
                .apply(&op)?
                .ok_or(OtError::ElementNotFound(element))?;
            changes.push(change);
        }
        if changes.is_empty() {
            return Err(OtError::invalid("a batch needs at least one mutation"));
        }

        self.model = scratch;
        let operation =
            CompoundOperation::new(changes.iter().map(|c| c.operation.clone()).collect()).into();
        Ok(self.commit_local(operation, changes))
    }

    fn check_local(&self) -> Result<()> {
        if self.detached.is_some() {
            return Err(OtError::ModelDetached);
        }
        if let Some(max) = self.settings.max_pending {
            if self.pending.len() >= max {
                return Err(OtError::invalid(format!(
                    "{} local operations are already waiting for acknowledgment",
                    self.pending.len()
                )));
            }
        }
        Ok(())
    }

    fn commit_local(&mut self, operation: Operation, changes: Vec<ElementChange>) -> AppliedLocal {
        let outgoing = OutgoingOperation {
            seq_no: self.next_seq_no,
            context_version: self.version,
            operation,
        };
        self.next_seq_no += 1;
        self.pending.push_back(outgoing.clone());

        tracing::debug!(
            seq_no = outgoing.seq_no,
            context_version = outgoing.context_version,
            operation = %outgoing.operation.operation_type(),
            pending = self.pending.len(),
            "Applied local operation"
        );

        let session_id = self.settings.session_id.clone();
        let events = self.change_events(changes, true, &session_id, self.version);
        AppliedLocal { outgoing, events }
    }

    /// Handle the server's acknowledgment of the oldest pending operation
    ///
    /// Returns the acknowledged operation, or `None` when the model is
    /// detached.
    pub fn acknowledge(&mut self, seq_no: u64, version: u64) -> Result<Option<OutgoingOperation>> {
        if self.is_detached() {
            tracing::debug!(seq_no, version, "Ignoring acknowledgment on detached model");
            return Ok(None);
        }

        match self.pending.front() {
            Some(front) if front.seq_no == seq_no => {}
            _ => return Err(OtError::UnexpectedAcknowledgement { seq_no }),
        }
        if version != self.version {
            let err = OtError::VersionMismatch {
                expected: self.version,
                actual: version,
            };
            self.fail(&err);
            return Err(err);
        }

        self.version += 1;
        let acknowledged = self.pending.pop_front();
        tracing::debug!(
            seq_no,
            version,
            pending = self.pending.len(),
            "Local operation acknowledged"
        );
        Ok(acknowledged)
    }

    // ── Remote operations ─────────────────────────────────────────────────

    /// Rebase a remote operation over the pending local operations and apply it
    ///
    /// Returns `None` when the operation was ignored: the model is detached,
    /// or the operation was invalid and the policy is to drop it.
    pub fn receive_remote(&mut self, remote: RemoteOperation) -> Result<Option<AppliedRemote>> {
        if self.is_detached() {
            tracing::debug!(
                version = remote.version,
                "Ignoring remote operation on detached model"
            );
            return Ok(None);
        }

        if remote.version != self.version {
            let err = OtError::VersionMismatch {
                expected: self.version,
                actual: remote.version,
            };
            self.fail(&err);
            return Err(err);
        }

        match self.integrate_remote(&remote.operation) {
            Ok((operation, changes)) => {
                tracing::debug!(
                    session_id = %remote.session_id,
                    version = remote.version,
                    operation = %operation.operation_type(),
                    rebased_over = self.pending.len(),
                    "Applied remote operation"
                );
                self.version += 1;
                let events = self.change_events(changes, false, &remote.session_id, remote.version);
                Ok(Some(AppliedRemote { operation, events }))
            }
            Err(err)
                if err.is_invalid_arguments()
                    && self.settings.invalid_remote_policy == InvalidRemotePolicy::Drop =>
            {
                tracing::warn!(
                    session_id = %remote.session_id,
                    version = remote.version,
                    error = %err,
                    "Dropped invalid remote operation"
                );
                self.version += 1;
                Ok(None)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Transform `remote` through the queue and apply it, committing both only
    /// when every step succeeds
    fn integrate_remote(&mut self, remote: &Operation) -> Result<(Operation, Vec<ElementChange>)> {
        let mut incoming = remote.clone();
        let mut rebased = VecDeque::with_capacity(self.pending.len());
        for pending in &self.pending {
            let (s, c) = transform(&incoming, &pending.operation)?.into_tuple();
            tracing::trace!(seq_no = pending.seq_no, "Rebased over pending operation");
            incoming = s;
            rebased.push_back(OutgoingOperation {
                operation: c,
                ..pending.clone()
            });
        }

        let changes = self.model.apply_all(incoming.ops())?;
        self.pending = rebased;
        Ok((incoming, changes))
    }

    // ── Detachment ────────────────────────────────────────────────────────

    /// Stop synchronizing
    ///
    /// Every reference is disposed. Pending operations stay readable through
    /// [`pending`](Self::pending). Detaching twice yields no events.
    pub fn detach(&mut self, reason: impl Into<String>) -> Vec<ModelEvent> {
        self.detach_with(reason.into(), None)
    }

    fn detach_with(&mut self, reason: String, error: Option<OtError>) -> Vec<ModelEvent> {
        if self.is_detached() {
            return Vec::new();
        }

        let mut events: Vec<ModelEvent> = self
            .model_references
            .dispose_all()
            .into_iter()
            .map(ModelEvent::from)
            .collect();
        for manager in self.element_references.values_mut() {
            events.extend(manager.dispose_all().into_iter().map(ModelEvent::from));
        }

        tracing::info!(
            session_id = %self.settings.session_id,
            version = self.version,
            pending = self.pending.len(),
            reason = %reason,
            "Model detached"
        );
        self.detached = Some(reason.clone());
        events.push(ModelEvent::Detached { reason, error });
        events
    }

    fn fail(&mut self, err: &OtError) {
        tracing::error!(
            session_id = %self.settings.session_id,
            version = self.version,
            error = %err,
            "Synchronization failed"
        );
        let events = self.detach_with(err.to_string(), Some(err.clone()));
        self.undelivered.extend(events);
    }

    // ── Events ────────────────────────────────────────────────────────────

    fn change_events(
        &mut self,
        changes: Vec<ElementChange>,
        local: bool,
        session_id: &str,
        version: u64,
    ) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        for change in changes {
            let reference_events = self.update_references(&change);
            events.push(ModelEvent::Changed {
                element: change.operation.id().to_string(),
                local,
                session_id: session_id.to_string(),
                version,
                change,
            });
            events.extend(reference_events.into_iter().map(ModelEvent::from));
        }
        events
    }

    fn update_references(&mut self, change: &ElementChange) -> Vec<ReferenceEvent> {
        let op = &change.operation;
        let mut events = match self.element_references.get_mut(op.id()) {
            Some(manager) => manager.apply_operation(op),
            None => Vec::new(),
        };

        if !change.detached.is_empty() {
            for id in &change.detached {
                if let Some(mut manager) = self.element_references.remove(id) {
                    events.extend(manager.dispose_all());
                }
            }

            let detached: HashSet<ElementId> = change.detached.iter().cloned().collect();
            events.extend(self.model_references.remove_elements(&detached));
            for manager in self.element_references.values_mut() {
                events.extend(manager.remove_elements(&detached));
            }
        }
        events
    }

    // ── Local references ──────────────────────────────────────────────────

    /// Create a local reference on `source` (`None` for the model)
    pub fn create_reference(
        &mut self,
        source: Option<&str>,
        key: &str,
        reference_type: ReferenceType,
    ) -> Result<&AnyReference> {
        if self.is_detached() {
            return Err(OtError::ModelDetached);
        }
        let session_id = self.settings.session_id.clone();
        self.manager_mut(source)
            .ok_or_else(|| missing_source(source))?
            .create(&session_id, key, reference_type, true)
    }

    /// Local reference, disposed ones included
    pub fn reference(&self, source: Option<&str>, key: &str) -> Option<&AnyReference> {
        self.session_reference(&self.settings.session_id, source, key)
    }

    /// Reference of any session, disposed ones included
    pub fn session_reference(
        &self,
        session_id: &str,
        source: Option<&str>,
        key: &str,
    ) -> Option<&AnyReference> {
        self.manager(source)?.get(session_id, key)
    }

    pub fn reference_values(&self, source: Option<&str>, key: &str) -> Option<ReferenceValues> {
        self.reference(source, key).map(AnyReference::values)
    }

    /// Live references of every session on `source`
    pub fn references(&self, source: Option<&str>) -> impl Iterator<Item = &AnyReference> {
        self.manager(source)
            .into_iter()
            .flat_map(ReferenceManager::references)
    }

    pub fn set_reference(
        &mut self,
        source: Option<&str>,
        key: &str,
        values: ReferenceValues,
    ) -> Result<ReferenceEvent> {
        if self.is_detached() {
            return Err(OtError::ModelDetached);
        }
        if let ReferenceValues::Element(ids) = &values {
            if let Some(missing) = ids.iter().find(|id| !self.model.contains(id)) {
                return Err(OtError::ElementNotFound(missing.clone()));
            }
        }
        let session_id = self.settings.session_id.clone();
        self.manager_mut(source)
            .ok_or_else(|| missing_source(source))?
            .set(&session_id, key, values)
    }

    pub fn clear_reference(&mut self, source: Option<&str>, key: &str) -> Result<ReferenceEvent> {
        if self.is_detached() {
            return Err(OtError::ModelDetached);
        }
        let session_id = self.settings.session_id.clone();
        self.manager_mut(source)
            .ok_or_else(|| missing_source(source))?
            .clear(&session_id, key)
    }

    pub fn dispose_reference(&mut self, source: Option<&str>, key: &str) -> Option<ReferenceEvent> {
        let session_id = self.settings.session_id.clone();
        self.manager_mut(source)?.dispose(&session_id, key)
    }

    fn manager(&self, source: Option<&str>) -> Option<&ReferenceManager> {
        match source {
            None => Some(&self.model_references),
            Some(id) => self.element_references.get(id),
        }
    }

    /// Manager for `source`, created on first use; `None` for unknown elements
    fn manager_mut(&mut self, source: Option<&str>) -> Option<&mut ReferenceManager> {
        match source {
            None => Some(&mut self.model_references),
            Some(id) if self.model.contains(id) => Some(
                self.element_references
                    .entry(id.to_string())
                    .or_insert_with(|| ReferenceManager::new(Some(id.to_string()))),
            ),
            Some(_) => None,
        }
    }

    // ── Remote references ─────────────────────────────────────────────────

    /// Track another session's reference activity
    ///
    /// Events on elements this copy does not have are ignored, as is
    /// everything once the model is detached.
    pub fn receive_remote_reference(
        &mut self,
        event: RemoteReferenceEvent,
    ) -> Result<Vec<ModelEvent>> {
        if self.is_detached() {
            return Ok(Vec::new());
        }

        let events = match event {
            RemoteReferenceEvent::Published {
                session_id,
                source,
                key,
                reference_type,
            } => {
                if let Some(manager) = self.manager_mut(source.as_deref()) {
                    manager.create(&session_id, &key, reference_type, false)?;
                }
                Vec::new()
            }
            RemoteReferenceEvent::Set {
                session_id,
                source,
                key,
                values,
            } => {
                let rebased = if self.settings.rebase_remote_references {
                    self.rebase_reference_values(source.as_deref(), values)
                } else {
                    Some(values)
                };
                let Some(manager) = self.manager_mut(source.as_deref()) else {
                    return Ok(Vec::new());
                };
                match rebased {
                    Some(values) => {
                        if !manager.get(&session_id, &key).is_some_and(is_live) {
                            manager.create(&session_id, &key, values.reference_type(), false)?;
                        }
                        vec![manager.set(&session_id, &key, values)?]
                    }
                    // The values point into text a pending local operation removed
                    None => manager.dispose(&session_id, &key).into_iter().collect(),
                }
            }
            RemoteReferenceEvent::Cleared {
                session_id,
                source,
                key,
            } => match self.manager_mut(source.as_deref()) {
                Some(manager) if manager.get(&session_id, &key).is_some_and(is_live) => {
                    vec![manager.clear(&session_id, &key)?]
                }
                _ => Vec::new(),
            },
            RemoteReferenceEvent::Unpublished {
                session_id,
                source,
                key,
            } => self
                .manager_mut(source.as_deref())
                .and_then(|manager| manager.dispose(&session_id, &key))
                .into_iter()
                .collect(),
            RemoteReferenceEvent::SessionLeft { session_id } => {
                let mut events = self.model_references.dispose_session(&session_id);
                for manager in self.element_references.values_mut() {
                    events.extend(manager.dispose_session(&session_id));
                }
                events
            }
        };

        Ok(events.into_iter().map(ModelEvent::from).collect())
    }

    /// Move remote values through the local operations the server has not
    /// seen yet; `None` when one of them invalidates the values
    fn rebase_reference_values(
        &self,
        source: Option<&str>,
        values: ReferenceValues,
    ) -> Option<ReferenceValues> {
        let Some(source) = source else {
            return Some(values);
        };

        let mut values = values;
        let targeting = self
            .pending
            .iter()
            .flat_map(|pending| pending.operation.ops())
            .filter(|op: &&DiscreteOperation| op.id() == source && !op.is_no_op());
        for op in targeting {
            values = ReferenceTransformer::transform(op, &values)?;
        }
        Some(values)
    }
}

fn is_live(reference: &AnyReference) -> bool {
    !reference.is_disposed()
}

fn missing_source(source: Option<&str>) -> OtError {
    OtError::ElementNotFound(source.unwrap_or_default().to_string())
}
