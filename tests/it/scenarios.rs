//! End to end runs of the sync controller

use crate::helpers::{controller_with, remote, target_json, TARGET};
use otsync_core::ot::ops::{
    ArrayMoveOperation, ObjectAddPropertyOperation, StringInsertOperation, StringRemoveOperation,
};
use otsync_core::ot::{transform, Operation};
use otsync_core::reference::{ReferenceEvent, ReferenceType, ReferenceValues};
use otsync_core::sync::{LocalSyncController, OutgoingOperation, SyncState};
use otsync_core::{DataValue, ModelEvent, Mutation, OtError};
use serde_json::json;

#[test]
fn the_grey_wizard() {
    let mut controller = controller_with(json!("the grey wizard"), "local");

    let local = controller
        .apply(
            TARGET,
            Mutation::StringRemove {
                index: 4,
                length: 5,
            },
        )
        .unwrap();
    assert_eq!(
        local.outgoing.operation,
        Operation::Discrete(StringRemoveOperation::new(TARGET, 4, "grey ").into())
    );
    assert_eq!(target_json(&controller), json!("the wizard"));

    let applied = controller
        .receive_remote(remote(0, StringInsertOperation::new(TARGET, 9, "old ")))
        .unwrap()
        .unwrap();
    assert_eq!(
        applied.operation,
        Operation::Discrete(StringInsertOperation::new(TARGET, 4, "old ").into())
    );
    assert_eq!(target_json(&controller), json!("the old wizard"));

    // The pending removal is untouched by an insert after its range
    let pending: Vec<&OutgoingOperation> = controller.pending().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].operation, local.outgoing.operation);

    controller.acknowledge(0, 1).unwrap();
    assert_eq!(controller.state(), SyncState::Synchronized);
    assert_eq!(controller.version(), 2);
}

#[test]
fn pending_queue_is_rebased_in_order() {
    let mut controller = controller_with(json!("abcdef"), "local");
    controller
        .apply(
            TARGET,
            Mutation::StringInsert {
                index: 0,
                value: "12".to_string(),
            },
        )
        .unwrap();
    controller
        .apply(
            TARGET,
            Mutation::StringRemove {
                index: 4,
                length: 2,
            },
        )
        .unwrap();
    assert_eq!(target_json(&controller), json!("12abef"));

    let applied = controller
        .receive_remote(remote(0, StringInsertOperation::new(TARGET, 0, "X")))
        .unwrap()
        .unwrap();
    assert_eq!(
        applied.operation,
        Operation::Discrete(StringInsertOperation::new(TARGET, 0, "X").into())
    );
    assert_eq!(target_json(&controller), json!("X12abef"));

    let pending: Vec<Operation> = controller
        .pending()
        .map(|outgoing| outgoing.operation.clone())
        .collect();
    assert_eq!(
        pending,
        vec![
            Operation::Discrete(StringInsertOperation::new(TARGET, 1, "12").into()),
            Operation::Discrete(StringRemoveOperation::new(TARGET, 5, "cd").into()),
        ]
    );

    controller.acknowledge(0, 1).unwrap();
    controller.acknowledge(1, 2).unwrap();
    assert_eq!(controller.state(), SyncState::Synchronized);
    assert_eq!(controller.version(), 3);
}

/// Caret at 5 in "0123456789", then one remote edit
fn caret_after(op: StringRemoveOrInsert) -> Option<ReferenceValues> {
    let mut controller = controller_with(json!("0123456789"), "local");
    controller
        .create_reference(Some(TARGET), "caret", ReferenceType::Index)
        .unwrap();
    controller
        .set_reference(Some(TARGET), "caret", ReferenceValues::Index(vec![5]))
        .unwrap();

    let applied = match op {
        StringRemoveOrInsert::Insert(op) => controller.receive_remote(remote(0, op)),
        StringRemoveOrInsert::Remove(op) => controller.receive_remote(remote(0, op)),
    };
    applied.unwrap().unwrap();

    let reference = controller.reference(Some(TARGET), "caret")?;
    (!reference.is_disposed()).then(|| reference.values())
}

enum StringRemoveOrInsert {
    Insert(StringInsertOperation),
    Remove(StringRemoveOperation),
}

#[test]
fn references_follow_remote_edits() {
    assert_eq!(
        caret_after(StringRemoveOrInsert::Insert(StringInsertOperation::new(
            TARGET, 2, "abc"
        ))),
        Some(ReferenceValues::Index(vec![8]))
    );
    assert_eq!(
        caret_after(StringRemoveOrInsert::Remove(StringRemoveOperation::new(
            TARGET, 0, "0123"
        ))),
        Some(ReferenceValues::Index(vec![1]))
    );
    assert_eq!(
        caret_after(StringRemoveOrInsert::Remove(StringRemoveOperation::new(
            TARGET, 3, "3456"
        ))),
        None
    );
}

#[test]
fn conflict_detaches_the_model() {
    let mut controller = controller_with(json!({"title": "x"}), "local");
    controller
        .create_reference(Some(TARGET), "focus", ReferenceType::Property)
        .unwrap();
    controller
        .apply(
            TARGET,
            Mutation::ObjectRemove {
                key: "title".to_string(),
            },
        )
        .unwrap();

    let err = controller
        .receive_remote(remote(
            0,
            ObjectAddPropertyOperation::new(TARGET, "title", DataValue::string("r:1", "y")),
        ))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_fatal());
    assert_eq!(controller.state(), SyncState::Detached);

    let events = controller.take_undelivered_events();
    assert!(events.iter().any(|event| matches!(
        event,
        ModelEvent::Reference(ReferenceEvent::Disposed { key, .. }) if key == "focus"
    )));
    assert!(matches!(events.last(), Some(ModelEvent::Detached { .. })));
    assert!(events
        .last()
        .and_then(ModelEvent::error)
        .is_some_and(OtError::is_conflict));
    assert!(controller.detached_reason().is_some());

    // Detached models reject local work and ignore the server
    assert_eq!(
        controller
            .apply(
                TARGET,
                Mutation::ObjectSet {
                    key: "title".to_string(),
                    value: DataValue::string("l:1", "z"),
                },
            )
            .unwrap_err(),
        OtError::ModelDetached
    );
    assert!(controller
        .receive_remote(remote(1, ArrayMoveOperation::new(TARGET, 0, 1)))
        .unwrap()
        .is_none());
    assert!(controller.detach("again").is_empty());
}

#[test]
fn version_gap_detaches() {
    let mut controller = controller_with(json!("text"), "local");
    let err = controller
        .receive_remote(remote(3, StringInsertOperation::new(TARGET, 0, "x")))
        .unwrap_err();
    assert_eq!(
        err,
        OtError::VersionMismatch {
            expected: 0,
            actual: 3
        }
    );
    assert!(controller.is_detached());
    assert_eq!(target_json(&controller), json!("text"));
}

/// Minimal ordering authority: one operation in flight per session
#[derive(Default)]
struct Server {
    history: Vec<(String, Operation)>,
}

impl Server {
    /// Order an operation made against `version`; returns its version
    fn submit(&mut self, session_id: &str, version: u64, operation: &Operation) -> (u64, Operation) {
        let mut operation = operation.clone();
        for (_, applied) in &self.history[version as usize..] {
            operation = transform(applied, &operation).unwrap().c;
        }
        let assigned = self.history.len() as u64;
        self.history.push((session_id.to_string(), operation.clone()));
        (assigned, operation)
    }

    fn send_front(&mut self, client: &LocalSyncController) -> (u64, Operation) {
        let front = client.pending().next().unwrap();
        self.submit(client.session_id(), client.version(), &front.operation)
    }
}

fn deliver(client: &mut LocalSyncController, version: u64, operation: Operation) {
    client
        .receive_remote(otsync_core::sync::RemoteOperation {
            session_id: "other".to_string(),
            version,
            operation,
        })
        .unwrap();
}

#[test]
fn two_sessions_converge() {
    let mut alice = controller_with(json!("hello world"), "alice");
    let mut bob = controller_with(json!("hello world"), "bob");
    let mut server = Server::default();

    alice
        .apply(
            TARGET,
            Mutation::StringInsert {
                index: 0,
                value: "oh, ".to_string(),
            },
        )
        .unwrap();
    alice
        .apply(
            TARGET,
            Mutation::StringRemove {
                index: 10,
                length: 5,
            },
        )
        .unwrap();
    bob.apply(
        TARGET,
        Mutation::StringInsert {
            index: 11,
            value: "!".to_string(),
        },
    )
    .unwrap();

    let (a1_version, a1) = server.send_front(&alice);
    let (b1_version, b1) = server.send_front(&bob);

    alice.acknowledge(0, a1_version).unwrap();
    deliver(&mut alice, b1_version, b1);
    let (a2_version, a2) = server.send_front(&alice);

    deliver(&mut bob, a1_version, a1);
    bob.acknowledge(0, b1_version).unwrap();
    deliver(&mut bob, a2_version, a2);
    alice.acknowledge(1, a2_version).unwrap();

    assert_eq!(target_json(&alice), json!("oh, hello !"));
    assert_eq!(alice.model().to_json(), bob.model().to_json());
    assert_eq!(alice.version(), 3);
    assert_eq!(bob.version(), 3);
    assert_eq!(alice.state(), SyncState::Synchronized);
    assert_eq!(bob.state(), SyncState::Synchronized);
}
