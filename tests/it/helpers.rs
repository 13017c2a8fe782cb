use otsync_core::model::{IdGenerator, Model};
use otsync_core::ot::ops::DiscreteOperation;
use otsync_core::ot::Operation;
use otsync_core::sync::{LocalSyncController, RemoteOperation};
use otsync_core::SyncSettings;
use serde_json::Value;

/// Id of the value under `"v"` in a model built by [`model_with`]
pub const TARGET: &str = "m:2";

/// Model `{"v": value}`; the root is `m:1` and `value` is [`TARGET`]
pub fn model_with(value: Value) -> Model {
    let mut ids = IdGenerator::new("m");
    Model::from_json(&serde_json::json!({ "v": value }), &mut ids).unwrap()
}

pub fn controller_with(value: Value, session_id: &str) -> LocalSyncController {
    LocalSyncController::new(
        model_with(value),
        0,
        SyncSettings::with_session_id(session_id),
    )
}

pub fn remote(version: u64, op: impl Into<DiscreteOperation>) -> RemoteOperation {
    RemoteOperation {
        session_id: "remote".to_string(),
        version,
        operation: Operation::Discrete(op.into()),
    }
}

/// JSON of the value under `"v"`
pub fn target_json(controller: &LocalSyncController) -> Value {
    controller.model().to_json()["v"].clone()
}
