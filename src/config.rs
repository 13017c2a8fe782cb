//! Sync controller settings

use crate::SessionId;
use serde::{Deserialize, Serialize};

/// What to do with a remote operation that does not fit the local model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRemotePolicy {
    /// Skip the operation and keep synchronizing
    #[default]
    Drop,
    /// Stop synchronizing
    Detach,
}

/// Settings for a [`LocalSyncController`](crate::sync::LocalSyncController)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Session owning local operations and references
    #[serde(default = "generate_session_id")]
    pub session_id: SessionId,

    #[serde(default)]
    pub invalid_remote_policy: InvalidRemotePolicy,

    /// Maximum number of unacknowledged local operations (`None` = unbounded)
    #[serde(default)]
    pub max_pending: Option<usize>,

    /// Rebase remote reference values against pending local operations
    #[serde(default = "default_true")]
    pub rebase_remote_references: bool,
}

fn generate_session_id() -> SessionId {
    uuid::Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            session_id: generate_session_id(),
            invalid_remote_policy: InvalidRemotePolicy::default(),
            max_pending: None,
            rebase_remote_references: true,
        }
    }
}

impl SyncSettings {
    pub fn with_session_id(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }
}
