//! Error types for transformation, application and synchronization
//!
//! The transformation registry and the range utility never recover from an
//! error themselves: they report the specific condition and the
//! [`LocalSyncController`](crate::sync::LocalSyncController) decides whether
//! to drop the single operation or detach the model.

use crate::{ElementId, SessionId};
use thiserror::Error;

/// Errors raised by the OT core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OtError {
    /// Operation data outside of the structurally possible space
    /// (index past the end, removed text that does not match, wrong element kind)
    #[error("Invalid operation arguments: {reason}")]
    InvalidOperationArguments { reason: String },

    /// The ordering authority produced two operations that cannot be reconciled
    #[error("Illegal operation conflict on element {element}: {reason}")]
    IllegalOperationConflict { element: ElementId, reason: String },

    /// A local mutation was attempted after the model was detached
    #[error("Model is detached, no further local operations are accepted")]
    ModelDetached,

    /// A remote operation or acknowledgment arrived out of version order
    #[error("Version mismatch: expected {expected}, received {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    /// An acknowledgment arrived that does not match the oldest pending operation
    #[error("Unexpected acknowledgment for local operation {seq_no}")]
    UnexpectedAcknowledgement { seq_no: u64 },

    /// The target element is not part of the model
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// A reference with the same key exists but has a different kind
    #[error("Reference '{key}' of session {session_id} already exists with another type")]
    ReferenceTypeMismatch { session_id: SessionId, key: String },

    /// No reference is registered under this key
    #[error("Reference '{key}' of session {session_id} not found")]
    ReferenceNotFound { session_id: SessionId, key: String },

    /// The reference was disposed and can no longer be mutated
    #[error("Reference '{key}' has been disposed")]
    ReferenceDisposed { key: String },
}

impl OtError {
    /// Shorthand for [`OtError::InvalidOperationArguments`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        OtError::InvalidOperationArguments {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`OtError::IllegalOperationConflict`]
    pub fn conflict(element: &str, reason: impl Into<String>) -> Self {
        OtError::IllegalOperationConflict {
            element: element.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error indicates a serialization-authority bug
    pub fn is_conflict(&self) -> bool {
        matches!(self, OtError::IllegalOperationConflict { .. })
    }

    /// Check if this error is about malformed operation data
    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, OtError::InvalidOperationArguments { .. })
    }

    /// Check if the model can not continue after this error
    ///
    /// Conflicts and version gaps mean the local history no longer matches the
    /// server's, everything else only affects the single call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OtError::IllegalOperationConflict { .. } | OtError::VersionMismatch { .. }
        )
    }
}

/// Result type for OT core operations
pub type Result<T> = std::result::Result<T, OtError>;
