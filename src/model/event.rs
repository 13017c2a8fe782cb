use super::ElementChange;
use crate::error::OtError;
use crate::reference::ReferenceEvent;
use crate::{ElementId, SessionId};

/// Change descriptors produced by the sync controller
///
/// Events are returned to the caller rather than dispatched, so the caller
/// decides when and where to deliver them.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// An element's value changed
    Changed {
        element: ElementId,
        /// True for changes made through this controller
        local: bool,
        session_id: SessionId,
        /// Version the change was made against
        version: u64,
        change: ElementChange,
    },

    /// The model stopped synchronizing
    Detached {
        reason: String,
        /// The failure that forced the detachment; `None` when it was requested
        error: Option<OtError>,
    },

    Reference(ReferenceEvent),
}

impl ModelEvent {
    pub fn is_local(&self) -> bool {
        matches!(self, ModelEvent::Changed { local: true, .. })
    }

    /// Error that detached the model, if this event reports one
    pub fn error(&self) -> Option<&OtError> {
        match self {
            ModelEvent::Detached { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

impl From<ReferenceEvent> for ModelEvent {
    fn from(event: ReferenceEvent) -> Self {
        ModelEvent::Reference(event)
    }
}
