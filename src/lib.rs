//! otsync core - Operational transformation for structured documents
//!
//! This is the conflict resolution core of a real-time collaboration client.
//! It implements:
//! - Discrete and compound edit operations over arrays, objects, strings,
//!   numbers, booleans and dates
//! - Pairwise transformation of concurrent operations
//! - Interval relationships the transformation rules are written in
//! - An optimistic local document that rebases remote operations over
//!   unacknowledged local ones
//! - Shared references (carets, selections) that follow the edits
//!
//! # Examples
//!
//! ```rust
//! use otsync_core::model::{IdGenerator, Model};
//! use otsync_core::ot::ops::StringInsertOperation;
//! use otsync_core::ot::Operation;
//! use otsync_core::sync::{LocalSyncController, Mutation, RemoteOperation};
//! use otsync_core::SyncSettings;
//!
//! let mut ids = IdGenerator::new("c");
//! let model = Model::from_json(&serde_json::json!({"title": "the wizard"}), &mut ids)?;
//! let mut controller = LocalSyncController::new(model, 0, SyncSettings::default());
//!
//! // Applied right away, queued until the server acknowledges it
//! controller.apply(
//!     "c:2",
//!     Mutation::StringInsert { index: 4, value: "grey ".to_string() },
//! )?;
//!
//! // Another session edited the same version concurrently
//! controller.receive_remote(RemoteOperation {
//!     session_id: "other".to_string(),
//!     version: 0,
//!     operation: Operation::Discrete(StringInsertOperation::new("c:2", 10, "!").into()),
//! })?;
//!
//! assert_eq!(controller.model().to_json()["title"], "the grey wizard!");
//! # Ok::<(), otsync_core::OtError>(())
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod ot;
pub mod reference;
pub mod sync;
pub mod util;

// Re-exports for convenience
pub use config::SyncSettings;
pub use error::{OtError, Result};
pub use model::{DataValue, Model, ModelEvent};
pub use sync::{LocalSyncController, Mutation};

/// Element identifier, unique within a model
pub type ElementId = String;

/// Session identifier
pub type SessionId = String;
