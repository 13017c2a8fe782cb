//! Client side synchronization
//!
//! [`LocalSyncController`] keeps an optimistic copy of the document. Local
//! mutations are applied immediately and queued until the server acknowledges
//! them; remote operations are rebased against the queue before they are
//! applied.

mod controller;
mod mutation;

pub use controller::{
    AppliedLocal, AppliedRemote, LocalSyncController, OutgoingOperation, RemoteOperation,
    RemoteReferenceEvent, SyncState,
};
pub use mutation::Mutation;
