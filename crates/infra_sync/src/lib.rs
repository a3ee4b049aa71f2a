//! Replica Infrastructure
//!
//! This crate keeps client-visible mirrors of server-owned collections
//! consistent with the server of record. Scheduled pulls, asynchronous push
//! snapshots and post-mutation refetches all compete for the same cache
//! state, so every one of them funnels through one single-writer apply queue
//! per collection and an out-of-order network response can never
//! clobber a newer state. Last applied wins; nothing is merged client-side.
//!
//! It also provides the document-store adapters the refund commit sequence
//! persists through.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handle;
pub mod push;
pub mod replica;
pub mod store;

pub use adapters::DocumentRefundStore;
pub use config::{CollectionNames, SyncConfig};
pub use error::SyncError;
pub use handle::{CollectionSource, ReplicaDriver, ReplicaHandle};
pub use push::{PushEvent, PushRouter};
pub use replica::ReplicaCache;
pub use store::{Collection, MemoryStore};
