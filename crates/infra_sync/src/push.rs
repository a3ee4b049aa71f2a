//! Push channel plumbing
//!
//! The server pushes `{collection -> full snapshot}` events asynchronously
//! and unordered relative to pulls. `PushRouter` decodes each event and
//! forwards it to the right collection's apply queue, so pushes and pulls
//! contend on the same single writer and cannot tear the cache.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

use crate::error::SyncError;
use crate::handle::ReplicaHandle;

/// One push-channel delivery: a full snapshot of one collection
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub collection: String,
    pub snapshot: Vec<Value>,
}

type RouteFn =
    Box<dyn Fn(Vec<Value>) -> Pin<Box<dyn Future<Output = Result<bool, SyncError>> + Send>> + Send + Sync>;

/// Dispatches push events to registered replica handles
#[derive(Default)]
pub struct PushRouter {
    routes: HashMap<String, RouteFn>,
}

impl PushRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection's replica for push delivery
    pub fn register<T>(&mut self, collection: impl Into<String>, handle: ReplicaHandle<T>)
    where
        T: Clone + DeserializeOwned + Send + Sync + 'static,
    {
        self.routes.insert(
            collection.into(),
            Box::new(move |snapshot| {
                let handle = handle.clone();
                Box::pin(async move {
                    let mut items = Vec::with_capacity(snapshot.len());
                    for document in snapshot {
                        items.push(
                            serde_json::from_value(document)
                                .map_err(|e| SyncError::Codec(e.to_string()))?,
                        );
                    }
                    handle.apply_push(items).await
                })
            }),
        );
    }

    /// Delivers one event to its collection's apply queue
    ///
    /// Returns whether the snapshot replaced the cached one. Events for
    /// unregistered collections are dropped with a warning; the push source
    /// may carry collections this client does not mirror.
    pub async fn dispatch(&self, event: PushEvent) -> Result<bool, SyncError> {
        match self.routes.get(&event.collection) {
            Some(route) => route(event.snapshot).await,
            None => {
                warn!(collection = %event.collection, "push for unmirrored collection dropped");
                Ok(false)
            }
        }
    }
}
