//! Single-writer apply queue
//!
//! One tokio task owns the [`ReplicaCache`] for a collection; pulls, push
//! snapshots, refetches, and poll ticks all arrive as commands on one mpsc
//! channel and are applied strictly in arrival order. Serializing applies is
//! what keeps an older network response from overwriting a newer state: a
//! late response is compared against the snapshot held at apply time and
//! loses the dedup race.
//!
//! Readers never touch the queue. The driver publishes each accepted
//! snapshot through a watch channel of `Arc<Vec<T>>`.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::replica::ReplicaCache;
use core_kernel::PortError;

/// Where a collection's snapshots are fetched from
#[async_trait]
pub trait CollectionSource<T>: Send + Sync + 'static {
    /// Fetches the full collection from the server of record
    async fn fetch(&self) -> Result<Vec<T>, PortError>;
}

enum Command<T> {
    Pull(oneshot::Sender<Result<bool, SyncError>>),
    Refetch(oneshot::Sender<Result<bool, SyncError>>),
    Push(Vec<T>, oneshot::Sender<Result<bool, SyncError>>),
}

/// Cheap cloneable handle to one collection's apply queue
pub struct ReplicaHandle<T> {
    collection: String,
    tx: mpsc::Sender<Command<T>>,
    items_rx: watch::Receiver<Arc<Vec<T>>>,
}

impl<T> Clone for ReplicaHandle<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            tx: self.tx.clone(),
            items_rx: self.items_rx.clone(),
        }
    }
}

impl<T> ReplicaHandle<T> {
    /// The current snapshot, whatever was last applied
    pub fn items(&self) -> Arc<Vec<T>> {
        self.items_rx.borrow().clone()
    }

    /// A receiver that observes every accepted snapshot replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.items_rx.clone()
    }

    /// Enqueues a pull and waits for it to be applied
    ///
    /// Returns true when the fetched snapshot replaced the held one. A
    /// failed pull before the first successful load leaves the cache empty;
    /// afterwards the previous snapshot is retained.
    pub async fn pull(&self) -> Result<bool, SyncError> {
        self.send(Command::Pull).await
    }

    /// Enqueues a pull that never takes the empty-on-first-load path
    ///
    /// Used after local mutations to reconcile optimistic local state with
    /// the authoritative server state. No merge happens: the post-mutation
    /// view is whatever this returns or the next push delivers.
    pub async fn refetch(&self) -> Result<bool, SyncError> {
        self.send(Command::Refetch).await
    }

    /// Applies a push-channel snapshot through the same queue
    pub async fn apply_push(&self, items: Vec<T>) -> Result<bool, SyncError> {
        self.send(|ack| Command::Push(items, ack)).await
    }

    async fn send<F>(&self, make: F) -> Result<bool, SyncError>
    where
        F: FnOnce(oneshot::Sender<Result<bool, SyncError>>) -> Command<T>,
    {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(make(ack_tx))
            .await
            .map_err(|_| self.driver_gone())?;
        ack_rx.await.map_err(|_| self.driver_gone())?
    }

    fn driver_gone(&self) -> SyncError {
        SyncError::DriverGone {
            collection: self.collection.clone(),
        }
    }
}

/// Owns a [`ReplicaCache`] and applies commands one at a time
pub struct ReplicaDriver<T, S> {
    collection: String,
    cache: ReplicaCache<T>,
    source: S,
    poll_interval: Option<Duration>,
    queue_capacity: usize,
}

impl<T, S> ReplicaDriver<T, S>
where
    T: Clone + Serialize + Send + Sync + 'static,
    S: CollectionSource<T>,
{
    /// Creates a driver for one collection
    ///
    /// `poll_interval` of `None` disables periodic pulls; commands are then
    /// the only thing that moves the cache.
    pub fn new(collection: impl Into<String>, source: S, poll_interval: Option<Duration>) -> Self {
        Self {
            collection: collection.into(),
            cache: ReplicaCache::new(),
            source,
            poll_interval,
            queue_capacity: 64,
        }
    }

    /// Overrides the apply-queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Spawns the consumer task and returns the handle to it
    pub fn spawn(self) -> (ReplicaHandle<T>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let (items_tx, items_rx) = watch::channel(self.cache.items());
        let handle = ReplicaHandle {
            collection: self.collection.clone(),
            tx,
            items_rx,
        };
        let task = tokio::spawn(self.run(rx, items_tx));
        (handle, task)
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Command<T>>,
        items_tx: watch::Sender<Arc<Vec<T>>>,
    ) {
        let mut poll = self.poll_interval.map(tokio::time::interval);
        loop {
            let command = match poll.as_mut() {
                Some(interval) => tokio::select! {
                    cmd = rx.recv() => match cmd {
                        Some(cmd) => Some(cmd),
                        None => break,
                    },
                    _ = interval.tick() => None,
                },
                None => match rx.recv().await {
                    Some(cmd) => Some(cmd),
                    None => break,
                },
            };

            match command {
                Some(Command::Pull(ack)) => {
                    let result = self.pull(false, &items_tx).await;
                    let _ = ack.send(result);
                }
                Some(Command::Refetch(ack)) => {
                    let result = self.pull(true, &items_tx).await;
                    let _ = ack.send(result);
                }
                Some(Command::Push(items, ack)) => {
                    let result = self.cache.apply_snapshot(items);
                    if matches!(result, Ok(true)) {
                        let _ = items_tx.send(self.cache.items());
                    }
                    let _ = ack.send(result);
                }
                // Poll tick: an unacknowledged pull on the same queue.
                None => {
                    let _ = self.pull(false, &items_tx).await;
                }
            }
        }
        debug!(collection = %self.collection, "replica driver stopped");
    }

    async fn pull(
        &mut self,
        is_refetch: bool,
        items_tx: &watch::Sender<Arc<Vec<T>>>,
    ) -> Result<bool, SyncError> {
        let changed = match self.source.fetch().await {
            Ok(items) => self.cache.apply_snapshot(items)?,
            Err(err) => {
                warn!(
                    collection = %self.collection,
                    transient = err.is_transient(),
                    %err,
                    "pull failed, keeping last known good state"
                );
                let changed = if is_refetch {
                    self.cache.mark_refetch_failure()
                } else {
                    self.cache.mark_pull_failure()
                };
                if changed {
                    let _ = items_tx.send(self.cache.items());
                }
                return Err(SyncError::Port(err));
            }
        };
        if changed {
            let _ = items_tx.send(self.cache.items());
        }
        Ok(changed)
    }
}
