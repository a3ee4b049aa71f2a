//! Document store adapters
//!
//! `MemoryStore` implements the [`DocumentStore`] contract against process
//! memory, with an offline toggle for exercising the cache error policy. It
//! stands in for the remote HTTP store in tests and demos; the real adapter
//! only differs in transport.
//!
//! `Collection<T>` binds a collection name to a domain type, converting the
//! store's JSON documents at the cache boundary so the reconciliation engine
//! never branches on record shape.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::handle::CollectionSource;
use core_kernel::{DocumentStore, DomainPort, PortError, StoreQuery};

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the store becoming unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seeds a collection with serialized records
    pub async fn seed<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<(), PortError> {
        let mut documents = Vec::with_capacity(records.len());
        for record in records {
            documents.push(to_document(record)?);
        }
        self.collections
            .write()
            .await
            .insert(collection.to_string(), documents);
        Ok(())
    }

    fn check_online(&self) -> Result<(), PortError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::connection("store unreachable"));
        }
        Ok(())
    }
}

impl DomainPort for MemoryStore {}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, PortError> {
        self.check_online()?;
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, collection: &str, mut record: Value) -> Result<Value, PortError> {
        self.check_online()?;
        let object = record
            .as_object_mut()
            .ok_or_else(|| PortError::validation("record must be a JSON object"))?;
        // The server assigns ids to records that arrive without one.
        if !object.contains_key("id") {
            object.insert("id".to_string(), Value::String(Uuid::now_v7().to_string()));
        }
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<Value, PortError> {
        self.check_online()?;
        let patch_object = patch
            .as_object()
            .ok_or_else(|| PortError::validation("patch must be a JSON object"))?;

        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| PortError::not_found(collection, id))?;
        let record = records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| PortError::not_found(collection, id))?;

        let object = record
            .as_object_mut()
            .ok_or_else(|| PortError::internal("stored record is not an object"))?;
        for (key, value) in patch_object {
            object.insert(key.clone(), value.clone());
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), PortError> {
        self.check_online()?;
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| PortError::not_found(collection, id))?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Err(PortError::not_found(collection, id));
        }
        Ok(())
    }

    async fn search(&self, collection: &str, query: &StoreQuery) -> Result<Vec<Value>, PortError> {
        self.check_online()?;
        let needle = query.contains.to_lowercase();
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        r.get(&query.field)
                            .and_then(Value::as_str)
                            .is_some_and(|s| s.to_lowercase().contains(&needle))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// A collection name bound to its domain type
///
/// Normalizes every record to the one canonical shape at the cache boundary;
/// a record that fails to decode is a `Transformation` error, not a silent
/// skip.
pub struct Collection<T> {
    name: String,
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Collection<T> {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            store,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: DeserializeOwned> Collection<T> {
    /// Fetches and decodes the full collection
    pub async fn fetch_all(&self) -> Result<Vec<T>, PortError> {
        let documents = self.store.get_all(&self.name).await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| {
                    PortError::transformation(format!("collection '{}': {e}", self.name))
                })
            })
            .collect()
    }
}

#[async_trait]
impl<T> CollectionSource<T> for Collection<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, PortError> {
        self.fetch_all().await
    }
}

/// Serializes a domain record into its document form
pub(crate) fn to_document<T: Serialize>(record: &T) -> Result<Value, PortError> {
    serde_json::to_value(record).map_err(|e| PortError::transformation(e.to_string()))
}

/// Extracts the id of a stored document
pub(crate) fn record_id(record: &Value) -> Option<Uuid> {
    record
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}
