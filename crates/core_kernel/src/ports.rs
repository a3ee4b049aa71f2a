//! Ports for the remote persistence service
//!
//! The server of record is a remote document store reached over HTTP. This
//! module defines the abstract contract the domains program against, plus the
//! unified error taxonomy every adapter must map into. Adapters live in
//! `infra_sync`; domains never see transport details.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error type for port operations
///
/// All adapter failures are mapped into these variants so that callers can
/// make a uniform transient/permanent distinction. The replica cache relies
/// on `is_transient` to decide whether to keep last-known-good data.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// The remote store is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable { service: String },

    /// A record could not be converted to or from its domain shape
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may
    /// succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// Port traits extend this marker so implementations are thread-safe and
/// usable from async tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// A substring query against one field of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    /// Field name to match against
    pub field: String,
    /// Case-insensitive substring the field must contain
    pub contains: String,
}

impl StoreQuery {
    /// Creates a query matching records whose `field` contains `value`
    pub fn field_contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            contains: value.into(),
        }
    }
}

/// Abstract contract for the remote document store
///
/// Records are JSON documents carrying an `id` field. Writes return the
/// canonical record as persisted by the server, which callers must prefer
/// over their own draft.
#[async_trait]
pub trait DocumentStore: DomainPort {
    /// Fetches the full contents of a collection
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, PortError>;

    /// Creates a record, returning the canonical persisted form
    async fn create(&self, collection: &str, record: Value) -> Result<Value, PortError>;

    /// Applies a partial update to a record by id
    async fn update(&self, collection: &str, id: Uuid, patch: Value) -> Result<Value, PortError>;

    /// Deletes a record by id
    async fn delete(&self, collection: &str, id: Uuid) -> Result<(), PortError>;

    /// Searches a collection with a field-containment query
    async fn search(&self, collection: &str, query: &StoreQuery) -> Result<Vec<Value>, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Sale", "123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Sale"));
        assert!(error.to_string().contains("123"));
    }

    #[test]
    fn test_port_error_transient() {
        let timeout = PortError::Timeout {
            operation: "get_all".to_string(),
            duration_ms: 5000,
        };
        assert!(timeout.is_transient());

        let unavailable = PortError::ServiceUnavailable {
            service: "store".to_string(),
        };
        assert!(unavailable.is_transient());

        let validation = PortError::validation("Missing client name");
        assert!(!validation.is_transient());
    }

    #[test]
    fn test_store_query_builder() {
        let query = StoreQuery::field_contains("client_name", "kab");
        assert_eq!(query.field, "client_name");
        assert_eq!(query.contains, "kab");
    }
}
