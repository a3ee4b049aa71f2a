//! Sync configuration

use serde::Deserialize;
use std::time::Duration;

/// Names of the server-side collections the replicas mirror
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNames {
    pub sales: String,
    pub loan_accounts: String,
    pub product_loans: String,
    pub refunds: String,
    pub products: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            sales: "sales".to_string(),
            loan_accounts: "loan_accounts".to_string(),
            product_loans: "product_loans".to_string(),
            refunds: "refunds".to_string(),
            products: "products".to_string(),
        }
    }
}

/// Replica sync configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Seconds between periodic pulls; zero disables polling
    pub poll_interval_secs: u64,
    /// Capacity of each collection's apply queue
    pub apply_queue_capacity: usize,
    /// Collection names
    #[serde(default)]
    pub collections: CollectionNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            apply_queue_capacity: 64,
            collections: CollectionNames::default(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("SYNC"))
            .build()?
            .try_deserialize()
    }

    /// The poll interval, or `None` when polling is disabled
    pub fn poll_interval(&self) -> Option<Duration> {
        if self.poll_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.poll_interval_secs))
        }
    }
}
