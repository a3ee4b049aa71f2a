//! Sync infrastructure errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the replica infrastructure
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    /// The apply-queue driver task is gone; the handle is unusable
    #[error("Replica driver for '{collection}' has shut down")]
    DriverGone { collection: String },

    /// A snapshot could not be serialized for fingerprinting or decoded
    /// into its domain shape
    #[error("Snapshot codec error: {0}")]
    Codec(String),
}
