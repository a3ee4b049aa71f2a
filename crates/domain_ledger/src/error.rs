//! Ledger domain errors

use core_kernel::{Money, MoneyError};
use thiserror::Error;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The amount violates a ledger bound. `maximum` is the largest amount
    /// the operation would have accepted, so callers can re-prompt with it.
    #[error("Invalid amount {amount}: must be positive and at most {maximum}")]
    InvalidAmount { amount: Money, maximum: Money },

    #[error("No ledger entry at index {index} (history has {len} entries)")]
    EntryNotFound { index: usize, len: usize },

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
