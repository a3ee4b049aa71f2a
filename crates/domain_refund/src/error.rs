//! Refund domain errors

use core_kernel::{MoneyError, PortError};
use domain_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur in the refund domain
#[derive(Debug, Error)]
pub enum RefundError {
    /// Commit was attempted without a sale selected
    #[error("No sale selected")]
    NoSaleSelected,

    /// Commit was attempted with no refund line items
    #[error("Refund has no line items")]
    EmptyLineItems,

    /// A sale line was built with no units sold
    #[error("Sale line '{description}' has zero quantity")]
    ZeroQuantityLine { description: String },

    /// A refund price was supplied for a line the sale does not have
    #[error("Expected {expected} refund prices, got {actual}")]
    LineCountMismatch { expected: usize, actual: usize },

    /// The operation is not valid in the workflow's current phase
    #[error("Cannot {operation} while in phase {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: String,
    },

    /// One or more linked-loan adjustments failed; the refund record itself
    /// was still persisted
    #[error("Failed to update {} linked loan(s): {}", failures.len(), failures.join(", "))]
    LinkedLoanUpdateFailed { failures: Vec<String> },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Store error: {0}")]
    Store(#[from] PortError),
}
