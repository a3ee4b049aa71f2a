//! Refund Reconciliation Domain
//!
//! This crate turns a user-edited refund draft into persisted side effects:
//! the refund record, adjustments to heuristically linked loans, and optional
//! stock restoration.
//!
//! # Refund lifecycle
//!
//! ```text
//! SelectingSale -> EditingLines -> DecidingLoans -> DecidingStock -> ReadyToCommit -> Committed
//! ```
//!
//! `DecidingLoans` is skipped when no loan matches the sale, and
//! `DecidingStock` when no line is a full refund.

pub mod error;
pub mod matcher;
pub mod ports;
pub mod reconciler;
pub mod refund;
pub mod sale;
pub mod workflow;

pub use error::RefundError;
pub use matcher::{ContainmentMatcher, LinkedLoan, LoanMatcher};
pub use ports::RefundStore;
pub use reconciler::{
    AppliedAdjustment, CommitReport, LoanAdjustment, LoanAdjustmentResult, RefundDraft,
    RefundReconciler, StockRestoreResult,
};
pub use refund::{classify, RefundClass, RefundLine, RefundTransaction};
pub use sale::{Sale, SaleLine};
pub use workflow::{RefundPhase, RefundWorkflow};
