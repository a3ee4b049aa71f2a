//! Loan Ledger Domain
//!
//! This crate owns the balance invariant for loan accounts and the derived
//! arithmetic for advance-payment product loans.
//!
//! # Balance invariant
//!
//! For every `LoanAccount`, after every mutation:
//!
//! ```text
//! outstanding_balance == principal - sum(payment_history.amount)
//! ```
//!
//! The balance is stored denormalized for O(1) reads, but each mutating
//! operation updates it by exact delta, so the invariant holds by
//! construction. `LoanAccount::verify` recomputes the sum for tests and for
//! periodic reconciliation against the server copy.

pub mod account;
pub mod error;
pub mod product_loan;

pub use account::{LedgerEntry, LoanAccount};
pub use error::LedgerError;
pub use product_loan::{AdvanceReduction, ProductLoan};
