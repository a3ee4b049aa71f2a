//! Core Kernel - Foundational types for the ledger reconciliation engine
//!
//! This crate provides the building blocks shared by every domain module:
//! - Money with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - The document-store port abstraction and its error taxonomy

pub mod identifiers;
pub mod money;
pub mod ports;

pub use identifiers::{LoanAccountId, ProductId, ProductLoanId, RefundId, SaleId};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DocumentStore, DomainPort, PortError, StoreQuery};
