//! Refund domain ports
//!
//! The commit sequence talks to the server of record through this trait.
//! `infra_sync` provides the document-store-backed adapter; tests use mocks
//! with injectable per-call failures.

use async_trait::async_trait;

use crate::refund::RefundTransaction;
use core_kernel::{DomainPort, LoanAccountId, PortError, ProductId, ProductLoanId};
use domain_ledger::{LoanAccount, ProductLoan};

/// Persistence operations needed by the refund commit sequence
///
/// Writes are expected to persist the canonical record server-side; callers
/// reconcile their local view via the replica cache afterwards rather than
/// merging optimistically.
#[async_trait]
pub trait RefundStore: DomainPort {
    /// Persists the adjusted state of a loan account
    async fn update_account(&self, account: &LoanAccount) -> Result<(), PortError>;

    /// Removes a loan account and, implicitly, its payment history
    async fn delete_account(&self, id: LoanAccountId) -> Result<(), PortError>;

    /// Persists the adjusted state of a product loan
    async fn update_product_loan(&self, loan: &ProductLoan) -> Result<(), PortError>;

    /// Removes a product loan
    async fn delete_product_loan(&self, id: ProductLoanId) -> Result<(), PortError>;

    /// Persists a committed refund transaction
    async fn create_refund(&self, refund: &RefundTransaction) -> Result<(), PortError>;

    /// Returns `quantity` units of a product to stock
    async fn restore_stock(&self, product_id: ProductId, quantity: u32) -> Result<(), PortError>;
}
