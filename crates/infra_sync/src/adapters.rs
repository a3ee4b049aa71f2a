//! Domain port adapters over the document store
//!
//! `DocumentRefundStore` is the adapter the refund commit sequence persists
//! through, mapping typed domain writes onto the store's JSON collections.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::config::CollectionNames;
use crate::store::{record_id, to_document};
use core_kernel::{
    DocumentStore, DomainPort, LoanAccountId, PortError, ProductId, ProductLoanId,
};
use domain_ledger::{LoanAccount, ProductLoan};
use domain_refund::{RefundStore, RefundTransaction};

/// Persists refund side effects into their document collections
pub struct DocumentRefundStore {
    store: Arc<dyn DocumentStore>,
    collections: CollectionNames,
}

impl DocumentRefundStore {
    pub fn new(store: Arc<dyn DocumentStore>, collections: CollectionNames) -> Self {
        Self { store, collections }
    }
}

impl DomainPort for DocumentRefundStore {}

#[async_trait]
impl RefundStore for DocumentRefundStore {
    async fn update_account(&self, account: &LoanAccount) -> Result<(), PortError> {
        debug!(account_id = %account.id, "updating loan account");
        self.store
            .update(
                &self.collections.loan_accounts,
                *account.id.as_uuid(),
                to_document(account)?,
            )
            .await?;
        Ok(())
    }

    async fn delete_account(&self, id: LoanAccountId) -> Result<(), PortError> {
        debug!(account_id = %id, "deleting loan account");
        self.store
            .delete(&self.collections.loan_accounts, id.into())
            .await
    }

    async fn update_product_loan(&self, loan: &ProductLoan) -> Result<(), PortError> {
        debug!(loan_id = %loan.id, "updating product loan");
        self.store
            .update(
                &self.collections.product_loans,
                *loan.id.as_uuid(),
                to_document(loan)?,
            )
            .await?;
        Ok(())
    }

    async fn delete_product_loan(&self, id: ProductLoanId) -> Result<(), PortError> {
        debug!(loan_id = %id, "deleting product loan");
        self.store
            .delete(&self.collections.product_loans, id.into())
            .await
    }

    async fn create_refund(&self, refund: &RefundTransaction) -> Result<(), PortError> {
        debug!(refund_id = %refund.id, "persisting refund transaction");
        self.store
            .create(&self.collections.refunds, to_document(refund)?)
            .await?;
        Ok(())
    }

    async fn restore_stock(&self, product_id: ProductId, quantity: u32) -> Result<(), PortError> {
        let products = self.store.get_all(&self.collections.products).await?;
        let uuid = *product_id.as_uuid();
        let product = products
            .iter()
            .find(|p| record_id(p) == Some(uuid))
            .ok_or_else(|| PortError::not_found("product", product_id))?;

        let current = product.get("stock").and_then(serde_json::Value::as_u64).unwrap_or(0);
        let restored = current + u64::from(quantity);
        debug!(%product_id, from = current, to = restored, "restoring stock");

        self.store
            .update(
                &self.collections.products,
                uuid,
                json!({ "stock": restored }),
            )
            .await?;
        Ok(())
    }
}
