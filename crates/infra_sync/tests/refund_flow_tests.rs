//! End-to-end refund reconciliation tests
//!
//! Drives the full path a refund takes in production: replica caches pulled
//! from the document store, the workflow stepped through its phases, the
//! commit sequence persisted through the document adapters, and the caches
//! refetched to reconcile the local view with the server.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Currency, DocumentStore, Money};
use domain_ledger::{LoanAccount, ProductLoan};
use domain_refund::{LinkedLoan, LoanAdjustment, RefundPhase, RefundWorkflow, Sale};
use infra_sync::{Collection, CollectionNames, DocumentRefundStore, MemoryStore, ReplicaDriver};
use test_utils::{
    assert_balance_invariant, init_test_tracing, LoanAccountBuilder, ProductLoanBuilder,
    SaleBuilder, TemporalFixtures,
};

struct Harness {
    store: Arc<MemoryStore>,
    refund_store: DocumentRefundStore,
    accounts: infra_sync::ReplicaHandle<LoanAccount>,
    product_loans: infra_sync::ReplicaHandle<ProductLoan>,
}

impl Harness {
    async fn seeded(sale: &Sale, account: &LoanAccount, loan: &ProductLoan) -> Self {
        init_test_tracing();
        let store = Arc::new(MemoryStore::new());
        let names = CollectionNames::default();

        store.seed(&names.sales, &[sale.clone()]).await.unwrap();
        store
            .seed(&names.loan_accounts, &[account.clone()])
            .await
            .unwrap();
        store
            .seed(&names.product_loans, &[loan.clone()])
            .await
            .unwrap();
        let product_id = sale.line_items[0].product_id;
        store
            .seed(
                &names.products,
                &[json!({"id": product_id.as_uuid(), "name": "hammer", "stock": 3})],
            )
            .await
            .unwrap();

        let doc_store: Arc<dyn DocumentStore> = Arc::clone(&store) as Arc<dyn DocumentStore>;
        let (accounts, _task) = ReplicaDriver::new(
            names.loan_accounts.clone(),
            Collection::<LoanAccount>::new(names.loan_accounts.clone(), Arc::clone(&doc_store)),
            None,
        )
        .spawn();
        let (product_loans, _task) = ReplicaDriver::new(
            names.product_loans.clone(),
            Collection::<ProductLoan>::new(names.product_loans.clone(), Arc::clone(&doc_store)),
            None,
        )
        .spawn();

        accounts.pull().await.unwrap();
        product_loans.pull().await.unwrap();

        let refund_store = DocumentRefundStore::new(doc_store, names);
        Self {
            store,
            refund_store,
            accounts,
            product_loans,
        }
    }
}

#[tokio::test]
async fn full_refund_reconciles_loans_stock_and_caches() {
    let sale = SaleBuilder::new().build();
    let account = LoanAccountBuilder::new()
        .with_principal(dec!(1000))
        .with_payment(dec!(300), TemporalFixtures::payment_date())
        .build();
    let loan = ProductLoanBuilder::new()
        .with_selling_price(dec!(400))
        .with_advance(dec!(200))
        .build();
    let harness = Harness::seeded(&sale, &account, &loan).await;

    let mut workflow = RefundWorkflow::new();
    workflow.select_sale(sale.clone()).unwrap();

    // Full refund at the original selling price.
    workflow
        .set_refund_prices(
            &[sale.line_items[0].unit_selling_price],
            &harness.accounts.items(),
            &harness.product_loans.items(),
        )
        .unwrap();
    assert_eq!(workflow.phase(), RefundPhase::DecidingLoans);
    assert_eq!(workflow.linked_loans().len(), 2);

    workflow.choose_loan_action(LoanAdjustment::Modify).unwrap();
    assert_eq!(workflow.phase(), RefundPhase::DecidingStock);
    workflow.confirm_stock_restore(true).unwrap();

    let report = workflow.commit(&harness.refund_store).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(workflow.phase(), RefundPhase::Committed);

    // Refund total is 2 x 25 = 50.
    assert_eq!(report.refund.total_refund(), Money::new(dec!(50), Currency::USD));

    // The account had 300 of payments; 50 was unwound from the tail.
    assert!(harness.accounts.refetch().await.unwrap());
    let accounts = harness.accounts.items();
    assert_eq!(accounts.len(), 1);
    assert_eq!(
        accounts[0].outstanding_balance,
        Money::new(dec!(750), Currency::USD)
    );
    assert_balance_invariant(&accounts[0]);

    // The product loan's advance dropped from 200 to 150.
    assert!(harness.product_loans.refetch().await.unwrap());
    let loans = harness.product_loans.items();
    assert_eq!(loans[0].advance_received, Money::new(dec!(150), Currency::USD));

    // Stock went back up by the refunded quantity.
    let products = harness
        .store
        .get_all(&CollectionNames::default().products)
        .await
        .unwrap();
    assert_eq!(
        products[0].get("stock").and_then(serde_json::Value::as_u64),
        Some(5)
    );

    // And the refund record itself was persisted.
    let refunds = harness
        .store
        .get_all(&CollectionNames::default().refunds)
        .await
        .unwrap();
    assert_eq!(refunds.len(), 1);
}

#[tokio::test]
async fn delete_action_removes_both_linked_loans() {
    let sale = SaleBuilder::new().build();
    let account = LoanAccountBuilder::new().build();
    let loan = ProductLoanBuilder::new().build();
    let harness = Harness::seeded(&sale, &account, &loan).await;

    let mut workflow = RefundWorkflow::new();
    workflow.select_sale(sale.clone()).unwrap();
    workflow
        .set_refund_prices(
            &[sale.line_items[0].unit_selling_price],
            &harness.accounts.items(),
            &harness.product_loans.items(),
        )
        .unwrap();
    workflow.choose_loan_action(LoanAdjustment::Delete).unwrap();
    workflow.confirm_stock_restore(false).unwrap();

    let report = workflow.commit(&harness.refund_store).await.unwrap();
    assert!(report.is_clean());

    harness.accounts.refetch().await.unwrap();
    harness.product_loans.refetch().await.unwrap();
    assert!(harness.accounts.items().is_empty());
    assert!(harness.product_loans.items().is_empty());
}

#[tokio::test]
async fn unlinked_sale_skips_the_loan_phase() {
    let sale = SaleBuilder::new()
        .with_client_name(test_utils::StringFixtures::unlinked_client_name())
        .build();
    let account = LoanAccountBuilder::new().build();
    let loan = ProductLoanBuilder::new().build();
    let harness = Harness::seeded(&sale, &account, &loan).await;

    let mut workflow = RefundWorkflow::new();
    workflow.select_sale(sale.clone()).unwrap();
    workflow
        .set_refund_prices(
            &[sale.line_items[0].unit_selling_price],
            &harness.accounts.items(),
            &harness.product_loans.items(),
        )
        .unwrap();

    assert!(workflow.linked_loans().is_empty());
    assert_eq!(workflow.phase(), RefundPhase::DecidingStock);
}

#[tokio::test]
async fn partial_refund_matches_account_but_not_product_loan() {
    let sale = SaleBuilder::new().build();
    let account = LoanAccountBuilder::new().build();
    let loan = ProductLoanBuilder::new()
        .with_description("unrelated drill bits")
        .build();
    let harness = Harness::seeded(&sale, &account, &loan).await;

    let mut workflow = RefundWorkflow::new();
    workflow.select_sale(sale.clone()).unwrap();

    // Below the selling price, so the line classifies as partial.
    workflow
        .set_refund_prices(
            &[Money::new(dec!(10), Currency::USD)],
            &harness.accounts.items(),
            &harness.product_loans.items(),
        )
        .unwrap();

    let loans = workflow.linked_loans();
    assert_eq!(loans.len(), 1);
    assert!(matches!(loans[0], LinkedLoan::Account(_)));
    // Partial lines never offer stock restoration.
    assert!(workflow.restoration_candidates().is_empty());
}

#[tokio::test]
async fn caches_survive_an_outage_after_commit() {
    let sale = SaleBuilder::new().build();
    let account = LoanAccountBuilder::new().build();
    let loan = ProductLoanBuilder::new().build();
    let harness = Harness::seeded(&sale, &account, &loan).await;

    harness.store.set_offline(true);
    assert!(harness.accounts.refetch().await.is_err());
    assert!(harness.product_loans.pull().await.is_err());

    // Last known good snapshots are still served.
    assert_eq!(harness.accounts.items().len(), 1);
    assert_eq!(harness.product_loans.items().len(), 1);
}
