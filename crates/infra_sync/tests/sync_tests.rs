//! Integration tests for the replica infrastructure
//!
//! Everything runs against `MemoryStore` with its offline toggle, which is
//! enough to exercise the cache error policy, the apply queue, and the
//! document adapters end to end.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use core_kernel::{Currency, DocumentStore, Money, ProductId, RefundId, SaleId, StoreQuery};
use domain_ledger::LoanAccount;
use domain_refund::{RefundLine, RefundStore, RefundTransaction};
use infra_sync::{
    Collection, CollectionNames, DocumentRefundStore, MemoryStore, PushEvent, PushRouter,
    ReplicaDriver,
};

fn usd(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

fn sample_account(name: &str, principal: rust_decimal::Decimal) -> LoanAccount {
    LoanAccount::open(name, usd(principal), Currency::USD).unwrap()
}

fn account_driver(
    store: Arc<MemoryStore>,
) -> ReplicaDriver<LoanAccount, Collection<LoanAccount>> {
    let source = Collection::new("loan_accounts", store as Arc<dyn DocumentStore>);
    ReplicaDriver::new("loan_accounts", source, None)
}

// --- MemoryStore contract ---

#[tokio::test]
async fn create_assigns_id_when_missing() {
    let store = MemoryStore::new();
    let created = store
        .create("products", json!({"name": "hammer", "stock": 4}))
        .await
        .unwrap();

    let id = created.get("id").and_then(serde_json::Value::as_str).unwrap();
    assert!(Uuid::parse_str(id).is_ok());

    let all = store.get_all("products").await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn update_merges_patch_fields() {
    let store = MemoryStore::new();
    let id = Uuid::now_v7();
    store
        .seed("products", &[json!({"id": id, "name": "hammer", "stock": 4})])
        .await
        .unwrap();

    let updated = store
        .update("products", id, json!({"stock": 9}))
        .await
        .unwrap();

    assert_eq!(updated.get("stock").and_then(serde_json::Value::as_u64), Some(9));
    assert_eq!(
        updated.get("name").and_then(serde_json::Value::as_str),
        Some("hammer")
    );
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let store = MemoryStore::new();
    store
        .seed("products", &[json!({"id": Uuid::now_v7(), "name": "hammer"})])
        .await
        .unwrap();

    let err = store.delete("products", Uuid::now_v7()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn search_is_case_insensitive_containment() {
    let store = MemoryStore::new();
    store
        .seed(
            "sales",
            &[
                json!({"id": Uuid::now_v7(), "client_name": "Karim Benani"}),
                json!({"id": Uuid::now_v7(), "client_name": "Fatima Zahra"}),
            ],
        )
        .await
        .unwrap();

    let hits = store
        .search("sales", &StoreQuery::field_contains("client_name", "KARIM"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn typed_collection_decodes_seeded_records() {
    let store = Arc::new(MemoryStore::new());
    let account = sample_account("Karim", dec!(1000));
    store.seed("loan_accounts", &[account.clone()]).await.unwrap();

    let collection: Collection<LoanAccount> =
        Collection::new("loan_accounts", store as Arc<dyn DocumentStore>);
    let fetched = collection.fetch_all().await.unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, account.id);
    assert_eq!(fetched[0].outstanding_balance, usd(dec!(1000)));
}

#[tokio::test]
async fn malformed_record_is_a_transformation_error() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[json!({"id": Uuid::now_v7(), "bogus": true})])
        .await
        .unwrap();

    let collection: Collection<LoanAccount> =
        Collection::new("loan_accounts", store as Arc<dyn DocumentStore>);
    let err = collection.fetch_all().await.unwrap_err();
    assert!(matches!(err, core_kernel::PortError::Transformation { .. }));
}

// --- Replica driver through the apply queue ---

#[tokio::test]
async fn pull_failure_after_first_load_retains_items() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[sample_account("Karim", dec!(500))])
        .await
        .unwrap();

    let (handle, _task) = account_driver(Arc::clone(&store)).spawn();
    handle.pull().await.unwrap();
    assert_eq!(handle.items().len(), 1);

    store.set_offline(true);
    let err = handle.pull().await.unwrap_err();
    assert!(matches!(err, infra_sync::SyncError::Port(ref p) if p.is_transient()));
    // Last known good state survives the outage.
    assert_eq!(handle.items().len(), 1);
}

#[tokio::test]
async fn pull_failure_before_first_load_leaves_cache_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);

    let (handle, _task) = account_driver(store).spawn();
    assert!(handle.pull().await.is_err());
    assert!(handle.items().is_empty());
}

#[tokio::test]
async fn identical_pull_is_deduped() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[sample_account("Karim", dec!(500))])
        .await
        .unwrap();

    let (handle, _task) = account_driver(store).spawn();
    assert!(handle.pull().await.unwrap());
    assert!(!handle.pull().await.unwrap());
}

#[tokio::test]
async fn refetch_observes_server_side_changes() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[sample_account("Karim", dec!(500))])
        .await
        .unwrap();

    let (handle, _task) = account_driver(Arc::clone(&store)).spawn();
    handle.pull().await.unwrap();

    store
        .seed(
            "loan_accounts",
            &[
                sample_account("Karim", dec!(500)),
                sample_account("Fatima", dec!(200)),
            ],
        )
        .await
        .unwrap();

    assert!(handle.refetch().await.unwrap());
    assert_eq!(handle.items().len(), 2);
}

#[tokio::test]
async fn failed_refetch_never_clears() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[sample_account("Karim", dec!(500))])
        .await
        .unwrap();

    let (handle, _task) = account_driver(Arc::clone(&store)).spawn();
    handle.pull().await.unwrap();

    store.set_offline(true);
    assert!(handle.refetch().await.is_err());
    assert_eq!(handle.items().len(), 1);
}

#[tokio::test]
async fn watch_subscribers_see_accepted_snapshots() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed("loan_accounts", &[sample_account("Karim", dec!(500))])
        .await
        .unwrap();

    let (handle, _task) = account_driver(store).spawn();
    let mut rx = handle.subscribe();

    handle.pull().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().len(), 1);
}

// --- Push routing ---

#[tokio::test]
async fn push_snapshot_replaces_cache_through_router() {
    let store = Arc::new(MemoryStore::new());
    let (handle, _task) = account_driver(store).spawn();

    let mut router = PushRouter::new();
    router.register("loan_accounts", handle.clone());

    let pushed = sample_account("Fatima", dec!(750));
    let changed = router
        .dispatch(PushEvent {
            collection: "loan_accounts".to_string(),
            snapshot: vec![serde_json::to_value(&pushed).unwrap()],
        })
        .await
        .unwrap();

    assert!(changed);
    assert_eq!(handle.items()[0].id, pushed.id);
}

#[tokio::test]
async fn push_for_unmirrored_collection_is_dropped() {
    let router = PushRouter::new();
    let changed = router
        .dispatch(PushEvent {
            collection: "invoices".to_string(),
            snapshot: vec![json!({"id": 1})],
        })
        .await
        .unwrap();
    assert!(!changed);
}

#[tokio::test]
async fn undecodable_push_is_a_codec_error() {
    let store = Arc::new(MemoryStore::new());
    let (handle, _task) = account_driver(store).spawn();

    let mut router = PushRouter::new();
    router.register("loan_accounts", handle);

    let err = router
        .dispatch(PushEvent {
            collection: "loan_accounts".to_string(),
            snapshot: vec![json!({"bogus": true})],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, infra_sync::SyncError::Codec(_)));
}

// --- Document adapters ---

fn refund_fixture() -> RefundTransaction {
    let product_id = ProductId::new_v7();
    RefundTransaction {
        id: RefundId::new_v7(),
        original_sale_id: SaleId::new_v7(),
        date: chrono::Utc::now().date_naive(),
        line_items: vec![RefundLine {
            product_id,
            description: "hammer".to_string(),
            quantity_sold: 2,
            effective_quantity: 2,
            refund_unit_price: usd(dec!(25)),
            purchase_cost_counted: usd(dec!(30)),
            profit_delta: usd(dec!(20)),
        }],
        restore_stock: true,
        restored_product_ids: HashSet::from([product_id]),
        currency: Currency::USD,
    }
}

#[tokio::test]
async fn refund_store_persists_refund_records() {
    let store = Arc::new(MemoryStore::new());
    let refunds =
        DocumentRefundStore::new(Arc::clone(&store) as Arc<dyn DocumentStore>, CollectionNames::default());

    refunds.create_refund(&refund_fixture()).await.unwrap();

    let persisted = store.get_all("refunds").await.unwrap();
    assert_eq!(persisted.len(), 1);
}

#[tokio::test]
async fn restore_stock_increments_current_count() {
    let store = Arc::new(MemoryStore::new());
    let product_id = ProductId::new_v7();
    store
        .seed(
            "products",
            &[json!({"id": product_id.as_uuid(), "name": "hammer", "stock": 3})],
        )
        .await
        .unwrap();

    let refunds =
        DocumentRefundStore::new(Arc::clone(&store) as Arc<dyn DocumentStore>, CollectionNames::default());
    refunds.restore_stock(product_id, 2).await.unwrap();

    let products = store.get_all("products").await.unwrap();
    assert_eq!(
        products[0].get("stock").and_then(serde_json::Value::as_u64),
        Some(5)
    );
}

#[tokio::test]
async fn restore_stock_for_unknown_product_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    store.seed::<serde_json::Value>("products", &[]).await.unwrap();

    let refunds =
        DocumentRefundStore::new(store as Arc<dyn DocumentStore>, CollectionNames::default());
    let err = refunds.restore_stock(ProductId::new_v7(), 1).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_account_removes_the_record() {
    let store = Arc::new(MemoryStore::new());
    let account = sample_account("Karim", dec!(400));
    store.seed("loan_accounts", &[account.clone()]).await.unwrap();

    let refunds =
        DocumentRefundStore::new(Arc::clone(&store) as Arc<dyn DocumentStore>, CollectionNames::default());
    refunds.delete_account(account.id).await.unwrap();

    assert!(store.get_all("loan_accounts").await.unwrap().is_empty());
}
