//! Integration tests for the sync engine against an in-memory remote.
//!
//! The fake tables record every call and support failure injection, so the
//! suites can pin down the engine's observable contract: persist-first
//! mutations, offline safety, reconcile convergence, idempotent replay and
//! the anti-clobber bulk-load policy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use safra_core::{CostCategory, Money};
use safra_store::{LocalStore, StoreConfig};
use safra_sync::{
    ConnectivityMonitor, CostRow, ProductRow, RecordTable, RemoteLedger, SaleRow, SyncEngine,
    SyncError, SyncResult, TableRow,
};

// =============================================================================
// In-Memory Fake Table
// =============================================================================

/// Remote table fake: upsert-by-id rows, call counters, failure injection.
struct MemoryTable<R> {
    rows: Mutex<Vec<R>>,
    failing: AtomicBool,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl<R: TableRow + Clone> MemoryTable<R> {
    fn new() -> Arc<Self> {
        Arc::new(MemoryTable {
            rows: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn seed(&self, rows: Vec<R>) {
        *self.rows.lock().unwrap() = rows;
    }

    fn rows(&self) -> Vec<R> {
        self.rows.lock().unwrap().clone()
    }

    fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check(&self) -> SyncResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SyncError::RemoteUnavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<R: TableRow + Clone> RecordTable<R> for MemoryTable<R> {
    async fn insert(&self, row: &R) -> SyncResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows = self.rows.lock().unwrap();
        // upsert-by-identifier, like the real backend
        if let Some(existing) = rows.iter_mut().find(|r| r.id() == row.id()) {
            *existing = row.clone();
        } else {
            rows.push(row.clone());
        }
        Ok(())
    }

    async fn select_all(&self) -> SyncResult<Vec<R>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_by_id(&self, row: &R) -> SyncResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|r| r.id() == row.id()) {
            *existing = row.clone();
        }
        // zero matched rows still "succeeds", like a PATCH with no hits
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> SyncResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        self.rows.lock().unwrap().retain(|r| r.id() != id);
        Ok(())
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Run with `RUST_LOG=debug cargo test` to watch the engine's silent-degrade
/// paths in the output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    engine: Arc<SyncEngine>,
    products: Arc<MemoryTable<ProductRow>>,
    costs: Arc<MemoryTable<CostRow>>,
    sales: Arc<MemoryTable<SaleRow>>,
}

impl Fixture {
    async fn new(online: bool) -> Self {
        Fixture::with_store(LocalStore::in_memory().await.unwrap(), online)
    }

    fn with_store(store: LocalStore, online: bool) -> Self {
        init_tracing();

        let products = MemoryTable::new();
        let costs = MemoryTable::new();
        let sales = MemoryTable::new();

        let remote = RemoteLedger::from_tables(products.clone(), costs.clone(), sales.clone());

        let engine = Arc::new(SyncEngine::new(
            store,
            remote,
            ConnectivityMonitor::new(online),
        ));

        Fixture {
            engine,
            products,
            costs,
            sales,
        }
    }

    fn remote_call_count(&self) -> usize {
        self.products.insert_calls()
            + self.products.update_calls()
            + self.products.delete_calls()
            + self.costs.insert_calls()
            + self.costs.update_calls()
            + self.costs.delete_calls()
            + self.sales.insert_calls()
            + self.sales.update_calls()
            + self.sales.delete_calls()
    }
}

// =============================================================================
// Offline Safety
// =============================================================================

#[tokio::test]
async fn offline_mutations_never_touch_the_remote() {
    let fx = Fixture::new(false).await;

    let product = fx.engine.add_product("Milho", "10,50").await.unwrap();
    fx.engine
        .add_cost("Adubo", "15.00", CostCategory::Supply)
        .await
        .unwrap();
    fx.engine.record_sale(product.id, 2).await.unwrap();

    assert_eq!(fx.remote_call_count(), 0);
    assert_eq!(fx.engine.pending_count().await, 3);

    for p in fx.engine.products().await {
        assert!(!p.synced);
    }
}

#[tokio::test]
async fn offline_delete_is_local_only() {
    let fx = Fixture::new(false).await;

    let product = fx.engine.add_product("Milho", "10").await.unwrap();
    fx.engine.delete_product(product.id).await.unwrap();

    assert!(fx.engine.products().await.is_empty());
    assert_eq!(fx.remote_call_count(), 0);
}

// =============================================================================
// Online Mutations
// =============================================================================

#[tokio::test]
async fn online_mutation_pushes_once_and_flips_the_flag() {
    let fx = Fixture::new(true).await;

    let product = fx.engine.add_product("Milho", "10,50").await.unwrap();

    assert!(product.synced);
    assert_eq!(fx.products.insert_calls(), 1);
    assert_eq!(fx.engine.pending_count().await, 0);

    let rows = fx.products.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, product.id);
    assert_eq!(rows[0].price, Money::from_centavos(1050));
}

#[tokio::test]
async fn remote_failure_leaves_the_record_unsynced() {
    let fx = Fixture::new(true).await;
    fx.products.set_failing(true);

    // The caller still gets a success: the record is locally durable
    let product = fx.engine.add_product("Milho", "10").await.unwrap();
    assert!(!product.synced);
    assert_eq!(fx.engine.pending_count().await, 1);

    // Exactly one attempt was made, no inline retry loop
    assert_eq!(fx.products.insert_calls(), 1);

    // The next sweep picks it up
    fx.products.set_failing(false);
    let report = fx.engine.reconcile().await;
    assert_eq!(report.synced, 1);
    assert_eq!(fx.engine.pending_count().await, 0);
}

#[tokio::test]
async fn validation_errors_surface_before_anything_happens() {
    let fx = Fixture::new(true).await;

    assert!(fx.engine.add_product("", "10").await.is_err());
    assert!(fx.engine.add_product("Milho", "abc").await.is_err());
    assert!(fx.engine.add_cost("", "10", CostCategory::Other).await.is_err());
    assert!(fx.engine.record_sale(Uuid::new_v4(), 1).await.is_err());

    assert!(fx.engine.products().await.is_empty());
    assert_eq!(fx.remote_call_count(), 0);
}

// =============================================================================
// Local Durability
// =============================================================================

#[tokio::test]
async fn records_survive_a_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("safra.db");

    let product_id = {
        let store = LocalStore::open(StoreConfig::new(&path)).await.unwrap();
        let fx = Fixture::with_store(store, false);
        let product = fx.engine.add_product("Milho", "10,50").await.unwrap();
        product.id
    };

    // Fresh store over the same file, fresh engine: the record is there
    let store = LocalStore::open(StoreConfig::new(&path)).await.unwrap();
    let engine = SyncEngine::local_only(store);
    engine.bootstrap_load().await;

    let products = engine.products().await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, product_id);
    assert!(!products[0].synced);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn reconcile_converges_all_collections() {
    let fx = Fixture::new(false).await;

    let p1 = fx.engine.add_product("Milho", "10").await.unwrap();
    fx.engine.add_product("Feijão", "8,50").await.unwrap();
    fx.engine
        .add_cost("Adubo", "15", CostCategory::Supply)
        .await
        .unwrap();
    fx.engine
        .add_cost("Frete", "7", CostCategory::Transport)
        .await
        .unwrap();
    fx.engine.record_sale(p1.id, 3).await.unwrap();

    assert_eq!(fx.engine.pending_count().await, 5);

    fx.engine.connectivity().set_online(true);
    let report = fx.engine.reconcile().await;

    assert_eq!(report.attempted, 5);
    assert_eq!(report.synced, 5);
    assert_eq!(fx.engine.pending_count().await, 0);

    // Exactly one write per record
    assert_eq!(fx.products.insert_calls(), 2);
    assert_eq!(fx.costs.insert_calls(), 2);
    assert_eq!(fx.sales.insert_calls(), 1);

    assert_eq!(fx.products.rows().len(), 2);
    assert_eq!(fx.costs.rows().len(), 2);
    assert_eq!(fx.sales.rows().len(), 1);
}

#[tokio::test]
async fn reconcile_replays_in_insertion_order() {
    let fx = Fixture::new(false).await;

    let first = fx.engine.add_product("Milho", "10").await.unwrap();
    let second = fx.engine.add_product("Feijão", "8").await.unwrap();
    let third = fx.engine.add_product("Arroz", "6").await.unwrap();

    fx.engine.connectivity().set_online(true);
    fx.engine.reconcile().await;

    let ids: Vec<Uuid> = fx.products.rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[tokio::test]
async fn replaying_an_already_present_record_does_not_duplicate_it() {
    let fx = Fixture::new(true).await;

    // Created online: the row exists remotely
    let product = fx.engine.add_product("Milho", "10").await.unwrap();
    assert_eq!(fx.products.rows().len(), 1);

    // An edit whose push fails leaves the record remotely present but
    // locally Unsynced. This is the overlap case of two writes targeting one id
    fx.products.set_failing(true);
    fx.engine.update_product(product.id, "Milho", "12").await.unwrap();
    fx.products.set_failing(false);
    assert_eq!(fx.engine.pending_count().await, 1);

    // The sweep replays it as an upsert-by-id: same row, no duplicate
    fx.engine.reconcile().await;

    let rows = fx.products.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, product.id);
    assert_eq!(rows[0].price, Money::from_centavos(1200));
    assert_eq!(fx.engine.pending_count().await, 0);
}

#[tokio::test]
async fn reconcile_partial_failure_is_non_fatal() {
    let fx = Fixture::new(false).await;

    fx.engine.add_product("Milho", "10").await.unwrap();
    fx.engine
        .add_cost("Adubo", "15", CostCategory::Supply)
        .await
        .unwrap();

    // Products replay fails, costs replay succeeds
    fx.products.set_failing(true);
    fx.engine.connectivity().set_online(true);
    let report = fx.engine.reconcile().await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.synced, 1);
    assert_eq!(fx.engine.pending_count().await, 1);
    assert_eq!(fx.costs.rows().len(), 1);
}

#[tokio::test]
async fn reconnect_edge_triggers_a_sweep() {
    let fx = Fixture::new(false).await;

    fx.engine.add_product("Milho", "10").await.unwrap();
    assert_eq!(fx.engine.pending_count().await, 1);

    let listener = fx.engine.spawn_reconnect_listener();
    fx.engine.connectivity().set_online(true);

    // The sweep runs on a background task; wait for it to land
    tokio::time::timeout(Duration::from_secs(2), async {
        while fx.engine.pending_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("reconnect sweep should drain the pending records");

    assert_eq!(fx.products.rows().len(), 1);
    listener.abort();
}

// =============================================================================
// Anti-Clobber Bulk Load
// =============================================================================

#[tokio::test]
async fn empty_remote_answer_preserves_local_data() {
    let fx = Fixture::new(true).await;
    fx.products.set_failing(true); // keep the adds local-only
    for name in ["A", "B", "C", "D", "E"] {
        fx.engine.add_product(name, "1").await.unwrap();
    }
    fx.products.set_failing(false);

    // Remote products table is empty: ambiguous, so local data stays
    fx.engine.bootstrap_load().await;

    assert_eq!(fx.engine.products().await.len(), 5);
}

#[tokio::test]
async fn non_empty_remote_answer_replaces_local_data() {
    let fx = Fixture::new(true).await;
    fx.products.set_failing(true);
    for name in ["A", "B", "C", "D", "E"] {
        fx.engine.add_product(name, "1").await.unwrap();
    }
    fx.products.set_failing(false);

    let remote_rows = vec![
        ProductRow {
            id: Uuid::new_v4(),
            name: "Milho".into(),
            price: Money::from_centavos(1000),
        },
        ProductRow {
            id: Uuid::new_v4(),
            name: "Feijão".into(),
            price: Money::from_centavos(850),
        },
        ProductRow {
            id: Uuid::new_v4(),
            name: "Arroz".into(),
            price: Money::from_centavos(620),
        },
    ];
    fx.products.seed(remote_rows.clone());

    fx.engine.bootstrap_load().await;

    let products = fx.engine.products().await;
    assert_eq!(products.len(), 3);
    // Remote wins, and adopted records are already durable remotely
    for (product, row) in products.iter().zip(&remote_rows) {
        assert_eq!(product.id, row.id);
        assert!(product.synced);
    }
}

#[tokio::test]
async fn remote_load_error_preserves_local_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("safra.db");

    {
        let store = LocalStore::open(StoreConfig::new(&path)).await.unwrap();
        let fx = Fixture::with_store(store, false);
        fx.engine.add_product("Milho", "10").await.unwrap();
    }

    let store = LocalStore::open(StoreConfig::new(&path)).await.unwrap();
    let fx = Fixture::with_store(store, true);
    fx.products.set_failing(true);
    fx.costs.set_failing(true);
    fx.sales.set_failing(true);

    fx.engine.bootstrap_load().await;

    assert_eq!(fx.engine.products().await.len(), 1);
}

// =============================================================================
// Sale Snapshots
// =============================================================================

#[tokio::test]
async fn sale_snapshots_survive_product_edits_and_deletion() {
    let fx = Fixture::new(true).await;

    let product = fx.engine.add_product("Milho", "10.00").await.unwrap();
    let sale = fx.engine.record_sale(product.id, 3).await.unwrap();
    assert_eq!(sale.total, Money::from_centavos(3000));

    fx.engine
        .update_product(product.id, "Milho Premium", "99.00")
        .await
        .unwrap();

    let sales = fx.engine.sales().await;
    assert_eq!(sales[0].total, Money::from_centavos(3000));
    assert_eq!(sales[0].product_name, "Milho");

    fx.engine.delete_product(product.id).await.unwrap();

    let sales = fx.engine.sales().await;
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].total, Money::from_centavos(3000));
}

// =============================================================================
// Insert vs Update Targeting
// =============================================================================

#[tokio::test]
async fn edits_update_synced_records_but_upsert_unsynced_ones() {
    let fx = Fixture::new(true).await;

    // Created online: pushed via insert, now Synced
    let synced_product = fx.engine.add_product("Milho", "10").await.unwrap();
    assert_eq!(fx.products.insert_calls(), 1);

    // Editing a Synced record targets the existing row
    fx.engine
        .update_product(synced_product.id, "Milho", "12")
        .await
        .unwrap();
    assert_eq!(fx.products.update_calls(), 1);
    assert_eq!(fx.products.insert_calls(), 1);

    // A record that never reached the remote must not be PATCHed into the
    // void: a zero-row update would succeed vacuously and strand it
    fx.products.set_failing(true);
    let offline_product = fx.engine.add_product("Feijão", "8").await.unwrap();
    fx.products.set_failing(false);
    assert!(!offline_product.synced);

    fx.engine
        .update_product(offline_product.id, "Feijão", "9")
        .await
        .unwrap();
    assert_eq!(fx.products.insert_calls(), 3); // failed create + upsert edit
    assert_eq!(fx.products.update_calls(), 1);
    assert_eq!(fx.products.rows().len(), 2);
}

// =============================================================================
// Deletion Semantics
// =============================================================================

#[tokio::test]
async fn failed_remote_delete_does_not_roll_back() {
    let fx = Fixture::new(true).await;

    let cost = fx
        .engine
        .add_cost("Adubo", "15", CostCategory::Supply)
        .await
        .unwrap();
    assert_eq!(fx.costs.rows().len(), 1);

    fx.costs.set_failing(true);
    fx.engine.delete_cost(cost.id).await.unwrap();

    // Locally gone even though the remote still has the row
    assert!(fx.engine.costs().await.is_empty());
    assert_eq!(fx.costs.delete_calls(), 1);
    assert_eq!(fx.costs.rows().len(), 1);
}

#[tokio::test]
async fn deleting_unknown_records_is_an_error() {
    let fx = Fixture::new(true).await;

    assert!(fx.engine.delete_product(Uuid::new_v4()).await.is_err());
    assert!(fx.engine.delete_cost(Uuid::new_v4()).await.is_err());
}
