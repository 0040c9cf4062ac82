//! # Sync Engine
//!
//! Orchestrates reads and writes between the Durable Local Store and the
//! Remote Record Store, tags every record with its synchronization state,
//! and runs a reconciliation sweep on connectivity restore.
//!
//! ## The Dual-Write Scheme
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Mutation Flow                                   │
//! │                                                                         │
//! │  add_product("Milho", "10,50")                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. validate input              ← ValidationError is the ONLY error    │
//! │       │                           the caller ever sees                  │
//! │       ▼                                                                 │
//! │  2. append to in-memory ledger, tagged Unsynced                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. persist to local store      ← unconditional; failures logged       │
//! │       │                           and swallowed                         │
//! │       ▼                                                                 │
//! │  4. online?  ──no──► done (record waits for the reconnect sweep)       │
//! │       │yes                                                              │
//! │       ▼                                                                 │
//! │  5. ONE remote write attempt    ← no inline retry loop                 │
//! │       │                                                                 │
//! │       ├── success → flip to Synced, persist again                      │
//! │       └── failure → stays Unsynced, logged, caller already happy       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Per-Record State Machine
//! ```text
//! Unsynced ──(remote write succeeds)──► Synced ──(mutated again)──► Unsynced
//! ```
//!
//! ## Consistency Ceiling
//! There is no retry/backoff beyond the two triggers (mutation-time
//! attempt, reconnect sweep). A record can stay `Unsynced` indefinitely if
//! no online transition is ever observed: the system is "eventually synced
//! if the app observes a reconnect", not guaranteed.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use safra_core::{
    report, Collection, CoreError, CoreResult, Cost, CostCategory, LedgerSummary, Money, Product,
    Sale,
};
use safra_store::LocalStore;

use crate::connectivity::ConnectivityMonitor;
use crate::remote::{CostRow, ProductRow, RecordTable, RemoteLedger, SaleRow};

// =============================================================================
// Ledger
// =============================================================================

/// The three in-memory collections, in insertion order.
#[derive(Debug, Default)]
struct Ledger {
    products: Vec<Product>,
    sales: Vec<Sale>,
    costs: Vec<Cost>,
}

// =============================================================================
// Reconcile Report
// =============================================================================

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Unsynced records found across the three collections.
    pub attempted: usize,

    /// Records whose remote write succeeded and whose flag was flipped.
    pub synced: usize,
}

impl ReconcileReport {
    fn absorb(&mut self, (attempted, synced): (usize, usize)) {
        self.attempted += attempted;
        self.synced += synced;
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// Owns the three collections, the local store handle, the remote table
/// handles and the connectivity monitor.
///
/// One instance per process, shared by reference (`Arc`): explicit
/// ownership instead of process-wide mutable globals, while keeping
/// single-instance semantics.
///
/// ## Locking
/// The collections sit behind one async `RwLock`. Lock scope never spans a
/// remote round-trip, so a reconnect-triggered sweep can overlap an
/// in-flight mutation attempt; the remote side's upsert semantics make the
/// duplicate write harmless.
pub struct SyncEngine {
    local: LocalStore,
    remote: Option<RemoteLedger>,
    connectivity: ConnectivityMonitor,
    ledger: RwLock<Ledger>,
}

impl SyncEngine {
    /// Creates an engine wired to a remote ledger.
    pub fn new(local: LocalStore, remote: RemoteLedger, connectivity: ConnectivityMonitor) -> Self {
        SyncEngine {
            local,
            remote: Some(remote),
            connectivity,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// Creates a local-only engine (remote sync disabled by configuration).
    /// Records simply accumulate as `Unsynced`.
    pub fn local_only(local: LocalStore) -> Self {
        SyncEngine {
            local,
            remote: None,
            connectivity: ConnectivityMonitor::starting_offline(),
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// The engine's connectivity monitor (the host feeds the platform
    /// signal into this).
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Current connectivity level.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// The remote tables, but only when a push attempt is allowed right
    /// now: a remote must be configured AND the monitor must report
    /// online. Offline means zero remote calls.
    fn remote_ready(&self) -> Option<&RemoteLedger> {
        if self.connectivity.is_online() {
            self.remote.as_ref()
        } else {
            None
        }
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Loads the ledger on startup.
    ///
    /// ## Two Phases
    /// 1. **Local phase**: read all three collections from the local
    ///    store (fallback: empty). This always succeeds; the ledger is
    ///    usable with no network at all.
    /// 2. **Load phase**: attempt `select_all` per collection and adopt
    ///    the remote snapshot under the anti-clobber policy:
    ///    - non-empty answer → remote wins, local state replaced
    ///    - empty answer     → local state preserved (ambiguous between
    ///      "truly empty" and "misconfigured"; the conservative choice is
    ///      deliberate)
    ///    - error            → local state preserved
    pub async fn bootstrap_load(&self) {
        let products: Vec<Product> = self.local.read(Collection::Products.key(), vec![]).await;
        let sales: Vec<Sale> = self.local.read(Collection::Sales.key(), vec![]).await;
        let costs: Vec<Cost> = self.local.read(Collection::Costs.key(), vec![]).await;

        info!(
            products = products.len(),
            sales = sales.len(),
            costs = costs.len(),
            "ledger loaded from local store"
        );

        {
            let mut ledger = self.ledger.write().await;
            ledger.products = products;
            ledger.sales = sales;
            ledger.costs = costs;
        }

        let Some(remote) = self.remote.as_ref() else {
            debug!("no remote configured, skipping load phase");
            return;
        };

        self.refresh_products(remote).await;
        self.refresh_costs(remote).await;
        self.refresh_sales(remote).await;
    }

    async fn refresh_products(&self, remote: &RemoteLedger) {
        match remote.products.select_all().await {
            Ok(rows) if rows.is_empty() => {
                warn!("remote products answer is empty, keeping local data");
            }
            Ok(rows) => {
                let adopted: Vec<Product> = rows.into_iter().map(ProductRow::into_record).collect();
                info!(count = adopted.len(), "adopted remote products snapshot");
                {
                    let mut ledger = self.ledger.write().await;
                    ledger.products = adopted;
                }
                self.persist_products().await;
            }
            Err(e) => {
                warn!(error = %e, "remote products load failed, keeping local data");
            }
        }
    }

    async fn refresh_sales(&self, remote: &RemoteLedger) {
        match remote.sales.select_all().await {
            Ok(rows) if rows.is_empty() => {
                warn!("remote sales answer is empty, keeping local data");
            }
            Ok(rows) => {
                let adopted: Vec<Sale> = rows.into_iter().map(SaleRow::into_record).collect();
                info!(count = adopted.len(), "adopted remote sales snapshot");
                {
                    let mut ledger = self.ledger.write().await;
                    ledger.sales = adopted;
                }
                self.persist_sales().await;
            }
            Err(e) => {
                warn!(error = %e, "remote sales load failed, keeping local data");
            }
        }
    }

    async fn refresh_costs(&self, remote: &RemoteLedger) {
        match remote.costs.select_all().await {
            Ok(rows) if rows.is_empty() => {
                warn!("remote costs answer is empty, keeping local data");
            }
            Ok(rows) => {
                let adopted: Vec<Cost> = rows.into_iter().map(CostRow::into_record).collect();
                info!(count = adopted.len(), "adopted remote costs snapshot");
                {
                    let mut ledger = self.ledger.write().await;
                    ledger.costs = adopted;
                }
                self.persist_costs().await;
            }
            Err(e) => {
                warn!(error = %e, "remote costs load failed, keeping local data");
            }
        }
    }

    // =========================================================================
    // Product Mutations
    // =========================================================================

    /// Creates a product from raw user input.
    ///
    /// The price accepts both `10.50` and `10,50`. Validation failures are
    /// returned synchronously; storage and remote failures are not: local
    /// success is what the caller sees.
    pub async fn add_product(&self, name: &str, price_input: &str) -> CoreResult<Product> {
        let price = Money::parse(price_input).map_err(CoreError::from)?;
        let mut product = Product::new(name, price)?;

        {
            let mut ledger = self.ledger.write().await;
            ledger.products.push(product.clone());
        }
        self.persist_products().await;

        if let Some(remote) = self.remote_ready() {
            match remote.products.insert(&ProductRow::from(&product)).await {
                Ok(()) => {
                    self.mark_product_synced(product.id).await;
                    self.persist_products().await;
                    product.synced = true;
                }
                Err(e) => {
                    warn!(id = %product.id, error = %e, "product push failed, will retry on reconnect");
                }
            }
        }

        Ok(product)
    }

    /// Edits a product's name and price. Resets the record to `Unsynced`
    /// and attempts one remote write.
    ///
    /// ## Insert vs Update
    /// A record that was `Synced` before this edit exists remotely, so the
    /// push is an update-by-id. One that was still `Unsynced` may never
    /// have reached the remote at all, where an update would match zero rows
    /// and succeed vacuously, so it is pushed as an upsert instead.
    pub async fn update_product(
        &self,
        id: Uuid,
        name: &str,
        price_input: &str,
    ) -> CoreResult<Product> {
        let price = Money::parse(price_input).map_err(CoreError::from)?;
        safra_core::validation::validate_product_name(name).map_err(CoreError::from)?;

        let (mut product, was_synced) = {
            let mut ledger = self.ledger.write().await;
            let product = ledger
                .products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(CoreError::ProductNotFound(id))?;

            let was_synced = product.synced;
            product.name = name.trim().to_string();
            product.price = price;
            product.synced = false;
            (product.clone(), was_synced)
        };
        self.persist_products().await;

        if let Some(remote) = self.remote_ready() {
            let row = ProductRow::from(&product);
            let pushed = if was_synced {
                remote.products.update_by_id(&row).await
            } else {
                remote.products.insert(&row).await
            };

            match pushed {
                Ok(()) => {
                    self.mark_product_synced(product.id).await;
                    self.persist_products().await;
                    product.synced = true;
                }
                Err(e) => {
                    warn!(id = %product.id, error = %e, "product push failed, will retry on reconnect");
                }
            }
        }

        Ok(product)
    }

    /// Deletes a product locally and fires one best-effort remote delete.
    ///
    /// A remote failure does not roll back the local deletion: local
    /// state is authoritative for the user-visible effect. Historical
    /// sales keep their frozen snapshots of this product.
    pub async fn delete_product(&self, id: Uuid) -> CoreResult<()> {
        {
            let mut ledger = self.ledger.write().await;
            let before = ledger.products.len();
            ledger.products.retain(|p| p.id != id);
            if ledger.products.len() == before {
                return Err(CoreError::ProductNotFound(id));
            }
        }
        self.persist_products().await;

        if let Some(remote) = self.remote_ready() {
            if let Err(e) = remote.products.delete_by_id(id).await {
                warn!(id = %id, error = %e, "remote product delete failed, local deletion stands");
            }
        }

        Ok(())
    }

    // =========================================================================
    // Sale Mutations
    // =========================================================================

    /// Records a sale against an existing product, freezing the product
    /// name and computed total at this moment.
    pub async fn record_sale(&self, product_id: Uuid, quantity: i64) -> CoreResult<Sale> {
        let mut sale = {
            let mut ledger = self.ledger.write().await;
            let product = ledger
                .products
                .iter()
                .find(|p| p.id == product_id)
                .ok_or(CoreError::ProductNotFound(product_id))?;

            let sale = Sale::record(product, quantity)?;
            ledger.sales.push(sale.clone());
            sale
        };
        self.persist_sales().await;

        if let Some(remote) = self.remote_ready() {
            match remote.sales.insert(&SaleRow::from(&sale)).await {
                Ok(()) => {
                    self.mark_sale_synced(sale.id).await;
                    self.persist_sales().await;
                    sale.synced = true;
                }
                Err(e) => {
                    warn!(id = %sale.id, error = %e, "sale push failed, will retry on reconnect");
                }
            }
        }

        Ok(sale)
    }

    // =========================================================================
    // Cost Mutations
    // =========================================================================

    /// Records a cost entry from raw user input.
    pub async fn add_cost(
        &self,
        description: &str,
        amount_input: &str,
        category: CostCategory,
    ) -> CoreResult<Cost> {
        let amount = Money::parse(amount_input).map_err(CoreError::from)?;
        let mut cost = Cost::new(description, amount, category)?;

        {
            let mut ledger = self.ledger.write().await;
            ledger.costs.push(cost.clone());
        }
        self.persist_costs().await;

        if let Some(remote) = self.remote_ready() {
            match remote.costs.insert(&CostRow::from(&cost)).await {
                Ok(()) => {
                    self.mark_cost_synced(cost.id).await;
                    self.persist_costs().await;
                    cost.synced = true;
                }
                Err(e) => {
                    warn!(id = %cost.id, error = %e, "cost push failed, will retry on reconnect");
                }
            }
        }

        Ok(cost)
    }

    /// Deletes a cost entry locally with one best-effort remote delete.
    pub async fn delete_cost(&self, id: Uuid) -> CoreResult<()> {
        {
            let mut ledger = self.ledger.write().await;
            let before = ledger.costs.len();
            ledger.costs.retain(|c| c.id != id);
            if ledger.costs.len() == before {
                return Err(CoreError::CostNotFound(id));
            }
        }
        self.persist_costs().await;

        if let Some(remote) = self.remote_ready() {
            if let Err(e) = remote.costs.delete_by_id(id).await {
                warn!(id = %id, error = %e, "remote cost delete failed, local deletion stands");
            }
        }

        Ok(())
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Replays every `Unsynced` record against the remote store.
    ///
    /// ## Ordering
    /// Collections are swept in the fixed order products → costs → sales
    /// ([`Collection::RECONCILE_ORDER`]): sales and costs may reference
    /// product identifiers that should exist remotely first. The remote
    /// store does not enforce this, so a products failure is non-fatal for
    /// the rest of the sweep. Within a collection, records replay in
    /// original insertion order.
    ///
    /// ## Idempotency
    /// Every replay is an upsert-by-identifier. Sweeping a record that a
    /// concurrent mutation attempt already pushed lands on the same remote
    /// row instead of duplicating it.
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let Some(remote) = self.remote.as_ref() else {
            debug!("no remote configured, nothing to reconcile");
            return report;
        };

        if !self.connectivity.is_online() {
            debug!("offline, skipping reconciliation sweep");
            return report;
        }

        report.absorb(self.reconcile_products(remote).await);
        report.absorb(self.reconcile_costs(remote).await);
        report.absorb(self.reconcile_sales(remote).await);

        info!(
            attempted = report.attempted,
            synced = report.synced,
            "reconciliation sweep finished"
        );

        report
    }

    async fn reconcile_products(&self, remote: &RemoteLedger) -> (usize, usize) {
        let pending: Vec<Product> = {
            let ledger = self.ledger.read().await;
            ledger.products.iter().filter(|p| !p.synced).cloned().collect()
        };

        let attempted = pending.len();
        let mut synced = 0;
        for record in pending {
            match remote.products.insert(&ProductRow::from(&record)).await {
                Ok(()) => {
                    self.mark_product_synced(record.id).await;
                    synced += 1;
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "product replay failed");
                }
            }
        }

        if synced > 0 {
            self.persist_products().await;
        }
        (attempted, synced)
    }

    async fn reconcile_costs(&self, remote: &RemoteLedger) -> (usize, usize) {
        let pending: Vec<Cost> = {
            let ledger = self.ledger.read().await;
            ledger.costs.iter().filter(|c| !c.synced).cloned().collect()
        };

        let attempted = pending.len();
        let mut synced = 0;
        for record in pending {
            match remote.costs.insert(&CostRow::from(&record)).await {
                Ok(()) => {
                    self.mark_cost_synced(record.id).await;
                    synced += 1;
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "cost replay failed");
                }
            }
        }

        if synced > 0 {
            self.persist_costs().await;
        }
        (attempted, synced)
    }

    async fn reconcile_sales(&self, remote: &RemoteLedger) -> (usize, usize) {
        let pending: Vec<Sale> = {
            let ledger = self.ledger.read().await;
            ledger.sales.iter().filter(|s| !s.synced).cloned().collect()
        };

        let attempted = pending.len();
        let mut synced = 0;
        for record in pending {
            match remote.sales.insert(&SaleRow::from(&record)).await {
                Ok(()) => {
                    self.mark_sale_synced(record.id).await;
                    synced += 1;
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "sale replay failed");
                }
            }
        }

        if synced > 0 {
            self.persist_sales().await;
        }
        (attempted, synced)
    }

    /// Spawns the background task that turns every "became online" edge
    /// into one reconciliation sweep. The engine never polls the level.
    pub fn spawn_reconnect_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let mut events = self.connectivity.subscribe();

        tokio::spawn(async move {
            while events.went_online().await {
                info!("connectivity restored, starting reconciliation sweep");
                engine.reconcile().await;
            }
            debug!("connectivity monitor gone, reconnect listener exiting");
        })
    }

    // =========================================================================
    // Read-Only Accessors (display layer)
    // =========================================================================

    /// Snapshot of the products collection, in insertion order.
    pub async fn products(&self) -> Vec<Product> {
        self.ledger.read().await.products.clone()
    }

    /// Snapshot of the sales collection, in insertion order.
    pub async fn sales(&self) -> Vec<Sale> {
        self.ledger.read().await.sales.clone()
    }

    /// Snapshot of the costs collection, in insertion order.
    pub async fn costs(&self) -> Vec<Cost> {
        self.ledger.read().await.costs.clone()
    }

    /// How many records across all collections still await remote
    /// durability.
    pub async fn pending_count(&self) -> usize {
        let ledger = self.ledger.read().await;
        ledger.products.iter().filter(|p| !p.synced).count()
            + ledger.sales.iter().filter(|s| !s.synced).count()
            + ledger.costs.iter().filter(|c| !c.synced).count()
    }

    /// Aggregated totals over the ledger.
    pub async fn summary(&self) -> LedgerSummary {
        let ledger = self.ledger.read().await;
        report::summarize(&ledger.sales, &ledger.costs)
    }

    /// Plain-text report export.
    pub async fn report_text(&self) -> String {
        let ledger = self.ledger.read().await;
        report::render_text(&ledger.sales, &ledger.costs)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn mark_product_synced(&self, id: Uuid) {
        let mut ledger = self.ledger.write().await;
        if let Some(p) = ledger.products.iter_mut().find(|p| p.id == id) {
            p.synced = true;
        }
    }

    async fn mark_sale_synced(&self, id: Uuid) {
        let mut ledger = self.ledger.write().await;
        if let Some(s) = ledger.sales.iter_mut().find(|s| s.id == id) {
            s.synced = true;
        }
    }

    async fn mark_cost_synced(&self, id: Uuid) {
        let mut ledger = self.ledger.write().await;
        if let Some(c) = ledger.costs.iter_mut().find(|c| c.id == id) {
            c.synced = true;
        }
    }

    /// Persists the products collection; a failure is logged and
    /// swallowed; the in-memory ledger stays authoritative for this
    /// session.
    async fn persist_products(&self) {
        let snapshot = { self.ledger.read().await.products.clone() };
        if let Err(e) = self.local.write(Collection::Products.key(), &snapshot).await {
            warn!(error = %e, "persisting products failed, in-memory state remains authoritative");
        }
    }

    async fn persist_sales(&self) {
        let snapshot = { self.ledger.read().await.sales.clone() };
        if let Err(e) = self.local.write(Collection::Sales.key(), &snapshot).await {
            warn!(error = %e, "persisting sales failed, in-memory state remains authoritative");
        }
    }

    async fn persist_costs(&self) {
        let snapshot = { self.ledger.read().await.costs.clone() };
        if let Err(e) = self.local.write(Collection::Costs.key(), &snapshot).await {
            warn!(error = %e, "persisting costs failed, in-memory state remains authoritative");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
// The engine's behavior against fake and mocked remotes is covered by the
// integration suites in tests/.
