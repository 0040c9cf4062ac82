//! # Remote Record Store
//!
//! One thin key-value table per collection, reachable only over the
//! network, behind a PostgREST-style API (the shape Supabase exposes).
//!
//! ## The Table Seam
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Remote Record Store                               │
//! │                                                                         │
//! │  SyncEngine ──────► RecordTable<R>  (trait)                            │
//! │                        │                                                │
//! │          ┌─────────────┴─────────────┐                                 │
//! │          ▼                           ▼                                  │
//! │   RestTable<R>                 in-memory fake                          │
//! │   (production)                 (tests)                                 │
//! │                                                                         │
//! │   POST   /products            Prefer: resolution=merge-duplicates      │
//! │   GET    /products?select=*                                            │
//! │   PATCH  /products?id=eq.<uuid>                                        │
//! │   DELETE /products?id=eq.<uuid>                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Contract
//! Every call is a network round-trip and may fail for any reason. All
//! failures come back as typed [`SyncError`] values: `RemoteUnavailable`
//! for transport/backend faults, `Timeout` when the per-call deadline is
//! exceeded. Nothing here panics and nothing retries; the engine decides
//! what a failure means.
//!
//! ## Upsert Semantics
//! `insert` is an upsert-by-identifier. A mutation-time push and a
//! reconnect sweep can race on the same record; the second write must land
//! on the existing row instead of duplicating it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use safra_core::{Cost, CostCategory, Money, Product, Sale};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Row Types
// =============================================================================
// The remote payload is the entity shape minus the local-only `synced`
// flag. Records adopted FROM the remote are durably there by definition,
// so conversion back into a domain record sets `synced: true`.

/// Marker for types that live in a remote table.
pub trait TableRow: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Remote table name.
    const TABLE: &'static str;

    /// Row identifier, used for update/delete targeting.
    fn id(&self) -> Uuid;
}

/// Remote row for the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price: Money,
}

impl TableRow for ProductRow {
    const TABLE: &'static str = "products";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        ProductRow {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
        }
    }
}

impl ProductRow {
    /// Converts a remote row back into a domain record.
    pub fn into_record(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            synced: true,
        }
    }
}

/// Remote row for the `sales` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl TableRow for SaleRow {
    const TABLE: &'static str = "sales";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<&Sale> for SaleRow {
    fn from(sale: &Sale) -> Self {
        SaleRow {
            id: sale.id,
            product_id: sale.product_id,
            product_name: sale.product_name.clone(),
            quantity: sale.quantity,
            total: sale.total,
            created_at: sale.created_at,
        }
    }
}

impl SaleRow {
    pub fn into_record(self) -> Sale {
        Sale {
            id: self.id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            total: self.total,
            created_at: self.created_at,
            synced: true,
        }
    }
}

/// Remote row for the `costs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRow {
    pub id: Uuid,
    pub description: String,
    pub amount: Money,
    pub category: CostCategory,
    pub occurred_at: DateTime<Utc>,
}

impl TableRow for CostRow {
    const TABLE: &'static str = "costs";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<&Cost> for CostRow {
    fn from(cost: &Cost) -> Self {
        CostRow {
            id: cost.id,
            description: cost.description.clone(),
            amount: cost.amount,
            category: cost.category,
            occurred_at: cost.occurred_at,
        }
    }
}

impl CostRow {
    pub fn into_record(self) -> Cost {
        Cost {
            id: self.id,
            description: self.description,
            amount: self.amount,
            category: self.category,
            occurred_at: self.occurred_at,
            synced: true,
        }
    }
}

// =============================================================================
// Record Table Trait
// =============================================================================

/// Contract of a single remote collection table.
///
/// The trait is the seam the engine is tested through: production uses
/// [`RestTable`], tests substitute an in-memory fake with failure
/// injection.
#[async_trait]
pub trait RecordTable<R: TableRow>: Send + Sync {
    /// Writes a row, replacing any existing row with the same identifier
    /// (upsert). Duplicate pushes of an already-present id must not create
    /// a second row.
    async fn insert(&self, row: &R) -> SyncResult<()>;

    /// Fetches the full table contents.
    async fn select_all(&self) -> SyncResult<Vec<R>>;

    /// Updates the row matching `row.id()`.
    async fn update_by_id(&self, row: &R) -> SyncResult<()>;

    /// Deletes the row with the given identifier.
    async fn delete_by_id(&self, id: Uuid) -> SyncResult<()>;
}

// =============================================================================
// REST Implementation
// =============================================================================

/// PostgREST-style table client.
pub struct RestTable<R> {
    client: Client,
    base: Url,
    api_key: Option<String>,
    timeout: Duration,
    _row: PhantomData<fn() -> R>,
}

impl<R: TableRow> RestTable<R> {
    /// Creates a table client against `base` (e.g.
    /// `https://example.supabase.co/rest/v1`).
    pub fn new(
        client: Client,
        base: &Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> SyncResult<Self> {
        // Url::join treats a path without a trailing slash as a file and
        // would drop the last segment, so normalize here.
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(RestTable {
            client,
            base,
            api_key,
            timeout,
            _row: PhantomData,
        })
    }

    fn table_url(&self) -> SyncResult<Url> {
        self.base.join(R::TABLE).map_err(SyncError::from)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url).timeout(self.timeout);
        if let Some(ref key) = self.api_key {
            req = req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    fn map_transport(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout.as_secs())
        } else {
            SyncError::RemoteUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl<R: TableRow> RecordTable<R> for RestTable<R> {
    async fn insert(&self, row: &R) -> SyncResult<()> {
        debug!(table = R::TABLE, id = %row.id(), "remote upsert");

        self.request(reqwest::Method::POST, self.table_url()?)
            // merge-duplicates makes the insert an upsert-by-primary-key
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?
            .error_for_status()
            .map_err(|e| self.map_transport(e))?;

        Ok(())
    }

    async fn select_all(&self) -> SyncResult<Vec<R>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("select", "*");

        debug!(table = R::TABLE, "remote select_all");

        let rows = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?
            .error_for_status()
            .map_err(|e| self.map_transport(e))?
            .json::<Vec<R>>()
            .await
            .map_err(|e| self.map_transport(e))?;

        Ok(rows)
    }

    async fn update_by_id(&self, row: &R) -> SyncResult<()> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", row.id()));

        debug!(table = R::TABLE, id = %row.id(), "remote update");

        self.request(reqwest::Method::PATCH, url)
            .json(row)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?
            .error_for_status()
            .map_err(|e| self.map_transport(e))?;

        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> SyncResult<()> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        debug!(table = R::TABLE, id = %id, "remote delete");

        self.request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?
            .error_for_status()
            .map_err(|e| self.map_transport(e))?;

        Ok(())
    }
}

// =============================================================================
// Remote Ledger
// =============================================================================

/// The three remote tables bundled for the engine.
#[derive(Clone)]
pub struct RemoteLedger {
    pub products: Arc<dyn RecordTable<ProductRow>>,
    pub costs: Arc<dyn RecordTable<CostRow>>,
    pub sales: Arc<dyn RecordTable<SaleRow>>,
}

impl RemoteLedger {
    /// Builds REST tables from the sync configuration.
    ///
    /// The caller should have checked [`SyncConfig::is_remote_enabled`];
    /// an empty base URL fails here as `InvalidUrl`.
    pub fn rest(config: &SyncConfig) -> SyncResult<Self> {
        let base = config.remote_url()?;
        let timeout = config.timeout();
        let api_key = config.remote.api_key.clone();
        let client = Client::new();

        let products =
            RestTable::<ProductRow>::new(client.clone(), &base, api_key.clone(), timeout)?;
        let costs = RestTable::<CostRow>::new(client.clone(), &base, api_key.clone(), timeout)?;
        let sales = RestTable::<SaleRow>::new(client, &base, api_key, timeout)?;

        Ok(RemoteLedger {
            products: Arc::new(products),
            costs: Arc::new(costs),
            sales: Arc::new(sales),
        })
    }

    /// Bundles arbitrary table implementations (tests use this with
    /// in-memory fakes).
    pub fn from_tables(
        products: Arc<dyn RecordTable<ProductRow>>,
        costs: Arc<dyn RecordTable<CostRow>>,
        sales: Arc<dyn RecordTable<SaleRow>>,
    ) -> Self {
        RemoteLedger {
            products,
            costs,
            sales,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
