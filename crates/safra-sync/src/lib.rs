//! # safra-sync: Sync Engine for Safra
//!
//! This crate provides the local-first synchronization layer for Safra,
//! enabling offline-first operation with best-effort mirroring to a remote
//! record store.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sync Engine Architecture                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   SyncEngine (Main Orchestrator)                 │  │
//! │  │                                                                  │  │
//! │  │  Owns the three collections, the local store handle, the        │  │
//! │  │  remote tables and the connectivity monitor. One per process.   │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  LocalStore    │  │  RemoteLedger  │  │ ConnectivityMonitor    │    │
//! │  │  (safra-store) │  │  (remote.rs)   │  │ (connectivity.rs)      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ persist-first, │  │ one REST table │  │ level + "became        │    │
//! │  │ fallback reads │  │ per collection │  │ online" edge events    │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  GUARANTEES:                                                           │
//! │  • Every mutation is locally durable before any network attempt        │
//! │  • Offline ⇒ zero remote calls; records wait tagged Unsynced           │
//! │  • Reconnect edge ⇒ one reconciliation sweep, products → costs →       │
//! │    sales, original insertion order within each collection              │
//! │  • An empty remote answer never erases non-empty local data            │
//! │  • Every remote call carries an explicit deadline                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - The `SyncEngine` orchestrator (dual writes, reconcile)
//! - [`remote`] - Remote record store: row types, table trait, REST client
//! - [`connectivity`] - Online/offline level and edge events
//! - [`config`] - Sync configuration (remote URL, API key, deadlines)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use safra_store::{LocalStore, StoreConfig};
//! use safra_sync::{ConnectivityMonitor, RemoteLedger, SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! let config = SyncConfig::load_or_default(None)?;
//! let local = LocalStore::open(StoreConfig::new("safra.db")).await?;
//!
//! let engine = Arc::new(if config.is_remote_enabled() {
//!     SyncEngine::new(
//!         local,
//!         RemoteLedger::rest(&config)?,
//!         ConnectivityMonitor::starting_offline(),
//!     )
//! } else {
//!     SyncEngine::local_only(local)
//! });
//!
//! engine.bootstrap_load().await;
//! engine.spawn_reconnect_listener();
//!
//! // the host platform feeds the connectivity signal:
//! engine.connectivity().set_online(true); // triggers a reconcile sweep
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod remote;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{RemoteConfig, SyncConfig};
pub use connectivity::{ConnectivityMonitor, OnlineEvents};
pub use engine::{ReconcileReport, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use remote::{CostRow, ProductRow, RecordTable, RemoteLedger, RestTable, SaleRow, TableRow};
