//! # safra-store: Durable Local Store for Safra
//!
//! This crate provides local persistence for the ledger collections.
//! It uses SQLite (via sqlx) as a key/payload store: one row per
//! collection, holding the JSON serialization of the full ordered record
//! sequence.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Safra Data Flow                                 │
//! │                                                                         │
//! │  SyncEngine mutation (add_product, record_sale, …)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    safra-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   LocalStore::write(key, records)  ← persist unconditionally   │   │
//! │  │   LocalStore::read(key, fallback)  ← never fails, degrades     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode), survives process restarts            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why a key/payload table instead of one table per collection?
//! The store's contract is "collection name → serialized ordered sequence".
//! Keeping the payload opaque means the store needs no knowledge of record
//! shapes, no per-collection DDL, and no migration story: exactly the
//! availability-first role it plays. Relational queries belong to the
//! remote side.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod local;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, StoreConfig};
