//! # Local Ledger Store
//!
//! Key-scoped persistent mapping from a collection name to the serialized
//! ordered sequence of its records.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Local Ledger Store                               │
//! │                                                                         │
//! │  write("products", &[p1, p2, p3])                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ ledger (key TEXT PK, payload TEXT)      │                           │
//! │  │                                         │                           │
//! │  │ products │ [{"id":…,"synced":false},…]  │                           │
//! │  │ sales    │ [{"id":…,"total":3000},…]    │                           │
//! │  │ costs    │ [{"id":…,"amount":700},…]    │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read("products", fallback: vec![]) ──► Vec<Product>                   │
//! │                                                                         │
//! │  FAULT TOLERANCE:                                                      │
//! │  • missing key        → fallback                                       │
//! │  • corrupt payload    → fallback (logged)                              │
//! │  • query failure      → fallback (logged)                              │
//! │  The read path NEVER returns an error: the in-memory ledger must       │
//! │  always be renderable even on a broken disk.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Better crash recovery

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Configuration
// =============================================================================

/// Local store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("/path/to/safra.db").max_connections(2);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 2 (one ledger writer, one background reader is plenty)
    pub max_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,
}

impl StoreConfig {
    /// Creates a new store configuration with the given path.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Creates an in-memory store configuration (for testing).
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            // In-memory requires a single connection
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Local Store
// =============================================================================

/// Durable key/payload store backing the ledger collections.
///
/// One row per collection; the payload is the JSON serialization of the
/// full ordered record sequence, `synced` flags included. The store is the
/// source of truth for availability: it must work with no network at all.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite: WAL journal, NORMAL synchronous
    /// 3. Creates the ledger table if missing
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "opening local store"
        );

        // sqlite://path with mode=rwc creates the file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::Open(e.to_string()))?
            // WAL mode: better concurrent read performance and crash recovery
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: safe from corruption, may lose the last
            // transaction on power failure
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        let store = LocalStore { pool };
        store.init_schema().await?;

        Ok(store)
    }

    /// Opens an isolated in-memory store (for testing).
    pub async fn in_memory() -> StoreResult<Self> {
        LocalStore::open(StoreConfig::in_memory()).await
    }

    /// Creates the ledger table if it doesn't exist yet.
    ///
    /// Deliberately `CREATE TABLE IF NOT EXISTS` rather than a migration
    /// framework: the store has a single table whose payloads are opaque
    /// JSON, so there is no schema to evolve.
    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger (
                key        TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads the record sequence stored under `key`.
    ///
    /// ## Fault Tolerance
    /// Every failure mode (missing key, corrupt payload, query error)
    /// degrades to the caller-supplied `fallback` and is logged. The read
    /// path never errors: the display layer must always have something to
    /// render, and the sync engine must always have a ledger to start from.
    pub async fn read<T>(&self, key: &str, fallback: Vec<T>) -> Vec<T>
    where
        T: DeserializeOwned,
    {
        let row = match sqlx::query("SELECT payload FROM ledger WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                warn!(key = %key, error = %e, "ledger read failed, using fallback");
                return fallback;
            }
        };

        let Some(row) = row else {
            debug!(key = %key, "no stored payload, using fallback");
            return fallback;
        };

        let payload: String = match row.try_get("payload") {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "ledger payload unreadable, using fallback");
                return fallback;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %key, error = %e, "corrupt ledger payload, using fallback");
                fallback
            }
        }
    }

    /// Writes the full record sequence under `key`, replacing any previous
    /// payload.
    ///
    /// Write failures surface as an explicit `StoreError`; the caller
    /// decides what to do with them. The sync engine logs and swallows:
    /// the in-memory state stays authoritative for the session even when
    /// persistence silently fails.
    pub async fn write<T>(&self, key: &str, records: &[T]) -> StoreResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_string(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        debug!(key = %key, bytes = payload.len(), "persisting ledger payload");

        sqlx::query(
            r#"
            INSERT INTO ledger (key, payload, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns a reference to the connection pool (advanced use/tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the connection pool.
    pub async fn close(&self) {
        info!("closing local store");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
