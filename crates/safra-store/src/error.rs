//! # Store Error Types
//!
//! Error types for local persistence.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ├── read path:  caught inside the store, degrades to fallback    │
//! │       │               (a render path must never fail on a storage      │
//! │       │               fault)                                           │
//! │       │                                                                 │
//! │       └── write path: returned to the sync engine, which logs it and   │
//! │                       keeps the in-memory state authoritative          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Local persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database file could not be opened or created.
    ///
    /// ## When This Occurs
    /// - File permissions issue
    /// - Disk full
    /// - Invalid path
    #[error("failed to open store: {0}")]
    Open(String),

    /// Query execution failed.
    #[error("store query failed: {0}")]
    Query(String),

    /// A stored payload could not be decoded.
    ///
    /// ## When This Occurs
    /// - Partial write from a crashed process
    /// - Hand-edited database file
    ///
    /// The read path converts this to the caller's fallback; it only
    /// escapes through the write path if serialization itself fails.
    #[error("corrupt payload for key '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// A record sequence could not be serialized for storage.
    #[error("failed to serialize payload: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
