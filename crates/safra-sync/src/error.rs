//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Remote      │  │     Local       │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ RemoteUnavail.  │  │  Storage        │  │  Config                 │ │
//! │  │ Timeout         │  │  Serialization  │  │  InvalidUrl             │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  PROPAGATION POLICY: remote failures never interrupt a user action     │
//! │  that already succeeded locally. The engine inspects the error, logs   │
//! │  it, and leaves the record Unsynced for the next reconciliation.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Network or backend failure during a remote table call.
    ///
    /// The record involved stays `Unsynced`; local state is preserved.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A remote call exceeded its deadline.
    ///
    /// Treated identically to `RemoteUnavailable` by the engine; the
    /// variant exists so logs can tell a dead link from a slow one.
    #[error("remote call timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Local persistence failed.
    #[error("local store error: {0}")]
    Storage(#[from] safra_store::StoreError),

    /// A payload could not be encoded or decoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid or unreadable sync configuration.
    #[error("invalid sync configuration: {0}")]
    Config(String),

    /// Invalid remote base URL.
    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        // Timeouts are mapped where the deadline is known (see RestTable);
        // anything arriving here is a generic transport/backend failure.
        SyncError::RemoteUnavailable(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true for failures of the remote side only, the kind the
    /// engine silently degrades on, leaving the record `Unsynced`.
    pub fn is_remote_fault(&self) -> bool {
        matches!(self, SyncError::RemoteUnavailable(_) | SyncError::Timeout(_))
    }
}
