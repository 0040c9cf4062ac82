//! # safra-core: Pure Domain Logic for Safra
//!
//! This crate is the **heart** of Safra. It contains all domain logic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Safra Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Display layer (external)                    │   │
//! │  │      reads the collections, calls the mutation entry points     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    safra-sync (Sync Engine)                     │   │
//! │  │        dual-write orchestration, reconcile-on-reconnect         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ safra-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ validation│  │  report   │  │   │
//! │  │   │  Product  │  │   Money   │  │   rules   │  │ summaries │  │   │
//! │  │   │ Sale/Cost │  │  parsing  │  │  checks   │  │ text dump │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Record types (Product, Sale, Cost) and the collections
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`report`] - Ledger summaries and text export
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use safra_core::Money` instead of
// `use safra_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use report::{render_text, summarize, LedgerSummary};
pub use types::{Collection, Cost, CostCategory, Product, Sale};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single sale.
///
/// ## Why a limit?
/// Prevents accidental over-recording (e.g., typing 1000 instead of 10).
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a cost description.
pub const MAX_DESCRIPTION_LEN: usize = 500;
