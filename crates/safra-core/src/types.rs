//! # Domain Types
//!
//! Core record types used throughout Safra.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │      Cost       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  product_id     │   │  description    │       │
//! │  │  price          │   │  product_name*  │   │  amount         │       │
//! │  │  synced         │   │  quantity       │   │  category       │       │
//! │  └─────────────────┘   │  total*         │   │  occurred_at    │       │
//! │                        │  created_at     │   │  synced         │       │
//! │                        │  synced         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  * frozen snapshots: a sale keeps the product name and the computed    │
//! │    total from the moment it was recorded. Renaming, repricing or       │
//! │    deleting the product never rewrites history.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The `synced` Flag
//! Every record carries exactly one `synced` boolean. `false` means the
//! record exists locally but its remote durability is unconfirmed. The sync
//! engine owns all transitions: a successful remote write flips it to
//! `true`; any further mutation resets it to `false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_description, validate_product_name, validate_quantity};

// =============================================================================
// Collection
// =============================================================================

/// One of the three independently synchronized record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Sales,
    Costs,
}

impl Collection {
    /// Storage key under which the collection's serialized sequence lives.
    #[inline]
    pub const fn key(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
            Collection::Costs => "costs",
        }
    }

    /// Fixed reconciliation order: products first, because sales and costs
    /// may reference product identifiers that should exist remotely before
    /// dependent records are pushed. Soft dependency only: a failure here
    /// is non-fatal.
    pub const RECONCILE_ORDER: [Collection; 3] =
        [Collection::Products, Collection::Costs, Collection::Sales];
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4, generated client-side, never reused).
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Unit price in centavos. Non-negative.
    pub price: Money,

    /// Whether the last known local state has been durably written remotely.
    pub synced: bool,
}

impl Product {
    /// Creates a new product after validating its inputs.
    ///
    /// A freshly created record is always `Unsynced`; the sync engine flips
    /// the flag once the remote write is confirmed.
    pub fn new(name: impl Into<String>, price: Money) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_product_name(&name)?;
        if price.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "price".to_string(),
            });
        }

        Ok(Product {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            price,
            synced: false,
        })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// Uses the snapshot pattern: product name and computed total are frozen at
/// the moment the sale is recorded. They are historical facts, not live
/// references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,

    /// The product this sale referenced at creation time.
    pub product_id: Uuid,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Units sold.
    pub quantity: i64,

    /// Total in centavos: unit price × quantity, computed once (frozen).
    pub total: Money,

    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,

    pub synced: bool,
}

impl Sale {
    /// Records a sale of `quantity` units of `product`.
    ///
    /// ## Snapshot Semantics
    /// ```text
    /// Product "Milho" @ 10.00  ──record(qty: 3)──►  Sale { total: 30.00 }
    ///        │
    ///        └── later repriced to 99.00 ──► Sale still reads 30.00
    /// ```
    pub fn record(product: &Product, quantity: i64) -> Result<Self, ValidationError> {
        validate_quantity(quantity)?;

        Ok(Sale {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            total: product.price.multiply_quantity(quantity),
            created_at: Utc::now(),
            synced: false,
        })
    }
}

// =============================================================================
// Cost Category
// =============================================================================

/// What kind of expense a cost entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    /// Seeds, fertilizer, feed and other consumables.
    Supply,
    /// Freight and fuel.
    Transport,
    /// Anything else.
    Other,
}

impl std::fmt::Display for CostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostCategory::Supply => write!(f, "supply"),
            CostCategory::Transport => write!(f, "transport"),
            CostCategory::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for CostCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "supply" => Ok(CostCategory::Supply),
            "transport" => Ok(CostCategory::Transport),
            "other" => Ok(CostCategory::Other),
            other => Err(ValidationError::InvalidFormat {
                field: "category".to_string(),
                reason: format!("unknown category '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Cost
// =============================================================================

/// An expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub id: Uuid,

    /// What the money was spent on.
    pub description: String,

    /// Amount in centavos. Non-negative.
    pub amount: Money,

    pub category: CostCategory,

    /// When the expense occurred.
    pub occurred_at: DateTime<Utc>,

    pub synced: bool,
}

impl Cost {
    /// Creates a new cost entry after validating its inputs.
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        category: CostCategory,
    ) -> Result<Self, ValidationError> {
        let description = description.into();
        validate_description(&description)?;
        if amount.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            });
        }

        Ok(Cost {
            id: Uuid::new_v4(),
            description: description.trim().to_string(),
            amount,
            category,
            occurred_at: Utc::now(),
            synced: false,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
