//! # niaga-core: Pure Business Logic for Niaga
//!
//! This crate holds the arithmetic and rules behind selling and restocking,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Niaga Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Outer layer (HTTP / UI, not in workspace)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    niaga-service                                │   │
//! │  │    SaleRecorder, CostAverager, ItemService, ReportService       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ niaga-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │  money  │ │ pricing │ │ costing │ │visibility│ │   │
//! │  │   │  Item   │ │  Money  │ │ line    │ │ weighted│ │ RoleView │ │   │
//! │  │   │  Sale   │ │Quantity │ │ totals  │ │ average │ │ redact   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    niaga-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Business, Item, Sale, SaleLine, requests)
//! - [`money`] - Decimal `Money`, `Quantity` and `DiscountPercent`
//! - [`pricing`] - Line totals with percentage discounts, sale totals
//! - [`report`] - Inventory, dashboard and receipt payloads
//! - [`costing`] - Weighted-average cost on restock, stock issue on sale
//! - [`visibility`] - Per-role response shapes (cost price hiding)
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use niaga_core::money::{DiscountPercent, Money, Quantity};
//! use niaga_core::pricing::line_total;
//!
//! let price = Money::from_units(10_000);
//! let total = line_total(price, Quantity::from_units(3), DiscountPercent::from_units(10)).unwrap();
//! assert_eq!(total, Money::from_units(27_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;
pub mod visibility;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountPercent, Money, Quantity};
pub use report::{DashboardStats, InventoryRow, Receipt, ReceiptLine, RecentSale, TopItem};
pub use types::*;
pub use visibility::{CostSensitive, RoleView};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a sale inside one short transaction.
pub const MAX_SALE_LINES: usize = 100;

/// Currency used when an item is created without one.
pub const DEFAULT_CURRENCY: &str = "IDR";
