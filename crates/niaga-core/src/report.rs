//! # Report Payloads
//!
//! Shapes returned by the reporting operations. The aggregation itself runs
//! in niaga-service; these are plain data.
//!
//! Key naming differs per report to match what the existing screens read:
//! the inventory sheet and the receipt use snake_case keys, the dashboard
//! uses camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Quantity};
use crate::types::Item;

// =============================================================================
// Inventory
// =============================================================================

/// One line of the inventory valuation sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    #[serde(rename = "kode")]
    pub code: String,

    #[serde(rename = "nama_produk")]
    pub name: String,

    /// Whole days since the item was created.
    #[serde(rename = "umur_hari")]
    pub age_days: i64,

    #[serde(rename = "saldo")]
    pub stock: Quantity,

    #[serde(rename = "satuan")]
    pub unit: String,

    /// Average unit cost.
    #[serde(rename = "hpp")]
    pub cost: Money,

    /// `saldo × hpp`.
    #[serde(rename = "nilai")]
    pub value: Money,

    /// Brand, or `-` when the item has none.
    #[serde(rename = "keterangan")]
    pub note: String,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Today's figures plus short lists for the dashboard screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Sum of grand totals since local midnight.
    #[serde(rename = "totalPenjualan")]
    pub total_sales: Money,

    /// Number of sales since local midnight.
    #[serde(rename = "totalTransaksi")]
    pub transaction_count: i64,

    #[serde(rename = "totalItems")]
    pub total_items: i64,

    /// Number of items at or below the low-stock threshold.
    #[serde(rename = "lowStockItems")]
    pub low_stock_count: i64,

    /// Lowest-stock items first.
    #[serde(rename = "lowStockList")]
    pub low_stock_list: Vec<Item>,

    #[serde(rename = "recentSales")]
    pub recent_sales: Vec<RecentSale>,

    #[serde(rename = "topItems")]
    pub top_items: Vec<TopItem>,
}

/// A sale as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSale {
    pub id: String,
    #[serde(rename = "noTransaksi")]
    pub transaction_number: String,
    #[serde(rename = "tanggal")]
    pub sold_at: DateTime<Utc>,
    pub grand_total: Money,
    pub item_count: i64,
    #[serde(rename = "pelanggan")]
    pub customer: Option<String>,
}

/// An all-time best seller by summed quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub name: String,
    pub total_sold: Quantity,
}

// =============================================================================
// Receipt
// =============================================================================

/// Printable receipt for one sale. Carries no cost information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub store_name: String,
    pub transaction_no: String,
    pub date: DateTime<Utc>,
    /// Customer name, or the walk-in label.
    pub pelanggan: String,
    pub items: Vec<ReceiptLine>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub qty: Quantity,
    pub price: Money,
    pub total: Money,
    /// Warranty label of the item, if any.
    pub guarantee: Option<String>,
}
