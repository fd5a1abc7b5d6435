//! # Cost Price Visibility
//!
//! Per-role response shapes. Owners see cost price (`hargaPokok`), average
//! cost (`hpp`) and inventory value (`nilai`); admins get the same payload
//! with those fields absent.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Item ──────────────┐                                                  │
//! │   InventoryRow ──────┤  CostSensitive::redact()                         │
//! │   DashboardStats ────┤  ────────────────────────►  ItemSummary          │
//! │   Vec<T> ────────────┘                             InventoryRowSummary  │
//! │                                                    DashboardSummary     │
//! │                                                    Vec<T::Redacted>     │
//! │                                                                         │
//! │   RoleView::for_role(Role::Owner, v)  →  Full(v)                        │
//! │   RoleView::for_role(Role::Admin, v)  →  Redacted(v.redact())           │
//! │                                                                         │
//! │   Both variants serialize as the inner value, so the caller sees the   │
//! │   same JSON with the sensitive keys missing.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A redacted type has no cost field at all, so there is nothing to forget
//! to strip.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::money::{Money, Quantity};
use crate::report::{DashboardStats, InventoryRow, RecentSale, TopItem};
use crate::types::{Item, Role};

// =============================================================================
// Trait and View
// =============================================================================

/// A payload that carries cost information and has a cost-free counterpart.
pub trait CostSensitive: Sized {
    type Redacted: Serialize + fmt::Debug + Clone + PartialEq;

    /// Drops every cost-sensitive field.
    fn redact(self) -> Self::Redacted;
}

/// A payload shaped for the caller's role.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleView<T: CostSensitive> {
    /// Owner view, everything included.
    Full(T),
    /// Admin view, cost fields removed.
    Redacted(T::Redacted),
}

impl<T: CostSensitive> RoleView<T> {
    pub fn for_role(role: Role, value: T) -> Self {
        if role.can_see_cost() {
            RoleView::Full(value)
        } else {
            RoleView::Redacted(value.redact())
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, RoleView::Redacted(_))
    }

    /// Full payload, if the caller was allowed to see it.
    pub fn full(&self) -> Option<&T> {
        match self {
            RoleView::Full(value) => Some(value),
            RoleView::Redacted(_) => None,
        }
    }

    pub fn into_full(self) -> Option<T> {
        match self {
            RoleView::Full(value) => Some(value),
            RoleView::Redacted(_) => None,
        }
    }

    pub fn redacted(&self) -> Option<&T::Redacted> {
        match self {
            RoleView::Full(_) => None,
            RoleView::Redacted(value) => Some(value),
        }
    }
}

impl<T> Serialize for RoleView<T>
where
    T: CostSensitive + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RoleView::Full(value) => value.serialize(serializer),
            RoleView::Redacted(value) => value.serialize(serializer),
        }
    }
}

impl<T: CostSensitive> CostSensitive for Vec<T> {
    type Redacted = Vec<T::Redacted>;

    fn redact(self) -> Self::Redacted {
        self.into_iter().map(CostSensitive::redact).collect()
    }
}

// =============================================================================
// Item
// =============================================================================

/// [`Item`] without `hargaPokok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: String,
    pub business_id: String,
    #[serde(rename = "kodeItem")]
    pub code: String,
    pub barcode: Option<String>,
    #[serde(rename = "namaItem")]
    pub name: String,
    pub stock: Quantity,
    #[serde(rename = "satuan")]
    pub unit: String,
    #[serde(rename = "merek")]
    pub brand: Option<String>,
    #[serde(rename = "garansi")]
    pub warranty: Option<String>,
    #[serde(rename = "hargaJual")]
    pub selling_price: Money,
    #[serde(rename = "mataUang")]
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl CostSensitive for Item {
    type Redacted = ItemSummary;

    fn redact(self) -> ItemSummary {
        ItemSummary {
            id: self.id,
            business_id: self.business_id,
            code: self.code,
            barcode: self.barcode,
            name: self.name,
            stock: self.stock,
            unit: self.unit,
            brand: self.brand,
            warranty: self.warranty,
            selling_price: self.selling_price,
            currency: self.currency,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// [`InventoryRow`] without `hpp` and `nilai`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRowSummary {
    #[serde(rename = "kode")]
    pub code: String,
    #[serde(rename = "nama_produk")]
    pub name: String,
    #[serde(rename = "umur_hari")]
    pub age_days: i64,
    #[serde(rename = "saldo")]
    pub stock: Quantity,
    #[serde(rename = "satuan")]
    pub unit: String,
    #[serde(rename = "keterangan")]
    pub note: String,
}

impl CostSensitive for InventoryRow {
    type Redacted = InventoryRowSummary;

    fn redact(self) -> InventoryRowSummary {
        InventoryRowSummary {
            code: self.code,
            name: self.name,
            age_days: self.age_days,
            stock: self.stock,
            unit: self.unit,
            note: self.note,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// [`DashboardStats`] whose low-stock list carries [`ItemSummary`] entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    #[serde(rename = "totalPenjualan")]
    pub total_sales: Money,
    #[serde(rename = "totalTransaksi")]
    pub transaction_count: i64,
    #[serde(rename = "totalItems")]
    pub total_items: i64,
    #[serde(rename = "lowStockItems")]
    pub low_stock_count: i64,
    #[serde(rename = "lowStockList")]
    pub low_stock_list: Vec<ItemSummary>,
    #[serde(rename = "recentSales")]
    pub recent_sales: Vec<RecentSale>,
    #[serde(rename = "topItems")]
    pub top_items: Vec<TopItem>,
}

impl CostSensitive for DashboardStats {
    type Redacted = DashboardSummary;

    fn redact(self) -> DashboardSummary {
        DashboardSummary {
            total_sales: self.total_sales,
            transaction_count: self.transaction_count,
            total_items: self.total_items,
            low_stock_count: self.low_stock_count,
            low_stock_list: self.low_stock_list.redact(),
            recent_sales: self.recent_sales,
            top_items: self.top_items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    const SENSITIVE_KEYS: [&str; 3] = ["hargaPokok", "hpp", "nilai"];

    fn item(code: &str, stock: i64) -> Item {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        Item {
            id: format!("id-{code}"),
            business_id: "biz-1".to_string(),
            code: code.to_string(),
            barcode: Some("899000".to_string()),
            name: format!("Item {code}"),
            stock: Quantity::from_units(stock),
            unit: "pcs".to_string(),
            brand: None,
            warranty: Some("1 tahun".to_string()),
            cost_price: Money::from_units(5_000),
            selling_price: Money::from_units(7_500),
            currency: "IDR".to_string(),
            is_active: true,
            created_at: at,
            updated_at: at,
            version: 3,
        }
    }

    fn row(code: &str) -> InventoryRow {
        InventoryRow {
            code: code.to_string(),
            name: format!("Item {code}"),
            age_days: 12,
            stock: Quantity::from_units(4),
            unit: "pcs".to_string(),
            cost: Money::from_units(5_000),
            value: Money::from_units(20_000),
            note: "-".to_string(),
        }
    }

    fn dashboard() -> DashboardStats {
        DashboardStats {
            total_sales: Money::from_units(27_000),
            transaction_count: 1,
            total_items: 2,
            low_stock_count: 2,
            low_stock_list: vec![item("A", 1), item("B", 2)],
            recent_sales: vec![RecentSale {
                id: "sale-1".to_string(),
                transaction_number: "TRX-1".to_string(),
                sold_at: Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap(),
                grand_total: Money::from_units(27_000),
                item_count: 1,
                customer: None,
            }],
            top_items: vec![TopItem {
                name: "Item A".to_string(),
                total_sold: Quantity::from_units(3),
            }],
        }
    }

    fn assert_no_sensitive_keys(value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, nested) in map {
                    assert!(
                        !SENSITIVE_KEYS.contains(&key.as_str()),
                        "found sensitive key {key}"
                    );
                    assert_no_sensitive_keys(nested);
                }
            }
            Value::Array(values) => values.iter().for_each(assert_no_sensitive_keys),
            _ => {}
        }
    }

    #[test]
    fn test_owner_sees_everything() {
        let view = RoleView::for_role(Role::Owner, item("A", 1));
        assert!(!view.is_redacted());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["hargaPokok"], "5000");
        assert_eq!(json, serde_json::to_value(item("A", 1)).unwrap());
    }

    #[test]
    fn test_admin_item_drops_only_cost() {
        let full = serde_json::to_value(item("A", 1)).unwrap();
        let view = RoleView::for_role(Role::Admin, item("A", 1));
        let redacted = serde_json::to_value(&view).unwrap();

        let mut expected = full.as_object().unwrap().clone();
        expected.remove("hargaPokok");
        assert_eq!(redacted, Value::Object(expected));
    }

    #[test]
    fn test_admin_item_preserves_key_order() {
        let view = RoleView::for_role(Role::Admin, item("A", 1));
        let text = serde_json::to_string(&view).unwrap();

        let position = |key: &str| text.find(&format!("\"{key}\"")).unwrap();
        assert!(position("kodeItem") < position("namaItem"));
        assert!(position("namaItem") < position("stock"));
        assert!(position("garansi") < position("hargaJual"));
        assert!(position("hargaJual") < position("mataUang"));
    }

    #[test]
    fn test_admin_inventory_list_is_stripped_element_wise() {
        let rows = vec![row("A"), row("B"), row("C")];
        let view = RoleView::for_role(Role::Admin, rows);
        let json = serde_json::to_value(&view).unwrap();

        assert_no_sensitive_keys(&json);
        let codes: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["kode"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert_eq!(json[0]["saldo"], "4");
        assert_eq!(json[0]["keterangan"], "-");
    }

    #[test]
    fn test_admin_dashboard_strips_nested_items() {
        let owner = serde_json::to_value(RoleView::for_role(Role::Owner, dashboard())).unwrap();
        assert_eq!(owner["lowStockList"][0]["hargaPokok"], "5000");

        let admin = serde_json::to_value(RoleView::for_role(Role::Admin, dashboard())).unwrap();
        assert_no_sensitive_keys(&admin);

        assert_eq!(admin["totalPenjualan"], "27000");
        assert_eq!(admin["lowStockList"].as_array().unwrap().len(), 2);
        assert_eq!(admin["lowStockList"][1]["kodeItem"], "B");
        assert_eq!(admin["recentSales"], owner["recentSales"]);
        assert_eq!(admin["topItems"], owner["topItems"]);
        assert_eq!(
            admin["recentSales"][0]["tanggal"],
            owner["recentSales"][0]["tanggal"]
        );
    }

    #[test]
    fn test_view_accessors() {
        let owner = RoleView::for_role(Role::Owner, item("A", 1));
        assert_eq!(owner.full().map(|i| i.code.as_str()), Some("A"));
        assert!(owner.redacted().is_none());

        let admin = RoleView::for_role(Role::Admin, item("A", 1));
        assert!(admin.full().is_none());
        assert_eq!(admin.redacted().map(|i| i.version), Some(3));
        assert!(admin.into_full().is_none());
    }
}
