//! # Domain Types
//!
//! Core domain types used throughout Niaga.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Business     │   │      Item       │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  business_id    │   │  business_id    │       │
//! │  │  name           │   │  code (kode)    │   │  no_transaksi   │       │
//! │  └─────────────────┘   │  stock          │   │  grand_total    │       │
//! │                        │  cost_price     │   └────────┬────────┘       │
//! │                        │  selling_price  │            │ 1..n           │
//! │                        └────────▲────────┘   ┌────────▼────────┐       │
//! │                                 └────────────│    SaleLine     │       │
//! │                                              │  quantity       │       │
//! │                                              │  unit_price     │       │
//! │                                              │  discount %     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Rust fields use English names. The serialized names follow the JSON
//! contract the POS frontend already speaks (`kodeItem`, `hargaPokok`,
//! `noTransaksi`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{DiscountPercent, Money, Quantity};

// =============================================================================
// Role
// =============================================================================

/// Caller role, decided by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Business owner. Sees cost prices and inventory valuation.
    Owner,
    /// Staff administrator. Cost-sensitive fields are hidden.
    Admin,
}

impl Role {
    /// Whether this role may see cost prices (`hargaPokok`, `hpp`, `nilai`).
    #[inline]
    pub const fn can_see_cost(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

// =============================================================================
// Business
// =============================================================================

/// Tenant boundary. Every item and sale belongs to exactly one business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Item
// =============================================================================

/// A catalog item with its current stock and weighted-average cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business this item belongs to.
    pub business_id: String,

    /// Item code, unique within the business.
    #[serde(rename = "kodeItem")]
    pub code: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to the cashier and on receipts.
    #[serde(rename = "namaItem")]
    pub name: String,

    /// Quantity on hand. Never negative after a committed operation.
    pub stock: Quantity,

    /// Unit of measure (pcs, meter, unit, ...).
    #[serde(rename = "satuan")]
    pub unit: String,

    #[serde(rename = "merek")]
    pub brand: Option<String>,

    /// Warranty label printed on receipts.
    #[serde(rename = "garansi")]
    pub warranty: Option<String>,

    /// Weighted-average unit cost (HPP). Hidden from non-owner roles.
    #[serde(rename = "hargaPokok")]
    pub cost_price: Money,

    /// Unit selling price.
    #[serde(rename = "hargaJual")]
    pub selling_price: Money,

    /// Currency code (ISO 4217).
    #[serde(rename = "mataUang")]
    pub currency: String,

    /// Inactive items stay in history but are no longer offered.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
}

impl Item {
    /// Inventory value at average cost (`stock × hargaPokok`).
    pub fn stock_value(&self) -> Option<Money> {
        self.cost_price.checked_mul_quantity(self.stock)
    }

    /// Whether `quantity` can be taken out of stock.
    pub fn can_sell(&self, quantity: Quantity) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub business_id: String,
    #[serde(rename = "kodeItem")]
    pub code: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(rename = "namaItem")]
    pub name: String,
    /// Opening stock.
    #[serde(default)]
    pub stock: Quantity,
    #[serde(rename = "satuan")]
    pub unit: String,
    #[serde(rename = "merek", default)]
    pub brand: Option<String>,
    #[serde(rename = "garansi", default)]
    pub warranty: Option<String>,
    /// Opening unit cost for the opening stock.
    #[serde(rename = "hargaPokok", default)]
    pub cost_price: Money,
    #[serde(rename = "hargaJual")]
    pub selling_price: Money,
    #[serde(rename = "mataUang", default)]
    pub currency: Option<String>,
}

/// Partial update of catalog attributes.
///
/// Stock and cost are deliberately absent: they only move through a restock
/// or a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(rename = "kodeItem", default)]
    pub code: Option<String>,
    /// `Some(None)` clears the barcode.
    #[serde(default)]
    pub barcode: Option<Option<String>>,
    #[serde(rename = "namaItem", default)]
    pub name: Option<String>,
    #[serde(rename = "satuan", default)]
    pub unit: Option<String>,
    #[serde(rename = "merek", default)]
    pub brand: Option<Option<String>>,
    #[serde(rename = "garansi", default)]
    pub warranty: Option<Option<String>>,
    #[serde(rename = "hargaJual", default)]
    pub selling_price: Option<Money>,
    #[serde(rename = "mataUang", default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ItemPatch {
    /// Applies the patch to `item` in place.
    pub fn apply_to(self, item: &mut Item) {
        if let Some(code) = self.code {
            item.code = code.trim().to_string();
        }
        if let Some(barcode) = self.barcode {
            item.barcode = barcode;
        }
        if let Some(name) = self.name {
            item.name = name.trim().to_string();
        }
        if let Some(unit) = self.unit {
            item.unit = unit.trim().to_string();
        }
        if let Some(brand) = self.brand {
            item.brand = brand;
        }
        if let Some(warranty) = self.warranty {
            item.warranty = warranty;
        }
        if let Some(price) = self.selling_price {
            item.selling_price = price;
        }
        if let Some(currency) = self.currency {
            item.currency = currency;
        }
        if let Some(active) = self.is_active {
            item.is_active = active;
        }
    }
}

/// A restock event: incoming goods at a purchase price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restock {
    /// Incoming quantity, must be > 0.
    pub qty: Quantity,

    /// Unit purchase price of the incoming goods.
    #[serde(rename = "hargaBeli")]
    pub purchase_price: Money,

    /// New selling price; `None` leaves it unchanged.
    #[serde(rename = "hargaJual", default)]
    pub selling_price: Option<Money>,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub business_id: String,

    /// Human-facing transaction number, unique across the store.
    #[serde(rename = "noTransaksi")]
    pub transaction_number: String,

    #[serde(rename = "pelanggan")]
    pub customer: Option<String>,

    pub sub_total: Money,
    pub grand_total: Money,

    #[serde(rename = "keterangan")]
    pub note: Option<String>,

    /// Business date/time of the sale.
    #[serde(rename = "tanggal")]
    pub sold_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// A line of a sale. Unit price and unit are frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,

    #[serde(rename = "jumlah")]
    pub quantity: Quantity,

    #[serde(rename = "harga")]
    pub unit_price: Money,

    #[serde(rename = "satuan")]
    pub unit: String,

    #[serde(rename = "potPersen")]
    pub discount_percent: DiscountPercent,

    /// `harga × jumlah × (1 − potPersen/100)`.
    pub total: Money,

    #[serde(rename = "keterangan")]
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A sale together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleLine>,
}

/// Request to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub business_id: String,

    /// Externally supplied transaction number; generated when absent.
    #[serde(rename = "noTransaksi", default)]
    pub transaction_number: Option<String>,

    #[serde(rename = "pelanggan", default)]
    pub customer: Option<String>,

    #[serde(rename = "keterangan", default)]
    pub note: Option<String>,

    /// Cart lines, in order.
    #[serde(rename = "items")]
    pub lines: Vec<NewSaleLine>,
}

/// One requested cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleLine {
    pub item_id: String,

    #[serde(rename = "jumlah")]
    pub quantity: Quantity,

    #[serde(rename = "harga")]
    pub unit_price: Money,

    #[serde(rename = "satuan")]
    pub unit: String,

    #[serde(rename = "potPersen", default)]
    pub discount_percent: Option<DiscountPercent>,

    #[serde(rename = "keterangan", default)]
    pub note: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_item() -> Item {
        let now = Utc::now();
        Item {
            id: "item-1".to_string(),
            business_id: "biz-1".to_string(),
            code: "AC-001".to_string(),
            barcode: None,
            name: "Freon R32".to_string(),
            stock: Quantity::from_units(10),
            unit: "kg".to_string(),
            brand: Some("Daikin".to_string()),
            warranty: None,
            cost_price: Money::from_units(5_000),
            selling_price: Money::from_units(7_500),
            currency: "IDR".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn test_role_cost_visibility() {
        assert!(Role::Owner.can_see_cost());
        assert!(!Role::Admin.can_see_cost());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"OWNER\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_item_wire_names() {
        let json = serde_json::to_value(sample_item()).unwrap();
        assert_eq!(json["kodeItem"], "AC-001");
        assert_eq!(json["namaItem"], "Freon R32");
        assert_eq!(json["hargaPokok"], "5000");
        assert_eq!(json["businessId"], "biz-1");
        assert!(json.get("costPrice").is_none());
    }

    #[test]
    fn test_item_stock_value_and_can_sell() {
        let item = sample_item();
        assert_eq!(item.stock_value(), Some(Money::from_units(50_000)));
        assert!(item.can_sell(Quantity::from_units(10)));
        assert!(!item.can_sell(Quantity::from_decimal(dec!(10.5))));
    }

    #[test]
    fn test_patch_never_touches_stock_or_cost() {
        let mut item = sample_item();
        let patch = ItemPatch {
            name: Some("  Freon R32 1kg ".to_string()),
            barcode: Some(Some("899123".to_string())),
            brand: Some(None),
            selling_price: Some(Money::from_units(8_000)),
            is_active: Some(false),
            ..Default::default()
        };
        patch.apply_to(&mut item);

        assert_eq!(item.name, "Freon R32 1kg");
        assert_eq!(item.barcode.as_deref(), Some("899123"));
        assert_eq!(item.brand, None);
        assert_eq!(item.selling_price, Money::from_units(8_000));
        assert!(!item.is_active);
        assert_eq!(item.stock, Quantity::from_units(10));
        assert_eq!(item.cost_price, Money::from_units(5_000));
    }

    #[test]
    fn test_new_sale_deserializes_from_cart_payload() {
        let payload = r#"{
            "businessId": "biz-1",
            "pelanggan": "Budi",
            "items": [
                { "itemId": "item-1", "jumlah": 3, "harga": 10000, "satuan": "pcs", "potPersen": 10 },
                { "itemId": "item-2", "jumlah": "1.5", "harga": "2000", "satuan": "m" }
            ]
        }"#;

        let sale: NewSale = serde_json::from_str(payload).unwrap();
        assert_eq!(sale.transaction_number, None);
        assert_eq!(sale.customer.as_deref(), Some("Budi"));
        assert_eq!(sale.lines.len(), 2);
        assert_eq!(sale.lines[0].discount_percent, Some(DiscountPercent::from_units(10)));
        assert_eq!(sale.lines[1].quantity, Quantity::from_decimal(dec!(1.5)));
        assert_eq!(sale.lines[1].discount_percent, None);
    }
}
