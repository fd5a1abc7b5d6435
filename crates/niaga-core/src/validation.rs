//! # Validation Module
//!
//! Input validation for Niaga requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP / UI)                                           │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: niaga-service                                                │
//! │  └── THIS MODULE: field rules, run before any persistence              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (business_id, kode_item), UNIQUE (no_transaksi)            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use niaga_core::validation::{validate_item_code, validate_quantity};
//! use niaga_core::Quantity;
//!
//! validate_item_code("AC-001").unwrap();
//! validate_quantity("jumlah", Quantity::from_units(5)).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountPercent, Money, Quantity};
use crate::types::{ItemPatch, NewItem, NewSale, Restock};
use crate::MAX_SALE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_UNIT_LEN: usize = 20;
const MAX_TRANSACTION_NUMBER_LEN: usize = 50;
const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates an item code (`kodeItem`).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, `-`, `_`, `.` and `/` only
///
/// ## Example
/// ```rust
/// use niaga_core::validation::validate_item_code;
///
/// assert!(validate_item_code("AC-001").is_ok());
/// assert!(validate_item_code("PIPA/3.8").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("has space").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = required_trimmed("kodeItem", code, MAX_CODE_LEN)?;

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "kodeItem".to_string(),
            reason: "must contain only letters, numbers, '-', '_', '.' and '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates an item name (`namaItem`): required, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required_trimmed("namaItem", name, MAX_NAME_LEN).map(|_| ())
}

/// Validates a unit of measure (`satuan`): required, at most 20 characters.
pub fn validate_unit(field: &str, unit: &str) -> ValidationResult<()> {
    required_trimmed(field, unit, MAX_UNIT_LEN).map(|_| ())
}

/// Validates a currency code: exactly three ASCII uppercase letters.
///
/// ```rust
/// use niaga_core::validation::validate_currency;
///
/// assert!(validate_currency("IDR").is_ok());
/// assert!(validate_currency("idr").is_err());
/// ```
pub fn validate_currency(currency: &str) -> ValidationResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "mataUang".to_string(),
            reason: "must be a 3-letter uppercase currency code".to_string(),
        });
    }

    Ok(())
}

/// Validates a caller-supplied transaction number (`noTransaksi`).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace anywhere
pub fn validate_transaction_number(number: &str) -> ValidationResult<()> {
    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "noTransaksi".to_string(),
        });
    }

    if number.chars().count() > MAX_TRANSACTION_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "noTransaksi".to_string(),
            max: MAX_TRANSACTION_NUMBER_LEN,
        });
    }

    if number.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "noTransaksi".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (lists everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or restock quantity: strictly greater than zero.
pub fn validate_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price or cost. Zero is allowed (free items, gifts).
///
/// ```rust
/// use niaga_core::validation::validate_price;
/// use niaga_core::Money;
///
/// assert!(validate_price("harga", Money::from_units(10_000)).is_ok());
/// assert!(validate_price("harga", Money::zero()).is_ok());
/// assert!(validate_price("harga", Money::from_units(-1)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line discount: 0 to 100 percent inclusive.
pub fn validate_discount_percent(field: &str, discount: DiscountPercent) -> ValidationResult<()> {
    let value = discount.value();
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use niaga_core::validation::validate_uuid;
///
/// assert!(validate_uuid("itemId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("itemId", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a sale request before anything is written.
///
/// Checks line count first, then every line in order. Field names in errors
/// point at the offending line (`items[2].jumlah`).
pub fn validate_new_sale(sale: &NewSale) -> CoreResult<()> {
    validate_uuid("businessId", &sale.business_id)?;

    if sale.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    if sale.lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    if let Some(number) = &sale.transaction_number {
        validate_transaction_number(number)?;
    }

    for (index, line) in sale.lines.iter().enumerate() {
        let field = |name: &str| format!("items[{index}].{name}");

        validate_uuid(&field("itemId"), &line.item_id)?;
        validate_quantity(&field("jumlah"), line.quantity)?;
        validate_price(&field("harga"), line.unit_price)?;
        validate_unit(&field("satuan"), &line.unit)?;
        if let Some(discount) = line.discount_percent {
            validate_discount_percent(&field("potPersen"), discount)?;
        }
    }

    Ok(())
}

/// Validates a new catalog item.
pub fn validate_new_item(item: &NewItem) -> CoreResult<()> {
    validate_uuid("businessId", &item.business_id)?;
    validate_item_code(&item.code)?;
    validate_item_name(&item.name)?;
    validate_unit("satuan", &item.unit)?;

    if item.stock.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        }
        .into());
    }

    validate_price("hargaPokok", item.cost_price)?;
    validate_price("hargaJual", item.selling_price)?;

    if let Some(currency) = &item.currency {
        validate_currency(currency)?;
    }

    Ok(())
}

/// Validates the fields present in an item patch.
pub fn validate_item_patch(patch: &ItemPatch) -> CoreResult<()> {
    if let Some(code) = &patch.code {
        validate_item_code(code)?;
    }
    if let Some(name) = &patch.name {
        validate_item_name(name)?;
    }
    if let Some(unit) = &patch.unit {
        validate_unit("satuan", unit)?;
    }
    if let Some(price) = patch.selling_price {
        validate_price("hargaJual", price)?;
    }
    if let Some(currency) = &patch.currency {
        validate_currency(currency)?;
    }

    Ok(())
}

/// Validates a restock event.
pub fn validate_restock(restock: &Restock) -> CoreResult<()> {
    validate_quantity("qty", restock.qty)?;
    validate_price("hargaBeli", restock.purchase_price)?;
    if let Some(price) = restock.selling_price {
        validate_price("hargaJual", price)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
