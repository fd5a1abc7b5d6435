//! # Pricing
//!
//! Line totals and sale totals for the Sale Recorder.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sale Pricing Pipeline                              │
//! │                                                                         │
//! │  for each line:                                                         │
//! │     gross     = harga × jumlah                                          │
//! │     lineTotal = gross × (1 − potPersen / 100)                           │
//! │                                                                         │
//! │  subTotal   = Σ lineTotal                                               │
//! │  grandTotal = subTotal        (no tax or fee layer)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No intermediate rounding happens anywhere in the pipeline. Every step is
//! checked so an absurd cart returns [`CoreError::AmountOverflow`] instead of
//! panicking.

use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountPercent, Money, Quantity};
use crate::types::NewSaleLine;

/// A cart line with its computed total.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub item_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub unit: String,
    pub discount_percent: DiscountPercent,
    pub total: Money,
    pub note: Option<String>,
}

/// All lines of a sale, priced, plus the sale totals.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub sub_total: Money,
    pub grand_total: Money,
}

/// Computes `unit_price × quantity × (1 − discount/100)`.
///
/// ## Example
/// ```rust
/// use niaga_core::money::{DiscountPercent, Money, Quantity};
/// use niaga_core::pricing::line_total;
///
/// let total = line_total(
///     Money::from_units(10_000),
///     Quantity::from_units(3),
///     DiscountPercent::from_units(10),
/// ).unwrap();
/// assert_eq!(total, Money::from_units(27_000));
/// ```
pub fn line_total(
    unit_price: Money,
    quantity: Quantity,
    discount: DiscountPercent,
) -> CoreResult<Money> {
    unit_price
        .checked_mul_quantity(quantity)
        .and_then(|gross| gross.apply_percentage_discount(discount))
        .ok_or(CoreError::AmountOverflow {
            context: "line total",
        })
}

/// Prices every line of a cart and sums the totals.
///
/// Lines keep their request order. A missing `potPersen` counts as 0.
pub fn price_sale(lines: &[NewSaleLine]) -> CoreResult<PricedSale> {
    let mut priced = Vec::with_capacity(lines.len());
    let mut sub_total = Money::zero();

    for line in lines {
        let discount = line.discount_percent.unwrap_or_default();
        let total = line_total(line.unit_price, line.quantity, discount)?;

        sub_total = sub_total
            .checked_add(total)
            .ok_or(CoreError::AmountOverflow {
                context: "sale subtotal",
            })?;

        priced.push(PricedLine {
            item_id: line.item_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            unit: line.unit.trim().to_string(),
            discount_percent: discount,
            total,
            note: line.note.clone(),
        });
    }

    Ok(PricedSale {
        lines: priced,
        sub_total,
        grand_total: sub_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
