//! # Costing
//!
//! Weighted-average unit cost (HPP) and stock movements.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RESTOCK (receive)                                                      │
//! │                                                                         │
//! │    totalValue = oldStock × oldCost + incomingQty × incomingPrice       │
//! │    newStock   = oldStock + incomingQty                                  │
//! │    newCost    = newStock > 0 ? totalValue / newStock : incomingPrice   │
//! │                                                                         │
//! │  SALE (issue)                                                           │
//! │                                                                         │
//! │    newStock   = oldStock − qty        (rejected when qty > oldStock)    │
//! │    cost       unchanged                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are kept at full decimal precision. Rounding, if any, belongs to
//! the presentation layer.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Quantity};

/// Stock on hand together with its weighted-average unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPosition {
    pub stock: Quantity,
    pub average_cost: Money,
}

impl StockPosition {
    pub fn new(stock: Quantity, average_cost: Money) -> Self {
        Self {
            stock,
            average_cost,
        }
    }

    /// Receives `quantity` units bought at `unit_cost` and returns the new
    /// position.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::costing::StockPosition;
    /// use niaga_core::money::{Money, Quantity};
    ///
    /// let position = StockPosition::new(Quantity::from_units(10), Money::from_units(5_000));
    /// let after = position.receive(Quantity::from_units(5), Money::from_units(8_000)).unwrap();
    ///
    /// assert_eq!(after.stock, Quantity::from_units(15));
    /// assert_eq!(after.average_cost, Money::from_units(6_000));
    /// ```
    pub fn receive(&self, quantity: Quantity, unit_cost: Money) -> CoreResult<StockPosition> {
        let new_stock = self
            .stock
            .checked_add(quantity)
            .ok_or(CoreError::AmountOverflow { context: "stock" })?;

        let average_cost = weighted_average_cost(self.stock, self.average_cost, quantity, unit_cost)?;

        Ok(StockPosition {
            stock: new_stock,
            average_cost,
        })
    }

    /// Takes `quantity` units out of stock. The average cost does not move.
    ///
    /// `item` is only used to label the error.
    pub fn issue(&self, item: &str, quantity: Quantity) -> CoreResult<StockPosition> {
        if quantity > self.stock {
            return Err(CoreError::InsufficientStock {
                item: item.to_string(),
                available: self.stock,
                requested: quantity,
            });
        }

        let stock = self
            .stock
            .checked_sub(quantity)
            .ok_or(CoreError::AmountOverflow { context: "stock" })?;

        Ok(StockPosition {
            stock,
            average_cost: self.average_cost,
        })
    }
}

/// Weighted average of the current stock value and an incoming lot.
///
/// Returns `incoming_price` unchanged when the resulting stock is zero.
pub fn weighted_average_cost(
    old_stock: Quantity,
    old_cost: Money,
    incoming_qty: Quantity,
    incoming_price: Money,
) -> CoreResult<Money> {
    let overflow = || CoreError::AmountOverflow {
        context: "average cost",
    };

    let new_stock = old_stock.value().checked_add(incoming_qty.value()).ok_or_else(overflow)?;
    if new_stock <= Decimal::ZERO {
        return Ok(incoming_price);
    }

    let current_value = old_cost.checked_mul_quantity(old_stock).ok_or_else(overflow)?;
    let incoming_value = incoming_price
        .checked_mul_quantity(incoming_qty)
        .ok_or_else(overflow)?;
    let total_value = current_value.checked_add(incoming_value).ok_or_else(overflow)?;

    total_value
        .amount()
        .checked_div(new_stock)
        .map(Money::from_decimal)
        .ok_or_else(overflow)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_restock_weighted_average() {
        let position = StockPosition::new(Quantity::from_units(10), Money::from_units(5_000));
        let after = position
            .receive(Quantity::from_units(5), Money::from_units(8_000))
            .unwrap();

        assert_eq!(after.stock, Quantity::from_units(15));
        assert_eq!(after.average_cost, Money::from_units(6_000));
    }

    #[test]
    fn test_restock_from_empty_takes_incoming_price() {
        let position = StockPosition::new(Quantity::zero(), Money::zero());
        let after = position
            .receive(Quantity::from_units(4), Money::from_units(7_250))
            .unwrap();

        assert_eq!(after.stock, Quantity::from_units(4));
        assert_eq!(after.average_cost, Money::from_units(7_250));
    }

    #[test]
    fn test_zero_resulting_stock_keeps_incoming_price() {
        let cost = weighted_average_cost(
            Quantity::zero(),
            Money::from_units(9_000),
            Quantity::zero(),
            Money::from_units(4_000),
        )
        .unwrap();
        assert_eq!(cost, Money::from_units(4_000));
    }

    #[test]
    fn test_average_is_not_rounded() {
        // (1 × 100 + 2 × 200) / 3 = 166.666...
        let cost = weighted_average_cost(
            Quantity::from_units(1),
            Money::from_units(100),
            Quantity::from_units(2),
            Money::from_units(200),
        )
        .unwrap();

        assert!(cost.amount() > dec!(166.6666));
        assert!(cost.amount() < dec!(166.6667));
    }

    #[test]
    fn test_fractional_restock() {
        let position = StockPosition::new(Quantity::from_decimal(dec!(1.5)), Money::from_units(10_000));
        let after = position
            .receive(Quantity::from_decimal(dec!(0.5)), Money::from_units(14_000))
            .unwrap();

        assert_eq!(after.stock, Quantity::from_units(2));
        assert_eq!(after.average_cost, Money::from_units(11_000));
    }

    #[test]
    fn test_issue_reduces_stock_only() {
        let position = StockPosition::new(Quantity::from_units(5), Money::from_units(6_000));
        let after = position.issue("Freon R32", Quantity::from_units(3)).unwrap();

        assert_eq!(after.stock, Quantity::from_units(2));
        assert_eq!(after.average_cost, Money::from_units(6_000));

        let emptied = after.issue("Freon R32", Quantity::from_units(2)).unwrap();
        assert!(emptied.stock.is_zero());
    }

    #[test]
    fn test_issue_rejects_overdraw() {
        let position = StockPosition::new(Quantity::from_units(2), Money::from_units(6_000));
        let err = position.issue("Freon R32", Quantity::from_units(3)).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => {
                assert_eq!(item, "Freon R32");
                assert_eq!(available, Quantity::from_units(2));
                assert_eq!(requested, Quantity::from_units(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
