//! # Money Module
//!
//! Provides `Money`, `Quantity` and `DiscountPercent`: decimal newtypes for
//! every value that takes part in sale and cost arithmetic.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Weighted-average cost divides by stock on every restock, and stock    │
//! │  itself can be fractional (2.5 meters of pipe). Integer cents are not  │
//! │  enough, floats drift.                                                 │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 fixed point (rust_decimal, 96-bit mantissa)     │
//! │    10000 × 3 × 0.9 = 27000 exactly                                      │
//! │    (10×5000 + 5×8000) / 15 = 6000 exactly                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use niaga_core::money::{Money, Quantity};
//!
//! let price = Money::from_units(12_500);
//! let total = price.checked_mul_quantity(Quantity::from_units(2)).unwrap();
//! assert_eq!(total, Money::from_units(25_000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the item's currency (whole rupiah plus optional
/// fraction).
///
/// ## Where Money is Used
/// ```text
/// Item.hargaJual ──► SaleLine.harga ──► SaleLine.total ──► Sale.subTotal
///
/// Item.hargaPokok ◄── restock (weighted average) ──► inventory `nilai`
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a whole-unit amount (e.g. `Money::from_units(10_000)` = Rp 10.000).
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::money::{Money, Quantity};
    ///
    /// let unit_price = Money::from_units(2_990);
    /// let line = unit_price.checked_mul_quantity(Quantity::from_units(3)).unwrap();
    /// assert_eq!(line, Money::from_units(8_970));
    /// ```
    pub fn checked_mul_quantity(self, qty: Quantity) -> Option<Money> {
        self.0.checked_mul(qty.value()).map(Money)
    }

    /// Applies a percentage discount: `amount × (1 − pct/100)`.
    ///
    /// No rounding is applied; a 12.5% discount on 10 000 is exactly 8 750.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::money::{DiscountPercent, Money};
    ///
    /// let gross = Money::from_units(30_000);
    /// let net = gross.apply_percentage_discount(DiscountPercent::from_units(10)).unwrap();
    /// assert_eq!(net, Money::from_units(27_000));
    /// ```
    pub fn apply_percentage_discount(self, discount: DiscountPercent) -> Option<Money> {
        self.0.checked_mul(discount.remaining_fraction()).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A stock or sale quantity in the item's unit of measure (`satuan`).
///
/// Fractional quantities are allowed: items sold by the meter or kilogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        Quantity(value)
    }

    #[inline]
    pub fn from_units(units: i64) -> Self {
        Quantity(Decimal::from(units))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }

    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_sub(other.0).map(Quantity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Quantity(value)
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Quantity)
    }
}

// =============================================================================
// Discount Percent
// =============================================================================

/// A per-line discount expressed in percent (`potPersen`), 0 to 100.
///
/// The range is enforced by [`crate::validation::validate_discount_percent`];
/// this type only carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        DiscountPercent(value)
    }

    #[inline]
    pub fn from_units(pct: i64) -> Self {
        DiscountPercent(Decimal::from(pct))
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountPercent(Decimal::ZERO)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// `1 − pct/100`, the share of the gross amount the customer pays.
    pub fn remaining_fraction(&self) -> Decimal {
        Decimal::ONE - self.0 / Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for DiscountPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
