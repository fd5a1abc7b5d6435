//! # Column Codec
//!
//! SQLite has no decimal type and sqlx has no `rust_decimal` support for it,
//! so decimals are stored as canonical TEXT. Timestamps are stored as
//! fixed-width RFC 3339 TEXT so that `ORDER BY` and range filters on the
//! raw column agree with time order.
//!
//! ```text
//! Decimal   6000.00          ──►  "6000"
//! Decimal   2.50             ──►  "2.5"
//! DateTime  2024-03-01 08:00 ──►  "2024-03-01T08:00:00.000000Z"
//! ```
//!
//! Decimal TEXT does not sort numerically. Any filtering or ordering on
//! stock or money happens in Rust after decoding.

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use niaga_core::{DiscountPercent, Money, Quantity};
use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn encode_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn decode_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| DbError::Decode(format!("{column} = {raw:?}: {e}")))
}

pub fn encode_money(value: Money) -> String {
    encode_decimal(value.amount())
}

pub fn decode_money(column: &str, raw: &str) -> DbResult<Money> {
    decode_decimal(column, raw).map(Money::from_decimal)
}

pub fn encode_quantity(value: Quantity) -> String {
    encode_decimal(value.value())
}

pub fn decode_quantity(column: &str, raw: &str) -> DbResult<Quantity> {
    decode_decimal(column, raw).map(Quantity::from_decimal)
}

pub fn encode_discount(value: DiscountPercent) -> String {
    encode_decimal(value.value())
}

pub fn decode_discount(column: &str, raw: &str) -> DbResult<DiscountPercent> {
    decode_decimal(column, raw).map(DiscountPercent::from_decimal)
}

/// Current time at the precision the database keeps.
///
/// Timestamps built with this survive a write/read cycle unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamp with microsecond precision.
pub fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Decode(format!("{column} = {raw:?}: {e}")))
}
