//! # Report Repository
//!
//! Read-only queries behind the dashboard and the receipt.
//!
//! Quantities and amounts are TEXT columns, so sums and rankings are done
//! here in Rust after decoding rather than with SQL `SUM`/`ORDER BY`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::codec::{decode_money, decode_quantity, decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};
use niaga_core::{Money, Quantity, ReceiptLine, RecentSale, TopItem};

#[derive(Debug, FromRow)]
struct RecentSaleRow {
    id: String,
    no_transaksi: String,
    tanggal: String,
    grand_total: String,
    item_count: i64,
    pelanggan: Option<String>,
}

impl TryFrom<RecentSaleRow> for RecentSale {
    type Error = DbError;

    fn try_from(row: RecentSaleRow) -> DbResult<RecentSale> {
        Ok(RecentSale {
            sold_at: decode_timestamp("sales.tanggal", &row.tanggal)?,
            grand_total: decode_money("sales.grand_total", &row.grand_total)?,
            id: row.id,
            transaction_number: row.no_transaksi,
            item_count: row.item_count,
            customer: row.pelanggan,
        })
    }
}

#[derive(Debug, FromRow)]
struct SoldQuantityRow {
    item_id: String,
    nama_item: String,
    jumlah: String,
}

#[derive(Debug, FromRow)]
struct ReceiptLineRow {
    nama_item: String,
    jumlah: String,
    harga: String,
    total: String,
    garansi: Option<String>,
}

impl TryFrom<ReceiptLineRow> for ReceiptLine {
    type Error = DbError;

    fn try_from(row: ReceiptLineRow) -> DbResult<ReceiptLine> {
        Ok(ReceiptLine {
            qty: decode_quantity("sale_items.jumlah", &row.jumlah)?,
            price: decode_money("sale_items.harga", &row.harga)?,
            total: decode_money("sale_items.total", &row.total)?,
            name: row.nama_item,
            guarantee: row.garansi,
        })
    }
}

/// Today's sales figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesTotals {
    pub count: i64,
    pub grand_total: Money,
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Number of sales and sum of grand totals with `tanggal >= since`.
    pub async fn sales_totals_since(
        &self,
        business_id: &str,
        since: DateTime<Utc>,
    ) -> DbResult<SalesTotals> {
        debug!(business_id = %business_id, since = %since, "Summing sales");

        let totals: Vec<String> = sqlx::query_scalar(
            "SELECT grand_total FROM sales WHERE business_id = ?1 AND tanggal >= ?2",
        )
        .bind(business_id)
        .bind(encode_timestamp(since))
        .fetch_all(&self.pool)
        .await?;

        let mut grand_total = Money::zero();
        for raw in &totals {
            let amount = decode_money("sales.grand_total", raw)?;
            grand_total = grand_total
                .checked_add(amount)
                .ok_or_else(|| DbError::Decode("sales total overflow".to_string()))?;
        }

        Ok(SalesTotals {
            count: totals.len() as i64,
            grand_total,
        })
    }

    /// The latest `limit` sales with their line counts.
    pub async fn recent_sales(&self, business_id: &str, limit: u32) -> DbResult<Vec<RecentSale>> {
        let rows: Vec<RecentSaleRow> = sqlx::query_as(
            "SELECT s.id, s.no_transaksi, s.tanggal, s.grand_total, s.pelanggan, \
                (SELECT COUNT(*) FROM sale_items si WHERE si.sale_id = s.id) AS item_count \
             FROM sales s \
             WHERE s.business_id = ?1 \
             ORDER BY s.tanggal DESC, s.created_at DESC \
             LIMIT ?2",
        )
        .bind(business_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RecentSale::try_from).collect()
    }

    /// All-time best sellers by summed quantity, highest first.
    ///
    /// Ties are broken by item name.
    pub async fn top_items(&self, business_id: &str, limit: usize) -> DbResult<Vec<TopItem>> {
        let rows: Vec<SoldQuantityRow> = sqlx::query_as(
            "SELECT si.item_id, i.nama_item, si.jumlah \
             FROM sale_items si \
             INNER JOIN sales s ON s.id = si.sale_id \
             INNER JOIN items i ON i.id = si.item_id \
             WHERE s.business_id = ?1",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sold: HashMap<String, TopItem> = HashMap::new();
        for row in rows {
            let quantity = decode_quantity("sale_items.jumlah", &row.jumlah)?;
            let entry = sold.entry(row.item_id).or_insert_with(|| TopItem {
                name: row.nama_item,
                total_sold: Quantity::zero(),
            });
            entry.total_sold = entry
                .total_sold
                .checked_add(quantity)
                .ok_or_else(|| DbError::Decode("sold quantity overflow".to_string()))?;
        }

        let mut ranked: Vec<TopItem> = sold.into_values().collect();
        ranked.sort_by(|a, b| {
            b.total_sold
                .cmp(&a.total_sold)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Receipt lines of a sale in cart order, with item name and warranty.
    pub async fn receipt_lines(&self, sale_id: &str) -> DbResult<Vec<ReceiptLine>> {
        let rows: Vec<ReceiptLineRow> = sqlx::query_as(
            "SELECT i.nama_item, si.jumlah, si.harga, si.total, i.garansi \
             FROM sale_items si \
             INNER JOIN items i ON i.id = si.item_id \
             WHERE si.sale_id = ?1 \
             ORDER BY si.line_no",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReceiptLine::try_from).collect()
    }
}
