//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 One sale = one transaction                              │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── insert_sale_in()      sales row (takes the write lock)           │
//! │   ├── insert_line_in() × n  sale_items rows, in cart order             │
//! │   └── ItemRepository::write_position_in() per item                     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Sales are never updated or deleted afterwards.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    decode_discount, decode_money, decode_quantity, decode_timestamp, encode_discount,
    encode_money, encode_quantity, encode_timestamp,
};
use crate::error::{DbError, DbResult};
use niaga_core::{Sale, SaleDetail, SaleLine};

const SALE_COLUMNS: &str = "s.id, s.business_id, s.no_transaksi, s.pelanggan, s.sub_total, \
     s.grand_total, s.keterangan, s.tanggal, s.created_at";

const LINE_COLUMNS: &str = "si.id, si.sale_id, si.item_id, si.jumlah, si.harga, si.satuan, \
     si.pot_persen, si.total, si.keterangan, si.created_at";

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    business_id: String,
    no_transaksi: String,
    pelanggan: Option<String>,
    sub_total: String,
    grand_total: String,
    keterangan: Option<String>,
    tanggal: String,
    created_at: String,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> DbResult<Sale> {
        Ok(Sale {
            sub_total: decode_money("sales.sub_total", &row.sub_total)?,
            grand_total: decode_money("sales.grand_total", &row.grand_total)?,
            sold_at: decode_timestamp("sales.tanggal", &row.tanggal)?,
            created_at: decode_timestamp("sales.created_at", &row.created_at)?,
            id: row.id,
            business_id: row.business_id,
            transaction_number: row.no_transaksi,
            customer: row.pelanggan,
            note: row.keterangan,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleLineRow {
    id: String,
    sale_id: String,
    item_id: String,
    jumlah: String,
    harga: String,
    satuan: String,
    pot_persen: String,
    total: String,
    keterangan: Option<String>,
    created_at: String,
}

impl TryFrom<SaleLineRow> for SaleLine {
    type Error = DbError;

    fn try_from(row: SaleLineRow) -> DbResult<SaleLine> {
        Ok(SaleLine {
            quantity: decode_quantity("sale_items.jumlah", &row.jumlah)?,
            unit_price: decode_money("sale_items.harga", &row.harga)?,
            discount_percent: decode_discount("sale_items.pot_persen", &row.pot_persen)?,
            total: decode_money("sale_items.total", &row.total)?,
            created_at: decode_timestamp("sale_items.created_at", &row.created_at)?,
            id: row.id,
            sale_id: row.sale_id,
            item_id: row.item_id,
            unit: row.satuan,
            note: row.keterangan,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines, only if it belongs to `business_id`.
    pub async fn get_detail(&self, business_id: &str, sale_id: &str) -> DbResult<Option<SaleDetail>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1 AND s.business_id = ?2");

        let row: Option<SaleRow> = sqlx::query_as(&sql)
            .bind(sale_id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sale = Sale::try_from(row)?;
        let items = self.get_lines(&sale.id).await?;
        Ok(Some(SaleDetail { sale, items }))
    }

    /// Lines of a sale in cart order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM sale_items si WHERE si.sale_id = ?1 ORDER BY si.line_no"
        );

        let rows: Vec<SaleLineRow> = sqlx::query_as(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SaleLine::try_from).collect()
    }

    /// All sales of a business, newest first, each with its lines.
    pub async fn list_details(&self, business_id: &str) -> DbResult<Vec<SaleDetail>> {
        debug!(business_id = %business_id, "Listing sales");

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE s.business_id = ?1 \
             ORDER BY s.tanggal DESC, s.created_at DESC, s.id"
        );
        let sale_rows: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM sale_items si \
             INNER JOIN sales s ON s.id = si.sale_id \
             WHERE s.business_id = ?1 \
             ORDER BY si.sale_id, si.line_no"
        );
        let line_rows: Vec<SaleLineRow> = sqlx::query_as(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        let mut lines_by_sale: HashMap<String, Vec<SaleLine>> = HashMap::new();
        for row in line_rows {
            let line = SaleLine::try_from(row)?;
            lines_by_sale.entry(line.sale_id.clone()).or_default().push(line);
        }

        sale_rows
            .into_iter()
            .map(|row| {
                let sale = Sale::try_from(row)?;
                let items = lines_by_sale.remove(&sale.id).unwrap_or_default();
                Ok(SaleDetail { sale, items })
            })
            .collect()
    }

    /// Whether a transaction number is already taken.
    pub async fn transaction_number_exists(&self, number: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sales WHERE no_transaksi = ?1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Inserts the sale header.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` on `sales.no_transaksi` - number taken
    pub async fn insert_sale_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            no_transaksi = %sale.transaction_number,
            "Inserting sale"
        );

        sqlx::query(
            "INSERT INTO sales ( \
                id, business_id, no_transaksi, pelanggan, sub_total, grand_total, \
                keterangan, tanggal, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&sale.id)
        .bind(&sale.business_id)
        .bind(&sale.transaction_number)
        .bind(&sale.customer)
        .bind(encode_money(sale.sub_total))
        .bind(encode_money(sale.grand_total))
        .bind(&sale.note)
        .bind(encode_timestamp(sale.sold_at))
        .bind(encode_timestamp(sale.created_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: sale.transaction_number.clone(),
            },
            other => other,
        })?;

        Ok(())
    }

    /// Inserts one sale line at position `line_no` (0-based).
    pub async fn insert_line_in(
        conn: &mut SqliteConnection,
        line: &SaleLine,
        line_no: usize,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_items ( \
                id, sale_id, item_id, line_no, jumlah, harga, satuan, pot_persen, \
                total, keterangan, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.item_id)
        .bind(line_no as i64)
        .bind(encode_quantity(line.quantity))
        .bind(encode_money(line.unit_price))
        .bind(&line.unit)
        .bind(encode_discount(line.discount_percent))
        .bind(encode_money(line.total))
        .bind(&line.note)
        .bind(encode_timestamp(line.created_at))
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Helper to generate a new sale or sale line ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 4;

/// Generates a transaction number: `TRX-<yyyyMMddHHmmss>-<XXXX>`.
///
/// ## Format
/// - timestamp: UTC, second precision
/// - XXXX: 4 random base-36 characters (0-9, A-Z)
///
/// ## Example
/// `TRX-20240301080000-7KQ2`
///
/// Uniqueness is not guaranteed here. The unique index on
/// `sales.no_transaksi` rejects a collision and the caller generates again.
pub fn generate_transaction_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format_transaction_number(Utc::now(), &suffix)
}

/// Formats a transaction number from its parts.
pub fn format_transaction_number(at: DateTime<Utc>, suffix: &str) -> String {
    format!("TRX-{}-{}", at.format("%Y%m%d%H%M%S"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::repository::item::{generate_item_id, ItemRepository};
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use niaga_core::{DiscountPercent, Item, Money, Quantity};

    struct Fixture {
        db: Database,
        business_id: String,
        item_id: String,
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let business = db.businesses().create("Abadi AC").await.unwrap();
        let now = codec::now();
        let item = Item {
            id: generate_item_id(),
            business_id: business.id.clone(),
            code: "AC-001".to_string(),
            barcode: None,
            name: "Freon R32".to_string(),
            stock: Quantity::from_units(10),
            unit: "kg".to_string(),
            brand: None,
            warranty: Some("3 bulan".to_string()),
            cost_price: Money::from_units(5_000),
            selling_price: Money::from_units(10_000),
            currency: "IDR".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        db.items().insert(&item).await.unwrap();

        Fixture {
            db,
            business_id: business.id,
            item_id: item.id,
        }
    }

    fn sale(business_id: &str, number: &str, sold_at: DateTime<Utc>) -> Sale {
        Sale {
            id: generate_sale_id(),
            business_id: business_id.to_string(),
            transaction_number: number.to_string(),
            customer: None,
            sub_total: Money::from_units(27_000),
            grand_total: Money::from_units(27_000),
            note: None,
            sold_at,
            created_at: sold_at,
        }
    }

    fn line(sale: &Sale, item_id: &str, qty: i64) -> SaleLine {
        SaleLine {
            id: generate_sale_id(),
            sale_id: sale.id.clone(),
            item_id: item_id.to_string(),
            quantity: Quantity::from_units(qty),
            unit_price: Money::from_units(10_000),
            unit: "kg".to_string(),
            discount_percent: DiscountPercent::from_units(10),
            total: Money::from_units(9_000 * qty),
            note: None,
            created_at: sale.created_at,
        }
    }

    async fn persist(f: &Fixture, sale: &Sale, lines: &[SaleLine]) -> DbResult<()> {
        let mut tx = f.db.begin().await?;
        SaleRepository::insert_sale_in(&mut tx, sale).await?;
        for (index, line) in lines.iter().enumerate() {
            SaleRepository::insert_line_in(&mut tx, line, index).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[test]
    fn test_transaction_number_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 5, 9).unwrap();
        assert_eq!(format_transaction_number(at, "7KQ2"), "TRX-20240301080509-7KQ2");

        let generated = generate_transaction_number();
        let suffix = generated.rsplit('-').next().unwrap();
        assert!(generated.starts_with("TRX-"));
        assert_eq!(generated.len(), "TRX-20240301080509-7KQ2".len());
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_sale_round_trip_keeps_line_order() {
        let f = setup().await;
        let header = sale(&f.business_id, "TRX-1", codec::now());
        let lines = vec![line(&header, &f.item_id, 3), line(&header, &f.item_id, 1)];
        persist(&f, &header, &lines).await.unwrap();

        let detail = f
            .db
            .sales()
            .get_detail(&f.business_id, &header.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(detail.sale, header);
        assert_eq!(detail.items, lines);
        assert!(f.db.sales().transaction_number_exists("TRX-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_detail_is_scoped_to_business() {
        let f = setup().await;
        let other = f.db.businesses().create("Moza Variasi").await.unwrap();
        let header = sale(&f.business_id, "TRX-1", codec::now());
        persist(&f, &header, &[line(&header, &f.item_id, 1)]).await.unwrap();

        assert!(f.db.sales().get_detail(&other.id, &header.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_transaction_number_rolls_back() {
        let f = setup().await;
        let first = sale(&f.business_id, "TRX-DUP", codec::now());
        persist(&f, &first, &[line(&first, &f.item_id, 1)]).await.unwrap();

        let second = sale(&f.business_id, "TRX-DUP", codec::now());
        let err = persist(&f, &second, &[line(&second, &f.item_id, 1)])
            .await
            .unwrap_err();

        assert!(err.is_unique_violation_on("no_transaksi"));
        assert_eq!(f.db.sales().list_details(&f.business_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_lines() {
        let f = setup().await;
        let base = codec::now();
        let older = sale(&f.business_id, "TRX-OLD", base - Duration::hours(2));
        let newer = sale(&f.business_id, "TRX-NEW", base);

        persist(&f, &older, &[line(&older, &f.item_id, 1)]).await.unwrap();
        persist(&f, &newer, &[line(&newer, &f.item_id, 2), line(&newer, &f.item_id, 3)])
            .await
            .unwrap();

        let listed = f.db.sales().list_details(&f.business_id).await.unwrap();
        let numbers: Vec<&str> = listed
            .iter()
            .map(|d| d.sale.transaction_number.as_str())
            .collect();

        assert_eq!(numbers, vec!["TRX-NEW", "TRX-OLD"]);
        assert_eq!(listed[0].items.len(), 2);
        assert_eq!(listed[1].items.len(), 1);
    }

    #[tokio::test]
    async fn test_item_with_lines_cannot_be_deleted() {
        let f = setup().await;
        let header = sale(&f.business_id, "TRX-1", codec::now());
        persist(&f, &header, &[line(&header, &f.item_id, 1)]).await.unwrap();

        let mut tx = f.db.begin().await.unwrap();
        assert_eq!(
            ItemRepository::count_sale_lines_in(&mut tx, &f.item_id).await.unwrap(),
            1
        );
        let err = ItemRepository::delete_in(&mut tx, &f.business_id, &f.item_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
