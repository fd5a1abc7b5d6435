//! # Item Repository
//!
//! Database operations for catalog items.
//!
//! ## Key Operations
//! - Search by name, code or barcode within one business
//! - CRUD operations
//! - Version-checked stock/cost writes for sales and restocks
//!
//! ## Compare-and-Swap Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  Read inside the transaction:   stock=5  version=7                      │
//! │                                                                         │
//! │  Write:                                                                 │
//! │     UPDATE items SET stock = '2', version = version + 1                 │
//! │     WHERE id = ? AND version = 7                                        │
//! │                                                                         │
//! │  rows_affected = 1  → our read was current, commit                      │
//! │  rows_affected = 0  → someone else wrote first → DbError::StaleWrite    │
//! │                       roll back and run the whole unit again            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions suffixed `_in` take a connection so they can run inside a
//! transaction opened by the caller.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    decode_money, decode_quantity, decode_timestamp, encode_money, encode_quantity,
    encode_timestamp,
};
use crate::error::{DbError, DbResult};
use niaga_core::{Item, Money, Quantity};

const ITEM_COLUMNS: &str = "id, business_id, kode_item, barcode, nama_item, stock, satuan, \
     merek, garansi, harga_pokok, harga_jual, mata_uang, is_active, created_at, updated_at, version";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    business_id: String,
    kode_item: String,
    barcode: Option<String>,
    nama_item: String,
    stock: String,
    satuan: String,
    merek: Option<String>,
    garansi: Option<String>,
    harga_pokok: String,
    harga_jual: String,
    mata_uang: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
    version: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Item> {
        Ok(Item {
            stock: decode_quantity("items.stock", &row.stock)?,
            cost_price: decode_money("items.harga_pokok", &row.harga_pokok)?,
            selling_price: decode_money("items.harga_jual", &row.harga_jual)?,
            created_at: decode_timestamp("items.created_at", &row.created_at)?,
            updated_at: decode_timestamp("items.updated_at", &row.updated_at)?,
            id: row.id,
            business_id: row.business_id,
            code: row.kode_item,
            barcode: row.barcode,
            name: row.nama_item,
            unit: row.satuan,
            brand: row.merek,
            warranty: row.garansi,
            currency: row.mata_uang,
            is_active: row.is_active,
            version: row.version,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> DbResult<Vec<Item>> {
    rows.into_iter().map(Item::try_from).collect()
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let results = repo.search(&business_id, "freon").await?;
/// let item = repo.get_in_business(&business_id, &item_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Searches a business's items by name, code or barcode.
    ///
    /// Matching is a case-insensitive substring match (ASCII). An empty
    /// query lists every item. Results are ordered by name.
    pub async fn search(&self, business_id: &str, query: &str) -> DbResult<Vec<Item>> {
        let query = query.trim();

        debug!(business_id = %business_id, query = %query, "Searching items");

        if query.is_empty() {
            return self.list_by_business(business_id).await;
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE business_id = ?1 \
             AND (nama_item LIKE ?2 ESCAPE '\\' OR kode_item LIKE ?2 ESCAPE '\\' OR barcode LIKE ?2 ESCAPE '\\') \
             ORDER BY nama_item, kode_item"
        );

        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(business_id)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned items");
        into_items(rows)
    }

    /// Lists all items of a business, ordered by name.
    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Item>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE business_id = ?1 ORDER BY nama_item, kode_item"
        );

        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(business_id)
            .fetch_all(&self.pool)
            .await?;

        into_items(rows)
    }

    /// Gets an item by its ID, regardless of business.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let row: Option<ItemRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Gets an item only if it belongs to `business_id`.
    pub async fn get_in_business(&self, business_id: &str, id: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND business_id = ?2");

        let row: Option<ItemRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Gets an item by its code within a business.
    pub async fn get_by_code(&self, business_id: &str, code: &str) -> DbResult<Option<Item>> {
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM items WHERE business_id = ?1 AND kode_item = ?2");

        let row: Option<ItemRow> = sqlx::query_as(&sql)
            .bind(business_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already used in this business
    /// * `Err(DbError::ForeignKeyViolation)` - business does not exist
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        debug!(business_id = %item.business_id, code = %item.code, "Inserting item");

        let sql = format!(
            "INSERT INTO items ({ITEM_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        );

        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.business_id)
            .bind(&item.code)
            .bind(&item.barcode)
            .bind(&item.name)
            .bind(encode_quantity(item.stock))
            .bind(&item.unit)
            .bind(&item.brand)
            .bind(&item.warranty)
            .bind(encode_money(item.cost_price))
            .bind(encode_money(item.selling_price))
            .bind(&item.currency)
            .bind(item.is_active)
            .bind(encode_timestamp(item.created_at))
            .bind(encode_timestamp(item.updated_at))
            .bind(item.version)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                    field,
                    value: item.code.clone(),
                },
                other => other,
            })?;

        Ok(item.clone())
    }

    /// Writes the catalog attributes of `item` (never stock or cost).
    ///
    /// `item.version` must be the version that was read. On success the
    /// returned item carries the bumped version.
    pub async fn update_details(&self, item: &Item) -> DbResult<Item> {
        debug!(id = %item.id, version = item.version, "Updating item details");

        let now = crate::codec::now();

        let result = sqlx::query(
            "UPDATE items SET \
                kode_item = ?3, barcode = ?4, nama_item = ?5, satuan = ?6, merek = ?7, \
                garansi = ?8, harga_jual = ?9, mata_uang = ?10, is_active = ?11, \
                updated_at = ?12, version = version + 1 \
             WHERE id = ?1 AND version = ?2",
        )
        .bind(&item.id)
        .bind(item.version)
        .bind(&item.code)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(&item.brand)
        .bind(&item.warranty)
        .bind(encode_money(item.selling_price))
        .bind(&item.currency)
        .bind(item.is_active)
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: item.code.clone(),
            },
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale("Item", &item.id));
        }

        let mut updated = item.clone();
        updated.updated_at = now;
        updated.version += 1;
        Ok(updated)
    }

    /// Number of items in a business.
    pub async fn count(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE business_id = ?1")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transactional operations
    // =========================================================================

    /// Reads an item inside a transaction.
    pub async fn fetch_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let row: Option<ItemRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Item::try_from).transpose()
    }

    /// Writes a new stock position for an item read at `expected_version`.
    ///
    /// ## Returns
    /// * `Ok(new_version)` - row updated
    /// * `Err(DbError::StaleWrite)` - the row changed since it was read
    pub async fn write_position_in(
        conn: &mut SqliteConnection,
        id: &str,
        expected_version: i64,
        stock: Quantity,
        cost_price: Money,
        selling_price: Money,
        updated_at: DateTime<Utc>,
    ) -> DbResult<i64> {
        debug!(
            id = %id,
            expected_version,
            stock = %stock,
            cost_price = %cost_price,
            "Writing stock position"
        );

        let result = sqlx::query(
            "UPDATE items SET \
                stock = ?3, harga_pokok = ?4, harga_jual = ?5, updated_at = ?6, \
                version = version + 1 \
             WHERE id = ?1 AND version = ?2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(encode_quantity(stock))
        .bind(encode_money(cost_price))
        .bind(encode_money(selling_price))
        .bind(encode_timestamp(updated_at))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale("Item", id));
        }

        Ok(expected_version + 1)
    }

    /// Number of sale lines referencing an item.
    pub async fn count_sale_lines_in(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE item_id = ?1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// Deletes an item of a business.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such item in this business
    /// * `Err(DbError::ForeignKeyViolation)` - item still referenced by a sale line
    pub async fn delete_in(conn: &mut SqliteConnection, business_id: &str, id: &str) -> DbResult<()> {
        debug!(business_id = %business_id, id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1 AND business_id = ?2")
            .bind(id)
            .bind(business_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
