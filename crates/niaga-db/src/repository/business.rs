//! # Business Repository
//!
//! Minimal tenant storage: enough to own items and sales.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::codec::{self, decode_timestamp, encode_timestamp};
use crate::error::{DbError, DbResult};
use niaga_core::Business;

#[derive(Debug, FromRow)]
struct BusinessRow {
    id: String,
    name: String,
    created_at: String,
}

impl TryFrom<BusinessRow> for Business {
    type Error = DbError;

    fn try_from(row: BusinessRow) -> DbResult<Business> {
        Ok(Business {
            created_at: decode_timestamp("businesses.created_at", &row.created_at)?,
            id: row.id,
            name: row.name,
        })
    }
}

/// Repository for business records.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Creates a business with a fresh UUID.
    pub async fn create(&self, name: &str) -> DbResult<Business> {
        let business = Business {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: codec::now(),
        };
        self.insert(&business).await?;
        Ok(business)
    }

    /// Inserts a business with a caller-chosen ID (used by the seeder).
    pub async fn insert(&self, business: &Business) -> DbResult<()> {
        debug!(id = %business.id, name = %business.name, "Inserting business");

        sqlx::query("INSERT INTO businesses (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&business.id)
            .bind(&business.name)
            .bind(encode_timestamp(business.created_at))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Business>> {
        let row: Option<BusinessRow> =
            sqlx::query_as("SELECT id, name, created_at FROM businesses WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Business::try_from).transpose()
    }

    /// Lists all businesses by name.
    pub async fn list(&self) -> DbResult<Vec<Business>> {
        let rows: Vec<BusinessRow> =
            sqlx::query_as("SELECT id, name, created_at FROM businesses ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Business::try_from).collect()
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM businesses WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}
