//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── StaleWrite / Busy → retried by niaga-service                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (niaga-service) ← Serialized for callers                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate `kode_item` within a business
    /// - Duplicate `no_transaksi`
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting an item still referenced by `sale_items`
    /// - Referencing a business that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A version-checked write matched zero rows.
    ///
    /// Another writer changed the row between our read and our write. The
    /// enclosing transaction must be rolled back and the whole unit retried.
    #[error("{entity} {id} was modified concurrently")]
    StaleWrite { entity: String, id: String },

    /// SQLite reported the database as busy or locked past the busy timeout.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// A stored value could not be decoded into its domain type.
    #[error("Corrupt stored value: {0}")]
    Decode(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn stale(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::StaleWrite {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether running the same unit of work again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::StaleWrite { .. } | DbError::Busy(_))
    }

    /// Whether this is a unique violation on the given column
    /// (e.g. `sales.no_transaksi`).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint / lock
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::ColumnDecode   → DbError::Decode
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // SQLITE_BUSY / SQLITE_LOCKED: "database is locked", "database table is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => {
                DbError::Decode(format!("column {index}: {source}"))
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DbError::stale("Item", "1").is_retryable());
        assert!(DbError::Busy("database is locked".to_string()).is_retryable());
        assert!(!DbError::not_found("Item", "1").is_retryable());
        assert!(!DbError::duplicate("sales.no_transaksi", "TRX-1").is_retryable());
    }

    #[test]
    fn test_unique_violation_column_match() {
        let err = DbError::duplicate("sales.no_transaksi", "unknown");
        assert!(err.is_unique_violation_on("no_transaksi"));
        assert!(!err.is_unique_violation_on("kode_item"));
        assert!(!DbError::PoolExhausted.is_unique_violation_on("no_transaksi"));
    }
}
