//! # API Error Type
//!
//! The one error type every service operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Niaga                                  │
//! │                                                                         │
//! │  Caller                      niaga-service                              │
//! │  ──────                      ─────────────                              │
//! │                                                                         │
//! │  recorder.record(sale)                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Validation?   ── CoreError::Validation ──────────┐              │  │
//! │  │  Stock check?  ── CoreError::InsufficientStock ───┤              │  │
//! │  │  Write race?   ── DbError::StaleWrite (retried) ──┤              │  │
//! │  │  SQLite?       ── DbError::QueryFailed ───────────┴─► ApiError ─►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for Freon R32: available 3, ..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage details never reach the caller: internal failures are logged and
//! replaced by a generic message.

use serde::Serialize;

use niaga_core::CoreError;
use niaga_db::DbError;

/// Error returned from every service operation.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Item not found: 6f1c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock for a sale line (422)
    InsufficientStock,

    /// Resource not found, or owned by another business (404)
    NotFound,

    /// Duplicate key, referenced row, or a write race that outlived its
    /// retries (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::conflict("Record is still referenced")
            }
            DbError::StaleWrite { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Write conflict not resolved by retry");
                ApiError::conflict(format!("{} {} was changed by another user, try again", entity, id))
            }
            DbError::Busy(e) => {
                tracing::warn!("Database busy: {}", e);
                ApiError::conflict("Database is busy, try again")
            }
            DbError::Decode(e) => {
                tracing::error!("Corrupt stored value: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Item", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::BusinessNotFound(id) => ApiError::not_found("Business", &id),
            err @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            err @ CoreError::ItemHasSalesHistory { .. } => ApiError::conflict(err.to_string()),
            err @ CoreError::DuplicateTransactionNumber(_) => ApiError::conflict(err.to_string()),
            err @ CoreError::TooManyLines { .. } => ApiError::validation(err.to_string()),
            CoreError::AmountOverflow { context } => {
                ApiError::validation(format!("Amount too large while computing {}", context))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use niaga_core::{Quantity, ValidationError};

    #[test]
    fn test_serializes_screaming_code() {
        let err = ApiError::not_found("Item", "abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Item not found: abc");
    }

    #[test]
    fn test_core_error_mapping() {
        let stock: ApiError = CoreError::InsufficientStock {
            item: "Freon R32".to_string(),
            available: Quantity::from_units(3),
            requested: Quantity::from_units(5),
        }
        .into();
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert!(stock.message.contains("Freon R32"));

        let invalid: ApiError = CoreError::from(ValidationError::Required {
            field: "items".to_string(),
        })
        .into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);

        let history: ApiError = CoreError::ItemHasSalesHistory {
            item: "AC-001".to_string(),
        }
        .into();
        assert_eq!(history.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_db_error_hides_internals() {
        let err: ApiError = DbError::QueryFailed("no such table: sales".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("sales"));

        let stale: ApiError = DbError::stale("Item", "abc").into();
        assert_eq!(stale.code, ErrorCode::Conflict);

        let duplicate: ApiError = DbError::duplicate("sales.no_transaksi", "TRX-1").into();
        assert_eq!(duplicate.code, ErrorCode::Conflict);
    }
}
