//! # Error Types
//!
//! Domain-specific error types for niaga-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  niaga-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  niaga-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  niaga-service errors                                                  │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴─► ApiError → HTTP/UI layer       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item, ID, quantities)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item cannot be found within the caller's business.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Sale cannot be found within the caller's business.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Business not found: {0}")]
    BusinessNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: Freon R32 × 5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Freon R32", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, nothing persisted
    /// ```
    ///
    /// `requested` is the total over every line that references the item.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: Quantity,
        requested: Quantity,
    },

    /// Item is referenced by at least one sale line and cannot be deleted.
    #[error("Item {item} has sales history and cannot be deleted; deactivate it instead")]
    ItemHasSalesHistory { item: String },

    /// A supplied transaction number is already in use.
    #[error("Transaction number already exists: {0}")]
    DuplicateTransactionNumber(String),

    #[error("A sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Decimal arithmetic exceeded the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any persistence happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, bad currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "Freon R32".to_string(),
            available: Quantity::from_units(3),
            requested: Quantity::from_units(5),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Freon R32: available 3, requested 5"
        );

        let err = CoreError::ItemHasSalesHistory {
            item: "AC-001".to_string(),
        };
        assert!(err.to_string().contains("deactivate"));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "kodeItem".to_string(),
        };
        assert_eq!(err.to_string(), "kodeItem is required");

        let err = ValidationError::OutOfRange {
            field: "potPersen".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "potPersen must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "satuan".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
