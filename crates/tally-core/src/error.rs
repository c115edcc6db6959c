//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Catalog / lookup failures                      │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── StoreError       - What a store reports across the trait seam     │
//! │  └── SaleError        - Everything process_sale can fail with          │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures → StoreError       │
//! │                                                                         │
//! │  HTTP API errors (in app)                                              │
//! │  └── ApiError         - What clients see (serialized)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a stable, machine-readable code

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Catalog and lookup errors raised outside the sale pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id does not resolve (missing or soft-deleted).
    #[error("Product with ID {0} not found")]
    ProductNotFound(i64),

    /// Sale id does not resolve.
    #[error("Transaction with ID {0} not found")]
    SaleNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`crate::store::SaleTransaction`] implementation.
///
/// The database layer classifies its driver errors into these two buckets so
/// the processor can tell a sale-number collision apart from an outage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write.
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: String },

    /// Any other storage failure (connection lost, busy, I/O, constraint).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend failure from anything printable.
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}

// =============================================================================
// Sale Error
// =============================================================================

/// Every way recording a sale can fail.
///
/// All variants are terminal for the request: the processor has already
/// rolled the unit of work back by the time one of these is returned, so no
/// stock was consumed and no sale or line rows exist.
///
/// ## User Workflow
/// ```text
/// Cart: [(COKE x3), (COKE x3)]   stock(COKE) = 5
///      │
///      ▼
/// line 1: 5 >= 3 ✓ → stock 2 (inside unit of work)
/// line 2: 2 >= 3 ✗
///      │
///      ▼
/// ROLLBACK → stock back to 5
/// InsufficientStock { name: "Coca-Cola", available: 2, requested: 3 }
/// ```
#[derive(Debug, Error)]
pub enum SaleError {
    /// The request broke a precondition (empty cart, bad quantity, ...).
    #[error("Invalid sale request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// A cart line names a product that does not resolve.
    #[error("Product with ID {product_id} not found")]
    ProductNotFound { product_id: i64 },

    /// A cart line names a deactivated product.
    #[error("Product {name} (ID {product_id}) is not active")]
    ProductInactive { product_id: i64, name: String },

    /// Current stock (possibly already decremented by an earlier line of the
    /// same cart) cannot cover the requested quantity.
    #[error("Insufficient stock for product {name} (ID {product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Tendered amount is below the computed total.
    #[error("Insufficient payment amount: total {total}, tendered {tendered}")]
    InsufficientPayment { total: Money, tendered: Money },

    /// The generated sale number collided with an existing one.
    #[error("Sale number {0} already exists")]
    DuplicateSaleNumber(String),

    /// The store failed underneath us.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl SaleError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            SaleError::InvalidRequest(_) => "INVALID_REQUEST",
            SaleError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            SaleError::ProductInactive { .. } => "PRODUCT_INACTIVE",
            SaleError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            SaleError::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            SaleError::DuplicateSaleNumber(_) => "DUPLICATE_SALE_NUMBER",
            SaleError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Whether the failure came from the store rather than from the request.
    pub fn is_persistence(&self) -> bool {
        matches!(self, SaleError::Persistence(_))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================


/// Convenience type alias for Results with SaleError.
pub type SaleResult<T> = Result<T, SaleError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SaleError::InsufficientStock {
            product_id: 7,
            name: "Coca-Cola".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product Coca-Cola (ID 7): available 2, requested 3"
        );

        let err = SaleError::InsufficientPayment {
            total: Money::from_cents(5000),
            tendered: Money::from_cents(4000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient payment amount: total $50.00, tendered $40.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        };
        assert_eq!(err.to_string(), "username must be at least 3 characters");
    }

    #[test]
    fn test_validation_converts_to_core_and_sale_errors() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.clone().into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let sale_err: SaleError = validation_err.into();
        assert_eq!(sale_err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn test_store_error_is_persistence() {
        let sale_err: SaleError = StoreError::backend("database is locked").into();
        assert!(sale_err.is_persistence());
        assert_eq!(sale_err.code(), "PERSISTENCE_FAILURE");

        let not_persistence = SaleError::ProductNotFound { product_id: 1 };
        assert!(!not_persistence.is_persistence());
    }
}
