//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler -> Result<Json<Envelope<T>>, ApiError>                         │
//! │       │                                                                 │
//! │       ├── ValidationError ──► VALIDATION_ERROR        400              │
//! │       ├── DbError ──────────► NOT_FOUND / CONFLICT    404 / 409 / 500  │
//! │       ├── SaleError ────────► INSUFFICIENT_STOCK ...  400 / 409 / 422  │
//! │       │                                                    / 500       │
//! │       └── auth failures ────► UNAUTHORIZED / FORBIDDEN 401 / 403       │
//! │                                                                         │
//! │  Body: { "success": false, "code": "NOT_FOUND", "message": "..." }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage details are logged, never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tally_core::{CoreError, SaleError, ValidationError};
use tally_db::DbError;

/// Error returned from HTTP handlers.
#[derive(Debug, Clone)]
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

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Uniqueness clash (409)
    Conflict,

    /// Sale request broke a precondition (400)
    InvalidRequest,

    /// Sale line names an unknown product (422)
    ProductNotFound,

    /// Sale line names a deactivated product (422)
    ProductInactive,

    /// Not enough stock (422)
    InsufficientStock,

    /// Tendered less than total (422)
    InsufficientPayment,

    /// Generated sale number collided (409)
    DuplicateSaleNumber,

    /// Sale could not be persisted (500)
    PersistenceFailure,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::DuplicateSaleNumber => StatusCode::CONFLICT,
            ErrorCode::ProductNotFound
            | ErrorCode::ProductInactive
            | ErrorCode::InsufficientStock
            | ErrorCode::InsufficientPayment => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PersistenceFailure | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
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
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "code": self.code,
            "message": self.message,
        });

        (self.status(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!(%message, "Check constraint violation");
                ApiError::validation("Value violates a data constraint")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Transaction", id),
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts sale failures, keeping each failure's own code.
impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        let code = match &err {
            SaleError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            SaleError::ProductNotFound { .. } => ErrorCode::ProductNotFound,
            SaleError::ProductInactive { .. } => ErrorCode::ProductInactive,
            SaleError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            SaleError::InsufficientPayment { .. } => ErrorCode::InsufficientPayment,
            SaleError::DuplicateSaleNumber(_) => ErrorCode::DuplicateSaleNumber,
            SaleError::Persistence(e) => {
                tracing::error!(error = %e, "Sale persistence failed");
                return ApiError::new(
                    ErrorCode::PersistenceFailure,
                    "Failed to record transaction, please retry",
                );
            }
        };

        ApiError::new(code, err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
