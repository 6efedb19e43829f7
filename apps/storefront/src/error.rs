//! # Application Error Type
//!
//! Unified error type for the Sale, Cart and Product handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in a Handler                              │
//! │                                                                         │
//! │  command ──► validate() ── ValidationErrors ──────────────┐            │
//! │     │                                                     │            │
//! │     ▼                                                     │            │
//! │  repo.get_by_id() ── None ──► AppError::NotFound ─────────┤            │
//! │     │                                                     │            │
//! │     ▼                                                     ▼            │
//! │  sale.cancel() ── OrderError ──────────────────────────► AppError      │
//! │     │                                                     ▲            │
//! │     ▼                                                     │            │
//! │  repo.save() ── DbError ──────────────────────────────────┘            │
//! │                                                                         │
//! │  AppError::code() / to_response() ──► { code, message } for transport  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use storefront_core::{OrderError, ValidationErrors};
use storefront_db::DbError;
use thiserror::Error;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested entity doesn't exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The command broke one or more input rules.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The aggregate refused the operation.
    #[error(transparent)]
    Domain(#[from] OrderError),

    /// The store failed.
    #[error(transparent)]
    Database(DbError),
}

/// Machine-readable error codes.
///
/// ## Suggested Status Mapping
/// | Code               | HTTP |
/// |--------------------|------|
/// | `NOT_FOUND`        | 404  |
/// | `VALIDATION_ERROR` | 400  |
/// | `INVALID_ARGUMENT` | 400  |
/// | `ALREADY_CANCELLED`| 409  |
/// | `CONFLICT`         | 409  |
/// | `DATABASE_ERROR`   | 500  |
/// | `INTERNAL`         | 500  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InvalidArgument,
    AlreadyCancelled,
    Conflict,
    DatabaseError,
    Internal,
}

/// What a transport sends back when a handler fails.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Sale not found: 5b0c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    /// Creates a not found error.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::Domain(OrderError::InvalidArgument(_)) => ErrorCode::InvalidArgument,
            AppError::Domain(OrderError::AlreadyCancelled(_)) => ErrorCode::AlreadyCancelled,
            AppError::Database(DbError::Conflict { .. }) => ErrorCode::Conflict,
            AppError::Database(DbError::UniqueViolation { .. }) => ErrorCode::ValidationError,
            AppError::Database(DbError::Internal(_)) => ErrorCode::Internal,
            AppError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Builds the outward response.
    ///
    /// Storage failures are logged in full and reported with a generic
    /// message; everything else carries its own message.
    pub fn to_response(&self) -> ErrorResponse {
        let code = self.code();
        let message = match self {
            AppError::Database(err) => match err {
                DbError::Conflict { .. } | DbError::UniqueViolation { .. } => err.to_string(),
                DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                    tracing::error!("Database unavailable: {}", err);
                    "Database unavailable".to_string()
                }
                DbError::TransactionFailed(_) => {
                    tracing::error!("Transaction failed: {}", err);
                    "Database transaction failed".to_string()
                }
                _ => {
                    tracing::error!("Database operation failed: {}", err);
                    "Database operation failed".to_string()
                }
            },
            other => other.to_string(),
        };

        ErrorResponse { code, message }
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::NotFound { entity, id },
            other => AppError::Database(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Convenience type alias for handler results.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ValidationError;

    #[test]
    fn test_db_not_found_becomes_app_not_found() {
        let err: AppError = DbError::not_found("Sale", "abc").into();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Sale not found: abc");
    }

    #[test]
    fn test_codes_by_source() {
        let err: AppError = OrderError::AlreadyCancelled("Sale is already cancelled.".into()).into();
        assert_eq!(err.code(), ErrorCode::AlreadyCancelled);

        let err: AppError = OrderError::InvalidArgument("bad".into()).into();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err: AppError = DbError::conflict("Cart", "x", 2).into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: AppError = ValidationErrors::from(ValidationError::Required {
            field: "title".into(),
        })
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_storage_details_stay_internal() {
        let err: AppError = DbError::QueryFailed("no such column: secret".into()).into();
        let response = err.to_response();
        assert_eq!(response.code, ErrorCode::DatabaseError);
        assert_eq!(response.message, "Database operation failed");
    }

    #[test]
    fn test_response_serializes_code() {
        let response = AppError::not_found("Product", "p-1").to_response();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-1");
    }
}
