//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── OrderError        - Aggregate rule violations                     │
//! │  ├── ValidationError   - A single failed input rule                    │
//! │  └── ValidationErrors  - Every failed rule of one command              │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  apps/storefront errors                                                │
//! │  └── AppError          - What the caller sees (adds NotFound)          │
//! │                                                                         │
//! │  Flow: ValidationErrors / OrderError / DbError → AppError → caller     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, id, etc.)
//! 3. Errors are enum variants, never String
//! 4. The aggregate never reports "not found"; that belongs to the caller

use std::fmt;

use thiserror::Error;

// =============================================================================
// Order Error
// =============================================================================

/// Violations raised by the Sale/Cart aggregate.
///
/// Every variant is raised before any state changes, so an aggregate that
/// returned an error is exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Malformed or out-of-range input to a constructor or mutator.
    ///
    /// ## When This Occurs
    /// - Nil order, item, product or customer id
    /// - Blank order number
    /// - Quantity below 1 or above 20
    /// - Unit price of zero or less
    /// - Date more than five minutes in the future
    #[error("{0}")]
    InvalidArgument(String),

    /// An operation that needs an active order hit a cancelled one.
    ///
    /// ## User Workflow
    /// ```text
    /// cancel_sale(id)  ──► Sale { is_cancelled: true }
    ///      │
    ///      ▼
    /// update_sale(id)  ──► replace_items()
    ///      │
    ///      ▼
    /// AlreadyCancelled("Cannot replace items on a cancelled sale")
    /// ```
    #[error("{0}")]
    AlreadyCancelled(String),
}

impl OrderError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        OrderError::InvalidArgument(message.into())
    }

    pub(crate) fn cancelled(message: impl Into<String>) -> Self {
        OrderError::AlreadyCancelled(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a command doesn't meet its declared rules.
/// They are checked before any handler logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid URL, malformed sort clause).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the field the rule was declared on.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

/// Every rule that failed for one command, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wraps a list of failures.
    pub fn new(errors: Vec<ValidationError>) -> Self {
        ValidationErrors(errors)
    }

    /// The individual failures.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for aggregate operations.
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_messages() {
        let err = OrderError::invalid("Quantity must be at least 1.");
        assert_eq!(err.to_string(), "Quantity must be at least 1.");

        let err = OrderError::cancelled("Sale is already cancelled.");
        assert!(matches!(err, OrderError::AlreadyCancelled(_)));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sale_number".to_string(),
        };
        assert_eq!(err.to_string(), "sale_number is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 20,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 20");
        assert_eq!(err.field(), "quantity");
    }

    #[test]
    fn test_validation_errors_join_messages() {
        let errors = ValidationErrors::new(vec![
            ValidationError::Required {
                field: "title".to_string(),
            },
            ValidationError::MustBePositive {
                field: "price".to_string(),
            },
        ]);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "title is required; price must be greater than zero"
        );
    }
}
