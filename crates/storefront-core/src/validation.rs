//! # Validation Module
//!
//! Input rule checks for commands, run before any handler logic.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command validation (THIS MODULE)                             │
//! │  ├── Required fields, ranges, formats                                  │
//! │  └── Every failing rule is collected and reported together             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Aggregate (order.rs)                                         │
//! │  ├── Same line rules, enforced again on every mutation                 │
//! │  └── Cancellation state                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::validation::{validate_quantity, validate_unit_price, Validator};
//!
//! let mut v = Validator::new();
//! v.check(validate_quantity("items[0].quantity", 25));
//! v.check(validate_unit_price("items[0].unit_price", Decimal::ZERO));
//!
//! let errors = v.finish().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ValidationError, ValidationErrors};
use crate::{MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound on a product rating.
pub const MAX_RATING: i64 = 5;

// =============================================================================
// Collector
// =============================================================================

/// Gathers the outcome of several checks so they can be reported at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    /// Records a failed check; successful checks are ignored.
    pub fn check(&mut self, result: ValidationResult<()>) -> &mut Self {
        if let Err(err) = result {
            self.errors.push(err);
        }
        self
    }

    /// Records every failure from a nested batch, e.g. a page request.
    pub fn extend(&mut self, errors: ValidationErrors) -> &mut Self {
        self.errors.extend(errors.errors().iter().cloned());
        self
    }

    /// `Ok` if nothing failed, otherwise every failure in check order.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors::new(self.errors))
        }
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Fails with `Required` if `value` is empty or whitespace.
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_required;
///
/// assert!(validate_required("branch", "Downtown").is_ok());
/// assert!(validate_required("branch", "  ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an order reference number.
///
/// ## Rules
/// - Must not be blank
/// - At most 50 characters
pub fn validate_order_number(field: &str, number: &str) -> ValidationResult<()> {
    validate_required(field, number)?;

    if number.trim().chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates an image reference: required, and an http(s) URL when present.
pub fn validate_image_url(field: &str, image: &str) -> ValidationResult<()> {
    validate_required(field, image)?;

    let image = image.trim();
    if !(image.starts_with("http://") || image.starts_with("https://")) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an http or https URL".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Fails with `Required` for the nil UUID.
pub fn validate_required_id(field: &str, id: Uuid) -> ValidationResult<()> {
    if id.is_nil() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (20)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Create Sale: one line                                                  │
/// │                                                                         │
/// │  Command says quantity: 25                                              │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity("items[0].quantity", 25) ← THIS FUNCTION             │
/// │       │                                                                 │
/// │       ├── qty <= 0? → "must be greater than zero"                       │
/// │       │                                                                 │
/// │       ├── qty > 20? → "must be between 1 and 20"                        │
/// │       │                                                                 │
/// │       └── OK → line goes to Order::add_item                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(field: &str, qty: i32) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

/// Validates a unit or catalogue price: strictly positive and at most
/// [`MAX_UNIT_PRICE`].
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use storefront_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price("price", Decimal::new(1099, 2)).is_ok());
/// assert!(validate_unit_price("price", Decimal::ZERO).is_err());
/// ```
pub fn validate_unit_price(field: &str, price: Decimal) -> ValidationResult<()> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }
    Ok(())
}

/// Rating average must lie in 0..=5.
pub fn validate_rating_rate(rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::from(MAX_RATING) {
        return Err(ValidationError::OutOfRange {
            field: "rating.rate".to_string(),
            min: 0,
            max: MAX_RATING,
        });
    }
    Ok(())
}

/// Rating count must not be negative.
pub fn validate_rating_count(count: i32) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "rating.count".to_string(),
            min: 0,
            max: i64::from(i32::MAX),
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every product field, reporting all failures.
pub fn validate_product(
    title: &str,
    price: Decimal,
    description: &str,
    category: &str,
    image: &str,
    rating_rate: Decimal,
    rating_count: i32,
) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.check(validate_required("title", title))
        .check(validate_unit_price("price", price))
        .check(validate_required("description", description))
        .check(validate_required("category", category))
        .check(validate_image_url("image", image))
        .check(validate_rating_rate(rating_rate))
        .check(validate_rating_count(rating_count));
    v.finish()
}

/// Validates one order line at position `index`.
pub fn validate_order_line(
    v: &mut Validator,
    index: usize,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
) {
    v.check(validate_required_id(
        &format!("items[{}].product_id", index),
        product_id,
    ))
    .check(validate_quantity(
        &format!("items[{}].quantity", index),
        quantity,
    ))
    .check(validate_unit_price(
        &format!("items[{}].unit_price", index),
        unit_price,
    ));
}

// =============================================================================
// Unit Tests
// =============================================================================
