//! # Discount Policy
//!
//! Quantity-tiered discounts for identical items on one order line.
//!
//! ## Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity      1 ─ 3 │ 4 ─ 9 │ 10 ─ 20 │ 21+                            │
//! │  discount         0% │   10% │     20% │ rejected                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rate is computed once when a line is created and never recomputed.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{OrderError, OrderResult};
use crate::MAX_ITEM_QUANTITY;

/// Quantity at which the 10% tier starts.
pub const TEN_PERCENT_FROM: i32 = 4;

/// Quantity at which the 20% tier starts.
pub const TWENTY_PERCENT_FROM: i32 = 10;

/// A discount rate that can only hold one of the tier values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    /// No discount.
    pub const NONE: DiscountRate = DiscountRate(Decimal::ZERO);

    /// 0.10
    pub const TEN_PERCENT: DiscountRate = DiscountRate(Decimal::from_parts(10, 0, 0, false, 2));

    /// 0.20
    pub const TWENTY_PERCENT: DiscountRate = DiscountRate(Decimal::from_parts(20, 0, 0, false, 2));

    /// Returns the rate as a fraction (0.10 for 10%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Accepts a stored rate if it matches one of the tiers.
    pub fn from_decimal(rate: Decimal) -> OrderResult<Self> {
        [Self::NONE, Self::TEN_PERCENT, Self::TWENTY_PERCENT]
            .into_iter()
            .find(|tier| tier.0 == rate)
            .ok_or_else(|| {
                OrderError::invalid(format!("{} is not a valid discount rate.", rate))
            })
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::NONE
    }
}

impl TryFrom<Decimal> for DiscountRate {
    type Error = OrderError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        DiscountRate::from_decimal(rate)
    }
}

impl From<DiscountRate> for Decimal {
    fn from(rate: DiscountRate) -> Self {
        rate.0
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

/// Maps a line quantity to its discount tier.
///
/// Pure and usable on its own, e.g. to preview the rate for a prospective
/// quantity before any order exists. Quantities below 1 are the caller's
/// concern; they fall in the 0% tier here.
///
/// ## Example
/// ```rust
/// use storefront_core::{calculate_discount, DiscountRate};
///
/// assert_eq!(calculate_discount(3).unwrap(), DiscountRate::NONE);
/// assert_eq!(calculate_discount(4).unwrap(), DiscountRate::TEN_PERCENT);
/// assert_eq!(calculate_discount(20).unwrap(), DiscountRate::TWENTY_PERCENT);
/// assert!(calculate_discount(21).is_err());
/// ```
pub fn calculate_discount(quantity: i32) -> OrderResult<DiscountRate> {
    match quantity {
        q if q > MAX_ITEM_QUANTITY => Err(OrderError::invalid(format!(
            "Cannot sell more than {} identical items.",
            MAX_ITEM_QUANTITY
        ))),
        q if q >= TWENTY_PERCENT_FROM => Ok(DiscountRate::TWENTY_PERCENT),
        q if q >= TEN_PERCENT_FROM => Ok(DiscountRate::TEN_PERCENT),
        _ => Ok(DiscountRate::NONE),
    }
}
