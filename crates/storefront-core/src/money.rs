//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Line totals apply a discount rate to a unit price:                     │
//! │    5 × 9.99 × 0.90 = 44.955 (half a cent matters here)                 │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 decimals (rust_decimal)                          │
//! │    Every product, rate and total is exact. No rounding happens until   │
//! │    something is displayed.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::money::Money;
//!
//! let price = Money::new(Decimal::new(1099, 2)); // 10.99
//! let line = price.multiply_quantity(3);          // 32.97
//! assert_eq!(line.amount(), Decimal::new(3297, 2));
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::discount::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost wrapper
/// - **No float constructor**: There is deliberately no `from_f64`
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  OrderItem.unit_price ──► OrderItem.total ──┐                           │
/// │                                             ├──► Order.total_amount()   │
/// │  OrderItem.unit_price ──► OrderItem.total ──┘                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use storefront_core::money::Money;
    ///
    /// let unit_price = Money::new(Decimal::new(299, 2));
    /// assert_eq!(unit_price.multiply_quantity(3).amount(), Decimal::new(897, 2));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns the amount left after taking `rate` off.
    ///
    /// The result is exact: `amount × (1 − rate)`, no rounding.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use storefront_core::money::Money;
    /// use storefront_core::DiscountRate;
    ///
    /// let subtotal = Money::new(Decimal::new(100, 0));
    /// let discounted = subtotal.apply_discount(DiscountRate::TEN_PERCENT);
    /// assert_eq!(discounted.amount(), Decimal::new(90, 0));
    /// ```
    #[inline]
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        Money(self.0 * (Decimal::ONE - rate.value()))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to cents for humans. Use [`Money::amount`] for exact values.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${:.2}", rounded.abs())
        }
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
