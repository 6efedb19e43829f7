//! # Order Aggregate
//!
//! The Sale and Cart aggregates. Both have exactly the same shape and rules,
//! so they are one generic type, [`Order<K>`], tagged with a zero-sized kind
//! marker. [`Sale`] and [`Cart`] are aliases.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │   Order::new() ──► ACTIVE ──────────── cancel() ──────────► CANCELLED   │
//! │                      │  ▲                                     │         │
//! │                      │  │ add_item()      (discount computed) │ reads   │
//! │                      │  │ replace_items() (discount trusted)  │ only    │
//! │                      │  │ update_*()                          │         │
//! │                      └──┘                                     ▼         │
//! │                                              every item is_cancelled    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `total_amount()` is the sum of every line total, cancelled lines included
//! - A cancelled order accepts no new or replacement items
//! - No line ever holds more than 20 identical items
//! - Every failing operation leaves the order untouched

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::discount::{calculate_discount, DiscountRate};
use crate::error::{OrderError, OrderResult};
use crate::ids::{CustomerId, ProductId};
use crate::money::Money;
use crate::{MAX_FUTURE_DATE_SKEW_MINUTES, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};

// =============================================================================
// Order Kind
// =============================================================================

/// Distinguishes Sales from Carts at the type level.
pub trait OrderKind:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static
{
    /// Display name used in messages ("Sale", "Cart").
    const NAME: &'static str;

    /// Lower-case name used in messages ("sale", "cart").
    const LABEL: &'static str;
}

/// Marker for the Sale aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaleKind;

impl OrderKind for SaleKind {
    const NAME: &'static str = "Sale";
    const LABEL: &'static str = "sale";
}

/// Marker for the Cart aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartKind;

impl OrderKind for CartKind {
    const NAME: &'static str = "Cart";
    const LABEL: &'static str = "cart";
}

/// A completed or in-progress sale.
pub type Sale = Order<SaleKind>;

/// A customer's shopping cart.
pub type Cart = Order<CartKind>;

// =============================================================================
// Order Item
// =============================================================================

/// A line of an order: one product, one quantity, one frozen discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    id: Uuid,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    discount_rate: DiscountRate,
    is_cancelled: bool,
}

impl OrderItem {
    /// Creates a validated line with a caller-supplied discount.
    ///
    /// Used to build replacement sets for [`Order::replace_items`]; the caller
    /// computes `discount_rate` with [`calculate_discount`].
    pub fn new(
        id: Uuid,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
        discount_rate: DiscountRate,
    ) -> OrderResult<Self> {
        if id.is_nil() {
            return Err(OrderError::invalid("Item ID must be a valid GUID."));
        }
        check_line(product_id, quantity, unit_price)?;

        Ok(OrderItem {
            id,
            product_id,
            quantity,
            unit_price,
            discount_rate,
            is_cancelled: false,
        })
    }

    /// Rebuilds a line from storage without re-checking business rules.
    pub fn from_storage(
        id: Uuid,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
        discount_rate: DiscountRate,
        is_cancelled: bool,
    ) -> Self {
        OrderItem {
            id,
            product_id,
            quantity,
            unit_price,
            discount_rate,
            is_cancelled,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[inline]
    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    #[inline]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    #[inline]
    pub fn discount_rate(&self) -> DiscountRate {
        self.discount_rate
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    /// `quantity × unit_price × (1 − discount_rate)`, exact.
    pub fn total(&self) -> Money {
        Money::new(self.unit_price)
            .multiply_quantity(self.quantity)
            .apply_discount(self.discount_rate)
    }

    fn ensure_cancellable(&self) -> OrderResult<()> {
        if self.is_cancelled {
            return Err(OrderError::cancelled(format!(
                "Item {} is already cancelled.",
                self.id
            )));
        }
        Ok(())
    }

    pub(crate) fn cancel(&mut self) -> OrderResult<()> {
        self.ensure_cancellable()?;
        self.is_cancelled = true;
        Ok(())
    }
}

/// Rules shared by `add_item` and `OrderItem::new`.
fn check_line(product_id: ProductId, quantity: i32, unit_price: Decimal) -> OrderResult<()> {
    if product_id.is_nil() {
        return Err(OrderError::invalid("ProductId must be a valid GUID."));
    }
    if quantity < 1 {
        return Err(OrderError::invalid("Quantity must be at least 1."));
    }
    if unit_price <= Decimal::ZERO {
        return Err(OrderError::invalid("UnitPrice must be greater than zero."));
    }
    if unit_price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(OrderError::invalid(format!(
            "UnitPrice cannot exceed {}.",
            MAX_UNIT_PRICE
        )));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(OrderError::invalid(format!(
            "Cannot sell more than {} identical items.",
            MAX_ITEM_QUANTITY
        )));
    }
    Ok(())
}

// =============================================================================
// Order
// =============================================================================

/// The Sale/Cart aggregate root.
///
/// Items live in a private `Vec` and are only visible as a slice; every
/// mutation goes through the methods below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order<K: OrderKind> {
    id: Uuid,
    number: String,
    date: DateTime<Utc>,
    customer_id: CustomerId,
    branch: String,
    is_cancelled: bool,
    items: Vec<OrderItem>,
    version: i64,
    kind: PhantomData<K>,
}

impl<K: OrderKind> Order<K> {
    /// Creates an active order with no items.
    ///
    /// ## Errors
    /// `InvalidArgument` when `id` or `customer_id` is nil or `number` is blank.
    pub fn new(
        id: Uuid,
        number: impl Into<String>,
        date: DateTime<Utc>,
        customer_id: CustomerId,
        branch: impl Into<String>,
    ) -> OrderResult<Self> {
        let number = number.into();

        if id.is_nil() {
            return Err(OrderError::invalid(format!(
                "{} ID must be a valid GUID.",
                K::NAME
            )));
        }
        if number.trim().is_empty() {
            return Err(OrderError::invalid(format!(
                "{}Number cannot be empty.",
                K::NAME
            )));
        }
        if customer_id.is_nil() {
            return Err(OrderError::invalid("CustomerId cannot be empty."));
        }

        Ok(Order {
            id,
            number,
            date,
            customer_id,
            branch: branch.into(),
            is_cancelled: false,
            items: Vec::new(),
            version: 0,
            kind: PhantomData,
        })
    }

    /// Rebuilds an order from storage without re-checking business rules.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: Uuid,
        number: String,
        date: DateTime<Utc>,
        customer_id: CustomerId,
        branch: String,
        is_cancelled: bool,
        items: Vec<OrderItem>,
        version: i64,
    ) -> Self {
        Order {
            id,
            number,
            date,
            customer_id,
            branch,
            is_cancelled,
            items,
            version,
            kind: PhantomData,
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn number(&self) -> &str {
        &self.number
    }

    #[inline]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[inline]
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    #[inline]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    /// Read-only view of the lines, in insertion order.
    #[inline]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Optimistic-concurrency version as last loaded from storage.
    #[inline]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Sum of every line total, cancelled lines included.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(OrderItem::total).sum()
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Appends a new line, computing its discount from the quantity tier.
    ///
    /// Identical products are never merged; each call adds its own line.
    ///
    /// ## Errors
    /// - `AlreadyCancelled` if the order is cancelled
    /// - `InvalidArgument` for a nil product, quantity outside 1..=20 or a
    ///   unit price of zero or less
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: i32,
        unit_price: Decimal,
    ) -> OrderResult<&OrderItem> {
        self.ensure_active(&format!("Cannot add items to a cancelled {}.", K::LABEL))?;
        check_line(product_id, quantity, unit_price)?;
        let discount_rate = calculate_discount(quantity)?;

        self.items.push(OrderItem {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            unit_price,
            discount_rate,
            is_cancelled: false,
        });

        Ok(&self.items[self.items.len() - 1])
    }

    /// Discards every line and adopts `new_items` as given.
    ///
    /// Discount rates on the incoming lines are trusted, not recomputed.
    pub fn replace_items(&mut self, new_items: impl IntoIterator<Item = OrderItem>) -> OrderResult<()> {
        self.ensure_active(&format!(
            "Cannot replace items on a cancelled {}.",
            K::LABEL
        ))?;

        self.items = new_items.into_iter().collect();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------

    /// Cancels the order and every line on it.
    ///
    /// All lines are checked before anything changes, so a line that was
    /// somehow already cancelled fails the whole call with the order intact.
    pub fn cancel(&mut self) -> OrderResult<()> {
        self.ensure_active(&format!("{} is already cancelled.", K::NAME))?;
        for item in &self.items {
            item.ensure_cancellable()?;
        }

        self.is_cancelled = true;
        for item in &mut self.items {
            item.cancel()?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Header updates
    // -------------------------------------------------------------------------

    pub fn update_number(&mut self, new_number: impl Into<String>) -> OrderResult<()> {
        let new_number = new_number.into();
        if new_number.trim().is_empty() {
            return Err(OrderError::invalid(format!(
                "{}Number cannot be empty.",
                K::NAME
            )));
        }
        self.number = new_number;
        Ok(())
    }

    /// Moves the order date; rejects dates more than five minutes ahead of now.
    pub fn update_date(&mut self, new_date: DateTime<Utc>) -> OrderResult<()> {
        self.update_date_at(new_date, Utc::now())
    }

    /// [`Order::update_date`] against an explicit clock reading.
    pub fn update_date_at(&mut self, new_date: DateTime<Utc>, now: DateTime<Utc>) -> OrderResult<()> {
        if new_date > now + Duration::minutes(MAX_FUTURE_DATE_SKEW_MINUTES) {
            return Err(OrderError::invalid(format!(
                "{} date cannot be in the far future.",
                K::NAME
            )));
        }
        self.date = new_date;
        Ok(())
    }

    pub fn update_customer(&mut self, new_customer_id: CustomerId) -> OrderResult<()> {
        if new_customer_id.is_nil() {
            return Err(OrderError::invalid("CustomerId cannot be empty."));
        }
        self.customer_id = new_customer_id;
        Ok(())
    }

    /// Branch is free text and accepted as-is.
    pub fn update_branch(&mut self, new_branch: impl Into<String>) {
        self.branch = new_branch.into();
    }

    fn ensure_active(&self, message: &str) -> OrderResult<()> {
        if self.is_cancelled {
            return Err(OrderError::cancelled(message));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    fn product() -> ProductId {
        ProductId::new(Uuid::new_v4())
    }

    fn new_sale() -> Sale {
        Sale::new(
            Uuid::new_v4(),
            "A-1",
            Utc::now(),
            CustomerId::new(Uuid::new_v4()),
            "B",
        )
        .unwrap()
    }

    #[test]
    fn test_create_starts_active_and_empty() {
        let sale = new_sale();
        assert_eq!(sale.number(), "A-1");
        assert_eq!(sale.branch(), "B");
        assert!(!sale.is_cancelled());
        assert!(sale.items().is_empty());
        assert_eq!(sale.version(), 0);
        assert!(sale.total_amount().is_zero());
    }

    #[test]
    fn test_create_rejects_bad_header() {
        let customer = CustomerId::new(Uuid::new_v4());

        let err = Sale::new(Uuid::nil(), "A-1", Utc::now(), customer, "B").unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)));

        let err = Cart::new(Uuid::new_v4(), "   ", Utc::now(), customer, "B").unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidArgument("CartNumber cannot be empty.".to_string())
        );

        let err = Sale::new(
            Uuid::new_v4(),
            "A-1",
            Utc::now(),
            CustomerId::new(Uuid::nil()),
            "B",
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)));
    }

    #[test]
    fn test_add_items_scenario() {
        let mut sale = new_sale();

        let first = sale.add_item(product(), 3, dec(1000, 2)).unwrap();
        assert_eq!(first.discount_rate(), DiscountRate::NONE);
        assert_eq!(first.total().amount(), dec(30, 0));

        let second = sale.add_item(product(), 5, dec(1000, 2)).unwrap();
        assert_eq!(second.discount_rate(), DiscountRate::TEN_PERCENT);
        assert_eq!(second.total().amount(), dec(45, 0));

        assert_eq!(sale.total_amount().amount(), dec(75, 0));
    }

    #[test]
    fn test_add_item_top_tier() {
        let mut sale = new_sale();
        let item = sale.add_item(product(), 20, dec(200, 2)).unwrap();
        assert_eq!(item.discount_rate(), DiscountRate::TWENTY_PERCENT);
        assert_eq!(item.total().amount(), dec(32, 0));
    }

    #[test]
    fn test_add_item_quantity_over_limit_appends_nothing() {
        let mut sale = new_sale();
        let err = sale.add_item(product(), 21, dec(200, 2)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)));
        assert!(sale.items().is_empty());
    }

    #[test]
    fn test_add_item_rejects_bad_lines() {
        let mut sale = new_sale();
        assert!(sale.add_item(ProductId::new(Uuid::nil()), 1, dec(1, 0)).is_err());
        assert!(sale.add_item(product(), 0, dec(1, 0)).is_err());
        assert!(sale.add_item(product(), 1, Decimal::ZERO).is_err());
        assert!(sale.add_item(product(), 1, dec(-1, 0)).is_err());
        assert!(sale.items().is_empty());
    }

    #[test]
    fn test_add_item_price_cap() {
        let mut sale = new_sale();
        let err = sale.add_item(product(), 20, Decimal::MAX).unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)));
        assert!(sale.items().is_empty());

        // 20 × 1e9 at 20% off
        sale.add_item(product(), 20, Decimal::from(MAX_UNIT_PRICE)).unwrap();
        assert_eq!(sale.total_amount().amount(), Decimal::from(16_000_000_000i64));
    }

    #[test]
    fn test_same_product_is_not_merged() {
        let mut sale = new_sale();
        let p = product();
        sale.add_item(p, 2, dec(5, 0)).unwrap();
        sale.add_item(p, 2, dec(5, 0)).unwrap();

        assert_eq!(sale.items().len(), 2);
        assert_ne!(sale.items()[0].id(), sale.items()[1].id());
        // Each line is priced on its own quantity, so neither reaches the 10% tier
        assert!(sale.items().iter().all(|i| i.discount_rate().is_zero()));
    }

    #[test]
    fn test_cancel_cascades_to_items() {
        let mut sale = new_sale();
        sale.add_item(product(), 3, dec(1000, 2)).unwrap();
        sale.add_item(product(), 5, dec(1000, 2)).unwrap();

        sale.cancel().unwrap();

        assert!(sale.is_cancelled());
        assert!(sale.items().iter().all(OrderItem::is_cancelled));
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut sale = new_sale();
        sale.add_item(product(), 1, dec(1, 0)).unwrap();
        sale.cancel().unwrap();

        let err = sale.cancel().unwrap_err();
        assert!(matches!(err, OrderError::AlreadyCancelled(_)));
        assert!(sale.is_cancelled());
    }

    #[test]
    fn test_cancelled_order_rejects_mutation_of_items() {
        let mut sale = new_sale();
        sale.cancel().unwrap();

        let err = sale.add_item(product(), 1, dec(1, 0)).unwrap_err();
        assert!(matches!(err, OrderError::AlreadyCancelled(_)));

        let err = sale.replace_items(Vec::new()).unwrap_err();
        assert!(matches!(err, OrderError::AlreadyCancelled(_)));
    }

    #[test]
    fn test_cancel_with_precancelled_item_leaves_order_untouched() {
        let items = vec![
            OrderItem::from_storage(Uuid::new_v4(), product(), 1, dec(1, 0), DiscountRate::NONE, false),
            OrderItem::from_storage(Uuid::new_v4(), product(), 1, dec(1, 0), DiscountRate::NONE, true),
        ];
        let mut sale = Sale::from_storage(
            Uuid::new_v4(),
            "A-1".to_string(),
            Utc::now(),
            CustomerId::new(Uuid::new_v4()),
            "B".to_string(),
            false,
            items,
            3,
        );

        let err = sale.cancel().unwrap_err();
        assert!(matches!(err, OrderError::AlreadyCancelled(_)));
        assert!(!sale.is_cancelled());
        assert!(!sale.items()[0].is_cancelled());
    }

    /// Cancelled lines still count towards the total. Pinned on purpose.
    #[test]
    fn test_total_includes_cancelled_items() {
        let mut sale = new_sale();
        sale.add_item(product(), 3, dec(1000, 2)).unwrap();
        sale.add_item(product(), 5, dec(1000, 2)).unwrap();

        let before = sale.total_amount();
        sale.cancel().unwrap();
        assert_eq!(sale.total_amount(), before);
        assert_eq!(before.amount(), dec(75, 0));
    }

    #[test]
    fn test_replace_items_trusts_given_discount() {
        let mut sale = new_sale();
        sale.add_item(product(), 1, dec(1, 0)).unwrap();

        // 2 units would normally be 0%, the caller's 20% is kept as-is
        let replacement = OrderItem::new(
            Uuid::new_v4(),
            product(),
            2,
            dec(10, 0),
            DiscountRate::TWENTY_PERCENT,
        )
        .unwrap();
        let replacement_id = replacement.id();

        sale.replace_items(vec![replacement]).unwrap();

        assert_eq!(sale.items().len(), 1);
        assert_eq!(sale.items()[0].id(), replacement_id);
        assert_eq!(sale.total_amount().amount(), dec(16, 0));
    }

    #[test]
    fn test_item_new_validates() {
        let rate = DiscountRate::NONE;
        assert!(OrderItem::new(Uuid::nil(), product(), 1, dec(1, 0), rate).is_err());
        assert!(OrderItem::new(Uuid::new_v4(), product(), 21, dec(1, 0), rate).is_err());
        assert!(OrderItem::new(Uuid::new_v4(), product(), 0, dec(1, 0), rate).is_err());
        assert!(OrderItem::new(Uuid::new_v4(), product(), 1, Decimal::ZERO, rate).is_err());
        assert!(OrderItem::new(Uuid::new_v4(), product(), 20, Decimal::MAX, rate).is_err());
    }

    #[test]
    fn test_update_date_window() {
        let mut sale = new_sale();
        let now = Utc::now();

        let err = sale.update_date(now + Duration::minutes(10)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)));

        let ok = now + Duration::minutes(1);
        sale.update_date(ok).unwrap();
        assert_eq!(sale.date(), ok);
    }

    #[test]
    fn test_update_date_at_boundary() {
        let mut sale = new_sale();
        let now = Utc::now();

        sale.update_date_at(now + Duration::minutes(5), now).unwrap();
        assert!(sale
            .update_date_at(now + Duration::minutes(5) + Duration::seconds(1), now)
            .is_err());
        sale.update_date_at(now - Duration::days(30), now).unwrap();
    }

    #[test]
    fn test_header_updates() {
        let mut sale = new_sale();

        assert!(sale.update_number("  ").is_err());
        assert_eq!(sale.number(), "A-1");
        sale.update_number("A-2").unwrap();
        assert_eq!(sale.number(), "A-2");

        assert!(sale.update_customer(CustomerId::new(Uuid::nil())).is_err());
        let customer = CustomerId::new(Uuid::new_v4());
        sale.update_customer(customer).unwrap();
        assert_eq!(sale.customer_id(), customer);

        // No rule on branch, even an empty one is accepted
        sale.update_branch("");
        assert_eq!(sale.branch(), "");
    }

    #[test]
    fn test_header_updates_allowed_after_cancel() {
        let mut sale = new_sale();
        sale.cancel().unwrap();
        sale.update_number("A-9").unwrap();
        assert_eq!(sale.number(), "A-9");
    }
}
