//! # storefront-core: Pure Business Logic for Storefront
//!
//! This crate holds the domain rules for Sales, Carts and Products as
//! plain values and pure functions. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/storefront (handlers)                      │   │
//! │  │   create_sale, update_cart, cancel_sale, list_products, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   order   │  │ discount  │  │   money   │  │ validation│  │   │
//! │  │   │  Order<K> │  │  tiers    │  │   Money   │  │   rules   │  │   │
//! │  │   │ OrderItem │  │ 0/10/20%  │  │ (decimal) │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                storefront-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`order`] - The Sale/Cart aggregate and its line items
//! - [`discount`] - Quantity-tiered discount policy
//! - [`money`] - Money type over exact decimals
//! - [`product`] - Product catalogue entry
//! - [`ids`] - Typed identifiers
//! - [`query`] - Paging and sorting requests
//! - [`error`] - Domain error types
//! - [`validation`] - Input rule checks
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use rust_decimal::Decimal;
//! use storefront_core::{CustomerId, ProductId, Sale};
//! use uuid::Uuid;
//!
//! let mut sale = Sale::new(
//!     Uuid::new_v4(),
//!     "A-1",
//!     Utc::now(),
//!     CustomerId::new(Uuid::new_v4()),
//!     "Downtown",
//! )
//! .unwrap();
//!
//! sale.add_item(ProductId::new(Uuid::new_v4()), 5, Decimal::new(1000, 2)).unwrap();
//!
//! // 5 × 10.00 with the 10% tier
//! assert_eq!(sale.total_amount().amount(), Decimal::new(45, 0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod product;
pub mod query;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{calculate_discount, DiscountRate};
pub use error::{OrderError, ValidationError, ValidationErrors};
pub use ids::{CustomerId, ProductId};
pub use money::Money;
pub use order::{Cart, CartKind, Order, OrderItem, OrderKind, Sale, SaleKind};
pub use product::{Product, Rating};
pub use query::{PageRequest, ProductSort, ProductSortField, SortDirection, MAX_PAGE_SIZE};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of identical items on a single order line.
pub const MAX_ITEM_QUANTITY: i32 = 20;

/// Highest unit or catalogue price accepted, in whole currency units.
///
/// Bounds line totals (at most `20 × MAX_UNIT_PRICE`) far below the range of
/// `Decimal`, so totals never overflow.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

/// How far ahead of the current UTC time an order date may be set.
pub const MAX_FUTURE_DATE_SKEW_MINUTES: i64 = 5;
