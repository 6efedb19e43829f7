//! # Product
//!
//! A catalogue entry. Sales and carts reference products only by
//! [`ProductId`]; the price on an order line is captured when the line is
//! created and never follows later catalogue changes.
//!
//! Field rules (required text, positive price, rating bounds) are checked by
//! [`crate::validation::validate_product`] before a `Product` is built.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::ProductId;

/// Customer rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Average score, 0 to 5.
    pub rate: Decimal,
    /// Number of ratings the average is over.
    pub count: i32,
}

impl Rating {
    pub const fn new(rate: Decimal, count: i32) -> Self {
        Rating { rate, count }
    }
}

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub rating: Rating,
}

impl Product {
    /// Creates a product with a fresh id.
    pub fn new(
        title: impl Into<String>,
        price: Decimal,
        description: impl Into<String>,
        category: impl Into<String>,
        image: impl Into<String>,
        rating: Rating,
    ) -> Self {
        Product {
            id: ProductId::new(Uuid::new_v4()),
            title: title.into(),
            price,
            description: description.into(),
            category: category.into(),
            image: image.into(),
            rating,
        }
    }

    /// Replaces every mutable field at once.
    pub fn update(
        &mut self,
        title: impl Into<String>,
        price: Decimal,
        description: impl Into<String>,
        category: impl Into<String>,
        image: impl Into<String>,
        rating: Rating,
    ) {
        self.title = title.into();
        self.price = price;
        self.description = description.into();
        self.category = category.into();
        self.image = image.into();
        self.rating = rating;
    }
}
