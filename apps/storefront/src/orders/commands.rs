//! # Order Commands
//!
//! Inputs for the sale and cart handlers, with the rules each one must pass
//! before any aggregate is touched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_core::validation::{
    validate_order_line, validate_order_number, validate_required, validate_required_id,
    Validator,
};
use storefront_core::{ValidationError, ValidationErrors};

/// One line of a create or update command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLineInput {
    pub fn new(product_id: Uuid, quantity: i32, unit_price: Decimal) -> Self {
        OrderLineInput {
            product_id,
            quantity,
            unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderCommand {
    pub number: String,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch: String,
    pub items: Vec<OrderLineInput>,
}

impl CreateOrderCommand {
    /// Checks every rule and reports all failures together.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        validate_header(
            &mut v,
            &self.number,
            self.customer_id,
            &self.branch,
            &self.items,
        );
        v.finish()
    }
}

/// Replaces the header and the whole item set of an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderCommand {
    pub id: Uuid,
    pub number: String,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch: String,
    pub items: Vec<OrderLineInput>,
}

impl UpdateOrderCommand {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check(validate_required_id("id", self.id));
        validate_header(
            &mut v,
            &self.number,
            self.customer_id,
            &self.branch,
            &self.items,
        );
        v.finish()
    }
}

/// Paging for the list handlers; missing values fall back to page 1 and
/// the configured page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl ListOrdersQuery {
    pub fn page(page: i64, size: i64) -> Self {
        ListOrdersQuery {
            page: Some(page),
            size: Some(size),
        }
    }
}

fn validate_header(
    v: &mut Validator,
    number: &str,
    customer_id: Uuid,
    branch: &str,
    items: &[OrderLineInput],
) {
    v.check(validate_order_number("number", number))
        .check(validate_required_id("customer_id", customer_id))
        .check(validate_required("branch", branch));

    if items.is_empty() {
        v.check(Err(ValidationError::Required {
            field: "items".to_string(),
        }));
    }
    for (index, line) in items.iter().enumerate() {
        validate_order_line(v, index, line.product_id, line.quantity, line.unit_price);
    }
}
