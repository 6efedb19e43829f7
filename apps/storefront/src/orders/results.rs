//! # Order Results
//!
//! DTOs returned by the sale and cart handlers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_core::{Order, OrderItem, OrderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResult {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResult {
    pub success: bool,
}

impl SuccessResult {
    pub const OK: SuccessResult = SuccessResult { success: true };
}

/// Full view of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub id: Uuid,
    pub number: String,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch: String,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
    pub items: Vec<OrderItemDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetails {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_rate: Decimal,
    pub is_cancelled: bool,
    pub total: Decimal,
}

/// One row of a list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub number: String,
    pub date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch: String,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    pub page: u32,
    pub size: u32,
    pub total_items: i64,
    pub items: Vec<OrderSummary>,
}

/// The tier a quantity would land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreview {
    pub quantity: i32,
    pub discount_rate: Decimal,
}

impl From<&OrderItem> for OrderItemDetails {
    fn from(item: &OrderItem) -> Self {
        OrderItemDetails {
            id: item.id(),
            product_id: item.product_id().value(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            discount_rate: item.discount_rate().value(),
            is_cancelled: item.is_cancelled(),
            total: item.total().amount(),
        }
    }
}

impl<K: OrderKind> From<&Order<K>> for OrderDetails {
    fn from(order: &Order<K>) -> Self {
        OrderDetails {
            id: order.id(),
            number: order.number().to_string(),
            date: order.date(),
            customer_id: order.customer_id().value(),
            branch: order.branch().to_string(),
            total_amount: order.total_amount().amount(),
            is_cancelled: order.is_cancelled(),
            items: order.items().iter().map(OrderItemDetails::from).collect(),
        }
    }
}

impl<K: OrderKind> From<&Order<K>> for OrderSummary {
    fn from(order: &Order<K>) -> Self {
        OrderSummary {
            id: order.id(),
            number: order.number().to_string(),
            date: order.date(),
            customer_id: order.customer_id().value(),
            branch: order.branch().to_string(),
            total_amount: order.total_amount().amount(),
            is_cancelled: order.is_cancelled(),
            item_count: order.items().len(),
        }
    }
}
