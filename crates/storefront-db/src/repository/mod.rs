//! # Repository Module
//!
//! Unit-of-work repositories for the storefront.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Handler Uses a Repository                      │
//! │                                                                         │
//! │  let mut repo = db.sales();        one repository per handler call     │
//! │       │                                                                 │
//! │       ├── get_by_id / list / count ──► read straight from the pool     │
//! │       │                                                                 │
//! │       ├── add(&sale)     ─┐                                             │
//! │       ├── update(&sale)   ├─► staged in memory, nothing written         │
//! │       ├── delete(&sale)  ─┘                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  repo.save().await ──► BEGIN; every staged change; COMMIT               │
//! │                        (any failure rolls the whole batch back)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Formats
//! Ids are UUID strings, decimals are decimal strings and timestamps are
//! RFC 3339 UTC with nanoseconds, so text order is time order.
//!
//! ## Available Repositories
//!
//! - [`order::SaleRepository`] - Sales and their items
//! - [`order::CartRepository`] - Carts and their items
//! - [`product::ProductRepository`] - Product catalogue

pub mod order;
pub mod product;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// A change staged on a unit of work.
#[derive(Debug, Clone)]
pub(crate) enum Change<T> {
    Add(T),
    Update(T),
    Delete(T),
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| DbError::corrupt(column, value))
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> DbResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| DbError::corrupt(column, value))
}

pub(crate) fn parse_decimal(column: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value).map_err(|_| DbError::corrupt(column, value))
}
