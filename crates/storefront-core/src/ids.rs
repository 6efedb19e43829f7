//! # Typed Identifiers
//!
//! Newtypes over [`Uuid`] so a customer id can never be passed where a
//! product id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    #[inline]
    pub const fn new(id: Uuid) -> Self {
        CustomerId(id)
    }

    #[inline]
    pub const fn value(&self) -> Uuid {
        self.0
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for CustomerId {
    fn from(id: Uuid) -> Self {
        CustomerId(id)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque reference to a catalogue product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    #[inline]
    pub const fn new(id: Uuid) -> Self {
        ProductId(id)
    }

    #[inline]
    pub const fn value(&self) -> Uuid {
        self.0
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for ProductId {
    fn from(id: Uuid) -> Self {
        ProductId(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
