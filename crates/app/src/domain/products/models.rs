//! Product Models

use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub uuid: ProductUuid,
    pub sku: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: u64,
    pub stock: u64,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub sku: String,
    pub name: String,
    pub price: u64,
    pub stock: u64,
    pub active: bool,
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented. `unit_price` is the price at the moment of
    /// reservation.
    Reserved { remaining: u64, unit_price: u64 },

    /// Nothing changed. Unknown and inactive products report zero available.
    Rejected { available: u64 },
}
