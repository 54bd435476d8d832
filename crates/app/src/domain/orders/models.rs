//! Order Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{products::ProductUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order lifecycle. Orders are created `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status {0:?}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidIdempotencyKey {
    #[error("idempotency key must not be empty")]
    Empty,

    #[error("idempotency key must be at most {max} bytes", max = IdempotencyKey::MAX_LEN)]
    TooLong,
}

/// Caller-supplied token that makes a checkout safe to retry. Scoped to the
/// user that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub const MAX_LEN: usize = 255;

    /// # Errors
    ///
    /// Rejects blank keys and keys longer than [`Self::MAX_LEN`] bytes.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidIdempotencyKey> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(InvalidIdempotencyKey::Empty);
        }

        if value.len() > Self::MAX_LEN {
            return Err(InvalidIdempotencyKey::TooLong);
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IdempotencyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for IdempotencyKey {
    type Err = InvalidIdempotencyKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Order line with the unit price captured at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product: ProductUuid,
    pub quantity: u32,
    pub unit_price: u64,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Option<u64> {
        self.unit_price.checked_mul(u64::from(self.quantity))
    }
}

/// Sum of `quantity * unit_price`, or `None` on overflow.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> Option<u64> {
    items
        .iter()
        .try_fold(0_u64, |total, item| total.checked_add(item.line_total()?))
}

/// Order Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub idempotency_key: Option<IdempotencyKey>,
    pub status: OrderStatus,
    /// Sorted by product.
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NewOrderError {
    #[error("an order needs at least one line item")]
    NoItems,

    #[error("order total overflows")]
    TotalOverflow,
}

/// New Order Model
///
/// Built through [`NewOrder::new`], which sorts the lines and computes the
/// total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user: UserUuid,
    pub idempotency_key: Option<IdempotencyKey>,
    pub items: Vec<OrderItem>,
    pub total: u64,
}

impl NewOrder {
    /// # Errors
    ///
    /// Fails when `items` is empty or the total does not fit in a `u64`.
    pub fn new(
        user: UserUuid,
        idempotency_key: Option<IdempotencyKey>,
        mut items: Vec<OrderItem>,
    ) -> Result<Self, NewOrderError> {
        if items.is_empty() {
            return Err(NewOrderError::NoItems);
        }

        items.sort_unstable_by_key(|item| item.product);

        let total = order_total(&items).ok_or(NewOrderError::TotalOverflow)?;

        Ok(Self {
            uuid: OrderUuid::new(),
            user,
            idempotency_key,
            items,
            total,
        })
    }
}

/// What callers get back from a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order: OrderUuid,
    pub status: OrderStatus,
    pub total: u64,
    pub items: Vec<OrderItem>,
    pub created_at: Timestamp,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self {
            order: order.uuid,
            status: order.status,
            total: order.total,
            items: order.items,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, unit_price: u64) -> OrderItem {
        OrderItem {
            product: ProductUuid::new(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn new_order_computes_total_from_lines() -> Result<(), NewOrderError> {
        let order = NewOrder::new(UserUuid::new(), None, vec![item(3, 1_000), item(2, 250)])?;

        assert_eq!(order.total, 3_500);

        Ok(())
    }

    #[test]
    fn new_order_sorts_lines_by_product() -> Result<(), NewOrderError> {
        let low = OrderItem {
            product: ProductUuid::from_uuid(uuid::Uuid::from_u128(1)),
            quantity: 1,
            unit_price: 1,
        };
        let high = OrderItem {
            product: ProductUuid::from_uuid(uuid::Uuid::from_u128(2)),
            quantity: 1,
            unit_price: 1,
        };

        let order = NewOrder::new(UserUuid::new(), None, vec![high, low])?;

        assert_eq!(order.items, vec![low, high]);

        Ok(())
    }

    #[test]
    fn new_order_rejects_empty_lines() {
        let result = NewOrder::new(UserUuid::new(), None, Vec::new());

        assert_eq!(result, Err(NewOrderError::NoItems));
    }

    #[test]
    fn new_order_rejects_overflowing_total() {
        let result = NewOrder::new(UserUuid::new(), None, vec![item(2, u64::MAX)]);

        assert_eq!(result, Err(NewOrderError::TotalOverflow));
    }

    #[test]
    fn idempotency_key_rejects_blank_and_oversized_values() {
        assert_eq!(IdempotencyKey::new("  "), Err(InvalidIdempotencyKey::Empty));
        assert_eq!(
            IdempotencyKey::new("k".repeat(IdempotencyKey::MAX_LEN + 1)),
            Err(InvalidIdempotencyKey::TooLong)
        );
        assert!(
            IdempotencyKey::new("checkout-1").is_ok(),
            "expected a plain key to be accepted"
        );
    }

    #[test]
    fn order_status_round_trips_through_its_column_value() {
        for status in [OrderStatus::Pending, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse(), Ok(status));
        }

        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(UnknownOrderStatus("shipped".to_string()))
        );
    }
}
