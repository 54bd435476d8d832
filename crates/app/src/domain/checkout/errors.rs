//! Checkout errors.

use std::time::Duration;

use thiserror::Error;

use crate::{
    domain::{checkout::retry::IsTransient, orders::OrderSummary, products::ProductUuid},
    storage::StoreError,
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u64,
    },

    /// The idempotency key was already used. Carries the order it produced.
    #[error("order {} already placed with this idempotency key", .order.order)]
    Conflict { order: Box<OrderSummary> },

    #[error("checkout did not finish within {0:?}")]
    Timeout(Duration),

    #[error("infrastructure failure")]
    Infrastructure(#[source] StoreError),
}

impl CheckoutError {
    /// Whether the caller may safely retry the same checkout.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Infrastructure(error) => error.is_transient(),
            Self::EmptyCart | Self::InsufficientStock { .. } | Self::Conflict { .. } => false,
        }
    }
}

impl From<StoreError> for CheckoutError {
    fn from(error: StoreError) -> Self {
        Self::Infrastructure(error)
    }
}

impl IsTransient for CheckoutError {
    /// Only infrastructure failures are retried automatically. A timed out
    /// attempt is surfaced so the caller decides.
    fn is_transient(&self) -> bool {
        matches!(self, Self::Infrastructure(error) if error.is_transient())
    }
}
