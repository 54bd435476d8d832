//! Checkout service.

use async_trait::async_trait;
use mockall::automock;

use crate::domain::{
    checkout::errors::CheckoutError,
    orders::{IdempotencyKey, OrderSummary},
    users::UserUuid,
};

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Convert the user's cart into an order in one unit of work.
    ///
    /// With an idempotency key, repeating a successful checkout returns
    /// [`CheckoutError::Conflict`] carrying the original order instead of
    /// placing a second one.
    async fn checkout(
        &self,
        user: UserUuid,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderSummary, CheckoutError>;
}
