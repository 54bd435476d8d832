//! Order store.

use async_trait::async_trait;

use crate::{
    domain::{
        orders::models::{IdempotencyKey, NewOrder, Order, OrderStatus, OrderUuid},
        users::UserUuid,
    },
    storage::StoreError,
};

/// Committed orders. Append-only apart from status changes.
#[async_trait]
pub trait OrderStore<Tx: Send>: Send + Sync {
    /// Insert the header and every line as one step. `Conflict` when the user
    /// already has an order under the same idempotency key.
    async fn create(&self, tx: &mut Tx, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_by_idempotency_key(
        &self,
        tx: &mut Tx,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, StoreError>;

    /// `NotFound` unless the order exists and belongs to `user`.
    async fn get(&self, tx: &mut Tx, user: UserUuid, order: OrderUuid)
    -> Result<Order, StoreError>;

    /// Newest first.
    async fn list(&self, tx: &mut Tx, user: UserUuid) -> Result<Vec<Order>, StoreError>;

    /// Like [`OrderStore::get`] but keeps the order locked until `tx` ends.
    async fn lock(&self, tx: &mut Tx, user: UserUuid, order: OrderUuid)
    -> Result<Order, StoreError>;

    async fn set_status(
        &self,
        tx: &mut Tx,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, StoreError>;
}
