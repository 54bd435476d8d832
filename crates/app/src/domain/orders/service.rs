//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{Order, OrderStatus, OrderUuid},
        },
        users::UserUuid,
    },
    storage::{Storage, postgres::PgStorage},
};

/// Orders service over any [`Storage`] backend.
#[derive(Debug)]
pub struct Orders<S> {
    storage: Arc<S>,
}

pub type PgOrdersService = Orders<PgStorage>;

impl<S: Storage> Orders<S> {
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

impl<S> Clone for Orders<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

#[async_trait]
impl<S: Storage> OrdersService for Orders<S> {
    async fn get_order(&self, user: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.storage.begin().await?;

        let order = self.storage.orders().get(&mut tx, user, order).await?;

        self.storage.commit(tx).await?;

        Ok(order)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.storage.begin().await?;

        let orders = self.storage.orders().list(&mut tx, user).await?;

        self.storage.commit(tx).await?;

        Ok(orders)
    }

    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.storage.begin().await?;

        let locked = self.storage.orders().lock(&mut tx, user, order).await?;

        if locked.status != OrderStatus::Pending {
            return Err(OrdersServiceError::InvalidStatus(locked.status));
        }

        // Lines are stored in ascending product order, the same order checkout
        // reserves in.
        for item in &locked.items {
            self.storage
                .ledger()
                .release(&mut tx, item.product, item.quantity)
                .await?;
        }

        let cancelled = self
            .storage
            .orders()
            .set_status(&mut tx, order, OrderStatus::Cancelled)
            .await?;

        self.storage.commit(tx).await?;

        info!(%user, %order, "order cancelled");

        Ok(cancelled)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve one of the user's orders.
    async fn get_order(&self, user: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// All of the user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError>;

    /// Cancel a pending order and return its stock to the ledger.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, OrdersServiceError>;
}
