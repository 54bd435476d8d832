//! In-memory order store.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    domain::{
        orders::{
            IdempotencyKey, NewOrder, Order, OrderStatus, OrderStore, OrderUuid, order_total,
        },
        users::UserUuid,
    },
    storage::StoreError,
};

use super::{
    MemoryStorage,
    tx::{Created, Locked, MemoryTx, new_row},
};

impl MemoryTx {
    fn insert_order(&mut self, new: NewOrder) -> Result<Order, StoreError> {
        if new.items.is_empty() || order_total(&new.items) != Some(new.total) {
            return Err(StoreError::InvalidData);
        }

        let now = Timestamp::now();

        let order = Order {
            uuid: new.uuid,
            user: new.user,
            idempotency_key: new.idempotency_key,
            status: OrderStatus::Pending,
            items: new.items,
            total: new.total,
            created_at: now,
            updated_at: now,
        };

        let (row, guard) = new_row(order.clone())?;

        {
            let mut tables = self.tables();

            if tables.orders.contains_key(&order.uuid) {
                return Err(StoreError::Conflict);
            }

            if let Some(key) = &order.idempotency_key {
                let index = (order.user, key.clone());

                if tables.order_keys.contains_key(&index) {
                    return Err(StoreError::Conflict);
                }

                tables.order_keys.insert(index, order.uuid);
            }

            tables.orders.insert(order.uuid, row);
            tables
                .user_orders
                .entry(order.user)
                .or_default()
                .push(order.uuid);
        }

        self.track(Created::Order {
            uuid: order.uuid,
            user: order.user,
            key: order.idempotency_key.clone(),
        });
        self.orders.insert(order.uuid, Locked::new(guard));

        Ok(order)
    }

    async fn owned_order(
        &mut self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<&mut Locked<Order>, StoreError> {
        let locked = self.order(order).await?;

        if locked.get().user != user {
            return Err(StoreError::NotFound);
        }

        Ok(locked)
    }
}

#[async_trait]
impl OrderStore<MemoryTx> for MemoryStorage {
    async fn create(&self, tx: &mut MemoryTx, order: NewOrder) -> Result<Order, StoreError> {
        tx.insert_order(order)
    }

    async fn find_by_idempotency_key(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, StoreError> {
        let found = tx.tables().order_keys.get(&(user, key.clone())).copied();

        let Some(order) = found else {
            return Ok(None);
        };

        match tx.order(order).await {
            Ok(locked) => Ok(Some(locked.get().clone())),
            Err(StoreError::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn get(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, StoreError> {
        Ok(tx.owned_order(user, order).await?.get().clone())
    }

    async fn list(&self, tx: &mut MemoryTx, user: UserUuid) -> Result<Vec<Order>, StoreError> {
        let uuids = tx
            .tables()
            .user_orders
            .get(&user)
            .cloned()
            .unwrap_or_default();

        let mut orders = Vec::with_capacity(uuids.len());

        for uuid in uuids {
            match tx.order(uuid).await {
                Ok(locked) => orders.push(locked.get().clone()),
                Err(StoreError::NotFound) => {}
                Err(error) => return Err(error),
            }
        }

        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.uuid.cmp(&a.uuid))
        });

        Ok(orders)
    }

    async fn lock(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, StoreError> {
        Ok(tx.owned_order(user, order).await?.get().clone())
    }

    async fn set_status(
        &self,
        tx: &mut MemoryTx,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let order = tx.order(order).await?.get_mut();

        order.status = status;
        order.updated_at = Timestamp::now();

        Ok(order.clone())
    }
}
