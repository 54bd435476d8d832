//! In-memory unit of work.

use std::{
    collections::BTreeMap,
    sync::{Arc, MutexGuard},
};

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    domain::{
        carts::Cart,
        orders::{IdempotencyKey, Order, OrderUuid},
        products::{Product, ProductUuid},
        users::UserUuid,
    },
    storage::StoreError,
};

use super::{MemoryState, Row, Tables};

/// A row held by a transaction, plus its value from before the first write.
#[derive(Debug)]
pub(super) struct Locked<T> {
    guard: OwnedMutexGuard<T>,
    before: Option<T>,
}

impl<T: Clone> Locked<T> {
    pub(super) fn new(guard: OwnedMutexGuard<T>) -> Self {
        Self {
            guard,
            before: None,
        }
    }

    pub(super) fn get(&self) -> &T {
        &self.guard
    }

    pub(super) fn get_mut(&mut self) -> &mut T {
        if self.before.is_none() {
            self.before = Some(T::clone(&self.guard));
        }

        &mut self.guard
    }

    fn undo(&mut self) {
        if let Some(before) = self.before.take() {
            *self.guard = before;
        }
    }
}

/// A row inserted by the transaction. Removed again on rollback.
#[derive(Debug)]
pub(super) enum Created {
    Product {
        uuid: ProductUuid,
        sku: String,
    },
    Cart(UserUuid),
    Order {
        uuid: OrderUuid,
        user: UserUuid,
        key: Option<IdempotencyKey>,
    },
}

/// Create a row that is already locked by the caller.
pub(super) fn new_row<T>(value: T) -> Result<(Row<T>, OwnedMutexGuard<T>), StoreError> {
    let row = Arc::new(Mutex::new(value));
    let guard = Arc::clone(&row)
        .try_lock_owned()
        .map_err(|error| StoreError::Other(Box::new(error)))?;

    Ok((row, guard))
}

/// Unit of work over [`super::MemoryStorage`].
///
/// Dropping it without committing rolls it back.
#[derive(Debug)]
pub struct MemoryTx {
    state: Arc<MemoryState>,
    pub(super) products: BTreeMap<ProductUuid, Locked<Product>>,
    pub(super) carts: FxHashMap<UserUuid, Locked<Cart>>,
    pub(super) orders: FxHashMap<OrderUuid, Locked<Order>>,
    created: Vec<Created>,
    finished: bool,
}

impl MemoryTx {
    pub(super) fn new(state: Arc<MemoryState>) -> Self {
        Self {
            state,
            products: BTreeMap::new(),
            carts: FxHashMap::default(),
            orders: FxHashMap::default(),
            created: Vec::new(),
            finished: false,
        }
    }

    pub(super) fn tables(&self) -> MutexGuard<'_, Tables> {
        self.state.tables()
    }

    pub(super) fn track(&mut self, created: Created) {
        self.created.push(created);
    }

    /// Lock the row `lookup` finds, waiting while another transaction holds
    /// it. `None` when there is no such row or it was rolled away meanwhile.
    async fn lock_row<T: Send>(
        &self,
        lookup: impl Fn(&Tables) -> Option<Row<T>> + Send,
    ) -> Option<OwnedMutexGuard<T>> {
        let row = lookup(&self.tables())?;
        let guard = Arc::clone(&row).lock_owned().await;

        let current = lookup(&self.tables());

        current
            .is_some_and(|current| Arc::ptr_eq(&current, &row))
            .then_some(guard)
    }

    pub(super) async fn product(
        &mut self,
        uuid: ProductUuid,
    ) -> Result<&mut Locked<Product>, StoreError> {
        if !self.products.contains_key(&uuid) {
            let guard = self
                .lock_row(|tables| tables.products.get(&uuid).cloned())
                .await
                .ok_or(StoreError::NotFound)?;

            self.products.insert(uuid, Locked::new(guard));
        }

        self.products.get_mut(&uuid).ok_or(StoreError::NotFound)
    }

    pub(super) async fn cart(&mut self, user: UserUuid) -> Result<&mut Locked<Cart>, StoreError> {
        if !self.carts.contains_key(&user) {
            let guard = self
                .lock_row(|tables| tables.carts.get(&user).cloned())
                .await
                .ok_or(StoreError::NotFound)?;

            self.carts.insert(user, Locked::new(guard));
        }

        self.carts.get_mut(&user).ok_or(StoreError::NotFound)
    }

    pub(super) async fn cart_or_create(
        &mut self,
        user: UserUuid,
    ) -> Result<&mut Locked<Cart>, StoreError> {
        if !self.carts.contains_key(&user) {
            let guard = loop {
                if let Some(guard) = self
                    .lock_row(|tables| tables.carts.get(&user).cloned())
                    .await
                {
                    break guard;
                }

                // Another transaction may insert the cart between the lookup
                // and here, in which case lock theirs on the next pass.
                if let Some(guard) = self.insert_cart(user)? {
                    break guard;
                }
            };

            self.carts.insert(user, Locked::new(guard));
        }

        self.carts.get_mut(&user).ok_or(StoreError::NotFound)
    }

    fn insert_cart(&mut self, user: UserUuid) -> Result<Option<OwnedMutexGuard<Cart>>, StoreError> {
        let (row, guard) = new_row(Cart::empty(user))?;

        {
            let mut tables = self.tables();

            if tables.carts.contains_key(&user) {
                return Ok(None);
            }

            tables.carts.insert(user, row);
        }

        self.track(Created::Cart(user));

        Ok(Some(guard))
    }

    pub(super) async fn order(&mut self, uuid: OrderUuid) -> Result<&mut Locked<Order>, StoreError> {
        if !self.orders.contains_key(&uuid) {
            let guard = self
                .lock_row(|tables| tables.orders.get(&uuid).cloned())
                .await
                .ok_or(StoreError::NotFound)?;

            self.orders.insert(uuid, Locked::new(guard));
        }

        self.orders.get_mut(&uuid).ok_or(StoreError::NotFound)
    }

    pub(super) fn commit(&mut self) {
        self.finished = true;
        self.created.clear();
        self.release_locks();
    }

    pub(super) fn rollback(&mut self) {
        self.finished = true;

        for locked in self.products.values_mut() {
            locked.undo();
        }

        for locked in self.carts.values_mut() {
            locked.undo();
        }

        for locked in self.orders.values_mut() {
            locked.undo();
        }

        if !self.created.is_empty() {
            let mut tables = self.state.tables();

            for created in self.created.drain(..) {
                match created {
                    Created::Product { uuid, sku } => {
                        tables.products.remove(&uuid);
                        tables.skus.remove(&sku);
                    }
                    Created::Cart(user) => {
                        tables.carts.remove(&user);
                    }
                    Created::Order { uuid, user, key } => {
                        tables.orders.remove(&uuid);

                        if let Some(key) = key {
                            tables.order_keys.remove(&(user, key));
                        }

                        if let Some(orders) = tables.user_orders.get_mut(&user) {
                            orders.retain(|order| *order != uuid);
                        }
                    }
                }
            }
        }

        self.release_locks();
    }

    fn release_locks(&mut self) {
        self.products.clear();
        self.carts.clear();
        self.orders.clear();
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            self.rollback();
        }
    }
}
