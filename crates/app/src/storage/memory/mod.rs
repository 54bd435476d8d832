//! In-memory storage.
//!
//! Every product, cart and order is a row behind its own
//! `tokio::sync::Mutex`. A [`MemoryTx`] takes owned guards on the rows it
//! touches and keeps them until it commits or rolls back, which gives the
//! same blocking behaviour as `SELECT ... FOR UPDATE`. Writes go straight to
//! the locked row after its before-image is saved, and rollback (explicit or
//! on drop) restores those images.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::{
    domain::{
        carts::{Cart, CartStore},
        orders::{IdempotencyKey, Order, OrderStore, OrderUuid},
        products::{Product, ProductCatalog, ProductUuid, StockLedger},
        users::UserUuid,
    },
    storage::{Storage, StoreError},
};

mod carts;
mod orders;
mod products;
mod tx;

pub use tx::MemoryTx;

type Row<T> = Arc<tokio::sync::Mutex<T>>;

#[derive(Debug, Default)]
struct Tables {
    products: FxHashMap<ProductUuid, Row<Product>>,
    skus: FxHashMap<String, ProductUuid>,
    carts: FxHashMap<UserUuid, Row<Cart>>,
    orders: FxHashMap<OrderUuid, Row<Order>>,
    order_keys: FxHashMap<(UserUuid, IdempotencyKey), OrderUuid>,
    user_orders: FxHashMap<UserUuid, Vec<OrderUuid>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: Mutex<Tables>,
}

impl MemoryState {
    /// The table index is only ever mutated by single infallible inserts and
    /// removals, so a poisoned lock still guards consistent data.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<MemoryState>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx::new(Arc::clone(&self.state)))
    }

    async fn commit(&self, mut tx: MemoryTx) -> Result<(), StoreError> {
        tx.commit();

        Ok(())
    }

    async fn rollback(&self, mut tx: MemoryTx) -> Result<(), StoreError> {
        tx.rollback();

        Ok(())
    }

    fn catalog(&self) -> &dyn ProductCatalog<MemoryTx> {
        self
    }

    fn ledger(&self) -> &dyn StockLedger<MemoryTx> {
        self
    }

    fn carts(&self) -> &dyn CartStore<MemoryTx> {
        self
    }

    fn orders(&self) -> &dyn OrderStore<MemoryTx> {
        self
    }
}
