//! Storage
//!
//! A [`Storage`] hands out units of work and the stores that operate inside
//! them. Every store method takes the unit of work explicitly, so a checkout
//! can drain a cart, reserve stock and insert an order and then commit or
//! abort all of it at once.
//!
//! Dropping an uncommitted unit of work rolls it back on every backend.

use async_trait::async_trait;

use crate::domain::{
    carts::CartStore,
    orders::OrderStore,
    products::{ProductCatalog, StockLedger},
};

mod error;
pub mod memory;
pub mod postgres;

pub use error::{BoxError, StoreError};

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Unit of work.
    type Tx: Send + 'static;

    /// Start a unit of work.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Make every change made through `tx` visible and release its locks.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Discard every change made through `tx` and release its locks.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    fn catalog(&self) -> &dyn ProductCatalog<Self::Tx>;

    fn ledger(&self) -> &dyn StockLedger<Self::Tx>;

    fn carts(&self) -> &dyn CartStore<Self::Tx>;

    fn orders(&self) -> &dyn OrderStore<Self::Tx>;
}
