//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{Carts, CartsService},
        checkout::{CheckoutConfig, CheckoutCoordinator, CheckoutService, EventSink},
        orders::{Orders, OrdersService},
        products::{Products, ProductsService},
    },
    storage::{Storage, memory::MemoryStorage, postgres::PgStorage},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        events: Arc<dyn EventSink>,
        config: CheckoutConfig,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_storage(
            Arc::new(PgStorage::new(Db::new(pool))),
            events,
            config,
        ))
    }

    /// Build application context over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(events: Arc<dyn EventSink>, config: CheckoutConfig) -> Self {
        Self::from_storage(Arc::new(MemoryStorage::new()), events, config)
    }

    #[must_use]
    pub fn from_storage<S: Storage>(
        storage: Arc<S>,
        events: Arc<dyn EventSink>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            products: Arc::new(Products::new(Arc::clone(&storage))),
            carts: Arc::new(Carts::new(Arc::clone(&storage))),
            orders: Arc::new(Orders::new(Arc::clone(&storage))),
            checkout: Arc::new(CheckoutCoordinator::new(storage, events, config)),
        }
    }
}
