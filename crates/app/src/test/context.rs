//! Test context for service-level tests.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    database::Db,
    domain::{
        carts::{CartLine, Carts, CartsService, CartsServiceError},
        checkout::{ChannelEventSink, CheckoutConfig, CheckoutCoordinator, EventSink, OutboundEvent},
        orders::{Orders, OrdersService, OrdersServiceError},
        products::{Product, ProductUuid, Products, ProductsService, ProductsServiceError},
        users::UserUuid,
    },
    storage::{Storage, memory::MemoryStorage, postgres::PgStorage},
};

use super::{
    db::TestDb,
    helpers::{fast_checkout_config, new_product},
};

/// Services wired over one storage backend.
///
/// Checkout events go to an in-process channel readable through `events`
/// unless a different sink is installed with [`TestContext::with_event_sink`].
pub(crate) struct TestContext<S: Storage = MemoryStorage> {
    pub storage: Arc<S>,
    pub products: Products<S>,
    pub carts: Carts<S>,
    pub orders: Orders<S>,
    pub checkout: CheckoutCoordinator<S>,
    pub events: UnboundedReceiver<OutboundEvent>,
    sink: Arc<dyn EventSink>,
    config: CheckoutConfig,
    #[expect(dead_code, reason = "dropping it drops the test database")]
    db: Option<TestDb>,
}

impl TestContext<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }
}

impl TestContext<PgStorage> {
    /// Services over a fresh, migrated database in the shared container.
    pub async fn postgres() -> Self {
        let db = TestDb::new().await;
        let storage = PgStorage::new(Db::new(db.pool().clone()));

        let mut ctx = Self::new(Arc::new(storage));
        ctx.db = Some(db);

        ctx
    }
}

impl<S: Storage> TestContext<S> {
    pub fn new(storage: Arc<S>) -> Self {
        let (sink, events) = ChannelEventSink::new();
        let sink: Arc<dyn EventSink> = Arc::new(sink);
        let config = fast_checkout_config();

        Self {
            products: Products::new(Arc::clone(&storage)),
            carts: Carts::new(Arc::clone(&storage)),
            orders: Orders::new(Arc::clone(&storage)),
            checkout: CheckoutCoordinator::new(Arc::clone(&storage), Arc::clone(&sink), config),
            storage,
            events,
            sink,
            config,
            db: None,
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self.rebuild_checkout()
    }

    pub fn with_checkout_config(mut self, config: CheckoutConfig) -> Self {
        self.config = config;
        self.rebuild_checkout()
    }

    fn rebuild_checkout(mut self) -> Self {
        self.checkout = CheckoutCoordinator::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.sink),
            self.config,
        );

        self
    }

    pub async fn product(
        &self,
        sku: &str,
        price: u64,
        stock: u64,
    ) -> Result<Product, ProductsServiceError> {
        self.products
            .create_product(new_product(sku, price, stock))
            .await
    }

    pub async fn inactive_product(
        &self,
        sku: &str,
        price: u64,
        stock: u64,
    ) -> Result<Product, ProductsServiceError> {
        let mut product = new_product(sku, price, stock);
        product.active = false;

        self.products.create_product(product).await
    }

    pub async fn stock(&self, product: ProductUuid) -> Result<u64, ProductsServiceError> {
        Ok(self.products.get_product(product).await?.stock)
    }

    /// Cart contents, treating a missing cart as empty.
    pub async fn cart_lines(&self, user: UserUuid) -> Result<Vec<CartLine>, CartsServiceError> {
        match self.carts.get_cart(user).await {
            Ok(cart) => Ok(cart.lines()),
            Err(CartsServiceError::NotFound) => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    pub async fn order_count(&self, user: UserUuid) -> Result<usize, OrdersServiceError> {
        Ok(self.orders.list_orders(user).await?.len())
    }
}
