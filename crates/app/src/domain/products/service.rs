//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    domain::products::{
        errors::ProductsServiceError,
        models::{NewProduct, Product, ProductUuid},
    },
    storage::{Storage, postgres::PgStorage},
};

/// Products service over any [`Storage`] backend.
#[derive(Debug)]
pub struct Products<S> {
    storage: Arc<S>,
}

pub type PgProductsService = Products<PgStorage>;

impl<S: Storage> Products<S> {
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

impl<S> Clone for Products<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

#[async_trait]
impl<S: Storage> ProductsService for Products<S> {
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        if product.sku.trim().is_empty() {
            return Err(ProductsServiceError::InvalidData);
        }

        let mut tx = self.storage.begin().await?;

        let created = self.storage.catalog().create_product(&mut tx, product).await?;

        self.storage.commit(tx).await?;

        info!(product = %created.uuid, sku = %created.sku, "product created");

        Ok(created)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let mut tx = self.storage.begin().await?;

        let product = self.storage.catalog().get_product(&mut tx, product).await?;

        self.storage.commit(tx).await?;

        Ok(product)
    }

    async fn update_price(
        &self,
        product: ProductUuid,
        price: u64,
    ) -> Result<Product, ProductsServiceError> {
        let mut tx = self.storage.begin().await?;

        let updated = self
            .storage
            .catalog()
            .update_price(&mut tx, product, price)
            .await?;

        self.storage.commit(tx).await?;

        info!(product = %updated.uuid, price, "product price updated");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Add a product to the catalog.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Change a product's unit price. Existing orders keep the price they were
    /// placed at.
    async fn update_price(
        &self,
        product: ProductUuid,
        price: u64,
    ) -> Result<Product, ProductsServiceError>;
}
