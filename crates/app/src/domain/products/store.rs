//! Product stores.

use async_trait::async_trait;

use crate::{
    domain::products::models::{NewProduct, Product, ProductUuid, Reservation},
    storage::StoreError,
};

/// Catalog access. Product field editing beyond price is handled elsewhere.
#[async_trait]
pub trait ProductCatalog<Tx: Send>: Send + Sync {
    /// Insert a product. `Conflict` when the UUID or SKU is taken.
    async fn create_product(&self, tx: &mut Tx, product: NewProduct)
    -> Result<Product, StoreError>;

    async fn get_product(&self, tx: &mut Tx, product: ProductUuid) -> Result<Product, StoreError>;

    async fn update_price(
        &self,
        tx: &mut Tx,
        product: ProductUuid,
        price: u64,
    ) -> Result<Product, StoreError>;
}

/// Per-product available quantity.
///
/// The product row stays locked by `tx` once touched, so competing
/// reservations on the same product serialize until `tx` ends.
#[async_trait]
pub trait StockLedger<Tx: Send>: Send + Sync {
    /// Decrement stock by `quantity` only if at least `quantity` is available,
    /// as a single atomic step. A rejection has no side effects.
    async fn try_reserve(
        &self,
        tx: &mut Tx,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Reservation, StoreError>;

    /// Give `quantity` units back. Returns the new stock level.
    async fn release(
        &self,
        tx: &mut Tx,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, StoreError>;
}
