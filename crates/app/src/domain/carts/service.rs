//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    domain::{
        carts::{errors::CartsServiceError, models::Cart},
        products::{Product, ProductUuid},
        users::UserUuid,
    },
    storage::{Storage, StoreError, postgres::PgStorage},
};

/// Carts service over any [`Storage`] backend.
///
/// Stock checks made here are advisory. Nothing is reserved until checkout.
#[derive(Debug)]
pub struct Carts<S> {
    storage: Arc<S>,
}

pub type PgCartsService = Carts<PgStorage>;

impl<S: Storage> Carts<S> {
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn purchasable_product(
        &self,
        tx: &mut S::Tx,
        product: ProductUuid,
    ) -> Result<Product, CartsServiceError> {
        match self.storage.catalog().get_product(tx, product).await {
            Ok(found) if found.active => Ok(found),
            Ok(_) | Err(StoreError::NotFound) => Err(CartsServiceError::ProductNotFound(product)),
            Err(error) => Err(error.into()),
        }
    }
}

impl<S> Clone for Carts<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

fn ensure_in_stock(product: &Product, requested: u32) -> Result<(), CartsServiceError> {
    if u64::from(requested) > product.stock {
        return Err(CartsServiceError::InsufficientStock {
            product: product.uuid,
            requested,
            available: product.stock,
        });
    }

    Ok(())
}

#[async_trait]
impl<S: Storage> CartsService for Carts<S> {
    async fn get_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError> {
        let mut tx = self.storage.begin().await?;

        let cart = self.storage.carts().get(&mut tx, user).await?;

        self.storage.commit(tx).await?;

        Ok(cart)
    }

    async fn add_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.storage.begin().await?;

        let cart = self.storage.carts().lock_or_create(&mut tx, user).await?;
        let product = self.purchasable_product(&mut tx, product).await?;

        let merged = cart
            .quantity_of(product.uuid)
            .unwrap_or(0)
            .checked_add(quantity)
            .ok_or(CartsServiceError::InvalidQuantity)?;

        ensure_in_stock(&product, merged)?;

        self.storage
            .carts()
            .put_item(&mut tx, user, product.uuid, merged)
            .await?;

        let cart = self.storage.carts().get(&mut tx, user).await?;

        self.storage.commit(tx).await?;

        debug!(%user, product = %product.uuid, quantity = merged, "cart item added");

        Ok(cart)
    }

    async fn set_item_quantity(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.storage.begin().await?;

        let cart = self.storage.carts().lock_or_create(&mut tx, user).await?;

        if cart.quantity_of(product).is_none() {
            return Err(CartsServiceError::NotFound);
        }

        let product = self.purchasable_product(&mut tx, product).await?;

        ensure_in_stock(&product, quantity)?;

        self.storage
            .carts()
            .put_item(&mut tx, user, product.uuid, quantity)
            .await?;

        let cart = self.storage.carts().get(&mut tx, user).await?;

        self.storage.commit(tx).await?;

        debug!(%user, product = %product.uuid, quantity, "cart item updated");

        Ok(cart)
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.storage.begin().await?;

        let removed = self
            .storage
            .carts()
            .remove_item(&mut tx, user, product)
            .await?;

        if !removed {
            return Err(CartsServiceError::NotFound);
        }

        let cart = self.storage.carts().get(&mut tx, user).await?;

        self.storage.commit(tx).await?;

        debug!(%user, %product, "cart item removed");

        Ok(cart)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the user's cart. `NotFound` if they never added anything.
    async fn get_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError>;

    /// Add `quantity` units of a product, merging with any existing line and
    /// creating the cart on first use.
    async fn add_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Replace the quantity of an existing line.
    async fn set_item_quantity(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a line from the cart.
    async fn remove_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError>;
}
