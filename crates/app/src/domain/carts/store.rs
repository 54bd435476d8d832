//! Cart store.

use async_trait::async_trait;

use crate::{
    domain::{
        carts::models::{Cart, CartLine, DrainedCart},
        products::ProductUuid,
        users::UserUuid,
    },
    storage::StoreError,
};

/// Per-user carts.
///
/// Every mutating method locks the user's cart for the rest of `tx`, so cart
/// edits and checkout drains never interleave.
#[async_trait]
pub trait CartStore<Tx: Send>: Send + Sync {
    /// `NotFound` when the user has no cart.
    async fn get(&self, tx: &mut Tx, user: UserUuid) -> Result<Cart, StoreError>;

    /// Lock the user's cart, creating an empty one first if needed.
    async fn lock_or_create(&self, tx: &mut Tx, user: UserUuid) -> Result<Cart, StoreError>;

    /// Set the quantity of `product`, inserting the item if absent. The cart
    /// must already exist.
    async fn put_item(
        &self,
        tx: &mut Tx,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StoreError>;

    /// Returns whether an item was removed.
    async fn remove_item(
        &self,
        tx: &mut Tx,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<bool, StoreError>;

    /// Read and clear the cart's items under its row lock. A missing or empty
    /// cart yields an empty result and is left untouched.
    async fn drain_for_checkout(&self, tx: &mut Tx, user: UserUuid)
    -> Result<DrainedCart, StoreError>;

    /// Put drained lines back, merging with anything added since.
    async fn restore(&self, tx: &mut Tx, user: UserUuid, items: &[CartLine])
    -> Result<(), StoreError>;
}
