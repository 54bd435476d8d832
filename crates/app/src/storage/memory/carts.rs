//! In-memory cart store.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    domain::{
        carts::{Cart, CartItem, CartLine, CartStore, DrainedCart},
        products::ProductUuid,
        users::UserUuid,
    },
    storage::StoreError,
};

use super::{MemoryStorage, tx::MemoryTx};

fn touch(cart: &mut Cart, now: Timestamp) {
    cart.version = cart.version.saturating_add(1);
    cart.updated_at = now;
}

#[async_trait]
impl CartStore<MemoryTx> for MemoryStorage {
    async fn get(&self, tx: &mut MemoryTx, user: UserUuid) -> Result<Cart, StoreError> {
        Ok(tx.cart(user).await?.get().clone())
    }

    async fn lock_or_create(&self, tx: &mut MemoryTx, user: UserUuid) -> Result<Cart, StoreError> {
        Ok(tx.cart_or_create(user).await?.get().clone())
    }

    async fn put_item(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let cart = tx.cart(user).await?.get_mut();
        let now = Timestamp::now();

        match cart
            .items
            .binary_search_by_key(&product, |item| item.product)
        {
            Ok(index) => {
                if let Some(item) = cart.items.get_mut(index) {
                    item.quantity = quantity;
                    item.updated_at = now;
                }
            }
            Err(index) => cart.items.insert(
                index,
                CartItem {
                    product,
                    quantity,
                    created_at: now,
                    updated_at: now,
                },
            ),
        }

        touch(cart, now);

        Ok(())
    }

    async fn remove_item(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<bool, StoreError> {
        let locked = match tx.cart(user).await {
            Ok(locked) => locked,
            Err(StoreError::NotFound) => return Ok(false),
            Err(error) => return Err(error),
        };

        let Ok(index) = locked
            .get()
            .items
            .binary_search_by_key(&product, |item| item.product)
        else {
            return Ok(false);
        };

        let cart = locked.get_mut();
        cart.items.remove(index);
        touch(cart, Timestamp::now());

        Ok(true)
    }

    async fn drain_for_checkout(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
    ) -> Result<DrainedCart, StoreError> {
        let locked = match tx.cart(user).await {
            Ok(locked) => locked,
            Err(StoreError::NotFound) => return Ok(DrainedCart::default()),
            Err(error) => return Err(error),
        };

        if locked.get().is_empty() {
            return Ok(DrainedCart {
                cart: Some(locked.get().uuid),
                items: Vec::new(),
                version: locked.get().version,
            });
        }

        let cart = locked.get_mut();
        let items = std::mem::take(&mut cart.items)
            .iter()
            .map(CartItem::line)
            .collect();

        touch(cart, Timestamp::now());

        Ok(DrainedCart {
            cart: Some(cart.uuid),
            items,
            version: cart.version,
        })
    }

    async fn restore(
        &self,
        tx: &mut MemoryTx,
        user: UserUuid,
        items: &[CartLine],
    ) -> Result<(), StoreError> {
        let cart = tx.cart_or_create(user).await?.get_mut();
        let now = Timestamp::now();

        for line in items {
            match cart
                .items
                .binary_search_by_key(&line.product, |item| item.product)
            {
                Ok(index) => {
                    if let Some(item) = cart.items.get_mut(index) {
                        item.quantity = item
                            .quantity
                            .checked_add(line.quantity)
                            .ok_or(StoreError::InvalidData)?;
                        item.updated_at = now;
                    }
                }
                Err(index) => cart.items.insert(
                    index,
                    CartItem {
                        product: line.product,
                        quantity: line.quantity,
                        created_at: now,
                        updated_at: now,
                    },
                ),
            }
        }

        touch(cart, now);

        Ok(())
    }
}
