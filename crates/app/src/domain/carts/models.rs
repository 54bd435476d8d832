//! Cart Models

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{products::ProductUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Model
///
/// One per user. Items are kept sorted by product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub uuid: CartUuid,
    pub user: UserUuid,
    pub items: Vec<CartItem>,
    /// Bumped on every change to the item set.
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    /// An empty cart for `user`, as created lazily on first add.
    #[must_use]
    pub fn empty(user: UserUuid) -> Self {
        let now = Timestamp::now();

        Self {
            uuid: CartUuid::new(),
            user,
            items: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn quantity_of(&self, product: ProductUuid) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.product == product)
            .map(|item| item.quantity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::line).collect()
    }
}

/// CartItem Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItem {
    #[must_use]
    pub fn line(&self) -> CartLine {
        CartLine {
            product: self.product,
            quantity: self.quantity,
        }
    }
}

/// A product and quantity taken out of, or put back into, a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CartLine {
    pub product: ProductUuid,
    pub quantity: u32,
}

/// The contents of a cart at the moment it was drained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrainedCart {
    /// `None` when the user never had a cart.
    pub cart: Option<CartUuid>,
    /// Sorted by product.
    pub items: Vec<CartLine>,
    pub version: u64,
}

impl DrainedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
