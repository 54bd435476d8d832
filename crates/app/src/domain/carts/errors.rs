//! Carts service errors.

use thiserror::Error;

use crate::{domain::products::ProductUuid, storage::StoreError};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart or cart item not found")]
    NotFound,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u64,
    },

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            error => Self::Storage(error),
        }
    }
}
