//! Orders service errors.

use thiserror::Error;

use crate::{domain::orders::models::OrderStatus, storage::StoreError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order is {0} and cannot be changed")]
    InvalidStatus(OrderStatus),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for OrdersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            error => Self::Storage(error),
        }
    }
}
