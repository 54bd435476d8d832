//! Orders

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod store;

pub use errors::OrdersServiceError;
pub use models::{
    IdempotencyKey, InvalidIdempotencyKey, NewOrder, NewOrderError, Order, OrderItem,
    OrderStatus, OrderSummary, OrderUuid, order_total,
};
pub use service::*;
pub use store::OrderStore;
