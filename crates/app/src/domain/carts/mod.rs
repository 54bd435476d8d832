//! Carts

pub mod errors;
pub mod models;
pub(crate) mod repositories;
pub mod service;
pub mod store;

pub use errors::CartsServiceError;
pub use models::{Cart, CartItem, CartLine, CartUuid, DrainedCart};
pub use service::*;
pub use store::CartStore;
