//! Products

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod store;

pub use errors::ProductsServiceError;
pub use models::{NewProduct, Product, ProductUuid, Reservation};
pub use service::*;
pub use store::{ProductCatalog, StockLedger};
