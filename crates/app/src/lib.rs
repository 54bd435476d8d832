//! Cart-to-order transaction engine.
//!
//! Carts, stock and orders live behind a [`storage::Storage`] backend
//! (`PostgreSQL` or in-memory). The [`domain::checkout`] coordinator turns a
//! cart into an order in a single unit of work so stock is never over-sold
//! and a failed checkout leaves nothing behind.

pub mod context;
pub mod database;
pub mod domain;
pub mod storage;
pub mod uuids;

#[cfg(test)]
mod test;
