//! `PostgreSQL` storage.
//!
//! Row locks come from `SELECT ... FOR UPDATE` and from the conditional stock
//! `UPDATE`, and last until the transaction ends. Dropping an uncommitted
//! [`PgTransaction`] rolls it back.

use async_trait::async_trait;
use sqlx::error::{DatabaseError, ErrorKind};

use crate::{
    database::{Db, PgTransaction},
    domain::{
        carts::{CartStore, repositories::PgCartsRepository},
        orders::{OrderStore, repository::PgOrdersRepository},
        products::{ProductCatalog, StockLedger, repository::PgProductsRepository},
    },
    storage::{Storage, StoreError},
};

/// SQLSTATE `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, Clone)]
pub struct PgStorage {
    db: Db,
    products: PgProductsRepository,
    carts: PgCartsRepository,
    orders: PgOrdersRepository,
}

impl PgStorage {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            products: PgProductsRepository::new(),
            carts: PgCartsRepository::new(),
            orders: PgOrdersRepository::new(),
        }
    }
}

#[async_trait]
impl Storage for PgStorage {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StoreError> {
        Ok(self.db.begin_transaction().await?)
    }

    async fn commit(&self, tx: PgTransaction) -> Result<(), StoreError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: PgTransaction) -> Result<(), StoreError> {
        Ok(tx.rollback().await?)
    }

    fn catalog(&self) -> &dyn ProductCatalog<PgTransaction> {
        &self.products
    }

    fn ledger(&self) -> &dyn StockLedger<PgTransaction> {
        &self.products
    }

    fn carts(&self) -> &dyn CartStore<PgTransaction> {
        &self.carts
    }

    fn orders(&self) -> &dyn OrderStore<PgTransaction> {
        &self.orders
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(Box::new(error)),
            sqlx::Error::Database(ref database) => {
                if matches!(
                    database.code().as_deref(),
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
                ) {
                    return Self::Unavailable(Box::new(error));
                }

                match error.as_database_error().map(DatabaseError::kind) {
                    Some(ErrorKind::UniqueViolation) => Self::Conflict,
                    Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
                    Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => {
                        Self::InvalidData
                    }
                    _ => Self::Other(Box::new(error)),
                }
            }
            error => Self::Other(Box::new(error)),
        }
    }
}
