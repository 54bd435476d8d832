//! In-memory catalog and stock ledger.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    domain::products::{
        NewProduct, Product, ProductCatalog, ProductUuid, Reservation, StockLedger,
    },
    storage::StoreError,
};

use super::{
    MemoryStorage,
    tx::{Created, Locked, MemoryTx, new_row},
};

impl MemoryTx {
    fn insert_product(&mut self, new: NewProduct) -> Result<Product, StoreError> {
        let now = Timestamp::now();

        let product = Product {
            uuid: new.uuid,
            sku: new.sku,
            name: new.name,
            price: new.price,
            stock: new.stock,
            active: new.active,
            created_at: now,
            updated_at: now,
        };

        let (row, guard) = new_row(product.clone())?;

        {
            let mut tables = self.tables();

            if tables.products.contains_key(&product.uuid) || tables.skus.contains_key(&product.sku)
            {
                return Err(StoreError::Conflict);
            }

            tables.products.insert(product.uuid, row);
            tables.skus.insert(product.sku.clone(), product.uuid);
        }

        self.track(Created::Product {
            uuid: product.uuid,
            sku: product.sku.clone(),
        });
        self.products.insert(product.uuid, Locked::new(guard));

        Ok(product)
    }
}

#[async_trait]
impl ProductCatalog<MemoryTx> for MemoryStorage {
    async fn create_product(
        &self,
        tx: &mut MemoryTx,
        product: NewProduct,
    ) -> Result<Product, StoreError> {
        tx.insert_product(product)
    }

    async fn get_product(&self, tx: &mut MemoryTx, product: ProductUuid) -> Result<Product, StoreError> {
        Ok(tx.product(product).await?.get().clone())
    }

    async fn update_price(
        &self,
        tx: &mut MemoryTx,
        product: ProductUuid,
        price: u64,
    ) -> Result<Product, StoreError> {
        let product = tx.product(product).await?.get_mut();

        product.price = price;
        product.updated_at = Timestamp::now();

        Ok(product.clone())
    }
}

#[async_trait]
impl StockLedger<MemoryTx> for MemoryStorage {
    async fn try_reserve(
        &self,
        tx: &mut MemoryTx,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Reservation, StoreError> {
        let row = match tx.product(product).await {
            Ok(row) => row,
            Err(StoreError::NotFound) => return Ok(Reservation::Rejected { available: 0 }),
            Err(error) => return Err(error),
        };

        let requested = u64::from(quantity);
        let current = row.get();

        if !current.active {
            return Ok(Reservation::Rejected { available: 0 });
        }

        let Some(remaining) = current.stock.checked_sub(requested) else {
            return Ok(Reservation::Rejected {
                available: current.stock,
            });
        };

        let product = row.get_mut();

        product.stock = remaining;
        product.updated_at = Timestamp::now();

        Ok(Reservation::Reserved {
            remaining,
            unit_price: product.price,
        })
    }

    async fn release(
        &self,
        tx: &mut MemoryTx,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, StoreError> {
        let product = tx.product(product).await?.get_mut();

        product.stock = product
            .stock
            .checked_add(u64::from(quantity))
            .ok_or(StoreError::InvalidData)?;
        product.updated_at = Timestamp::now();

        Ok(product.stock)
    }
}
