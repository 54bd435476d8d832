//! Products Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use crate::{
    database::{PgTransaction, encode_amount, try_get_amount},
    domain::products::{
        models::{NewProduct, Product, ProductUuid, Reservation},
        store::{ProductCatalog, StockLedger},
    },
    storage::StoreError,
};

const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const UPDATE_PRICE_SQL: &str = include_str!("sql/update_price.sql");
const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const AVAILABLE_STOCK_SQL: &str = include_str!("sql/available_stock.sql");
const RELEASE_STOCK_SQL: &str = include_str!("sql/release_stock.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProductCatalog<PgTransaction> for PgProductsRepository {
    async fn create_product(
        &self,
        tx: &mut PgTransaction,
        product: NewProduct,
    ) -> Result<Product, StoreError> {
        let created = query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.sku)
            .bind(product.name)
            .bind(encode_amount(product.price, "price")?)
            .bind(encode_amount(product.stock, "stock")?)
            .bind(product.active)
            .fetch_one(&mut **tx)
            .await?;

        Ok(created)
    }

    async fn get_product(
        &self,
        tx: &mut PgTransaction,
        product: ProductUuid,
    ) -> Result<Product, StoreError> {
        let product = query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(product)
    }

    async fn update_price(
        &self,
        tx: &mut PgTransaction,
        product: ProductUuid,
        price: u64,
    ) -> Result<Product, StoreError> {
        let product = query_as::<Postgres, Product>(UPDATE_PRICE_SQL)
            .bind(product.into_uuid())
            .bind(encode_amount(price, "price")?)
            .fetch_one(&mut **tx)
            .await?;

        Ok(product)
    }
}

#[async_trait]
impl StockLedger<PgTransaction> for PgProductsRepository {
    async fn try_reserve(
        &self,
        tx: &mut PgTransaction,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Reservation, StoreError> {
        let reserved = query(RESERVE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(row) = reserved {
            return Ok(Reservation::Reserved {
                remaining: try_get_amount(&row, "stock")?,
                unit_price: try_get_amount(&row, "price")?,
            });
        }

        let available = query(AVAILABLE_STOCK_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| try_get_amount(&row, "available"))
            .transpose()?
            .unwrap_or(0);

        Ok(Reservation::Rejected { available })
    }

    async fn release(
        &self,
        tx: &mut PgTransaction,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<u64, StoreError> {
        let row = query(RELEASE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(quantity))
            .fetch_one(&mut **tx)
            .await?;

        Ok(try_get_amount(&row, "stock")?)
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_amount(row, "stock")?,
            active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
