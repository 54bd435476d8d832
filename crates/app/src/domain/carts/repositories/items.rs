//! Cart Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use crate::{
    database::{PgTransaction, encode_quantity, try_get_quantity},
    domain::{
        carts::models::{CartItem, CartLine, CartUuid},
        products::ProductUuid,
    },
};

const GET_CART_ITEMS_SQL: &str = include_str!("../sql/get_cart_items.sql");
const PUT_CART_ITEM_SQL: &str = include_str!("../sql/put_cart_item.sql");
const MERGE_CART_ITEM_SQL: &str = include_str!("../sql/merge_cart_item.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const DRAIN_CART_ITEMS_SQL: &str = include_str!("../sql/drain_cart_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_items(
        &self,
        tx: &mut PgTransaction,
        cart: CartUuid,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(GET_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn put_cart_item(
        &self,
        tx: &mut PgTransaction,
        cart: CartUuid,
        line: CartLine,
    ) -> Result<(), sqlx::Error> {
        query(PUT_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(line.product.into_uuid())
            .bind(encode_quantity(line.quantity, "quantity")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn merge_cart_item(
        &self,
        tx: &mut PgTransaction,
        cart: CartUuid,
        line: CartLine,
    ) -> Result<(), sqlx::Error> {
        query(MERGE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(line.product.into_uuid())
            .bind(encode_quantity(line.quantity, "quantity")?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn delete_cart_item(
        &self,
        tx: &mut PgTransaction,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn drain_cart_items(
        &self,
        tx: &mut PgTransaction,
        cart: CartUuid,
    ) -> Result<Vec<CartLine>, sqlx::Error> {
        let rows = query(DRAIN_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        let mut lines = rows
            .iter()
            .map(|row| {
                Ok(CartLine {
                    product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
                    quantity: try_get_quantity(row, "quantity")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        lines.sort_unstable();

        Ok(lines)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
