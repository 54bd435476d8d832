//! Carts Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use crate::{
    database::{PgTransaction, try_get_amount},
    domain::{
        carts::{
            models::{Cart, CartLine, CartUuid, DrainedCart},
            store::CartStore,
        },
        products::ProductUuid,
        users::UserUuid,
    },
    storage::StoreError,
};

use super::PgCartItemsRepository;

const GET_CART_SQL: &str = include_str!("../sql/get_cart.sql");
const LOCK_CART_SQL: &str = include_str!("../sql/lock_cart.sql");
const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");
const BUMP_CART_VERSION_SQL: &str = include_str!("../sql/bump_cart_version.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository {
    items: PgCartItemsRepository,
}

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            items: PgCartItemsRepository::new(),
        }
    }

    async fn find_cart(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        for_update: bool,
    ) -> Result<Option<Cart>, sqlx::Error> {
        let sql = if for_update { LOCK_CART_SQL } else { GET_CART_SQL };

        let Some(mut cart) = query_as::<Postgres, Cart>(sql)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        cart.items = self.items.get_cart_items(tx, cart.uuid).await?;

        Ok(Some(cart))
    }

    async fn ensure_cart(&self, tx: &mut PgTransaction, user: UserUuid) -> Result<(), sqlx::Error> {
        query(ENSURE_CART_SQL)
            .bind(CartUuid::new().into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    async fn bump_version(&self, tx: &mut PgTransaction, cart: CartUuid) -> Result<u64, sqlx::Error> {
        let row = query(BUMP_CART_VERSION_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        try_get_amount(&row, "version")
    }
}

#[async_trait]
impl CartStore<PgTransaction> for PgCartsRepository {
    async fn get(&self, tx: &mut PgTransaction, user: UserUuid) -> Result<Cart, StoreError> {
        self.find_cart(tx, user, false)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn lock_or_create(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
    ) -> Result<Cart, StoreError> {
        self.ensure_cart(tx, user).await?;

        self.find_cart(tx, user, true)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn put_item(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let cart = self
            .find_cart(tx, user, true)
            .await?
            .ok_or(StoreError::NotFound)?;

        self.items
            .put_cart_item(tx, cart.uuid, CartLine { product, quantity })
            .await?;

        self.bump_version(tx, cart.uuid).await?;

        Ok(())
    }

    async fn remove_item(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<bool, StoreError> {
        let Some(cart) = self.find_cart(tx, user, true).await? else {
            return Ok(false);
        };

        let rows_affected = self.items.delete_cart_item(tx, cart.uuid, product).await?;

        if rows_affected == 0 {
            return Ok(false);
        }

        self.bump_version(tx, cart.uuid).await?;

        Ok(true)
    }

    async fn drain_for_checkout(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
    ) -> Result<DrainedCart, StoreError> {
        let Some(cart) = self.find_cart(tx, user, true).await? else {
            return Ok(DrainedCart::default());
        };

        if cart.is_empty() {
            return Ok(DrainedCart {
                cart: Some(cart.uuid),
                items: Vec::new(),
                version: cart.version,
            });
        }

        let items = self.items.drain_cart_items(tx, cart.uuid).await?;
        let version = self.bump_version(tx, cart.uuid).await?;

        Ok(DrainedCart {
            cart: Some(cart.uuid),
            items,
            version,
        })
    }

    async fn restore(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        items: &[CartLine],
    ) -> Result<(), StoreError> {
        let cart = self.lock_or_create(tx, user).await?;

        for line in items {
            self.items.merge_cart_item(tx, cart.uuid, *line).await?;
        }

        self.bump_version(tx, cart.uuid).await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            items: Vec::new(),
            version: try_get_amount(row, "version")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
