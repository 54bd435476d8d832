//! Orders Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{PgTransaction, encode_amount, encode_quantity, try_get_amount, try_get_quantity},
    domain::{
        orders::{
            models::{IdempotencyKey, NewOrder, Order, OrderItem, OrderStatus, OrderUuid},
            store::OrderStore,
        },
        products::ProductUuid,
        users::UserUuid,
    },
    storage::StoreError,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEMS_SQL: &str = include_str!("sql/create_order_items.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const FIND_ORDER_BY_KEY_SQL: &str = include_str!("sql/find_order_by_key.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    async fn with_items(
        &self,
        tx: &mut PgTransaction,
        mut orders: Vec<Order>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let uuids: Vec<Uuid> = orders.iter().map(|order| order.uuid.into_uuid()).collect();

        let rows = query(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut items: FxHashMap<OrderUuid, Vec<OrderItem>> = FxHashMap::default();

        for row in &rows {
            let order = OrderUuid::from_uuid(row.try_get("order_uuid")?);

            items.entry(order).or_default().push(OrderItem {
                product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
                quantity: try_get_quantity(row, "quantity")?,
                unit_price: try_get_amount(row, "unit_price")?,
            });
        }

        for order in &mut orders {
            order.items = items.remove(&order.uuid).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn with_order_items(
        &self,
        tx: &mut PgTransaction,
        order: Order,
    ) -> Result<Order, sqlx::Error> {
        self.with_items(tx, vec![order])
            .await?
            .pop()
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn fetch_order(
        &self,
        tx: &mut PgTransaction,
        sql: &'static str,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        let order = query_as::<Postgres, Order>(sql)
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_order_items(tx, order).await
    }
}

#[async_trait]
impl OrderStore<PgTransaction> for PgOrdersRepository {
    async fn create(&self, tx: &mut PgTransaction, order: NewOrder) -> Result<Order, StoreError> {
        let mut created = query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user.into_uuid())
            .bind(order.idempotency_key.as_ref().map(IdempotencyKey::as_str))
            .bind(encode_amount(order.total, "total")?)
            .fetch_one(&mut **tx)
            .await?;

        let mut products = Vec::with_capacity(order.items.len());
        let mut quantities = Vec::with_capacity(order.items.len());
        let mut unit_prices = Vec::with_capacity(order.items.len());

        for item in &order.items {
            products.push(item.product.into_uuid());
            quantities.push(encode_quantity(item.quantity, "quantity")?);
            unit_prices.push(encode_amount(item.unit_price, "unit_price")?);
        }

        query(CREATE_ORDER_ITEMS_SQL)
            .bind(created.uuid.into_uuid())
            .bind(products)
            .bind(quantities)
            .bind(unit_prices)
            .execute(&mut **tx)
            .await?;

        created.items = order.items;

        Ok(created)
    }

    async fn find_by_idempotency_key(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, StoreError> {
        let found = query_as::<Postgres, Order>(FIND_ORDER_BY_KEY_SQL)
            .bind(user.into_uuid())
            .bind(key.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        let Some(order) = found else {
            return Ok(None);
        };

        Ok(Some(self.with_order_items(tx, order).await?))
    }

    async fn get(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, StoreError> {
        Ok(self.fetch_order(tx, GET_ORDER_SQL, user, order).await?)
    }

    async fn list(&self, tx: &mut PgTransaction, user: UserUuid) -> Result<Vec<Order>, StoreError> {
        let orders = query_as::<Postgres, Order>(LIST_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(self.with_items(tx, orders).await?)
    }

    async fn lock(
        &self,
        tx: &mut PgTransaction,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<Order, StoreError> {
        Ok(self.fetch_order(tx, LOCK_ORDER_SQL, user, order).await?)
    }

    async fn set_status(
        &self,
        tx: &mut PgTransaction,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, StoreError> {
        let updated = query_as::<Postgres, Order>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await?;

        Ok(self.with_order_items(tx, updated).await?)
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        let idempotency_key = row
            .try_get::<Option<String>, _>("idempotency_key")?
            .map(IdempotencyKey::new)
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "idempotency_key".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            idempotency_key,
            status,
            items: Vec::new(),
            total: try_get_amount(row, "total")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
