//! Checkout coordinator.
//!
//! One checkout attempt is one unit of work: drain the cart, reserve stock in
//! ascending product order, insert the order, commit. Any failure before the
//! commit aborts the unit of work, which puts the drained lines back and
//! returns every reserved unit. Transient infrastructure failures re-run the
//! whole attempt from scratch.

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    domain::{
        carts::DrainedCart,
        checkout::{
            config::CheckoutConfig,
            errors::CheckoutError,
            events::{EventSink, ORDER_CREATED, OutboundEvent},
            retry::retry_on_transient,
            service::CheckoutService,
        },
        orders::{IdempotencyKey, NewOrder, Order, OrderItem, OrderSummary},
        products::Reservation,
        users::UserUuid,
    },
    storage::{Storage, StoreError},
};

/// Progress of a single checkout attempt, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    /// Unit of work opened.
    Started,
    /// Cart lines taken out of the cart under its lock.
    CartDrained,
    /// Reserving stock for one line.
    Reserving,
    /// Every line has its stock.
    AllReserved,
    /// A line could not be reserved.
    Rejected,
    /// Order header and lines written.
    OrderPersisted,
    /// Unit of work committed.
    Committed,
    /// Unit of work rolled back or abandoned.
    Aborted,
}

impl CheckoutStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::CartDrained => "cart_drained",
            Self::Reserving => "reserving",
            Self::AllReserved => "all_reserved",
            Self::Rejected => "rejected",
            Self::OrderPersisted => "order_persisted",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        }
    }
}

impl Display for CheckoutStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Why an attempt's unit of work was abandoned.
enum Abort {
    Failed(CheckoutError),
    /// The order insert hit the idempotency constraint. The unit of work is
    /// unusable afterwards, so the existing order is read in a fresh one.
    DuplicateKey,
}

impl From<CheckoutError> for Abort {
    fn from(error: CheckoutError) -> Self {
        Self::Failed(error)
    }
}

impl From<StoreError> for Abort {
    fn from(error: StoreError) -> Self {
        Self::Failed(error.into())
    }
}

pub struct CheckoutCoordinator<S> {
    storage: Arc<S>,
    events: Arc<dyn EventSink>,
    config: CheckoutConfig,
}

impl<S> Debug for CheckoutCoordinator<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CheckoutCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for CheckoutCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            events: Arc::clone(&self.events),
            config: self.config,
        }
    }
}

impl<S: Storage> CheckoutCoordinator<S> {
    #[must_use]
    pub fn new(storage: Arc<S>, events: Arc<dyn EventSink>, config: CheckoutConfig) -> Self {
        Self {
            storage,
            events,
            config,
        }
    }

    async fn attempt(
        &self,
        user: UserUuid,
        key: Option<&IdempotencyKey>,
        attempt: u32,
    ) -> Result<Order, CheckoutError> {
        let limit = self.config.transaction_timeout;

        let (tx, order) = match timeout(limit, self.prepare(user, key, attempt)).await {
            Ok(prepared) => prepared?,
            Err(_elapsed) => {
                // The unit of work was dropped mid-flight, which rolls it back.
                warn!(attempt, stage = %CheckoutStage::Aborted, ?limit, "checkout attempt timed out");

                return Err(CheckoutError::Timeout(limit));
            }
        };

        // Not bounded by the attempt timeout: once COMMIT is sent its outcome
        // has to be learned, not abandoned.
        self.commit(tx, user, key, order).await
    }

    /// Everything up to the commit. On error the unit of work is already
    /// rolled back.
    async fn prepare(
        &self,
        user: UserUuid,
        key: Option<&IdempotencyKey>,
        attempt: u32,
    ) -> Result<(S::Tx, Order), CheckoutError> {
        let mut tx = self.storage.begin().await?;

        debug!(attempt, stage = %CheckoutStage::Started, "unit of work started");

        match self.place_order(&mut tx, user, key).await {
            Ok(order) => Ok((tx, order)),
            Err(Abort::DuplicateKey) => {
                self.abort(tx).await;

                Err(self.existing_order(user, key).await)
            }
            Err(Abort::Failed(error)) => {
                self.abort(tx).await;

                Err(error)
            }
        }
    }

    async fn commit(
        &self,
        tx: S::Tx,
        user: UserUuid,
        key: Option<&IdempotencyKey>,
        order: Order,
    ) -> Result<Order, CheckoutError> {
        match self.storage.commit(tx).await {
            Ok(()) => {
                info!(
                    stage = %CheckoutStage::Committed,
                    order = %order.uuid,
                    total = order.total,
                    lines = order.items.len(),
                    "order committed"
                );

                Ok(order)
            }
            Err(StoreError::Conflict) => Err(self.existing_order(user, key).await),
            Err(error) => self.recover_commit(user, &order, error).await,
        }
    }

    /// A commit that reported failure may still have landed. The order id is
    /// known up front, so look for it before letting the attempt be retried.
    async fn recover_commit(
        &self,
        user: UserUuid,
        order: &Order,
        error: StoreError,
    ) -> Result<Order, CheckoutError> {
        warn!(error = %error, order = %order.uuid, "commit failed, checking whether it landed");

        match self.find_committed(user, order).await {
            Ok(Some(stored)) => {
                info!(
                    stage = %CheckoutStage::Committed,
                    order = %stored.uuid,
                    "order committed despite commit error"
                );

                Ok(stored)
            }
            Ok(None) => Err(error.into()),
            Err(lookup) => {
                // Outcome unknown. Retrying could place a second order or
                // report an empty cart, so the failure is made permanent.
                warn!(error = %lookup, order = %order.uuid, "could not confirm commit outcome");

                Err(CheckoutError::Infrastructure(StoreError::Other(Box::new(
                    error,
                ))))
            }
        }
    }

    async fn find_committed(
        &self,
        user: UserUuid,
        order: &Order,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.storage.begin().await?;

        let found = match self.storage.orders().get(&mut tx, user, order.uuid).await {
            Ok(stored) => Some(stored),
            Err(StoreError::NotFound) => None,
            Err(error) => return Err(error),
        };

        self.storage.commit(tx).await?;

        Ok(found)
    }

    async fn place_order(
        &self,
        tx: &mut S::Tx,
        user: UserUuid,
        key: Option<&IdempotencyKey>,
    ) -> Result<Order, Abort> {
        let drained = self.storage.carts().drain_for_checkout(tx, user).await?;

        debug!(
            stage = %CheckoutStage::CartDrained,
            lines = drained.items.len(),
            cart_version = drained.version,
            "cart drained"
        );

        if let Some(key) = key
            && let Some(existing) = self
                .storage
                .orders()
                .find_by_idempotency_key(tx, user, key)
                .await?
        {
            return Err(conflict(existing).into());
        }

        if drained.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let items = self.reserve_all(tx, &drained).await?;

        let order = NewOrder::new(user, key.cloned(), items).map_err(|error| {
            warn!(error = %error, "order rejected");

            CheckoutError::Infrastructure(StoreError::InvalidData)
        })?;

        match self.storage.orders().create(tx, order).await {
            Ok(order) => {
                debug!(stage = %CheckoutStage::OrderPersisted, order = %order.uuid, "order persisted");

                Ok(order)
            }
            Err(StoreError::Conflict) => Err(Abort::DuplicateKey),
            Err(error) => Err(error.into()),
        }
    }

    /// Reserve every drained line, lowest product id first, so that two
    /// checkouts sharing products always lock them in the same order.
    async fn reserve_all(
        &self,
        tx: &mut S::Tx,
        drained: &DrainedCart,
    ) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut lines = drained.items.clone();
        lines.sort_unstable();

        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            debug!(
                stage = %CheckoutStage::Reserving,
                product = %line.product,
                quantity = line.quantity,
                "reserving stock"
            );

            match self
                .storage
                .ledger()
                .try_reserve(tx, line.product, line.quantity)
                .await?
            {
                Reservation::Reserved {
                    remaining,
                    unit_price,
                } => {
                    debug!(product = %line.product, remaining, "stock reserved");

                    items.push(OrderItem {
                        product: line.product,
                        quantity: line.quantity,
                        unit_price,
                    });
                }
                Reservation::Rejected { available } => {
                    info!(
                        stage = %CheckoutStage::Rejected,
                        product = %line.product,
                        requested = line.quantity,
                        available,
                        "insufficient stock"
                    );

                    return Err(CheckoutError::InsufficientStock {
                        product: line.product,
                        requested: line.quantity,
                        available,
                    });
                }
            }
        }

        debug!(stage = %CheckoutStage::AllReserved, lines = items.len(), "all lines reserved");

        Ok(items)
    }

    async fn abort(&self, tx: S::Tx) {
        if let Err(error) = self.storage.rollback(tx).await {
            warn!(error = %error, "rollback failed");
        }

        debug!(stage = %CheckoutStage::Aborted, "unit of work aborted");
    }

    async fn existing_order(&self, user: UserUuid, key: Option<&IdempotencyKey>) -> CheckoutError {
        let Some(key) = key else {
            return StoreError::Conflict.into();
        };

        match self.find_existing(user, key).await {
            Ok(Some(order)) => conflict(order),
            Ok(None) => StoreError::Conflict.into(),
            Err(error) => error.into(),
        }
    }

    async fn find_existing(
        &self,
        user: UserUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.storage.begin().await?;

        let order = self
            .storage
            .orders()
            .find_by_idempotency_key(&mut tx, user, key)
            .await?;

        self.storage.commit(tx).await?;

        Ok(order)
    }

    async fn publish_order_created(
        &self,
        user: UserUuid,
        summary: &OrderSummary,
        key: Option<&IdempotencyKey>,
    ) {
        let payload = match serde_json::to_value(summary) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, order = %summary.order, "failed to encode order created event");

                return;
            }
        };

        let mut event = OutboundEvent::new(ORDER_CREATED, payload)
            .with_metadata("user_uuid", user.to_string())
            .with_metadata("order_uuid", summary.order.to_string());

        if let Some(key) = key {
            event = event.with_metadata("idempotency_key", key.as_str());
        }

        if let Err(error) = self.events.publish(event).await {
            warn!(error = %error, order = %summary.order, "failed to publish order created event");
        }
    }
}

fn conflict(order: Order) -> CheckoutError {
    info!(order = %order.uuid, "idempotency key already used");

    CheckoutError::Conflict {
        order: Box::new(order.into()),
    }
}

#[async_trait]
impl<S: Storage> CheckoutService for CheckoutCoordinator<S> {
    async fn checkout(
        &self,
        user: UserUuid,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<OrderSummary, CheckoutError> {
        let span = info_span!(
            "checkout",
            %user,
            idempotency_key = ?idempotency_key.as_ref().map(IdempotencyKey::as_str)
        );

        async move {
            let key = idempotency_key.as_ref();

            let order = retry_on_transient(&self.config.retry, move |attempt| {
                self.attempt(user, key, attempt)
            })
            .await?;

            let summary = OrderSummary::from(order);

            self.publish_order_created(user, &summary, key).await;

            Ok(summary)
        }
        .instrument(span)
        .await
    }
}
