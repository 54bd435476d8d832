//! Test Helpers

use std::time::Duration;

use crate::domain::{
    checkout::{CheckoutConfig, RetryConfig},
    orders::IdempotencyKey,
    products::{NewProduct, ProductUuid},
};

pub(crate) fn new_product(sku: &str, price: u64, stock: u64) -> NewProduct {
    NewProduct {
        uuid: ProductUuid::new(),
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        price,
        stock,
        active: true,
    }
}

pub(crate) fn key(value: &str) -> IdempotencyKey {
    IdempotencyKey::new(value).expect("test idempotency keys are valid")
}

/// Checkout settings with short backoff so retry tests stay fast.
pub(crate) fn fast_checkout_config() -> CheckoutConfig {
    CheckoutConfig {
        transaction_timeout: Duration::from_secs(5),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2,
        },
    }
}
