//! Property tests for stock accounting under concurrent checkout.

use std::sync::Arc;

use cartwright_app::{
    context::AppContext,
    domain::{
        checkout::{CheckoutConfig, CheckoutError, LogEventSink},
        products::{NewProduct, ProductUuid},
        users::UserUuid,
    },
    storage::{Storage, memory::MemoryStorage},
};
use proptest::prelude::*;
use tokio::task::JoinSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn checkout_never_oversells(
        stock in 0_u64..20,
        demands in prop::collection::vec(1_u32..5, 1..10),
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()?;

        rt.block_on(async {
            let storage = Arc::new(MemoryStorage::new());
            let app = AppContext::from_storage(
                Arc::clone(&storage),
                Arc::new(LogEventSink),
                CheckoutConfig::default(),
            );

            let product = app
                .products
                .create_product(NewProduct {
                    uuid: ProductUuid::new(),
                    sku: "SKU-P".to_string(),
                    name: "Property product".to_string(),
                    price: 100,
                    stock,
                    active: true,
                })
                .await?;

            // Seed carts below the service so demand may exceed stock.
            let mut buyers = Vec::with_capacity(demands.len());

            for &quantity in &demands {
                let user = UserUuid::new();
                let mut tx = storage.begin().await?;

                storage.carts().lock_or_create(&mut tx, user).await?;
                storage
                    .carts()
                    .put_item(&mut tx, user, product.uuid, quantity)
                    .await?;
                storage.commit(tx).await?;

                buyers.push((user, quantity));
            }

            let mut tasks = JoinSet::new();

            for &(user, quantity) in &buyers {
                let checkout = Arc::clone(&app.checkout);

                tasks.spawn(async move { (quantity, checkout.checkout(user, None).await) });
            }

            let mut sold = 0_u64;

            while let Some(joined) = tasks.join_next().await {
                let (quantity, result) = joined?;

                match result {
                    Ok(summary) => {
                        prop_assert_eq!(summary.total, u64::from(quantity) * 100);
                        sold += u64::from(quantity);
                    }
                    Err(CheckoutError::InsufficientStock { requested, .. }) => {
                        prop_assert_eq!(requested, quantity);
                    }
                    Err(error) => {
                        return Err(TestCaseError::fail(format!("unexpected error: {error}")));
                    }
                }
            }

            let remaining = app.products.get_product(product.uuid).await?.stock;

            prop_assert!(sold <= stock, "sold {} of {}", sold, stock);
            prop_assert_eq!(remaining + sold, stock);

            for (user, quantity) in buyers {
                let orders = app.orders.list_orders(user).await?;
                let cart = app.carts.get_cart(user).await?;

                prop_assert!(
                    orders.len() + usize::from(!cart.is_empty()) == 1,
                    "each buyer ends with either an order or their cart"
                );

                if cart.is_empty() {
                    prop_assert_eq!(orders.iter().map(|order| order.total).sum::<u64>(), u64::from(quantity) * 100);
                } else {
                    prop_assert_eq!(cart.quantity_of(product.uuid), Some(quantity));
                }
            }

            Ok(())
        })?;
    }
}
