//! Concurrent checkouts against the in-memory backend.

use std::sync::Arc;

use cartwright_app::{
    context::AppContext,
    domain::{
        carts::CartsServiceError,
        checkout::{CheckoutConfig, CheckoutError, LogEventSink},
        orders::{IdempotencyKey, OrderSummary},
        products::{NewProduct, Product, ProductUuid, ProductsServiceError},
        users::UserUuid,
    },
};
use testresult::TestResult;
use tokio::task::JoinSet;

fn app() -> AppContext {
    AppContext::in_memory(Arc::new(LogEventSink), CheckoutConfig::default())
}

async fn product(app: &AppContext, sku: &str, stock: u64) -> Result<Product, ProductsServiceError> {
    app.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price: 1_000,
            stock,
            active: true,
        })
        .await
}

async fn checkout_all(
    app: &AppContext,
    users: &[UserUuid],
    key: Option<&IdempotencyKey>,
) -> Vec<(UserUuid, Result<OrderSummary, CheckoutError>)> {
    let mut tasks = JoinSet::new();

    for &user in users {
        let checkout = Arc::clone(&app.checkout);
        let key = key.cloned();

        tasks.spawn(async move { (user, checkout.checkout(user, key).await) });
    }

    let mut results = Vec::with_capacity(users.len());

    while let Some(joined) = tasks.join_next().await {
        if let Ok(result) = joined {
            results.push(result);
        }
    }

    results
}

async fn cart_quantity(
    app: &AppContext,
    user: UserUuid,
    product: ProductUuid,
) -> Result<u32, CartsServiceError> {
    match app.carts.get_cart(user).await {
        Ok(cart) => Ok(cart.quantity_of(product).unwrap_or(0)),
        Err(CartsServiceError::NotFound) => Ok(0),
        Err(error) => Err(error),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_buyers_racing_for_the_same_stock() -> TestResult {
    let app = app();
    let sku = product(&app, "SKU-2", 10).await?;
    let users = [UserUuid::new(), UserUuid::new()];

    for user in users {
        app.carts.add_item(user, sku.uuid, 6).await?;
    }

    let results = checkout_all(&app, &users, None).await;

    assert_eq!(results.len(), 2);

    let winners: Vec<_> = results.iter().filter(|(_, result)| result.is_ok()).collect();
    let losers: Vec<_> = results.iter().filter(|(_, result)| result.is_err()).collect();

    assert_eq!(winners.len(), 1, "exactly one checkout should win: {results:?}");
    assert_eq!(losers.len(), 1, "exactly one checkout should lose: {results:?}");

    for (user, result) in losers {
        assert!(
            matches!(
                result,
                Err(CheckoutError::InsufficientStock { requested: 6, available: 4, .. })
            ),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(cart_quantity(&app, *user, sku.uuid).await?, 6);
        assert!(
            app.orders.list_orders(*user).await?.is_empty(),
            "loser should have no orders"
        );
    }

    assert_eq!(app.products.get_product(sku.uuid).await?.stock, 4);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_buyers_never_oversell() -> TestResult {
    let app = app();
    let sku = product(&app, "SKU-1", 7).await?;
    let users: Vec<UserUuid> = (0..20).map(|_| UserUuid::new()).collect();

    for &user in &users {
        app.carts.add_item(user, sku.uuid, 1).await?;
    }

    let results = checkout_all(&app, &users, None).await;
    let successes = results.iter().filter(|(_, result)| result.is_ok()).count();

    assert_eq!(results.len(), 20);
    assert_eq!(successes, 7);
    assert!(
        results.iter().all(|(_, result)| matches!(
            result,
            Ok(_) | Err(CheckoutError::InsufficientStock { .. })
        )),
        "only stock rejections are expected: {results:?}"
    );
    assert_eq!(app.products.get_product(sku.uuid).await?.stock, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_carts_all_succeed() -> TestResult {
    let app = app();
    let mut users = Vec::new();
    let mut products = Vec::new();

    for index in 0..8 {
        let user = UserUuid::new();
        let sku = product(&app, &format!("SKU-{index}"), 3).await?;

        app.carts.add_item(user, sku.uuid, 3).await?;

        users.push(user);
        products.push(sku.uuid);
    }

    let results = checkout_all(&app, &users, None).await;

    assert!(
        results.iter().all(|(_, result)| result.is_ok()),
        "every checkout should succeed: {results:?}"
    );

    for product in products {
        assert_eq!(app.products.get_product(product).await?.stock, 0);
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retries_with_one_key_place_one_order() -> TestResult {
    let app = app();
    let sku = product(&app, "SKU-1", 5).await?;
    let user = UserUuid::new();
    let key = IdempotencyKey::new("retry-1")?;

    app.carts.add_item(user, sku.uuid, 2).await?;

    let results = checkout_all(&app, &[user, user], Some(&key)).await;

    let placed: Vec<_> = results
        .iter()
        .filter_map(|(_, result)| result.as_ref().ok())
        .collect();

    assert_eq!(placed.len(), 1, "one checkout should place the order: {results:?}");
    assert!(
        results.iter().all(|(_, result)| match result {
            Ok(_) => true,
            Err(CheckoutError::Conflict { order }) => placed.iter().all(|p| p.order == order.order),
            Err(_) => false,
        }),
        "the other checkout should see the same order: {results:?}"
    );
    assert_eq!(app.products.get_product(sku.uuid).await?.stock, 3);
    assert_eq!(app.orders.list_orders(user).await?.len(), 1);

    Ok(())
}
