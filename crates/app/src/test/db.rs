//! Database test utilities and shared infrastructure
//!
//! Tests that need these require a Docker daemon and are `#[ignore]`d. Run
//! them with `cargo test -- --ignored`.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};
use uuid::Uuid;

const USER: &str = "cartwright_test";
const PASSWORD: &str = "cartwright_test_password";

/// Database names are interpolated into DDL, so only plain identifiers pass.
fn validate_database_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err("Database name must be 1-63 characters long".to_string());
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err("Database name must start with a letter or underscore".to_string());
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Database name can only contain letters, digits and underscores".to_string());
    }

    Ok(())
}

async fn init_postgres_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("cartwright_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

/// Started once and shared by every test in the binary.
static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn init_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(db_name) = receiver.recv().await {
            drop_database(&db_name).await;
        }
    });

    sender
}

async fn server_url(database: &str) -> Option<String> {
    let container = POSTGRES_CONTAINER.get()?;
    let port = container.get_host_port_ipv4(5432).await.ok()?;
    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Some(format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}"))
}

async fn drop_database(db_name: &str) {
    if validate_database_name(db_name).is_err() {
        return;
    }

    let Some(url) = server_url("postgres").await else {
        return;
    };

    if let Ok(mut conn) = PgConnection::connect(&url).await {
        let drop_query = format!("DROP DATABASE IF EXISTS \"{db_name}\"");

        if let Err(error) = sqlx::query(&drop_query).execute(&mut conn).await {
            tracing::warn!(%error, db_name, "failed to drop test database");
        }

        conn.close().await.ok();
    }
}

/// A uniquely named, migrated database inside the shared container.
///
/// Dropped in the background when the `TestDb` goes out of scope.
#[derive(Debug, Clone)]
pub(crate) struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get() {
            sender.send(self.name.clone()).ok();
        }
    }
}

impl TestDb {
    pub(crate) async fn new() -> Self {
        let name = format!("cartwright_test_{}", Uuid::now_v7().simple());

        CLEANUP_SENDER.get_or_init(init_cleanup_task).await;

        if let Err(error) = validate_database_name(&name) {
            panic!("Invalid database name '{name}': {error}");
        }

        POSTGRES_CONTAINER
            .get_or_init(init_postgres_container)
            .await;

        let admin_url = server_url("postgres")
            .await
            .expect("Failed to resolve container address");

        let mut conn = PgConnection::connect(&admin_url)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let database_url = server_url(&name)
            .await
            .expect("Failed to resolve container address");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to create pool for database");

        crate::database::migrate(&pool)
            .await
            .expect("Failed to run migrations on database");

        Self { pool, name }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_database_name_accepts_generated_names() {
        let name = format!("cartwright_test_{}", Uuid::now_v7().simple());

        assert!(validate_database_name(&name).is_ok(), "rejected {name}");
        assert!(validate_database_name("_underscore_start").is_ok(), "rejected leading underscore");
    }

    #[test]
    fn validate_database_name_rejects_unsafe_names() {
        for name in ["", "123invalid", "invalid-hyphen", "quote\"name", "semi;colon"] {
            assert!(validate_database_name(name).is_err(), "accepted {name:?}");
        }

        assert!(
            validate_database_name(&"a".repeat(64)).is_err(),
            "accepted a 64 character name"
        );
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn migrated_database_has_the_checkout_tables() {
        let test_db = TestDb::new().await;

        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = 'public' \
               AND table_name IN ('products', 'carts', 'cart_items', 'orders', 'order_items')",
        )
        .fetch_one(test_db.pool())
        .await
        .expect("Failed to query information schema");

        assert_eq!(count, 5);
    }
}
