use cartwright_app::domain::{
    checkout::CheckoutError, orders::IdempotencyKey, users::UserUuid,
};
use clap::Args;
use tracing::info;

use crate::config::{CheckoutArgs, DatabaseConfig};

use super::{app_context, print_json};

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    tuning: CheckoutArgs,

    /// User whose cart is checked out
    user: UserUuid,

    /// Makes retries of the same checkout safe
    #[arg(long)]
    idempotency_key: Option<IdempotencyKey>,
}

pub(crate) async fn run(command: CheckoutCommand) -> Result<(), String> {
    let app = app_context(&command.database, command.tuning.checkout_config()).await?;

    match app
        .checkout
        .checkout(command.user, command.idempotency_key)
        .await
    {
        Ok(summary) => print_json(&summary),
        Err(CheckoutError::Conflict { order }) => {
            info!(order = %order.order, "checkout already completed");

            print_json(&order)
        }
        Err(error) if error.is_retryable() => {
            Err(format!("checkout failed, safe to retry: {error}"))
        }
        Err(error) => Err(format!("checkout failed: {error}")),
    }
}
