use cartwright_app::domain::{
    checkout::CheckoutConfig,
    orders::{OrderSummary, OrderUuid},
    users::UserUuid,
};
use clap::{Args, Subcommand};

use crate::config::DatabaseConfig;

use super::{app_context, print_json};

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Show one of a user's orders
    Show(OrderArgs),

    /// List a user's orders, newest first
    List {
        /// User UUID
        user: UserUuid,
    },

    /// Cancel a pending order and return its stock
    Cancel(OrderArgs),
}

#[derive(Debug, Args)]
struct OrderArgs {
    /// User UUID
    user: UserUuid,

    /// Order UUID
    order: OrderUuid,
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    let app = app_context(&command.database, CheckoutConfig::default()).await?;

    match command.command {
        OrderSubcommand::Show(args) => {
            let order = app
                .orders
                .get_order(args.user, args.order)
                .await
                .map_err(|error| format!("failed to load order: {error}"))?;

            print_json(&order)
        }
        OrderSubcommand::List { user } => {
            let orders: Vec<OrderSummary> = app
                .orders
                .list_orders(user)
                .await
                .map_err(|error| format!("failed to list orders: {error}"))?
                .into_iter()
                .map(OrderSummary::from)
                .collect();

            print_json(&orders)
        }
        OrderSubcommand::Cancel(args) => {
            let order = app
                .orders
                .cancel_order(args.user, args.order)
                .await
                .map_err(|error| format!("failed to cancel order: {error}"))?;

            print_json(&order)
        }
    }
}
