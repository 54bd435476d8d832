use cartwright_app::domain::{
    checkout::CheckoutConfig, products::ProductUuid, users::UserUuid,
};
use clap::{Args, Subcommand};

use crate::config::DatabaseConfig;

use super::{app_context, print_json};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show a user's cart
    Show {
        /// User UUID
        user: UserUuid,
    },

    /// Add units of a product, merging with an existing line
    Add(LineArgs),

    /// Replace the quantity of an existing line
    Set(LineArgs),

    /// Remove a line from the cart
    Remove {
        /// User UUID
        user: UserUuid,

        /// Product UUID
        product: ProductUuid,
    },
}

#[derive(Debug, Args)]
struct LineArgs {
    /// User UUID
    user: UserUuid,

    /// Product UUID
    product: ProductUuid,

    /// Number of units
    quantity: u32,
}

pub(crate) async fn run(command: CartCommand) -> Result<(), String> {
    let app = app_context(&command.database, CheckoutConfig::default()).await?;

    let cart = match command.command {
        CartSubcommand::Show { user } => app.carts.get_cart(user).await,
        CartSubcommand::Add(line) => {
            app.carts
                .add_item(line.user, line.product, line.quantity)
                .await
        }
        CartSubcommand::Set(line) => {
            app.carts
                .set_item_quantity(line.user, line.product, line.quantity)
                .await
        }
        CartSubcommand::Remove { user, product } => app.carts.remove_item(user, product).await,
    }
    .map_err(|error| format!("cart operation failed: {error}"))?;

    print_json(&cart)
}
