use cartwright_app::domain::{
    checkout::CheckoutConfig,
    products::{NewProduct, ProductUuid},
};
use clap::{Args, Subcommand};

use crate::config::DatabaseConfig;

use super::{app_context, print_json};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Add a product to the catalog
    Create(CreateProductArgs),

    /// Show a product with its current stock
    Show {
        /// Product UUID
        product: ProductUuid,
    },

    /// Change a product's unit price
    SetPrice {
        /// Product UUID
        product: ProductUuid,

        /// New unit price in minor currency units
        price: u64,
    },
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Stock keeping unit; must be unique
    #[arg(long)]
    sku: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Unit price in minor currency units
    #[arg(long)]
    price: u64,

    /// Units available for sale
    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Create the product without offering it for sale
    #[arg(long)]
    inactive: bool,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<ProductUuid>,
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    let app = app_context(&command.database, CheckoutConfig::default()).await?;

    let product = match command.command {
        ProductSubcommand::Create(args) => app
            .products
            .create_product(NewProduct {
                uuid: args.product_uuid.unwrap_or_default(),
                sku: args.sku,
                name: args.name,
                price: args.price,
                stock: args.stock,
                active: !args.inactive,
            })
            .await
            .map_err(|error| format!("failed to create product: {error}"))?,
        ProductSubcommand::Show { product } => app
            .products
            .get_product(product)
            .await
            .map_err(|error| format!("failed to load product: {error}"))?,
        ProductSubcommand::SetPrice { product, price } => app
            .products
            .update_price(product, price)
            .await
            .map_err(|error| format!("failed to update price: {error}"))?,
    };

    print_json(&product)
}
