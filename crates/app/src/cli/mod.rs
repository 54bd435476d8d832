use std::sync::Arc;

use cartwright_app::{
    context::AppContext,
    domain::checkout::{CheckoutConfig, LogEventSink},
};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{DatabaseConfig, LoggingConfig};

mod cart;
mod checkout;
mod db;
mod order;
mod product;

#[derive(Debug, Parser)]
#[command(name = "cartwright", about = "Cartwright CLI", long_about = None)]
pub(crate) struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Product(product::ProductCommand),
    Cart(cart::CartCommand),
    Checkout(checkout::CheckoutCommand),
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Cart(command) => cart::run(command).await,
            Commands::Checkout(command) => checkout::run(command).await,
            Commands::Order(command) => order::run(command).await,
        }
    }
}

async fn app_context(
    database: &DatabaseConfig,
    checkout: CheckoutConfig,
) -> Result<AppContext, String> {
    AppContext::from_database_url(&database.database_url, Arc::new(LogEventSink), checkout)
        .await
        .map_err(|error| format!("{error}: {}", source_message(&error)))
}

fn source_message(error: &dyn std::error::Error) -> String {
    error
        .source()
        .map_or_else(String::new, ToString::to_string)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to encode output: {error}"))?;

    println!("{json}");

    Ok(())
}
