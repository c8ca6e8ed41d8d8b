//! Copperkart CLI - browse and watch store data.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog (all rows, or storefront-visible only)
//! ck-cli products list
//! ck-cli products list --active
//!
//! # List orders or inquiries, optionally for one customer
//! ck-cli orders list
//! ck-cli orders list --user b0cb3c1e-6f0a-47a5-8a0d-9a35a8c2f915
//! ck-cli inquiries list
//!
//! # Stream change notifications for a table until Ctrl-C
//! ck-cli watch products
//!
//! # Show the restored customer session, if any
//! ck-cli session show
//! ```
//!
//! Configuration comes from the environment (see `copperkart-client`);
//! without `COPPERKART_BACKEND_URL`/`COPPERKART_BACKEND_ANON_KEY` every
//! command runs in degenerate mode and prints nothing useful.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use uuid::Uuid;

use copperkart_client::Client;

mod commands;

#[derive(Parser)]
#[command(name = "ck-cli")]
#[command(author, version, about = "Copperkart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Browse orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Browse inquiries
    Inquiries {
        #[command(subcommand)]
        action: InquiriesAction,
    },
    /// Stream change notifications for a table until Ctrl-C
    Watch {
        /// Table to watch (products, orders, inquiries, user_profiles)
        table: String,
    },
    /// Inspect the durable customer session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, newest first
    List {
        /// Only storefront-visible products
        #[arg(long)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Restrict to one customer's orders
        #[arg(short, long)]
        user: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum InquiriesAction {
    /// List inquiries, newest first
    List {
        /// Restrict to one customer's inquiries
        #[arg(short, long)]
        user: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Restore and print the stored customer session
    Show,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::from_env()?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { active } => commands::catalog::list_products(&client, active).await,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { user } => commands::catalog::list_orders(&client, user).await,
        },
        Commands::Inquiries { action } => match action {
            InquiriesAction::List { user } => commands::catalog::list_inquiries(&client, user).await,
        },
        Commands::Watch { table } => commands::watch::watch(&client, &table).await?,
        Commands::Session { action } => match action {
            SessionAction::Show => commands::session::show(&client).await,
        },
    }

    Ok(())
}
