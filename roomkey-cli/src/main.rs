//! roomkey: resolve connection credentials for realtime agent rooms.
//!
//!   roomkey products          — list catalog products (demo list if offline)
//!   roomkey product <id>      — show one catalog record
//!   roomkey setup             — interactive form for name, email and product
//!   roomkey token             — resolve a credential and print it as JSON
//!
//! Sandbox mode is selected by setting ROOMKEY_CONN_DETAILS_ENDPOINT.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roomkey_sdk::catalog::{CatalogClient, ProductPicker};
use roomkey_sdk::config::DeploymentMode;
use roomkey_sdk::details::ConnectionDetailsStore;
use roomkey_sdk::source::TokenSourceMemo;

#[derive(Parser)]
#[command(name = "roomkey", about = "Resolve connection credentials for realtime agent rooms")]
pub struct Cli {
    /// Origin of the app serving /api/connection-details
    #[arg(long, env = "ROOMKEY_BASE_URL")]
    pub base_url: Option<String>,

    /// Origin of the product catalog
    #[arg(long, env = "ROOMKEY_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Agent to dispatch into the room
    #[arg(long, env = "ROOMKEY_AGENT_NAME")]
    pub agent_name: Option<String>,

    /// Sandbox identifier (sandbox mode only)
    #[arg(long, env = "ROOMKEY_SANDBOX_ID")]
    pub sandbox_id: Option<String>,

    /// Your name
    #[arg(long)]
    pub name: Option<String>,

    /// Your email
    #[arg(long)]
    pub email: Option<String>,

    /// Product id to ask about
    #[arg(long)]
    pub product: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List catalog products
    Products,
    /// Show a single catalog record
    Product { id: String },
    /// Fill in name, email and product interactively
    Setup,
    /// Resolve a credential and print it
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    let json_logs = std::env::var("ROOMKEY_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "roomkey_sdk=info,roomkey_cli=info".into());
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let file_config = config::Config::load();
    let resolved = config::Resolved::merge(&cli, &file_config);
    let store = ConnectionDetailsStore::new(resolved.details.clone());

    match cli.command {
        Command::Products => {
            let picker = load_picker(&resolved.app.catalog_url).await?;
            for p in picker.items() {
                println!("{}\t{}", p.id, p.name);
            }
        }
        Command::Product { ref id } => {
            let client = CatalogClient::new(&resolved.app.catalog_url)?;
            let details = client
                .fetch_product(id)
                .await
                .with_context(|| format!("Failed to look up product {id}"))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::Setup => {
            let mut picker = load_picker(&resolved.app.catalog_url).await?;
            config::interactive_setup(&file_config, &mut picker, &store);
            let d = store.current();
            eprintln!("  Saved: {} <{}>, product {}", d.name, d.email, d.product_id);
        }
        Command::Token => {
            let mode = DeploymentMode::from_env();
            tracing::info!(sandbox = mode.is_sandbox(), "resolving credential");
            let memo = TokenSourceMemo::new(mode);
            let source = memo.get(&Arc::new(resolved.app.clone()), &store);
            let credential = source.resolve().await.context("Could not obtain a connection credential")?;
            println!("{}", serde_json::to_string_pretty(credential.as_value())?);
        }
    }
    Ok(())
}

async fn load_picker(catalog_url: &str) -> Result<ProductPicker> {
    let client = CatalogClient::new(catalog_url).with_context(|| format!("Invalid catalog URL {catalog_url}"))?;
    let mut picker = ProductPicker::new();
    picker.load(&client).await;
    Ok(picker)
}
