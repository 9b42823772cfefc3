use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use roomkey_catalog::config::CatalogConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs with ROOMKEY_LOG_JSON=1, human-readable otherwise
    let json_logs = std::env::var("ROOMKEY_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env().add_directive("roomkey_catalog=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = CatalogConfig::parse();
    if !config.data_file.exists() {
        tracing::warn!("Product data file {} does not exist yet", config.data_file.display());
    }

    let (addr, server) = roomkey_catalog::web::start(&config).await?;
    tracing::info!(%addr, data = %config.data_file.display(), "catalog listening");
    server.await?
}
