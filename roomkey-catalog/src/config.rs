use std::path::PathBuf;

/// Catalog service configuration.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "roomkey-catalog", about = "Product catalog service for roomkey clients")]
pub struct CatalogConfig {
    /// Address to listen on (host:port)
    #[arg(long, env = "ROOMKEY_CATALOG_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// JSON file holding the product records
    #[arg(long, env = "ROOMKEY_CATALOG_DATA", default_value = "data/products.json")]
    pub data_file: PathBuf,
}
