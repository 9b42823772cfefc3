//! Persistent configuration for the roomkey CLI.
//!
//! Config file lives at `~/.config/roomkey/cli.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use roomkey_sdk::catalog::ProductPicker;
use roomkey_sdk::config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_CATALOG_URL};
use roomkey_sdk::details::{ConnectionDetails, ConnectionDetailsStore};

/// User configuration (persisted in cli.toml).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Origin of the application serving /api/connection-details.
    pub base_url: Option<String>,
    /// Origin of the product catalog.
    pub catalog_url: Option<String>,
    /// Agent to dispatch into the room.
    pub agent_name: Option<String>,
    /// Sandbox identifier for the sandbox token server.
    pub sandbox_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Last selected product.
    pub product_id: Option<String>,
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roomkey")
        .join("cli.toml")
}

impl Config {
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => return c,
                    Err(e) => tracing::warn!("bad config file {}: {e}", path.display()),
                },
                Err(e) => tracing::warn!("can't read {}: {e}", path.display()),
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        let path = config_path();
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        match toml::to_string_pretty(self) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    tracing::warn!("can't save config: {e}");
                }
            }
            Err(e) => tracing::warn!("can't serialize config: {e}"),
        }
    }
}

/// Effective settings after merging CLI args > config file > defaults.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub app: AppConfig,
    pub details: ConnectionDetails,
}

impl Resolved {
    pub fn merge(cli: &super::Cli, config: &Config) -> Self {
        let pick = |cli: &Option<String>, file: &Option<String>| cli.clone().or_else(|| file.clone());

        let app = AppConfig {
            agent_name: pick(&cli.agent_name, &config.agent_name),
            sandbox_id: pick(&cli.sandbox_id, &config.sandbox_id),
            base_url: pick(&cli.base_url, &config.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            catalog_url: pick(&cli.catalog_url, &config.catalog_url)
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        };
        let details = ConnectionDetails {
            name: pick(&cli.name, &config.name).unwrap_or_default(),
            email: pick(&cli.email, &config.email).unwrap_or_default(),
            product_id: pick(&cli.product, &config.product_id).unwrap_or_default(),
        };
        Self { app, details }
    }
}

/// Interactive form on stderr: name, email, then a product from the picker.
/// Writes the answers into `store` and saves them to the config file.
pub fn interactive_setup(config: &Config, picker: &mut ProductPicker, store: &ConnectionDetailsStore) {
    use std::io::{self, BufRead, Write};

    let stdin = io::stdin();
    let mut out = io::stderr();
    let current = store.current();

    let mut ask = |label: &str, default: &str| -> String {
        if default.is_empty() {
            write!(out, "  \x1b[1m{label}\x1b[0m: ").ok();
        } else {
            write!(out, "  \x1b[1m{label}\x1b[0m [{default}]: ").ok();
        }
        out.flush().ok();
        let mut input = String::new();
        stdin.lock().read_line(&mut input).ok();
        let input = input.trim();
        if input.is_empty() { default.to_string() } else { input.to_string() }
    };

    let name = ask("Name", &current.name);
    let email = ask("Email", &current.email);
    store.replace(ConnectionDetails {
        name,
        email,
        ..current.clone()
    });

    eprintln!();
    if picker.using_placeholders() {
        eprintln!("  \x1b[33mCatalog unavailable, showing demo products.\x1b[0m");
    }
    for (i, p) in picker.items().iter().enumerate() {
        eprintln!("  {:>2}. {} \x1b[90m({})\x1b[0m", i + 1, p.name, p.id);
    }
    let choice = ask(picker.prompt(), &current.product_id);
    let product_id = match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= picker.items().len() => picker.items()[n - 1].id.clone(),
        _ => choice,
    };
    if !product_id.is_empty() && picker.select(&product_id, store).is_none() {
        eprintln!("  \x1b[33mUnknown product {product_id}, keeping it anyway.\x1b[0m");
        store.replace(store.current().with_product(product_id));
    }

    let details = store.current();
    let saved = Config {
        name: Some(details.name.clone()),
        email: Some(details.email.clone()),
        product_id: Some(details.product_id.clone()),
        ..config.clone()
    };
    saved.save();
    eprintln!();
}
