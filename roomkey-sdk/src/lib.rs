//! Connection bootstrap for realtime agent rooms.
//!
//! A client that wants to join a room with an agent attached needs a
//! short-lived connection credential. This crate picks how that credential
//! is obtained (a sandbox token source in development, the application's
//! issuance endpoint otherwise), feeds it the user-entered connection
//! details, and hands the result to a session handle.
//!
//! ```rust,no_run
//! use roomkey_sdk::config::{AppConfig, DeploymentMode};
//! use roomkey_sdk::details::{ConnectionDetails, ConnectionDetailsStore};
//! use roomkey_sdk::source::TokenSource;
//! use roomkey_sdk::strategy::select_strategy;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::default().with_agent("concierge");
//! let mode = DeploymentMode::from_env();
//! let store = ConnectionDetailsStore::default();
//!
//! let source = TokenSource::new(select_strategy(&config, &mode), store.clone());
//! store.replace(ConnectionDetails::new("Ada", "ada@example.com", "p-42"));
//! let credential = source.resolve().await?;
//! println!("{:?}", credential.server_url());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod credential;
pub mod details;
pub mod error;
pub mod session;
pub mod source;
pub mod strategy;

pub use credential::Credential;
pub use details::{ConnectionDetails, ConnectionDetailsStore};
pub use error::{CatalogError, CredentialError};
