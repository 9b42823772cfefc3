//! Static application configuration and the deployment mode switch.

use serde::{Deserialize, Serialize};

/// Process-wide variable whose presence selects sandbox mode.
pub const SANDBOX_ENDPOINT_VAR: &str = "ROOMKEY_CONN_DETAILS_ENDPOINT";
/// Sandbox token server used when the variable is present but empty.
pub const DEFAULT_SANDBOX_ENDPOINT: &str = "https://cloud-api.livekit.io/api/sandbox/connection-details";
/// Where the application serves its issuance route.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Product catalog service.
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8000";
/// Issuance path, relative to [`AppConfig::base_url`].
pub const CONNECTION_DETAILS_PATH: &str = "/api/connection-details";

/// Deployment configuration, immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent to dispatch into the room. Empty counts as unset.
    pub agent_name: Option<String>,
    /// Sandbox identifier forwarded to the sandbox token server.
    pub sandbox_id: Option<String>,
    /// Origin of the application that owns the issuance endpoint.
    pub base_url: String,
    /// Origin of the product catalog service.
    pub catalog_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent_name: None,
            sandbox_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// The agent name, only if set and non-empty.
    pub fn agent(&self) -> Option<&str> {
        self.agent_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn with_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL of the issuance endpoint.
    pub fn connection_details_url(&self) -> String {
        format!("{}{CONNECTION_DETAILS_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// How credentials are obtained for this deployment.
///
/// Resolved once at startup and passed down explicitly; nothing re-reads the
/// environment per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Credentials come from a sandbox token server.
    Sandbox { endpoint: String },
    /// Credentials come from the application's own issuance endpoint.
    Backend,
}

impl DeploymentMode {
    /// Read [`SANDBOX_ENDPOINT_VAR`] from the process environment.
    pub fn from_env() -> Self {
        let value = std::env::var_os(SANDBOX_ENDPOINT_VAR).map(|v| v.to_string_lossy().into_owned());
        Self::from_var(value)
    }

    /// Presence selects sandbox mode; the content only picks the endpoint.
    pub fn from_var(value: Option<String>) -> Self {
        match value {
            Some(endpoint) if endpoint.trim().is_empty() => DeploymentMode::Sandbox {
                endpoint: DEFAULT_SANDBOX_ENDPOINT.to_string(),
            },
            Some(endpoint) => DeploymentMode::Sandbox {
                endpoint: endpoint.trim().to_string(),
            },
            None => DeploymentMode::Backend,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, DeploymentMode::Sandbox { .. })
    }
}
