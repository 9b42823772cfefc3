//! Credential strategies.
//!
//! Exactly one strategy is active per deployment:
//!
//! - **Sandbox**: a development token server issues the credential. The
//!   user-entered details play no part; only the [`AppConfig`] is forwarded.
//! - **Backend**: the application's issuance endpoint is called with the
//!   user's name, email and selected product, plus the agent to dispatch.
//!
//! Which one is chosen depends only on the [`DeploymentMode`], decided once at
//! startup. The details a strategy sends are passed in on every call, so a
//! caller always states which snapshot a credential was issued for.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::config::{AppConfig, DeploymentMode};
use crate::credential::Credential;
use crate::details::ConnectionDetails;
use crate::error::{CredentialError, status_text};

/// Anything that can hand out sandbox credentials for a configuration.
///
/// Errors are returned to the session handle exactly as produced here.
#[async_trait]
pub trait SandboxTokenSource: Send + Sync {
    async fn fetch(&self, config: &AppConfig) -> Result<Credential, CredentialError>;
}

/// Sandbox token server reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSandboxTokenSource {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpSandboxTokenSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SandboxTokenSource for HttpSandboxTokenSource {
    async fn fetch(&self, config: &AppConfig) -> Result<Credential, CredentialError> {
        let body = SandboxRequest {
            room_config: config.agent().map(RoomConfig::for_agent),
        };
        let mut req = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(ref id) = config.sandbox_id {
            req = req.header("X-Sandbox-Id", id);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CredentialError::Sandbox(status_text(&resp)));
        }
        let bytes = resp.bytes().await?;
        Ok(Credential::new(serde_json::from_slice(&bytes)?))
    }
}

#[derive(Debug, Serialize)]
struct SandboxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    room_config: Option<RoomConfig>,
}

/// Body sent to the issuance endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub initial_query: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_config: Option<RoomConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomConfig {
    pub agents: Vec<RoomAgent>,
}

impl RoomConfig {
    fn for_agent(agent_name: &str) -> Self {
        Self {
            agents: vec![RoomAgent {
                agent_name: agent_name.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomAgent {
    pub agent_name: String,
}

/// Delegates to a [`SandboxTokenSource`].
#[derive(Clone)]
pub struct SandboxStrategy {
    config: AppConfig,
    source: Arc<dyn SandboxTokenSource>,
}

impl SandboxStrategy {
    pub fn new(config: AppConfig, source: Arc<dyn SandboxTokenSource>) -> Self {
        Self { config, source }
    }

    pub async fn fetch(&self) -> Result<Credential, CredentialError> {
        tracing::debug!(sandbox_id = ?self.config.sandbox_id, "requesting sandbox credential");
        self.source.fetch(&self.config).await
    }
}

impl fmt::Debug for SandboxStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxStrategy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Calls the application's issuance endpoint.
#[derive(Debug, Clone)]
pub struct BackendStrategy {
    endpoint: String,
    agent_name: Option<String>,
    http: reqwest::Client,
}

impl BackendStrategy {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &AppConfig, http: reqwest::Client) -> Self {
        Self {
            endpoint: config.connection_details_url(),
            agent_name: config.agent().map(str::to_string),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The body [`fetch`](Self::fetch) would send for `details`.
    pub fn request_body(&self, details: &ConnectionDetails) -> TokenRequest {
        TokenRequest {
            initial_query: details.product_id.clone(),
            user_name: details.name.clone(),
            user_email: details.email.clone(),
            room_config: self.agent_name.as_deref().map(RoomConfig::for_agent),
        }
    }

    /// One request, no retries. Concurrent calls are independent.
    pub async fn fetch(&self, details: &ConnectionDetails) -> Result<Credential, CredentialError> {
        let body = self.request_body(details);
        tracing::debug!(
            endpoint = %self.endpoint,
            product = %body.initial_query,
            agent = ?self.agent_name,
            "requesting connection details"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = status_text(&resp);
            tracing::debug!(%status, reason = %text, "issuance endpoint rejected request");
            return Err(CredentialError::from_status(status, text));
        }

        let bytes = resp.bytes().await?;
        Ok(Credential::new(serde_json::from_slice(&bytes)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Sandbox,
    Backend,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Sandbox => f.write_str("sandbox"),
            StrategyKind::Backend => f.write_str("backend"),
        }
    }
}

/// The active credential strategy.
#[derive(Debug, Clone)]
pub enum TokenStrategy {
    Sandbox(SandboxStrategy),
    Backend(BackendStrategy),
}

impl TokenStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            TokenStrategy::Sandbox(_) => StrategyKind::Sandbox,
            TokenStrategy::Backend(_) => StrategyKind::Backend,
        }
    }

    /// Resolve a credential for the given details snapshot.
    ///
    /// The sandbox variant ignores `details`.
    pub async fn fetch(&self, details: &ConnectionDetails) -> Result<Credential, CredentialError> {
        match self {
            TokenStrategy::Sandbox(s) => s.fetch().await,
            TokenStrategy::Backend(b) => b.fetch(details).await,
        }
    }
}

/// Pick the strategy for `mode`, using the HTTP sandbox token server in
/// sandbox mode.
pub fn select_strategy(config: &AppConfig, mode: &DeploymentMode) -> TokenStrategy {
    match mode {
        DeploymentMode::Sandbox { endpoint } => {
            select_strategy_with(config, mode, Arc::new(HttpSandboxTokenSource::new(endpoint.clone())))
        }
        DeploymentMode::Backend => selected(TokenStrategy::Backend(BackendStrategy::new(config))),
    }
}

/// Like [`select_strategy`], with a caller-supplied sandbox token source.
/// `sandbox` is unused in backend mode.
pub fn select_strategy_with(
    config: &AppConfig,
    mode: &DeploymentMode,
    sandbox: Arc<dyn SandboxTokenSource>,
) -> TokenStrategy {
    selected(match mode {
        DeploymentMode::Sandbox { .. } => TokenStrategy::Sandbox(SandboxStrategy::new(config.clone(), sandbox)),
        DeploymentMode::Backend => TokenStrategy::Backend(BackendStrategy::new(config)),
    })
}

fn selected(strategy: TokenStrategy) -> TokenStrategy {
    tracing::debug!(kind = %strategy.kind(), "selected credential strategy");
    strategy
}
