//! Lazy credential source handed to the session handle.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{AppConfig, DeploymentMode};
use crate::credential::Credential;
use crate::details::{ConnectionDetails, ConnectionDetailsStore};
use crate::error::CredentialError;
use crate::strategy::{SandboxTokenSource, StrategyKind, TokenStrategy, select_strategy, select_strategy_with};

/// A strategy bound to the store it reads details from.
///
/// Nothing is requested until [`resolve`](Self::resolve) is called, and every
/// call issues a fresh request against the details current at that moment.
#[derive(Debug, Clone)]
pub struct TokenSource {
    strategy: Arc<TokenStrategy>,
    store: ConnectionDetailsStore,
}

impl TokenSource {
    pub fn new(strategy: TokenStrategy, store: ConnectionDetailsStore) -> Self {
        Self {
            strategy: Arc::new(strategy),
            store,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Snapshot the store, then ask the strategy for a credential.
    pub async fn resolve(&self) -> Result<Credential, CredentialError> {
        let details = self.store.current();
        self.resolve_for(&details).await
    }

    /// Ask the strategy for a credential issued against `details`.
    pub async fn resolve_for(&self, details: &ConnectionDetails) -> Result<Credential, CredentialError> {
        self.strategy.fetch(details).await
    }

    /// Whether both sources share the same selected strategy instance.
    pub fn same_strategy(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.strategy, &other.strategy)
    }
}

struct Cached {
    config: Arc<AppConfig>,
    store: ConnectionDetailsStore,
    revision: u64,
    source: TokenSource,
}

/// Keeps the selected [`TokenSource`] until its inputs change.
///
/// The key is the identity of the `Arc<AppConfig>`, the store handle and the
/// store's revision. Asking again with the same inputs returns the cached
/// source, so repeated lookups never reselect (or re-create HTTP clients).
pub struct TokenSourceMemo {
    mode: DeploymentMode,
    sandbox: Option<Arc<dyn SandboxTokenSource>>,
    cached: Mutex<Option<Cached>>,
}

impl TokenSourceMemo {
    pub fn new(mode: DeploymentMode) -> Self {
        Self {
            mode,
            sandbox: None,
            cached: Mutex::new(None),
        }
    }

    /// Use `sandbox` instead of the HTTP sandbox token server.
    pub fn with_sandbox(mode: DeploymentMode, sandbox: Arc<dyn SandboxTokenSource>) -> Self {
        Self {
            mode,
            sandbox: Some(sandbox),
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self, config: &Arc<AppConfig>, store: &ConnectionDetailsStore) -> TokenSource {
        let revision = store.revision();
        let mut cached = self.cached.lock();
        if let Some(c) = cached.as_ref() {
            if Arc::ptr_eq(&c.config, config) && c.store.same_store(store) && c.revision == revision {
                return c.source.clone();
            }
        }

        tracing::debug!(revision, mode = ?self.mode, "recomputing token source");
        let strategy = match self.sandbox {
            Some(ref sandbox) => select_strategy_with(config, &self.mode, sandbox.clone()),
            None => select_strategy(config, &self.mode),
        };
        let source = TokenSource::new(strategy, store.clone());
        *cached = Some(Cached {
            config: config.clone(),
            store: store.clone(),
            revision,
            source: source.clone(),
        });
        source
    }
}
