//! Session handle boundary.
//!
//! The live transport is not part of this crate. A [`Connector`] turns a
//! credential into whatever connection object the application uses; the
//! [`SessionHandle`] wraps it with the bookkeeping every caller needs:
//!
//! - a fresh credential is resolved for every connect attempt, never reused;
//! - attempts are numbered, and a result that finishes after a newer attempt
//!   has started is dropped with [`SessionError::Superseded`];
//! - credential failures are surfaced, not swallowed.
//!
//! The SDK does not reconnect on its own. [`SessionHandle::connect_with_retry`]
//! is there for callers that want bounded retries with backoff.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::config::AppConfig;
use crate::credential::Credential;
use crate::error::CredentialError;
use crate::source::TokenSource;

/// Hints passed alongside the credential source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Agent the session expects to meet in the room.
    pub agent_name: Option<String>,
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            agent_name: config.agent().map(str::to_string),
        }
    }
}

/// Establishes the realtime transport from a resolved credential.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Send;

    async fn connect(&self, credential: &Credential, options: &SessionOptions) -> anyhow::Result<Self::Connection>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not obtain a credential: {0}")]
    Credential(#[from] CredentialError),
    #[error("Transport failed to connect: {0:#}")]
    Transport(anyhow::Error),
    #[error("Connect attempt {attempt} was superseded by attempt {current}")]
    Superseded { attempt: u64, current: u64 },
}

impl SessionError {
    fn is_retryable(&self) -> bool {
        match self {
            SessionError::Credential(e) => e.is_retryable(),
            SessionError::Transport(_) => true,
            SessionError::Superseded { .. } => false,
        }
    }
}

/// Backoff settings for [`SessionHandle::connect_with_retry`].
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            max_attempts: 5,
        }
    }
}

pub struct SessionHandle<K: Connector> {
    source: TokenSource,
    options: SessionOptions,
    connector: K,
    generation: AtomicU64,
}

impl<K: Connector> SessionHandle<K> {
    pub fn new(source: TokenSource, options: SessionOptions, connector: K) -> Self {
        Self {
            source,
            options,
            connector,
            generation: AtomicU64::new(0),
        }
    }

    /// Number of the most recently started attempt (0 before the first).
    pub fn current_attempt(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn ensure_current(&self, attempt: u64) -> Result<(), SessionError> {
        let current = self.current_attempt();
        if current != attempt {
            tracing::debug!(attempt, current, "discarding stale connect attempt");
            return Err(SessionError::Superseded { attempt, current });
        }
        Ok(())
    }

    /// Start a new attempt: resolve a credential, then connect with it.
    pub async fn connect(&self) -> Result<K::Connection, SessionError> {
        let attempt = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(attempt, kind = %self.source.kind(), "connect attempt");

        let credential = match self.source.resolve().await {
            Ok(c) => c,
            Err(e) => {
                self.ensure_current(attempt)?;
                return Err(e.into());
            }
        };
        self.ensure_current(attempt)?;

        let connection = self
            .connector
            .connect(&credential, &self.options)
            .await
            .map_err(SessionError::Transport)?;
        self.ensure_current(attempt)?;
        Ok(connection)
    }

    /// [`connect`](Self::connect) with exponential backoff on retryable
    /// failures. Each retry resolves a new credential.
    pub async fn connect_with_retry(&self, reconnect: &ReconnectConfig) -> Result<K::Connection, SessionError> {
        let mut delay = reconnect.initial_delay;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.connect().await {
                Ok(conn) => return Ok(conn),
                Err(e) if e.is_retryable() && attempts < reconnect.max_attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay, reconnect);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn next_delay(delay: Duration, reconnect: &ReconnectConfig) -> Duration {
    let base = delay.as_millis() as f64 * reconnect.backoff_factor;
    let jitter = rand_jitter(delay.as_millis() as u64 / 4);
    Duration::from_millis((base as u64 + jitter).min(reconnect.max_delay.as_millis() as u64))
}

fn rand_jitter(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..max)
}
