//! Error types for credential resolution and catalog access.

/// Why a credential could not be obtained.
///
/// None of these are recovered inside the crate; they surface to whoever
/// asked for the credential (normally the session handle).
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The issuance endpoint answered with a non-2xx status.
    #[error("Failed to fetch token: {status_text}")]
    RequestFailed { status: u16, status_text: String },
    /// The response body was not JSON.
    #[error("Failed to parse token response: {0}")]
    ParseFailed(#[from] serde_json::Error),
    /// No response was received at all.
    #[error("Token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The sandbox token source reported a failure.
    #[error("Sandbox token source: {0}")]
    Sandbox(String),
}

impl CredentialError {
    pub(crate) fn from_status(status: reqwest::StatusCode, status_text: String) -> Self {
        CredentialError::RequestFailed {
            status: status.as_u16(),
            status_text,
        }
    }

    /// Whether trying again later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CredentialError::Transport(e) => !e.is_builder(),
            CredentialError::RequestFailed { status, .. } => *status >= 500,
            CredentialError::ParseFailed(_) | CredentialError::Sandbox(_) => false,
        }
    }
}

/// Failures talking to the product catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Catalog returned {status}: {status_text}")]
    Status { status: u16, status_text: String },
    #[error("Catalog response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Product {product_id} not found")]
    NotFound { product_id: String },
    #[error("Catalog error: {message}")]
    Service { message: String },
}

/// Reason phrase the server sent on the status line. HTTP/2 has none, so
/// fall back to the canonical phrase for the code.
pub(crate) fn status_text(resp: &reqwest::Response) -> String {
    match resp.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => canonical_text(resp.status()),
    }
}

/// Canonical reason for a status, falling back to the numeric code.
pub(crate) fn canonical_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}
