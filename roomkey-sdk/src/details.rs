//! User-entered connection details and the store that holds them.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identity and selection data sent along with a credential request.
///
/// Empty strings are valid (e.g. before a product has been picked).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub name: String,
    pub email: String,
    pub product_id: String,
}

impl ConnectionDetails {
    pub fn new(name: impl Into<String>, email: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            product_id: product_id.into(),
        }
    }

    /// Copy of these details with a different product selected.
    pub fn with_product(&self, product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    details: ConnectionDetails,
    revision: u64,
}

/// Shared handle to the current [`ConnectionDetails`].
///
/// One writer (the presentation layer) replaces the whole value; any number
/// of readers take snapshots. Every replace bumps [`revision`](Self::revision).
#[derive(Debug, Clone, Default)]
pub struct ConnectionDetailsStore {
    inner: Arc<RwLock<Inner>>,
}

impl ConnectionDetailsStore {
    pub fn new(details: ConnectionDetails) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { details, revision: 0 })),
        }
    }

    /// Snapshot of the latest value.
    pub fn current(&self) -> ConnectionDetails {
        self.inner.read().details.clone()
    }

    /// Replace the stored value. No validation happens here.
    pub fn replace(&self, details: ConnectionDetails) {
        let mut inner = self.inner.write();
        inner.details = details;
        inner.revision += 1;
        tracing::trace!(revision = inner.revision, "connection details replaced");
    }

    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Whether both handles point at the same underlying store.
    pub fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
