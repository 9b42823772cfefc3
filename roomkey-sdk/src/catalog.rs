//! Product catalog client and the picker state built on it.
//!
//! The catalog only feeds a convenience picker, so its failures are handled
//! differently from credential failures: [`CatalogClient`] reports them as a
//! plain `Result`, and [`ProductPicker::settle`] decides to fall back to
//! placeholder products instead of surfacing the error.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::details::ConnectionDetailsStore;
use crate::error::{CatalogError, status_text};

/// Message the catalog service uses for an unknown product id.
pub const NOT_FOUND_MESSAGE: &str = "No products found!";

/// Entry in the product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Full catalog record. Fields beyond id and name are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What the picker shows when the catalog can't be reached.
pub fn placeholder_products() -> Vec<Product> {
    (1..=3)
        .map(|i| Product::new(i.to_string(), format!("Mock Product {i}")))
        .collect()
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    base: Url,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            base: Url::parse(base_url)?,
            http: reqwest::Client::new(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, CatalogError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                status_text: status_text(&resp),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `GET /product`
    pub async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let body = self.get_json(self.url(&["product"])?).await?;
        if let Some(message) = error_message(&body) {
            return Err(CatalogError::Service { message });
        }
        Ok(serde_json::from_value(body)?)
    }

    /// `GET /product/{id}`
    pub async fn fetch_product(&self, product_id: &str) -> Result<ProductDetails, CatalogError> {
        let body = self.get_json(self.url(&["product", product_id])?).await?;
        match error_message(&body) {
            Some(message) if message == NOT_FOUND_MESSAGE => Err(CatalogError::NotFound {
                product_id: product_id.to_string(),
            }),
            Some(message) => Err(CatalogError::Service { message }),
            None => Ok(serde_json::from_value(body)?),
        }
    }
}

/// The catalog reports some failures as `{"error": "..."}` with a 200.
fn error_message(body: &serde_json::Value) -> Option<String> {
    body.as_object()?.get("error")?.as_str().map(str::to_string)
}

/// Product selector state for a presentation layer.
#[derive(Debug, Clone)]
pub struct ProductPicker {
    items: Vec<Product>,
    loading: bool,
    placeholders: bool,
    selected: Option<String>,
}

impl Default for ProductPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductPicker {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            placeholders: false,
            selected: None,
        }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the list is the offline fallback.
    pub fn using_placeholders(&self) -> bool {
        self.placeholders
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn prompt(&self) -> &'static str {
        if self.loading { "Loading..." } else { "Select a product" }
    }

    /// Apply a fetch result. On error the placeholder list is used and the
    /// error is only logged.
    pub fn settle(&mut self, result: Result<Vec<Product>, CatalogError>) {
        match result {
            Ok(items) => {
                self.items = items;
                self.placeholders = false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch products, using mock data");
                self.items = placeholder_products();
                self.placeholders = true;
            }
        }
        if let Some(ref id) = self.selected {
            if !self.items.iter().any(|p| &p.id == id) {
                tracing::debug!(product = %id, "selected product no longer listed");
                self.selected = None;
            }
        }
        self.loading = false;
    }

    pub async fn load(&mut self, client: &CatalogClient) {
        self.loading = true;
        let result = client.fetch_products().await;
        self.settle(result);
    }

    /// Select `product_id` if it is listed, writing it into `store` by full
    /// replacement of the details.
    pub fn select(&mut self, product_id: &str, store: &ConnectionDetailsStore) -> Option<&Product> {
        let product = self.items.iter().find(|p| p.id == product_id)?;
        store.replace(store.current().with_product(product.id.clone()));
        self.selected = Some(product.id.clone());
        Some(product)
    }
}
