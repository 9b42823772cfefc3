//! Product records backed by a JSON file.
//!
//! The file is read on every request, so edits are picked up without a
//! restart. A leading UTF-8 byte order mark is tolerated.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// List entry: id and name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
}

impl From<&ProductRecord> for ProductSummary {
    fn from(record: &ProductRecord) -> Self {
        Self {
            id: record.product_id.clone(),
            name: record.product_name.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProductFileError {
    #[error("Product data not found")]
    Missing,
    #[error("Failed to read product data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid product data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ProductFile {
    path: PathBuf,
}

impl ProductFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Vec<ProductRecord>, ProductFileError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ProductFileError::Missing),
            Err(e) => return Err(e.into()),
        };
        parse_records(&bytes)
    }

    pub async fn summaries(&self) -> Result<Vec<ProductSummary>, ProductFileError> {
        Ok(self.load().await?.iter().map(ProductSummary::from).collect())
    }

    /// First record with a matching id.
    pub async fn find(&self, product_id: &str) -> Result<Option<ProductRecord>, ProductFileError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|p| p.product_id == product_id))
    }
}

fn parse_records(bytes: &[u8]) -> Result<Vec<ProductRecord>, ProductFileError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(serde_json::from_slice(bytes)?)
}
