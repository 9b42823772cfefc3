//! HTTP API for the product catalog.
//!
//! Read-only. Lookup failures the client is expected to handle (no data
//! file, unknown id) answer 200 with an `{"error": ...}` body; unreadable or
//! malformed data answers 500.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::CatalogConfig;
use crate::products::{ProductFile, ProductFileError};

pub struct CatalogState {
    pub products: ProductFile,
}

pub fn router(state: Arc<CatalogState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/product", get(list_products))
        .route("/product/{product_id}", get(lookup_product))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_body(message: impl Into<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message.into() }))
}

fn file_error(e: ProductFileError) -> Response {
    match e {
        ProductFileError::Missing => {
            tracing::warn!("product data file not found");
            error_body(e.to_string()).into_response()
        }
        e => {
            tracing::error!(error = %e, "failed to load product data");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn list_products(State(state): State<Arc<CatalogState>>) -> Response {
    match state.products.summaries().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => file_error(e),
    }
}

async fn lookup_product(State(state): State<Arc<CatalogState>>, Path(product_id): Path<String>) -> Response {
    match state.products.find(&product_id).await {
        Ok(Some(record)) => {
            tracing::debug!(%product_id, name = %record.product_name, "product lookup");
            Json(record).into_response()
        }
        Ok(None) => error_body("No products found!").into_response(),
        Err(e) => file_error(e),
    }
}

/// Bind and serve in the background. Returns the bound address.
pub async fn start(
    config: &CatalogConfig,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<anyhow::Result<()>>)> {
    let state = Arc::new(CatalogState {
        products: ProductFile::new(config.data_file.clone()),
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    let addr = listener.local_addr()?;
    let app = router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });
    Ok((addr, handle))
}
