//! HTTP client for the remote catalog service.

use std::time::Duration;

use async_trait::async_trait;
use domain::{CatalogProduct, ProductId, StockOperation};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::catalog::{AuthToken, CatalogError, CatalogGateway};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Product representation returned by `GET {base}/{id}`.
#[derive(Debug, Deserialize)]
struct ProductDto {
    id: ProductId,
    #[serde(default)]
    name: Option<String>,
    price: Decimal,
    #[serde(default = "default_available")]
    available: bool,
}

fn default_available() -> bool {
    true
}

/// Catalog gateway talking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogGateway {
    /// Creates a gateway for the catalog at `base_url`, bounding every
    /// request by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_items(
        &self,
        path: &str,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(token.as_str())
            .json(items)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(resp).await)
    }
}

/// Maps a non-success response onto a catalog error, preferring the
/// `message` field of a JSON error body.
async fn error_from_response(resp: reqwest::Response) -> CatalogError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if text.is_empty() {
                format!("HTTP {}", status)
            } else {
                text
            }
        });

    if status.is_client_error() {
        CatalogError::Rejected(message)
    } else {
        CatalogError::Transport(format!("HTTP {}: {}", status.as_u16(), message))
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    #[tracing::instrument(skip(self, token), fields(items = items.len()))]
    async fn validate_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        self.post_items("validate-stock", items, token).await
    }

    #[tracing::instrument(skip(self, token))]
    async fn get_product(
        &self,
        product_id: ProductId,
        token: &AuthToken,
    ) -> Result<CatalogProduct, CatalogError> {
        let resp = self
            .client
            .get(format!("{}/{}", self.base_url, product_id))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::ProductNotFound(product_id));
        }
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let dto: ProductDto = resp
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        if dto.id != product_id {
            return Err(CatalogError::InvalidResponse(format!(
                "Requested product {} but catalog returned {}",
                product_id, dto.id
            )));
        }

        let product = CatalogProduct::from_decimal_price(dto.id, dto.price, dto.available)
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        Ok(match dto.name {
            Some(name) => product.with_name(name),
            None => product,
        })
    }

    #[tracing::instrument(skip(self, token), fields(items = items.len()))]
    async fn deduct_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        self.post_items("deduct-stock", items, token).await
    }

    #[tracing::instrument(skip(self, token), fields(items = items.len()))]
    async fn restore_stock(
        &self,
        items: &[StockOperation],
        token: &AuthToken,
    ) -> Result<(), CatalogError> {
        self.post_items("restore-stock", items, token).await
    }
}
