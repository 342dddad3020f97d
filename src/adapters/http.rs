use crate::config::toml_config::ApiConfig;
use crate::core::{CatalogProduct, Inventory, Stock};
use crate::utils::error::{CartError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// [`Inventory`] backed by the storefront REST API
/// (`GET /products/{id}`, `GET /stock/{id}`).
#[derive(Debug, Clone)]
pub struct HttpInventory {
    base_url: Url,
    client: Client,
}

impl HttpInventory {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| CartError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        // join() would otherwise drop the last path segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Self::with_client(&config.base_url, client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, resource: &str, product_id: i64) -> Result<Url> {
        self.base_url
            .join(&format!("{}/{}", resource, product_id))
            .map_err(|e| CartError::ConfigError {
                message: format!("Cannot build {} URL: {}", resource, e),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(url).send().await?;

        tracing::debug!("API response status: {}", response.status());
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Inventory for HttpInventory {
    async fn product(&self, product_id: i64) -> Result<CatalogProduct> {
        let url = self.endpoint("products", product_id)?;
        self.get_json(url).await
    }

    async fn stock(&self, product_id: i64) -> Result<Stock> {
        let url = self.endpoint("stock", product_id)?;
        self.get_json(url).await
    }
}
