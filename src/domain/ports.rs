use crate::domain::model::{CatalogProduct, Stock};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Scoped string key-value persistence, in the shape of browser localStorage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Read-only view of the remote catalog and stock oracle.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn product(&self, product_id: i64) -> Result<CatalogProduct>;
    async fn stock(&self, product_id: i64) -> Result<Stock>;
}

/// Fire-and-forget sink for user-visible errors.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}
