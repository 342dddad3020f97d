use crate::core::{Cart, Inventory, KeyValueStore};
use crate::utils::error::{CartError, Result};

/// Storage key the cart snapshot lives under unless configured otherwise.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

/// In-memory cart mirrored to a [`KeyValueStore`] and checked against an
/// [`Inventory`] before any quantity goes up.
///
/// Every mutation stages a new [`Cart`], writes its snapshot, and only then
/// swaps it in. A failed operation leaves both the in-memory cart and the
/// persisted copy exactly as they were.
pub struct CartStore<S: KeyValueStore, I: Inventory> {
    storage: S,
    inventory: I,
    key: String,
    cart: Cart,
}

impl<S: KeyValueStore, I: Inventory> CartStore<S, I> {
    /// Restores the cart persisted under `key`, or starts empty when there is
    /// nothing usable there.
    pub async fn load(storage: S, inventory: I, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = restore(&storage, &key).await;
        tracing::debug!("Cart restored from '{}' with {} items", key, cart.len());

        Self {
            storage,
            inventory,
            key,
            cart,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Adds one unit of `product_id`, appending a new line-item if the
    /// product is not in the cart yet.
    pub async fn add_product(&mut self, product_id: i64) -> Result<()> {
        let next = match self.cart.get(product_id).map(|p| p.amount) {
            None => {
                let product = self.inventory.product(product_id).await?;
                let stock = self.inventory.stock(product_id).await?;

                if stock.amount < 1 {
                    return Err(CartError::StockExhausted {
                        product_id,
                        requested: 1,
                        available: stock.amount,
                    });
                }

                let mut item = product.into_line_item(1);
                if item.id != product_id {
                    tracing::warn!(
                        "Catalog returned id {} for product {}, keeping requested id",
                        item.id,
                        product_id
                    );
                    item.id = product_id;
                }
                self.cart.with_appended(item)
            }
            Some(current) => {
                let stock = self.inventory.stock(product_id).await?;
                let candidate = match current.checked_add(1) {
                    Some(candidate) => candidate,
                    None => {
                        return Err(CartError::StockExhausted {
                            product_id,
                            requested: current,
                            available: stock.amount,
                        })
                    }
                };

                if candidate > stock.amount {
                    return Err(CartError::StockExhausted {
                        product_id,
                        requested: candidate,
                        available: stock.amount,
                    });
                }

                self.cart.with_amount(product_id, candidate)
            }
        };

        self.commit(next).await?;
        tracing::debug!("Added product {} to cart", product_id);
        Ok(())
    }

    pub async fn remove_product(&mut self, product_id: i64) -> Result<()> {
        if !self.cart.contains(product_id) {
            return Err(CartError::NotFound { product_id });
        }

        let next = self.cart.without(product_id);
        self.commit(next).await?;
        tracing::debug!("Removed product {} from cart", product_id);
        Ok(())
    }

    /// Sets the amount of a line-item already in the cart. Never deletes:
    /// a non-positive amount is rejected.
    pub async fn update_product_amount(&mut self, product_id: i64, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Err(CartError::InvalidAmount { product_id, amount });
        }

        if !self.cart.contains(product_id) {
            return Err(CartError::NotFound { product_id });
        }

        let stock = self.inventory.stock(product_id).await?;
        if amount > stock.amount {
            return Err(CartError::StockExhausted {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let next = self.cart.with_amount(product_id, amount);
        self.commit(next).await?;
        tracing::debug!("Set product {} amount to {}", product_id, amount);
        Ok(())
    }

    async fn commit(&mut self, next: Cart) -> Result<()> {
        let snapshot = next.to_snapshot()?;
        self.storage.set(&self.key, &snapshot).await?;
        self.cart = next;
        Ok(())
    }
}

async fn restore<S: KeyValueStore>(storage: &S, key: &str) -> Cart {
    let snapshot = match storage.get(key).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            tracing::debug!("No cart snapshot under '{}', starting empty", key);
            return Cart::new();
        }
        Err(e) => {
            tracing::warn!("Failed to read cart snapshot '{}': {}, starting empty", key, e);
            return Cart::new();
        }
    };

    match Cart::from_snapshot(&snapshot) {
        Ok(cart) => {
            let (cart, dropped) = cart.normalized();
            if dropped > 0 {
                tracing::warn!(
                    "Dropped {} invalid line-items from cart snapshot '{}'",
                    dropped,
                    key
                );
            }
            cart
        }
        Err(e) => {
            tracing::warn!("Discarding unreadable cart snapshot '{}': {}", key, e);
            Cart::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use crate::core::{CatalogProduct, Stock};
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct StubInventory {
        stock: HashMap<i64, i64>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StubInventory {
        fn with_stock(pairs: &[(i64, i64)]) -> Self {
            Self {
                stock: pairs.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn down(&self) -> CartError {
            CartError::StorageError {
                message: "inventory unreachable".to_string(),
            }
        }
    }

    #[async_trait]
    impl Inventory for StubInventory {
        async fn product(&self, product_id: i64) -> Result<CatalogProduct> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(self.down());
            }
            Ok(serde_json::from_value(json!({
                "id": product_id,
                "title": format!("Shoe {}", product_id),
                "price": 139.9
            }))?)
        }

        async fn stock(&self, product_id: i64) -> Result<Stock> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(self.down());
            }
            Ok(Stock {
                id: product_id,
                amount: self.stock.get(&product_id).copied().unwrap_or(0),
            })
        }
    }

    /// Reads fine, refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key).await
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CartError::StorageError {
                message: "quota exceeded".to_string(),
            })
        }
    }

    fn snapshot(items: serde_json::Value) -> String {
        serde_json::to_string(&items).unwrap()
    }

    fn amounts(cart: &Cart) -> Vec<(i64, i64)> {
        cart.iter().map(|p| (p.id, p.amount)).collect()
    }

    #[tokio::test]
    async fn test_add_new_product_appends_with_amount_one() {
        let storage = MemoryStore::new();
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 5)]), DEFAULT_CART_KEY)
                .await;

        store.add_product(1).await.unwrap();

        assert_eq!(amounts(store.cart()), vec![(1, 1)]);
        assert_eq!(store.cart().items()[0].attributes["title"], json!("Shoe 1"));
        assert_eq!(
            storage.entry(DEFAULT_CART_KEY),
            Some(store.cart().to_snapshot().unwrap())
        );
    }

    #[tokio::test]
    async fn test_add_new_product_without_stock_is_rejected() {
        let storage = MemoryStore::new();
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 0)]), DEFAULT_CART_KEY)
                .await;

        let err = store.add_product(1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StockExhausted);
        assert!(store.cart().is_empty());
        assert_eq!(storage.entry(DEFAULT_CART_KEY), None);
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_by_one() {
        let storage = MemoryStore::new();
        storage.insert(DEFAULT_CART_KEY, &snapshot(json!([{"id": 1, "amount": 2}])));
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 5)]), DEFAULT_CART_KEY)
                .await;

        store.add_product(1).await.unwrap();

        assert_eq!(amounts(store.cart()), vec![(1, 3)]);
        assert_eq!(
            storage.entry(DEFAULT_CART_KEY),
            Some(r#"[{"id":1,"amount":3}]"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_add_existing_product_at_stock_limit_is_rejected() {
        let storage = MemoryStore::new();
        let persisted = snapshot(json!([{"id": 1, "amount": 1}]));
        storage.insert(DEFAULT_CART_KEY, &persisted);
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 1)]), DEFAULT_CART_KEY)
                .await;

        let err = store.add_product(1).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::StockExhausted {
                product_id: 1,
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(amounts(store.cart()), vec![(1, 1)]);
        assert_eq!(storage.entry(DEFAULT_CART_KEY), Some(persisted));
    }

    #[tokio::test]
    async fn test_add_existing_product_at_max_amount_is_rejected() {
        let storage = MemoryStore::new();
        let persisted = format!(r#"[{{"id":1,"amount":{}}}]"#, i64::MAX);
        storage.insert(DEFAULT_CART_KEY, &persisted);
        let mut store = CartStore::load(
            storage.clone(),
            StubInventory::with_stock(&[(1, i64::MAX)]),
            DEFAULT_CART_KEY,
        )
        .await;

        let err = store.add_product(1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StockExhausted);
        assert_eq!(amounts(store.cart()), vec![(1, i64::MAX)]);
        assert_eq!(storage.entry(DEFAULT_CART_KEY), Some(persisted));
    }

    #[tokio::test]
    async fn test_add_with_inventory_down_leaves_cart_unchanged() {
        let storage = MemoryStore::new();
        let mut store =
            CartStore::load(storage.clone(), StubInventory::failing(), DEFAULT_CART_KEY).await;

        let err = store.add_product(9).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(store.cart().is_empty());
        assert_eq!(storage.entry(DEFAULT_CART_KEY), None);
    }

    #[tokio::test]
    async fn test_remove_product() {
        let storage = MemoryStore::new();
        storage.insert(
            DEFAULT_CART_KEY,
            &snapshot(json!([{"id": 1, "amount": 1}, {"id": 2, "amount": 4}])),
        );
        let mut store =
            CartStore::load(storage.clone(), StubInventory::default(), DEFAULT_CART_KEY).await;

        store.remove_product(1).await.unwrap();

        assert_eq!(amounts(store.cart()), vec![(2, 4)]);
        assert_eq!(
            storage.entry(DEFAULT_CART_KEY),
            Some(r#"[{"id":2,"amount":4}]"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_not_found() {
        let storage = MemoryStore::new();
        let persisted = snapshot(json!([{"id": 1, "amount": 1}]));
        storage.insert(DEFAULT_CART_KEY, &persisted);
        let inventory = StubInventory::default();
        let calls = inventory.calls.clone();
        let mut store = CartStore::load(storage.clone(), inventory, DEFAULT_CART_KEY).await;

        let err = store.remove_product(42).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(amounts(store.cart()), vec![(1, 1)]);
        assert_eq!(storage.entry(DEFAULT_CART_KEY), Some(persisted));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_amount_within_stock() {
        let storage = MemoryStore::new();
        storage.insert(DEFAULT_CART_KEY, &snapshot(json!([{"id": 1, "amount": 3}])));
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 5)]), DEFAULT_CART_KEY)
                .await;

        store.update_product_amount(1, 2).await.unwrap();

        assert_eq!(amounts(store.cart()), vec![(1, 2)]);
        assert_eq!(
            storage.entry(DEFAULT_CART_KEY),
            Some(r#"[{"id":1,"amount":2}]"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_amounts() {
        let storage = MemoryStore::new();
        storage.insert(DEFAULT_CART_KEY, &snapshot(json!([{"id": 1, "amount": 3}])));
        let inventory = StubInventory::with_stock(&[(1, 5)]);
        let calls = inventory.calls.clone();
        let mut store = CartStore::load(storage.clone(), inventory, DEFAULT_CART_KEY).await;

        for amount in [0, -1, -100] {
            let err = store.update_product_amount(1, amount).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        }
        // also rejected before the cart lookup
        let err = store.update_product_amount(99, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);

        assert_eq!(amounts(store.cart()), vec![(1, 3)]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_above_stock_is_rejected() {
        let storage = MemoryStore::new();
        storage.insert(DEFAULT_CART_KEY, &snapshot(json!([{"id": 1, "amount": 3}])));
        let mut store =
            CartStore::load(storage.clone(), StubInventory::with_stock(&[(1, 5)]), DEFAULT_CART_KEY)
                .await;

        let err = store.update_product_amount(1, 6).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StockExhausted);
        assert_eq!(amounts(store.cart()), vec![(1, 3)]);
    }

    #[tokio::test]
    async fn test_update_absent_product_is_not_found() {
        let mut store = CartStore::load(
            MemoryStore::new(),
            StubInventory::with_stock(&[(1, 5)]),
            DEFAULT_CART_KEY,
        )
        .await;

        let err = store.update_product_amount(1, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_cart() {
        let inner = MemoryStore::new();
        let persisted = snapshot(json!([{"id": 1, "amount": 1}]));
        inner.insert(DEFAULT_CART_KEY, &persisted);
        let mut store = CartStore::load(
            ReadOnlyStore(inner.clone()),
            StubInventory::with_stock(&[(1, 5), (2, 5)]),
            DEFAULT_CART_KEY,
        )
        .await;

        assert!(store.add_product(1).await.is_err());
        assert!(store.add_product(2).await.is_err());
        assert!(store.update_product_amount(1, 4).await.is_err());
        assert!(store.remove_product(1).await.is_err());

        assert_eq!(amounts(store.cart()), vec![(1, 1)]);
        assert_eq!(inner.entry(DEFAULT_CART_KEY), Some(persisted));
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let storage = MemoryStore::new();
        let inventory = StubInventory::with_stock(&[(1, 5), (2, 5), (3, 5)]);
        let mut store = CartStore::load(storage.clone(), inventory.clone(), "cart").await;
        store.add_product(3).await.unwrap();
        store.add_product(1).await.unwrap();
        store.add_product(3).await.unwrap();
        store.add_product(2).await.unwrap();
        store.update_product_amount(2, 4).await.unwrap();

        let reloaded = CartStore::load(storage, inventory, "cart").await;

        assert_eq!(reloaded.cart(), store.cart());
        assert_eq!(amounts(reloaded.cart()), vec![(3, 2), (1, 1), (2, 4)]);
    }

    #[tokio::test]
    async fn test_load_corrupt_snapshot_starts_empty() {
        let storage = MemoryStore::new();
        storage.insert(DEFAULT_CART_KEY, "{\"id\": 1,");
        let store =
            CartStore::load(storage.clone(), StubInventory::default(), DEFAULT_CART_KEY).await;

        assert!(store.cart().is_empty());
        // corrupt data is only replaced by the next successful mutation
        assert_eq!(storage.entry(DEFAULT_CART_KEY).as_deref(), Some("{\"id\": 1,"));
    }

    #[tokio::test]
    async fn test_load_normalizes_invalid_items() {
        let storage = MemoryStore::new();
        storage.insert(
            DEFAULT_CART_KEY,
            &snapshot(json!([
                {"id": 1, "amount": 0},
                {"id": 2, "amount": 2},
                {"id": 2, "amount": 7}
            ])),
        );
        let store = CartStore::load(storage, StubInventory::default(), DEFAULT_CART_KEY).await;

        assert_eq!(amounts(store.cart()), vec![(2, 2)]);
    }
}
