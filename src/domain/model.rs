use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::utils::error::Result;

/// A cart line-item: a catalog product plus the quantity held in the cart.
///
/// Display attributes (title, price, image, ...) are kept as opaque JSON so
/// whatever the catalog returns survives a snapshot round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
    pub amount: i64,
}

impl Product {
    pub fn with_amount(&self, amount: i64) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }
}

/// A product as served by `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CatalogProduct {
    pub fn into_line_item(self, amount: i64) -> Product {
        let mut attributes = self.attributes;
        attributes.remove("amount");
        Product {
            id: self.id,
            attributes,
            amount,
        }
    }
}

/// Available quantity for one product, as served by `GET /stock/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(alias = "productId")]
    pub id: i64,
    pub amount: i64,
}

/// Ordered line-items, unique by id. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, product_id: i64) -> Option<&Product> {
        self.items.iter().find(|p| p.id == product_id)
    }

    pub fn contains(&self, product_id: i64) -> bool {
        self.get(product_id).is_some()
    }

    /// Sum of all line-item amounts.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|p| p.amount).sum()
    }

    // The builders below return a fresh cart so callers can stage a change
    // and only swap it in once it has been persisted.

    pub fn with_appended(&self, product: Product) -> Cart {
        let mut items = self.items.clone();
        items.push(product);
        Cart { items }
    }

    pub fn with_amount(&self, product_id: i64, amount: i64) -> Cart {
        let items = self
            .items
            .iter()
            .map(|p| {
                if p.id == product_id {
                    p.with_amount(amount)
                } else {
                    p.clone()
                }
            })
            .collect();
        Cart { items }
    }

    pub fn without(&self, product_id: i64) -> Cart {
        let items = self
            .items
            .iter()
            .filter(|p| p.id != product_id)
            .cloned()
            .collect();
        Cart { items }
    }

    /// Drops non-positive amounts and repeated ids (first one wins).
    /// Returns the cleaned cart and how many items were discarded.
    pub fn normalized(self) -> (Cart, usize) {
        let before = self.items.len();
        let mut seen = HashSet::new();
        let items: Vec<Product> = self
            .items
            .into_iter()
            .filter(|p| p.amount > 0 && seen.insert(p.id))
            .collect();
        let dropped = before - items.len();
        (Cart { items }, dropped)
    }

    pub fn to_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Cart> {
        Ok(serde_json::from_str(snapshot)?)
    }
}

impl From<Vec<Product>> for Cart {
    fn from(items: Vec<Product>) -> Self {
        Cart { items }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
