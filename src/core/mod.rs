pub mod cart_store;
pub mod session;

pub use crate::domain::model::{Cart, CatalogProduct, Product, Stock};
pub use crate::domain::ports::{Inventory, KeyValueStore, Notifier};
pub use crate::utils::error::Result;
