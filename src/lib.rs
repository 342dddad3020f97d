pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::CartConfig;

pub use adapters::{ConsoleNotifier, FileStore, HttpInventory, MemoryStore, RecordingNotifier};
pub use core::cart_store::{CartStore, DEFAULT_CART_KEY};
pub use core::session::{CartSession, Notice, NoticeMessages, Operation};
pub use domain::model::{Cart, CatalogProduct, Product, Stock};
pub use domain::ports::{Inventory, KeyValueStore, Notifier};
pub use utils::error::{CartError, ErrorKind, Result};
