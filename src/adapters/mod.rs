// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod notifier;
pub mod storage;

pub use http::HttpInventory;
pub use notifier::{ConsoleNotifier, RecordingNotifier};
pub use storage::{FileStore, MemoryStore};
