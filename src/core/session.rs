use crate::core::cart_store::CartStore;
use crate::core::{Cart, Inventory, KeyValueStore, Notifier};
use crate::utils::error::{CartError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    Update,
}

/// The user-visible failure messages a session can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    StockExhausted,
    AddFailed,
    RemoveFailed,
    UpdateFailed,
}

impl Notice {
    pub fn for_error(operation: Operation, error: &CartError) -> Notice {
        match operation {
            Operation::Add if error.is_stock_exhausted() => Notice::StockExhausted,
            Operation::Update if error.is_stock_exhausted() => Notice::StockExhausted,
            Operation::Add => Notice::AddFailed,
            Operation::Remove => Notice::RemoveFailed,
            Operation::Update => Notice::UpdateFailed,
        }
    }
}

/// Wording for each [`Notice`]. Loaded from the `[messages]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeMessages {
    pub stock_exhausted: String,
    pub add_failed: String,
    pub remove_failed: String,
    pub update_failed: String,
}

impl Default for NoticeMessages {
    fn default() -> Self {
        Self {
            stock_exhausted: "Requested quantity is out of stock".to_string(),
            add_failed: "Could not add the product".to_string(),
            remove_failed: "Could not remove the product".to_string(),
            update_failed: "Could not change the product amount".to_string(),
        }
    }
}

impl NoticeMessages {
    pub fn text(&self, notice: Notice) -> &str {
        match notice {
            Notice::StockExhausted => &self.stock_exhausted,
            Notice::AddFailed => &self.add_failed,
            Notice::RemoveFailed => &self.remove_failed,
            Notice::UpdateFailed => &self.update_failed,
        }
    }
}

/// Fire-and-forget facade over a [`CartStore`] for UI code.
///
/// Operations never return errors. A failure is logged, turned into a
/// [`Notice`], and handed to the notifier; the cart is left as it was.
pub struct CartSession<S: KeyValueStore, I: Inventory, N: Notifier> {
    store: CartStore<S, I>,
    notifier: N,
    messages: NoticeMessages,
    last_notice: Option<Notice>,
}

impl<S: KeyValueStore, I: Inventory, N: Notifier> CartSession<S, I, N> {
    pub fn new(store: CartStore<S, I>, notifier: N) -> Self {
        Self {
            store,
            notifier,
            messages: NoticeMessages::default(),
            last_notice: None,
        }
    }

    pub fn with_messages(mut self, messages: NoticeMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn cart(&self) -> &Cart {
        self.store.cart()
    }

    pub fn store(&self) -> &CartStore<S, I> {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Notice raised by the most recent operation, if it failed.
    pub fn last_notice(&self) -> Option<Notice> {
        self.last_notice
    }

    pub async fn add_product(&mut self, product_id: i64) {
        let result = self.store.add_product(product_id).await;
        self.report(Operation::Add, result);
    }

    pub async fn remove_product(&mut self, product_id: i64) {
        let result = self.store.remove_product(product_id).await;
        self.report(Operation::Remove, result);
    }

    pub async fn update_product_amount(&mut self, product_id: i64, amount: i64) {
        let result = self.store.update_product_amount(product_id, amount).await;
        self.report(Operation::Update, result);
    }

    fn report(&mut self, operation: Operation, result: Result<()>) {
        self.last_notice = match result {
            Ok(()) => None,
            Err(e) => {
                let notice = Notice::for_error(operation, &e);
                tracing::warn!(
                    "Cart {:?} failed ({:?}): {}",
                    operation,
                    e.kind(),
                    e
                );
                self.notifier.error(self.messages.text(notice));
                Some(notice)
            }
        };
    }
}
