use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Requested amount {requested} of product {product_id} exceeds stock ({available})")]
    StockExhausted {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    #[error("Product {product_id} is not in the cart")]
    NotFound { product_id: i64 },

    #[error("Invalid amount {amount} for product {product_id}")]
    InvalidAmount { product_id: i64, amount: i64 },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// Coarse classification of a [`CartError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested quantity exceeds available stock.
    StockExhausted,
    /// Operation target is not in the cart.
    NotFound,
    /// Non-positive quantity requested.
    InvalidAmount,
    /// The inventory service or the persistent store failed.
    Transport,
    /// Startup configuration is unusable.
    Config,
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::StockExhausted { .. } => ErrorKind::StockExhausted,
            CartError::NotFound { .. } => ErrorKind::NotFound,
            CartError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            CartError::ApiError(_)
            | CartError::IoError(_)
            | CartError::SerializationError(_)
            | CartError::StorageError { .. } => ErrorKind::Transport,
            CartError::ConfigError { .. } | CartError::InvalidConfigValueError { .. } => {
                ErrorKind::Config
            }
        }
    }

    pub fn is_stock_exhausted(&self) -> bool {
        self.kind() == ErrorKind::StockExhausted
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
