use crate::config::toml_config::CartConfig;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cart-store")]
#[command(about = "Manage a storefront cart backed by local storage and a stock API")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Base URL of the products/stock API")]
    pub api_base_url: Option<String>,

    #[arg(long, global = true, help = "JSON file used as local storage")]
    pub storage_path: Option<String>,

    #[arg(long, global = true, help = "Storage key of the cart snapshot")]
    pub cart_key: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the current cart
    Show,
    /// Add one unit of a product
    Add { product_id: i64 },
    /// Remove a product line
    Remove { product_id: i64 },
    /// Set the amount of a product already in the cart
    Update {
        product_id: i64,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

impl CliConfig {
    /// Merges the config file (or defaults) with command-line overrides.
    pub fn resolve(&self) -> Result<CartConfig> {
        let mut config = match &self.config {
            Some(path) => CartConfig::from_file(path)?,
            None => CartConfig::default(),
        };

        if let Some(url) = &self.api_base_url {
            config.api.base_url = url.clone();
        }
        if let Some(path) = &self.storage_path {
            config.storage.path = path.clone();
        }
        if let Some(key) = &self.cart_key {
            config.storage.key = key.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url {
            validation::validate_url("--api-base-url", url)?;
        }
        if let Some(path) = &self.storage_path {
            validation::validate_path("--storage-path", path)?;
        }
        if let Some(key) = &self.cart_key {
            validation::validate_non_empty_string("--cart-key", key)?;
        }
        Ok(())
    }
}
