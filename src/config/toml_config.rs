use crate::core::cart_store::DEFAULT_CART_KEY;
use crate::core::session::NoticeMessages;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub messages: NoticeMessages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    #[serde(default = "default_cart_key")]
    pub key: String,
}

fn default_cart_key() -> String {
    DEFAULT_CART_KEY.to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3333".to_string(),
                timeout_seconds: None,
            },
            storage: StorageConfig {
                path: "./.cart-store/storage.json".to_string(),
                key: default_cart_key(),
            },
            messages: NoticeMessages::default(),
        }
    }
}

impl CartConfig {
    /// Loads the config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CartError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a TOML document after environment substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CartError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` from the environment; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CartError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_path("storage.path", &self.storage.path)?;
        validation::validate_non_empty_string("storage.key", &self.storage.key)?;

        if self.api.timeout_seconds == Some(0) {
            return Err(CartError::InvalidConfigValueError {
                field: "api.timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least 1 second; omit it to wait indefinitely"
                    .to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for CartConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
