//! Configuration loading and representation.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! named by `STOCKROOM_CONFIG`, then individual environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_inventory::{LOW_STOCK_THRESHOLD, STOCK_CEILING, StockPolicy};

pub const CONFIG_PATH_VAR: &str = "STOCKROOM_CONFIG";

pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_WAREHOUSE_USERNAME: &str = "warehouse";
pub const DEFAULT_WAREHOUSE_PASSWORD: &str = "warehouse_password";

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub warehouse_username: String,
    pub warehouse_password: String,
    pub low_stock_threshold: i64,
    pub stock_ceiling: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("data"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_minutes: 60,
            warehouse_username: DEFAULT_WAREHOUSE_USERNAME.to_string(),
            warehouse_password: DEFAULT_WAREHOUSE_PASSWORD.to_string(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            stock_ceiling: STOCK_CEILING,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load using `env` as the variable lookup.
    pub fn load_from(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match env(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = env("STOCKROOM_BIND") {
            self.bind_addr = v;
        }
        if let Some(v) = env("STOCKROOM_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env("JWT_SECRET") {
            self.jwt_secret = v;
        }
        if let Some(v) = env("STOCKROOM_TOKEN_TTL_MINUTES") {
            self.token_ttl_minutes = parse_int("STOCKROOM_TOKEN_TTL_MINUTES", v)?;
        }
        if let Some(v) = env("STOCKROOM_WAREHOUSE_USER") {
            self.warehouse_username = v;
        }
        if let Some(v) = env("STOCKROOM_WAREHOUSE_PASSWORD") {
            self.warehouse_password = v;
        }
        if let Some(v) = env("STOCKROOM_LOW_STOCK_THRESHOLD") {
            self.low_stock_threshold = parse_int("STOCKROOM_LOW_STOCK_THRESHOLD", v)?;
        }
        if let Some(v) = env("STOCKROOM_STOCK_CEILING") {
            self.stock_ceiling = parse_int("STOCKROOM_STOCK_CEILING", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.token_ttl_minutes) {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            )));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("jwt_secret must not be empty".into()));
        }
        if self.warehouse_username.trim().is_empty() {
            return Err(ConfigError::Invalid("warehouse_username must not be empty".into()));
        }
        self.policy()?;
        Ok(())
    }

    pub fn policy(&self) -> Result<StockPolicy, ConfigError> {
        StockPolicy::new(self.low_stock_threshold, self.stock_ceiling)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Log a warning for every security-relevant setting left at its default.
    pub fn warn_insecure_defaults(&self) {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
        }
        if self.warehouse_password == DEFAULT_WAREHOUSE_PASSWORD {
            tracing::warn!("STOCKROOM_WAREHOUSE_PASSWORD not set; using insecure dev default");
        }
    }
}

fn parse_int(key: &'static str, value: String) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
