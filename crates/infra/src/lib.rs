//! Infrastructure layer: configuration and file-backed storage.

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::StoreError;
