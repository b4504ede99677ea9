//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct and loading (Config, ConfigError)
//! - [`storage`]: Namespace store configuration (StorageConfig, StorageBackend)
//! - [`minting`]: Minting and allocation limits (MintingConfig)
//! - [`validation`]: Startup validation of the loaded configuration

mod defaults;
mod minting;
mod storage;
mod types;
mod validation;

pub use defaults::default_true;
pub use minting::MintingConfig;
pub use storage::{StorageBackend, StorageConfig};
pub use types::{Config, ConfigError};
pub use validation::{validate, ValidationError};
