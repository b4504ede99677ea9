//! Core configuration types and loading.

use ark_noid::LookupSettings;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::minting::MintingConfig;
use super::storage::StorageConfig;
use crate::allocator::MintNamespaceRequest;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Namespace store.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Minting limits.
    #[serde(default)]
    pub minting: MintingConfig,
    /// Namespaces to allocate at startup, in order.
    #[serde(default, rename = "namespace")]
    pub namespaces: Vec<MintNamespaceRequest>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Lookup file settings: `storage.files_dir`, then `DB_FILES_DIR`, then
    /// the system temporary directory, capped at `minting.max_space`.
    pub fn lookup_settings(&self) -> LookupSettings {
        LookupSettings::resolve(self.storage.files_dir.as_deref()).with_max_space(self.minting.max_space)
    }
}
