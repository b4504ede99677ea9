//! Namespace store configuration.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults::default_storage_path;

/// Where allocated namespaces are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// On-disk redb database at `storage.path`.
    #[default]
    Redb,
    /// Process memory; nothing survives a restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: "redb" or "memory".
    #[serde(default)]
    pub backend: StorageBackend,
    /// Path to the redb database file.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Directory for NOID lookup files. Falls back to `DB_FILES_DIR`, then
    /// the system temporary directory.
    #[serde(default)]
    pub files_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            files_dir: None,
        }
    }
}
