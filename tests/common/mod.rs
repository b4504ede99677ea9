//! Integration test common infrastructure.
//!
//! Runs the arkd binary against a provisioning file in a temporary
//! directory and reads back the resulting namespace store.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tempfile::TempDir;

const NAMESPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("namespaces");

/// A scratch directory holding one daemon's config, store and lookup files.
pub struct TestDaemon {
    dir: TempDir,
}

impl TestDaemon {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("arkd.redb")
    }

    /// Write a config with `[storage]` pointing into the scratch directory,
    /// followed by `body`, and run the daemon on it to completion.
    pub fn run(&self, body: &str) -> anyhow::Result<Output> {
        let config = format!(
            r#"
[storage]
backend = "redb"
path = "{}"
files_dir = "{}"

{}
"#,
            self.store_path().display(),
            self.dir.path().display(),
            body
        );
        self.run_raw(&config)
    }

    /// Run the daemon on a config written verbatim.
    pub fn run_raw(&self, config: &str) -> anyhow::Result<Output> {
        let config_path = self.dir.path().join("arkd.toml");
        std::fs::write(&config_path, config)?;

        let output = Command::new(env!("CARGO_BIN_EXE_arkd"))
            .arg(&config_path)
            .env("RUST_LOG", "info")
            .output()?;
        Ok(output)
    }

    pub fn store(&self) -> anyhow::Result<StoreReader> {
        StoreReader::open(&self.store_path())
    }
}

/// Read-only view of a store the daemon left behind.
pub struct StoreReader {
    db: Database,
}

impl StoreReader {
    fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    /// Allocated namespace names, in order.
    pub fn namespaces(&self) -> anyhow::Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(NAMESPACES)?;
        let mut names = Vec::new();
        for item in registry.iter()? {
            let (key, _) = item?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// Raw registry record for `namespace`.
    pub fn record(&self, namespace: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(NAMESPACES)?;
        match registry.get(namespace)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Every identifier stored for `namespace`, in key order.
    pub fn ids(&self, namespace: &str) -> anyhow::Result<Vec<String>> {
        let name = format!("ns:{namespace}");
        let definition: TableDefinition<&str, ()> = TableDefinition::new(&name);

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }
}
