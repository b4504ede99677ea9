//! arkd - NOID namespace allocation daemon
//!
//! Loads a provisioning file, opens the namespace store and allocates every
//! configured namespace through the single allocation worker.

mod allocator;
mod config;
mod error;
mod store;
mod telemetry;

use crate::allocator::Allocator;
use crate::config::{Config, StorageBackend};
use crate::error::AllocationError;
use crate::store::{MemoryStore, NamespaceStore, RedbStore};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "arkd.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        path = %config_path,
        namespaces = config.namespaces.len(),
        "Starting arkd"
    );

    // Open the namespace store
    let store: Arc<dyn NamespaceStore> = match config.storage.backend {
        StorageBackend::Redb => {
            info!(path = %config.storage.path, "Opening redb namespace store");
            Arc::new(RedbStore::open(&config.storage.path)?)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory namespace store; allocations will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    let settings = config.lookup_settings();
    info!(
        dir = %settings.dir.display(),
        max_space = settings.max_space,
        "Lookup file settings resolved"
    );

    let allocator = Allocator::spawn(store, &config.minting);

    let mut allocated = 0usize;
    let mut existing = 0usize;
    let mut failed = 0usize;

    for request in config.namespaces {
        let span = telemetry::spans::provision(&request.namespace, &request.alphabet, request.length);
        let namespace = request.namespace.clone();

        match allocator
            .provision(request, settings.clone())
            .instrument(span)
            .await
        {
            Ok(record) => {
                allocated += 1;
                info!(namespace = %namespace, count = record.count, "Provisioned namespace");
            }
            Err(AllocationError::NamespaceExists(_)) => {
                existing += 1;
                info!(namespace = %namespace, "Namespace already provisioned, skipping");
            }
            Err(e) => {
                failed += 1;
                error!(
                    namespace = %namespace,
                    error = %e,
                    code = e.error_code(),
                    retryable = e.is_retryable(),
                    "Failed to provision namespace"
                );
            }
        }
    }

    for name in allocator.namespaces()? {
        let count = allocator.count(&name)?.unwrap_or(0);
        if let Some(record) = allocator.record(&name)? {
            info!(
                namespace = %record.namespace,
                alphabet = %record.alphabet,
                length = record.length,
                count,
                naan = record.naan.as_deref().unwrap_or("-"),
                "Stored namespace"
            );
        }
    }

    info!(allocated, existing, failed, "Provisioning finished");

    if failed > 0 {
        anyhow::bail!("{failed} namespace(s) failed to provision");
    }
    Ok(())
}
