//! Namespace allocation worker.
//!
//! A single [`Allocator`] task owns every write to the namespace store.
//! Requests arrive over a bounded channel and are handled one at a time, so
//! at most one allocation runs at once and no per-namespace locking is
//! needed. A full queue shows up as callers waiting on `send`.
//!
//! # Lifecycle of a namespace
//!
//! - **absent**: no registry entry.
//! - **allocating**: the worker is draining a minter into a write
//!   transaction on the blocking pool.
//! - **allocated**: the transaction committed. A second request for the same
//!   namespace fails with [`AllocationError::NamespaceExists`].
//!
//! Storage faults, minter failures and timeouts abort the transaction and
//! leave the namespace absent.

mod types;

pub use types::{AllocatorEvent, MintNamespaceRequest};

use std::sync::Arc;
use std::time::{Duration, Instant};

use ark_noid::ark::{validate_naan, Ark};
use ark_noid::{LookupSettings, Minter};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn, Instrument, Span};

use crate::config::MintingConfig;
use crate::error::{AllocationError, StoreError};
use crate::store::{NamespaceRecord, NamespaceStore};
use crate::telemetry::spans;

/// Identifiers minted between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// The allocation worker.
pub struct Allocator {
    store: Arc<dyn NamespaceStore>,
    timeout: Duration,
}

impl Allocator {
    /// Spawn the worker and return a handle to it.
    pub fn spawn(store: Arc<dyn NamespaceStore>, config: &MintingConfig) -> AllocatorHandle {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));

        let actor = Self {
            store: Arc::clone(&store),
            timeout: config.allocation_timeout(),
        };

        tokio::spawn(async move {
            actor.run(rx).await;
        });

        AllocatorHandle { tx, store }
    }

    /// The main worker loop.
    async fn run(self, mut rx: mpsc::Receiver<AllocatorEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }
        info!("Allocator stopped");
    }

    async fn handle_event(&self, event: AllocatorEvent) {
        match event {
            AllocatorEvent::MintNamespace {
                minter,
                naan,
                reply_tx,
            } => {
                let span = spans::allocation(minter.namespace(), minter.is_randomized());
                let result = self.allocate(*minter, naan).instrument(span).await;
                let _ = reply_tx.send(result);
            }
        }
    }

    async fn allocate(
        &self,
        minter: Minter,
        naan: Option<String>,
    ) -> Result<NamespaceRecord, AllocationError> {
        let namespace = minter.namespace().to_string();

        if self.store.exists(&namespace)? {
            info!("Namespace already allocated");
            return Err(AllocationError::NamespaceExists(namespace));
        }

        let store = Arc::clone(&self.store);
        let timeout = self.timeout;
        let span = Span::current();
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let _guard = span.enter();
            let record = new_record(&minter, naan.clone());
            let mut ids = Drain {
                minter,
                naan,
                deadline: started + timeout,
                timeout,
                polled: 0,
                finished: false,
            };
            store.create(record, &mut ids)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Allocation task failed to complete");
            AllocationError::Unavailable
        })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(record) => {
                info!(count = record.count, elapsed_ms, "Namespace allocated");
            }
            Err(AllocationError::NamespaceExists(_)) => {
                warn!("Namespace allocated concurrently");
            }
            Err(e) => {
                error!(
                    error = %e,
                    code = e.error_code(),
                    elapsed_ms,
                    "Namespace allocation failed"
                );
            }
        }
        result
    }
}

fn new_record(minter: &Minter, naan: Option<String>) -> NamespaceRecord {
    let config = minter.config();
    NamespaceRecord {
        namespace: config.namespace().to_string(),
        alphabet: config.alphabet(),
        length: config.length(),
        shoulder: config.shoulder().map(str::to_string),
        checksums: config.checksums(),
        randomized: minter.is_randomized(),
        naan,
        count: 0,
        created_at: chrono::Utc::now().timestamp(),
    }
}

/// Drains a minter into finished keys, giving up at the deadline.
///
/// Yields at most one error, after which it is fused.
struct Drain {
    minter: Minter,
    naan: Option<String>,
    deadline: Instant,
    timeout: Duration,
    polled: u64,
    finished: bool,
}

impl Drain {
    fn key(&self, noid: String) -> Result<String, AllocationError> {
        match &self.naan {
            Some(naan) => Ark::new(naan.as_str(), noid)
                .map(|ark| ark.to_string())
                .map_err(|e| AllocationError::InvalidRequest(e.to_string())),
            None => Ok(noid),
        }
    }
}

impl Iterator for Drain {
    type Item = Result<String, AllocationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || !self.minter.has_next() {
            return None;
        }

        if self.polled % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.finished = true;
            return Some(Err(AllocationError::Timeout {
                namespace: self.minter.namespace().to_string(),
                after: self.timeout,
            }));
        }
        self.polled += 1;

        let item = self
            .minter
            .next_noid()
            .map_err(AllocationError::from)
            .and_then(|noid| self.key(noid));
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }
}

/// Cloneable handle for submitting allocations and reading the store.
#[derive(Clone)]
pub struct AllocatorHandle {
    tx: mpsc::Sender<AllocatorEvent>,
    store: Arc<dyn NamespaceStore>,
}

impl AllocatorHandle {
    /// Drain `minter` into a new namespace named after its configuration.
    ///
    /// With a `naan`, identifiers are stored in ARK form.
    pub async fn mint_namespace(
        &self,
        minter: Minter,
        naan: Option<String>,
    ) -> Result<NamespaceRecord, AllocationError> {
        if let Some(naan) = &naan {
            validate_naan(naan).map_err(|e| AllocationError::InvalidRequest(e.to_string()))?;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(AllocatorEvent::MintNamespace {
                minter: Box::new(minter),
                naan,
                reply_tx,
            })
            .await
            .map_err(|_| AllocationError::Unavailable)?;

        reply_rx.await.map_err(|_| AllocationError::Unavailable)?
    }

    /// Build the requested minter (and lookup file) on the blocking pool,
    /// then allocate it.
    pub async fn provision(
        &self,
        request: MintNamespaceRequest,
        settings: LookupSettings,
    ) -> Result<NamespaceRecord, AllocationError> {
        request.validate()?;
        if self.exists(&request.namespace)? {
            return Err(AllocationError::NamespaceExists(request.namespace));
        }

        let naan = request.naan.clone();
        let minter = tokio::task::spawn_blocking(move || request.build_minter(&settings))
            .await
            .map_err(|e| {
                error!(error = %e, "Minter construction task failed to complete");
                AllocationError::Unavailable
            })??;

        self.mint_namespace(minter, naan).await
    }

    /// Whether the namespace has been allocated.
    pub fn exists(&self, namespace: &str) -> Result<bool, StoreError> {
        self.store.exists(namespace)
    }

    /// Registry record of an allocated namespace.
    pub fn record(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError> {
        self.store.record(namespace)
    }

    /// Whether `id` was allocated in `namespace`.
    #[cfg(test)]
    pub fn contains(&self, namespace: &str, id: &str) -> Result<bool, StoreError> {
        self.store.contains(namespace, id)
    }

    /// Number of identifiers allocated in `namespace`.
    pub fn count(&self, namespace: &str) -> Result<Option<u64>, StoreError> {
        self.store.count(namespace)
    }

    /// Every allocated namespace.
    pub fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        self.store.namespaces()
    }
}
