//! Minting and allocation limits.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_allocation_timeout_secs, default_max_space, default_queue_depth};

/// Minting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MintingConfig {
    /// Largest identifier space a randomized minter may index (default: 2^62).
    #[serde(default = "default_max_space")]
    pub max_space: u64,
    /// Seconds a single namespace allocation may run before it is aborted
    /// (default: 600).
    #[serde(default = "default_allocation_timeout_secs")]
    pub allocation_timeout_secs: u64,
    /// Requests that may wait for the allocation worker (default: 32).
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl MintingConfig {
    /// Per-allocation time limit.
    pub fn allocation_timeout(&self) -> Duration {
        Duration::from_secs(self.allocation_timeout_secs)
    }
}

impl Default for MintingConfig {
    fn default() -> Self {
        Self {
            max_space: default_max_space(),
            allocation_timeout_secs: default_allocation_timeout_secs(),
            queue_depth: default_queue_depth(),
        }
    }
}
