//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Storage Defaults
// =============================================================================

pub fn default_storage_path() -> String {
    "arkd.redb".to_string()
}

// =============================================================================
// Minting Defaults
// =============================================================================

pub fn default_max_space() -> u64 {
    ark_noid::naf::DEFAULT_MAX_SPACE
}

/// Ten minutes.
pub fn default_allocation_timeout_secs() -> u64 {
    600
}

pub fn default_queue_depth() -> usize {
    32
}
