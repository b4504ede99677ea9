//! Unified error handling for arkd.
//!
//! Storage faults and allocation outcomes, with static error codes for log
//! labeling and a retryable/non-retryable classification for callers.

use std::time::Duration;

use ark_noid::NoidError;
use thiserror::Error;

// ============================================================================
// Storage Errors
// ============================================================================

/// Errors from the durable namespace store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// Allocation Errors
// ============================================================================

/// Errors surfaced to whoever asked for a namespace to be allocated.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("namespace already exists: {0}")]
    NamespaceExists(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Noid(#[from] NoidError),

    #[error("storage fault: {0}")]
    Store(#[from] StoreError),

    #[error("allocation of {namespace} exceeded {}s", .after.as_secs())]
    Timeout { namespace: String, after: Duration },

    #[error("allocator is not running")]
    Unavailable,
}

impl AllocationError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NamespaceExists(_) => "namespace_exists",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Noid(NoidError::Exhausted) => "exhausted",
            Self::Noid(NoidError::LookupIo { .. }) => "lookup_io",
            Self::Noid(NoidError::UnknownCharacter { .. }) => "unknown_character",
            Self::Noid(e) if e.is_configuration() => "invalid_minter",
            Self::Noid(_) => "noid_error",
            Self::Store(_) => "storage_fault",
            Self::Timeout { .. } => "timeout",
            Self::Unavailable => "unavailable",
        }
    }

    /// Whether the same request may succeed if simply sent again.
    ///
    /// Conflicts and bad requests need a different request; storage faults,
    /// lookup failures and timeouts need an operator.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
