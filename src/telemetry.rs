//! Tracing setup and span constructors.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

/// Standardized span constructors for allocation observability.
pub mod spans {
    use tracing::{info_span, Span};

    /// Create a span for one namespace allocation on the worker.
    pub fn allocation(namespace: &str, randomized: bool) -> Span {
        info_span!("allocation", namespace = %namespace, randomized)
    }

    /// Create a span for provisioning a configured namespace block.
    pub fn provision(namespace: &str, alphabet: &str, length: usize) -> Span {
        info_span!("provision", namespace = %namespace, alphabet = %alphabet, length)
    }
}
