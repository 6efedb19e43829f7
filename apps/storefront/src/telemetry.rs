//! # Telemetry
//!
//! Installs the global `tracing` subscriber.
//!
//! ## Log Levels
//! - `STOREFRONT_LOG=debug` - Show debug messages
//! - `STOREFRONT_LOG=storefront_db=trace,info` - Trace the db crate only
//! - Default: INFO level (falls back to `RUST_LOG` when unset)

use tracing_subscriber::EnvFilter;

/// Fallback directive when the configured one doesn't parse.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
