//! Logging setup for hosts embedding the search core.

use tracing_subscriber::EnvFilter;

use crate::error::CoreError;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), CoreError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))
}
