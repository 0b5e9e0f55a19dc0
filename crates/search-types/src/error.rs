//! Error types for configuration loading.

use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layered config could not be built or deserialized
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was loaded but is not acceptable
    #[error("Invalid setting: {0}")]
    Invalid(String),
}
