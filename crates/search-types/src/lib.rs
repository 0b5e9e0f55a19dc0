//! # search-types
//!
//! Shared types for the search-core facade.
//!
//! - Settings: layered configuration (defaults, config file, env vars)
//! - Enumerated options: directory mode and tokenization strategy
//! - Configuration error type
//!
//! ## Usage
//!
//! ```rust
//! use search_types::{DirectoryMode, Settings, TokenizationStrategy};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.mode, DirectoryMode::Ephemeral);
//! assert_eq!(settings.strategy, TokenizationStrategy::General);
//! ```

pub mod config;
pub mod error;

pub use config::{
    DirectoryMode, Settings, TokenizationStrategy, DEFAULT_WRITER_MEMORY_MB, MIN_WRITER_MEMORY_MB,
};
pub use error::ConfigError;
