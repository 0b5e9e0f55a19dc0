//! Search core error types.

use tantivy::directory::error::OpenDirectoryError;
use thiserror::Error;

/// Errors that can occur while building or operating an index core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid or incomplete configuration, raised before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] search_types::ConfigError),

    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Storage directory could not be opened
    #[error("Cannot open directory: {0}")]
    OpenDirectory(#[from] OpenDirectoryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document or existing index does not match the configured schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Engine handles were already released.
    ///
    /// Internal guard only: `IndexCore::shutdown` consumes the core, so
    /// callers holding a core never observe this.
    #[error("Index core is closed")]
    Closed,

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Failure to extract a single field value from a record.
///
/// Never aborts mapping of the remaining fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The record holds no value for this field
    #[error("no value for field '{0}'")]
    Missing(String),

    /// The value exists but cannot be represented
    #[error("invalid value for field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ExtractError {
    pub fn missing(field: impl Into<String>) -> Self {
        ExtractError::Missing(field.into())
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
