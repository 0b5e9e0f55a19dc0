//! Configuration loading for search-core.
//!
//! Layered config: defaults -> config file -> env vars.
//! The host applies its own overrides after `Settings::load` returns.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default memory budget for the index writer (50MB)
pub const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Smallest budget Tantivy accepts for a writer
pub const MIN_WRITER_MEMORY_MB: usize = 15;

/// Where index data lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryMode {
    /// In-memory, gone when the process exits
    #[default]
    Ephemeral,
    /// On disk under `indexes_path/<core_name>`
    Persistent,
}

impl DirectoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryMode::Ephemeral => "ephemeral",
            DirectoryMode::Persistent => "persistent",
        }
    }
}

impl std::fmt::Display for DirectoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How text is split into searchable terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenizationStrategy {
    /// Word-boundary splitting with case folding
    #[default]
    General,
    /// Whole input is a single term
    Exact,
}

impl TokenizationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenizationStrategy::General => "general",
            TokenizationStrategy::Exact => "exact",
        }
    }
}

impl std::fmt::Display for TokenizationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main settings for building search cores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base directory holding one subdirectory per persistent core
    #[serde(default = "default_indexes_path")]
    pub indexes_path: String,

    /// Directory mode used when the host does not choose one
    #[serde(default)]
    pub mode: DirectoryMode,

    /// Tokenization strategy used when the host does not choose one
    #[serde(default)]
    pub strategy: TokenizationStrategy,

    /// Core name for persistent mode
    #[serde(default)]
    pub core_name: Option<String>,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_indexes_path() -> String {
    ProjectDirs::from("", "", "search-core")
        .map(|p| p.data_local_dir().join("indexes"))
        .unwrap_or_else(|| PathBuf::from("./indexes"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    DEFAULT_WRITER_MEMORY_MB
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indexes_path: default_indexes_path(),
            mode: DirectoryMode::default(),
            strategy: TokenizationStrategy::default(),
            core_name: None,
            writer_memory_mb: default_writer_memory_mb(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (platform config dir, `search-core/config.*`)
    /// 3. Explicit config file (optional)
    /// 4. Environment variables (SEARCHCORE_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "search-core")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("indexes_path", default_indexes_path())?
            .set_default("mode", DirectoryMode::default().as_str())?
            .set_default("strategy", TokenizationStrategy::default().as_str())?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)?
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SEARCHCORE_INDEXES_PATH, SEARCHCORE_MODE, SEARCHCORE_CORE_NAME, ...
        builder = builder.add_source(Environment::with_prefix("SEARCHCORE").try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.writer_memory_mb < MIN_WRITER_MEMORY_MB {
            return Err(ConfigError::Invalid(format!(
                "writer_memory_mb must be at least {}, got {}",
                MIN_WRITER_MEMORY_MB, self.writer_memory_mb
            )));
        }
        if self.indexes_path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "indexes_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Base directory for persistent cores, with `~/` expanded.
    pub fn expanded_indexes_path(&self) -> PathBuf {
        if let Some(rest) = self.indexes_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.indexes_path)
    }
}
