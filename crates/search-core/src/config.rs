//! Index configuration.
//!
//! [`IndexConfigBuilder`] accumulates choices fluently; `build` consumes it,
//! validates before any I/O, resolves the directory once, and derives the
//! open mode from what the resolver found. [`IndexConfig`] is the immutable
//! result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tantivy::directory::Directory;
use tracing::debug;

use search_types::{DirectoryMode, Settings, TokenizationStrategy};
pub use search_types::{DEFAULT_WRITER_MEMORY_MB, MIN_WRITER_MEMORY_MB};

use crate::directory::{validate_core_name, DirectoryResolver, ResolvedDirectory};
use crate::error::CoreError;
use crate::index_core::IndexCore;
use crate::mapping::Record;
use crate::schema::DocumentSchema;
use crate::sink::{ErrorSink, TracingErrorSink};
use crate::tokenizer::{Analyzer, TokenizerSelector};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Writer budget in bytes for a budget given in MB.
///
/// Rejects budgets below [`MIN_WRITER_MEMORY_MB`] and budgets that do not
/// fit in `usize` bytes.
pub fn writer_budget_bytes(writer_memory_mb: usize) -> Result<usize, CoreError> {
    if writer_memory_mb < MIN_WRITER_MEMORY_MB {
        return Err(CoreError::Config(format!(
            "writer memory must be at least {} MB, got {}",
            MIN_WRITER_MEMORY_MB, writer_memory_mb
        )));
    }
    writer_memory_mb.checked_mul(BYTES_PER_MB).ok_or_else(|| {
        CoreError::Config(format!(
            "writer memory of {} MB overflows the byte budget",
            writer_memory_mb
        ))
    })
}

/// How the index is opened. Derived, never chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Directory held no data: create a new index
    CreateFresh,
    /// Directory held data: open it, creating only if it is not an index
    CreateOrAppend,
}

impl OpenMode {
    pub fn from_existing_data(already_has_data: bool) -> Self {
        if already_has_data {
            OpenMode::CreateOrAppend
        } else {
            OpenMode::CreateFresh
        }
    }
}

/// Validated, immutable configuration for one index core.
#[derive(Debug)]
pub struct IndexConfig {
    directory: ResolvedDirectory,
    analyzer: Analyzer,
    schema: DocumentSchema,
    open_mode: OpenMode,
    writer_memory_mb: usize,
    writer_memory_bytes: usize,
}

impl IndexConfig {
    /// Single validating constructor over already-resolved inputs.
    pub fn new(
        directory: ResolvedDirectory,
        analyzer: Analyzer,
        schema: DocumentSchema,
        writer_memory_mb: usize,
    ) -> Result<Self, CoreError> {
        schema.validate()?;
        let writer_memory_bytes = writer_budget_bytes(writer_memory_mb)?;

        let open_mode = OpenMode::from_existing_data(directory.already_has_data());
        Ok(Self {
            directory,
            analyzer,
            schema,
            open_mode,
            writer_memory_mb,
            writer_memory_bytes,
        })
    }

    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn location(&self) -> Option<&Path> {
        self.directory.location()
    }

    pub fn writer_memory_mb(&self) -> usize {
        self.writer_memory_mb
    }

    pub fn writer_memory_bytes(&self) -> usize {
        self.writer_memory_bytes
    }

    pub(crate) fn into_parts(self) -> (ResolvedDirectory, Analyzer, DocumentSchema, OpenMode, usize) {
        (
            self.directory,
            self.analyzer,
            self.schema,
            self.open_mode,
            self.writer_memory_bytes,
        )
    }
}

/// Fluent builder for index cores.
pub struct IndexConfigBuilder {
    mode: DirectoryMode,
    strategy: TokenizationStrategy,
    name: Option<String>,
    directory: Option<Box<dyn Directory>>,
    analyzer: Option<Analyzer>,
    schema: Option<DocumentSchema>,
    indexes_path: PathBuf,
    writer_memory_mb: usize,
    sink: Arc<dyn ErrorSink>,
}

impl Default for IndexConfigBuilder {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl IndexConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: settings.mode,
            strategy: settings.strategy,
            name: settings.core_name.clone(),
            directory: None,
            analyzer: None,
            schema: None,
            indexes_path: settings.expanded_indexes_path(),
            writer_memory_mb: settings.writer_memory_mb,
            sink: TracingErrorSink::shared(),
        }
    }

    pub fn with_mode(mut self, mode: DirectoryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy(mut self, strategy: TokenizationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Core name, required for persistent mode.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use this directory instead of resolving one from mode and name.
    ///
    /// It is probed for existing index data when the builder is consumed.
    pub fn with_directory<D: Into<Box<dyn Directory>>>(mut self, directory: D) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Use this analyzer instead of selecting one from the strategy.
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use the supported fields of `R` as the document schema.
    pub fn for_record<R: Record>(self) -> Self {
        self.with_schema(R::schema().document_schema())
    }

    pub fn with_indexes_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.indexes_path = path.into();
        self
    }

    pub fn with_writer_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate and resolve without opening the core.
    pub fn build_config(self) -> Result<IndexConfig, CoreError> {
        self.into_config().map(|(config, _)| config)
    }

    /// Resolve everything and open the core.
    pub fn build(self) -> Result<IndexCore, CoreError> {
        let (config, sink) = self.into_config()?;
        IndexCore::open(config, sink)
    }

    fn into_config(self) -> Result<(IndexConfig, Arc<dyn ErrorSink>), CoreError> {
        // Fail fast, before touching the filesystem
        let schema = self
            .schema
            .ok_or_else(|| CoreError::Config("a document schema is required".to_string()))?;
        schema.validate()?;
        writer_budget_bytes(self.writer_memory_mb)?;
        if self.directory.is_none() && self.mode == DirectoryMode::Persistent {
            validate_core_name(self.name.as_deref())?;
        }

        let directory = match self.directory {
            Some(directory) => ResolvedDirectory::from_directory(directory).map_err(|e| {
                self.sink.notify("probe directory", &e);
                e
            })?,
            None => DirectoryResolver::new(self.indexes_path, self.sink.clone())
                .resolve(self.mode, self.name.as_deref())?,
        };

        let analyzer = self
            .analyzer
            .unwrap_or_else(|| TokenizerSelector::select(self.strategy));

        let config = IndexConfig::new(directory, analyzer, schema, self.writer_memory_mb)?;
        debug!(
            open_mode = ?config.open_mode(),
            analyzer = config.analyzer().name(),
            location = ?config.location(),
            "Built index config"
        );
        Ok((config, self.sink))
    }
}
