//! # search-core
//!
//! A small facade over a Tantivy index.
//!
//! Configure an index (in-memory or on disk), pick a tokenization strategy,
//! and submit typed records that are mapped into documents.
//!
//! ## Components
//! - `DirectoryResolver`: ephemeral or persistent directory, new vs existing
//! - `TokenizerSelector`: general (word split, lowercased) or exact analyzer
//! - `IndexConfigBuilder`: validates, resolves once, derives the open mode
//! - `FieldMapper`: record to document through an explicit `RecordSchema`
//! - `IndexCore`: owns writer/reader/searcher, ordered shutdown
//! - `ErrorSink`: injected failure reporting
//!
//! ## Usage
//!
//! ```no_run
//! use search_core::{IndexConfigBuilder, Record, RecordSchema};
//! use search_types::DirectoryMode;
//!
//! struct Note {
//!     title: String,
//!     year: i64,
//! }
//!
//! impl Record for Note {
//!     fn schema() -> RecordSchema<Self> {
//!         RecordSchema::new()
//!             .text("title", |n: &Note| Ok(n.title.clone()))
//!             .integer("year", |n: &Note| Ok(n.year))
//!     }
//! }
//!
//! # fn main() -> Result<(), search_core::CoreError> {
//! let mut core = IndexConfigBuilder::new()
//!     .with_mode(DirectoryMode::Persistent)
//!     .with_name("notes")
//!     .for_record::<Note>()
//!     .build()?;
//! let mapper = core.mapper::<Note>();
//! core.index_record(&mapper, &Note { title: "Hello".into(), year: 2024 })?;
//! core.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod index_core;
pub mod logging;
pub mod mapping;
pub mod schema;
pub mod sink;
pub mod tokenizer;

pub use config::{
    writer_budget_bytes, IndexConfig, IndexConfigBuilder, OpenMode, DEFAULT_WRITER_MEMORY_MB,
    MIN_WRITER_MEMORY_MB,
};
pub use directory::{validate_core_name, DirectoryResolver, ResolvedDirectory};
pub use error::{CoreError, ExtractError};
pub use index_core::{IndexCore, ShutdownReport};
pub use logging::init_logging;
pub use mapping::{
    DeclaredType, FieldDescriptor, FieldMapper, FieldSpec, FieldValue, IndexedDocument,
    MappedDocument, MappingFailure, Record, RecordSchema,
};
pub use schema::{DocumentSchema, FieldKind, SchemaField};
pub use sink::{CollectingErrorSink, ErrorSink, ReportedFailure, TracingErrorSink};
pub use tokenizer::{Analyzer, TokenizerSelector};
