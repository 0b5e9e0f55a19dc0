//! End-to-end test infrastructure for search-core.
//!
//! Provides a shared TestHarness, sample record types, and helpers for
//! build -> index -> shutdown -> reopen scenarios.

use std::path::PathBuf;
use std::sync::Arc;

use search_core::{
    CollectingErrorSink, ExtractError, IndexConfigBuilder, IndexCore, Record, RecordSchema,
};
use search_types::{DirectoryMode, TokenizationStrategy};

/// Shared test harness for E2E tests.
///
/// Owns a temporary base directory for persistent cores and a collecting
/// error sink so tests can assert on reported failures.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Base directory persistent cores are created under
    pub indexes_path: PathBuf,
    /// Sink shared by every core the harness builds
    pub sink: Arc<CollectingErrorSink>,
}

impl TestHarness {
    /// Create a new harness with an empty indexes directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let indexes_path = temp_dir.path().join("indexes");

        Self {
            _temp_dir: temp_dir,
            indexes_path,
            sink: Arc::new(CollectingErrorSink::new()),
        }
    }

    /// Builder for a persistent core named `name`, schema taken from `R`.
    pub fn persistent<R: Record>(&self, name: &str) -> IndexConfigBuilder {
        IndexConfigBuilder::new()
            .with_mode(DirectoryMode::Persistent)
            .with_name(name)
            .with_indexes_path(&self.indexes_path)
            .with_error_sink(self.sink.clone())
            .for_record::<R>()
    }

    /// Builder for an in-memory core, schema taken from `R`.
    pub fn ephemeral<R: Record>(&self) -> IndexConfigBuilder {
        IndexConfigBuilder::new()
            .with_mode(DirectoryMode::Ephemeral)
            .with_indexes_path(&self.indexes_path)
            .with_error_sink(self.sink.clone())
            .for_record::<R>()
    }

    /// Builder for a persistent core using the exact-match strategy.
    pub fn persistent_exact<R: Record>(&self, name: &str) -> IndexConfigBuilder {
        self.persistent::<R>(name)
            .with_strategy(TokenizationStrategy::Exact)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog entry with one property of every kind.
#[derive(Debug, Clone)]
pub struct Book {
    pub title: String,
    pub year: i64,
    pub isbn: Option<String>,
    pub price: f64,
}

impl Book {
    pub fn new(title: &str, year: i64) -> Self {
        Self {
            title: title.to_string(),
            year,
            isbn: Some(format!("isbn-{}", year)),
            price: 9.99,
        }
    }

    pub fn without_isbn(mut self) -> Self {
        self.isbn = None;
        self
    }
}

impl Record for Book {
    fn schema() -> RecordSchema<Self> {
        RecordSchema::new()
            .text("title", |b: &Book| Ok(b.title.clone()))
            .integer("year", |b: &Book| Ok(b.year))
            .text("isbn", |b: &Book| {
                b.isbn.clone().ok_or_else(|| ExtractError::missing("isbn"))
            })
            .unsupported("price", "f64")
    }
}

/// A record with one text property and one unsupported property.
#[derive(Debug, Clone)]
pub struct Greeting {
    pub title: String,
    pub ignored: Vec<u8>,
}

impl Greeting {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ignored: vec![1, 2, 3],
        }
    }
}

impl Record for Greeting {
    fn schema() -> RecordSchema<Self> {
        RecordSchema::new()
            .text("title", |g: &Greeting| Ok(g.title.clone()))
            .unsupported("ignored", "Vec<u8>")
    }
}

/// Index every record, returning how many were accepted.
pub fn index_all<R: Record>(core: &mut IndexCore, records: &[R]) -> anyhow::Result<usize> {
    let mapper = core.mapper::<R>();
    let mut count = 0;
    for record in records {
        core.index_record(&mapper, record)?;
        count += 1;
    }
    Ok(count)
}

/// Sample books with distinct titles and years.
pub fn sample_books() -> Vec<Book> {
    vec![
        Book::new("Dune", 1965),
        Book::new("Neuromancer", 1984),
        Book::new("Snow Crash", 1992),
        Book::new("Anathem", 2008),
    ]
}
