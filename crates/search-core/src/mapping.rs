//! Record to document mapping.
//!
//! A record type declares its fields once, through a [`RecordSchema`]: name,
//! declared type, and an extractor. [`FieldMapper`] resolves that schema a
//! single time and applies it to every record.
//!
//! Mapping is best-effort:
//! - Unsupported declared types are dropped without calling the extractor
//! - An extractor failure skips that field only; it is reported and recorded

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::ExtractError;
use crate::schema::{DocumentSchema, FieldKind};
use crate::sink::ErrorSink;

/// Type a record declares for one of its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Text,
    Integer,
    /// Anything else; carries the type's name for diagnostics
    Unsupported(&'static str),
}

impl DeclaredType {
    /// Index representation, `None` when the type is dropped.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            DeclaredType::Text => Some(FieldKind::Text),
            DeclaredType::Integer => Some(FieldKind::Integer),
            DeclaredType::Unsupported(_) => None,
        }
    }
}

/// Extracted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(_) => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Integer(_) => FieldKind::Integer,
        }
    }
}

/// A named value extracted from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub value: FieldValue,
}

impl FieldDescriptor {
    pub fn declared_type(&self) -> DeclaredType {
        match self.value {
            FieldValue::Text(_) => DeclaredType::Text,
            FieldValue::Integer(_) => DeclaredType::Integer,
        }
    }
}

/// Ordered field descriptors submitted to the index as one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedDocument {
    fields: Vec<FieldDescriptor>,
}

impl IndexedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, FieldValue::Text(value.into()));
        self
    }

    pub fn with_integer(mut self, name: impl Into<String>, value: i64) -> Self {
        self.push(name, FieldValue::Integer(value));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            value,
        });
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

type Extractor<R> = Box<dyn Fn(&R) -> Result<FieldValue, ExtractError> + Send + Sync>;

/// One declared property of a record type.
pub struct FieldSpec<R> {
    name: String,
    declared: DeclaredType,
    extractor: Option<Extractor<R>>,
}

impl<R> FieldSpec<R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> DeclaredType {
        self.declared
    }
}

impl<R> fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish()
    }
}

/// Declared properties of a record type, in declaration order.
pub struct RecordSchema<R> {
    fields: Vec<FieldSpec<R>>,
}

impl<R> Default for RecordSchema<R> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

impl<R> RecordSchema<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a text property.
    pub fn text<F>(mut self, name: impl Into<String>, extract: F) -> Self
    where
        R: 'static,
        F: Fn(&R) -> Result<String, ExtractError> + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec {
            name: name.into(),
            declared: DeclaredType::Text,
            extractor: Some(Box::new(move |r: &R| extract(r).map(FieldValue::Text))),
        });
        self
    }

    /// Declare an integer property.
    pub fn integer<F>(mut self, name: impl Into<String>, extract: F) -> Self
    where
        R: 'static,
        F: Fn(&R) -> Result<i64, ExtractError> + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec {
            name: name.into(),
            declared: DeclaredType::Integer,
            extractor: Some(Box::new(move |r: &R| extract(r).map(FieldValue::Integer))),
        });
        self
    }

    /// Declare a property whose type is not indexed.
    pub fn unsupported(mut self, name: impl Into<String>, type_name: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            declared: DeclaredType::Unsupported(type_name),
            extractor: None,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec<R>] {
        &self.fields
    }

    /// Index schema covering the supported properties.
    pub fn document_schema(&self) -> DocumentSchema {
        let mut schema = DocumentSchema::new();
        for spec in &self.fields {
            if let Some(kind) = spec.declared.kind() {
                schema.push(spec.name.clone(), kind);
            }
        }
        schema
    }
}

/// A type that can be indexed as a document.
pub trait Record: Sized {
    fn schema() -> RecordSchema<Self>;
}

/// A property that could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFailure {
    pub field: String,
    pub error: ExtractError,
}

/// Result of mapping one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedDocument {
    /// Successfully extracted supported fields
    pub document: IndexedDocument,
    /// Properties dropped because their type is unsupported
    pub dropped: Vec<String>,
    /// Properties whose extractor failed
    pub failures: Vec<MappingFailure>,
}

impl MappedDocument {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Maps records of type `R` to indexed documents.
pub struct FieldMapper<R> {
    schema: RecordSchema<R>,
    sink: Arc<dyn ErrorSink>,
}

impl<R: Record> FieldMapper<R> {
    /// Resolve `R`'s schema once.
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self::with_schema(R::schema(), sink)
    }
}

impl<R> FieldMapper<R> {
    pub fn with_schema(schema: RecordSchema<R>, sink: Arc<dyn ErrorSink>) -> Self {
        Self { schema, sink }
    }

    pub fn schema(&self) -> &RecordSchema<R> {
        &self.schema
    }

    pub fn document_schema(&self) -> DocumentSchema {
        self.schema.document_schema()
    }

    /// Map one record. Never fails as a whole.
    pub fn map_to_document(&self, record: &R) -> MappedDocument {
        let mut mapped = MappedDocument::default();

        for spec in &self.schema.fields {
            let Some(extract) = &spec.extractor else {
                debug!(field = %spec.name, declared = ?spec.declared, "Dropping unsupported field");
                mapped.dropped.push(spec.name.clone());
                continue;
            };

            match extract(record) {
                Ok(value) => {
                    trace!(field = %spec.name, "Mapped field");
                    mapped.document.push(spec.name.clone(), value);
                }
                Err(error) => {
                    self.sink
                        .notify(&format!("map field '{}'", spec.name), &error);
                    mapped.failures.push(MappingFailure {
                        field: spec.name.clone(),
                        error,
                    });
                }
            }
        }

        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectingErrorSink;

    struct Article {
        title: String,
        year: Option<i64>,
        pages: u64,
        tags: Vec<String>,
    }

    impl Record for Article {
        fn schema() -> RecordSchema<Self> {
            RecordSchema::new()
                .text("title", |a: &Article| Ok(a.title.clone()))
                .integer("year", |a: &Article| {
                    a.year.ok_or_else(|| ExtractError::missing("year"))
                })
                .integer("pages", |a: &Article| {
                    i64::try_from(a.pages).map_err(|e| ExtractError::invalid("pages", e.to_string()))
                })
                .unsupported("tags", "Vec<String>")
        }
    }

    fn article(year: Option<i64>, pages: u64) -> Article {
        Article {
            title: "Hello".to_string(),
            year,
            pages,
            tags: vec!["greeting".to_string()],
        }
    }

    fn mapper() -> (Arc<CollectingErrorSink>, FieldMapper<Article>) {
        let sink = Arc::new(CollectingErrorSink::new());
        let mapper = FieldMapper::<Article>::new(sink.clone());
        (sink, mapper)
    }

    #[test]
    fn test_all_supported_fields_mapped() {
        let (sink, mapper) = mapper();
        let record = article(Some(2024), 120);
        assert_eq!(record.tags.len(), 1);

        let mapped = mapper.map_to_document(&record);

        assert_eq!(mapped.document.len(), 3);
        assert_eq!(mapped.document.get("title"), Some(&FieldValue::Text("Hello".into())));
        assert_eq!(mapped.document.get("year"), Some(&FieldValue::Integer(2024)));
        assert_eq!(mapped.document.get("pages"), Some(&FieldValue::Integer(120)));
        assert_eq!(mapped.dropped, vec!["tags".to_string()]);
        assert!(mapped.is_complete());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_failed_fields_are_skipped() {
        let (sink, mapper) = mapper();
        let mapped = mapper.map_to_document(&article(None, u64::MAX));

        // 3 supported properties, 2 failures
        assert_eq!(mapped.document.len(), 1);
        assert_eq!(mapped.document.fields()[0].name, "title");
        assert_eq!(mapped.failures.len(), 2);
        assert_eq!(mapped.failures[0].field, "year");
        assert_eq!(mapped.failures[0].error, ExtractError::missing("year"));
        assert_eq!(mapped.failures[1].field, "pages");
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.failures()[0].context, "map field 'year'");
    }

    #[test]
    fn test_unsupported_only_keeps_text() {
        struct Greeting {
            title: String,
        }
        impl Record for Greeting {
            fn schema() -> RecordSchema<Self> {
                RecordSchema::new()
                    .text("title", |g: &Greeting| Ok(g.title.clone()))
                    .unsupported("ignored", "f64")
            }
        }

        let sink = Arc::new(CollectingErrorSink::new());
        let mapper = FieldMapper::<Greeting>::new(sink);
        let mapped = mapper.map_to_document(&Greeting {
            title: "Hello".to_string(),
        });

        assert_eq!(mapped.document.len(), 1);
        assert_eq!(mapped.document.get("title").and_then(|v| v.as_text()), Some("Hello"));
        assert!(mapped.document.get("ignored").is_none());
    }

    #[test]
    fn test_document_schema_excludes_unsupported() {
        let schema = Article::schema().document_schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.kind_of("title"), Some(FieldKind::Text));
        assert_eq!(schema.kind_of("year"), Some(FieldKind::Integer));
        assert_eq!(schema.kind_of("tags"), None);
    }

    #[test]
    fn test_declared_types() {
        let schema = Article::schema();
        let declared: Vec<DeclaredType> = schema.fields().iter().map(|f| f.declared()).collect();
        assert_eq!(
            declared,
            vec![
                DeclaredType::Text,
                DeclaredType::Integer,
                DeclaredType::Integer,
                DeclaredType::Unsupported("Vec<String>"),
            ]
        );
        assert_eq!(DeclaredType::Unsupported("f64").kind(), None);
    }

    #[test]
    fn test_indexed_document_builder() {
        let doc = IndexedDocument::new()
            .with_text("title", "Hello")
            .with_integer("year", 1999);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.fields()[1].declared_type(), DeclaredType::Integer);
        assert_eq!(doc.get("year").and_then(|v| v.as_integer()), Some(1999));
        assert!(!doc.is_empty());
    }
}
