//! Index core: owns the writer, reader and searcher of one index.
//!
//! Lifecycle is `Open -> Closed`. [`IndexCore::shutdown`] consumes the core,
//! so nothing can touch it afterwards; a core dropped without shutdown is
//! closed by `Drop` on a best-effort basis.
//!
//! The reader/searcher pair is a snapshot taken when the core opens. It is
//! never reloaded: documents added through this core become visible only to
//! a core opened later over the same directory.

use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tantivy::collector::TopDocs;
use tantivy::directory::Directory;
use tantivy::indexer::NoMergePolicy;
use tantivy::query::{BooleanQuery, Query, RangeQuery};
use tantivy::schema::{Field, Schema, Value};
use tantivy::{
    DocAddress, Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, Searcher,
    TantivyDocument, TantivyError, Term,
};
use tracing::{debug, info, warn};

use crate::config::{IndexConfig, OpenMode};
use crate::error::CoreError;
use crate::mapping::{FieldMapper, FieldValue, IndexedDocument, MappedDocument, Record};
use crate::schema::{DocumentSchema, FieldKind, SchemaField};
use crate::sink::ErrorSink;
use crate::tokenizer::Analyzer;

/// What a completed shutdown did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Documents added through this core
    pub documents_added: u64,
    /// Segments merged into one (0 when there was nothing to merge)
    pub segments_merged: usize,
}

/// Engine handles. Field order is release order.
struct CoreHandles {
    writer: IndexWriter,
    index: Index,
    searcher: Searcher,
    reader: IndexReader,
}

/// Owner of one index's handles.
///
/// Not internally synchronized: mutating operations take `&mut self`.
pub struct IndexCore {
    /// `Some` for as long as the core is reachable; taken only by `shutdown`
    /// and `Drop`.
    handles: Option<CoreHandles>,
    fields: Vec<(Field, SchemaField)>,
    document_schema: DocumentSchema,
    analyzer: Analyzer,
    open_mode: OpenMode,
    location: Option<PathBuf>,
    sink: Arc<dyn ErrorSink>,
    documents_added: u64,
}

impl IndexCore {
    /// Open writer, reader and searcher over the configured directory.
    ///
    /// Failures are reported to `sink` and returned; no partially opened
    /// core is ever handed out.
    pub fn open(config: IndexConfig, sink: Arc<dyn ErrorSink>) -> Result<Self, CoreError> {
        let (directory, analyzer, document_schema, open_mode, writer_memory_bytes) =
            config.into_parts();
        let (directory, location) = directory.into_parts();
        let schema = document_schema.to_tantivy(analyzer.name());

        let opened = Self::open_handles(directory, &schema, &analyzer, open_mode, writer_memory_bytes)
            .and_then(|handles| Ok((handles, resolve_fields(&schema, &document_schema)?)));
        let (handles, fields) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                sink.notify("open index core", &e);
                return Err(e);
            }
        };

        info!(
            location = ?location,
            open_mode = ?open_mode,
            analyzer = analyzer.name(),
            num_docs = handles.searcher.num_docs(),
            "Opened index core"
        );

        Ok(Self {
            handles: Some(handles),
            fields,
            document_schema,
            analyzer,
            open_mode,
            location,
            sink,
            documents_added: 0,
        })
    }

    fn open_handles(
        directory: Box<dyn Directory>,
        schema: &Schema,
        analyzer: &Analyzer,
        open_mode: OpenMode,
        writer_memory_bytes: usize,
    ) -> Result<CoreHandles, CoreError> {
        let index = match open_mode {
            OpenMode::CreateFresh => {
                debug!("Creating new index");
                Index::create(directory, schema.clone(), IndexSettings::default())?
            }
            OpenMode::CreateOrAppend => {
                debug!("Opening existing index");
                Index::open_or_create(directory, schema.clone()).map_err(|e| match e {
                    TantivyError::SchemaError(msg) => CoreError::SchemaMismatch(msg),
                    other => CoreError::Tantivy(other),
                })?
            }
        };

        index
            .tokenizers()
            .register(analyzer.name(), analyzer.text_analyzer().clone());

        let writer: IndexWriter = index.writer(writer_memory_bytes)?;
        // Segments are merged once, at shutdown
        writer.set_merge_policy(Box::new(NoMergePolicy));
        debug!(memory_bytes = writer_memory_bytes, "Created index writer");

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let searcher = reader.searcher();

        Ok(CoreHandles {
            writer,
            index,
            searcher,
            reader,
        })
    }

    /// Never `Closed` for a live core.
    fn handles(&self) -> Result<&CoreHandles, CoreError> {
        self.handles.as_ref().ok_or(CoreError::Closed)
    }

    /// Report `error` to the sink and hand it back for propagation.
    fn report(&self, context: &str, error: CoreError) -> CoreError {
        self.sink.notify(context, &error);
        error
    }

    fn field(&self, name: &str) -> Result<(Field, FieldKind), CoreError> {
        self.fields
            .iter()
            .find(|(_, spec)| spec.name == name)
            .map(|(field, spec)| (*field, spec.kind))
            .ok_or_else(|| CoreError::SchemaMismatch(format!("unknown field '{}'", name)))
    }

    fn to_tantivy_doc(&self, doc: &IndexedDocument) -> Result<TantivyDocument, CoreError> {
        let mut out = TantivyDocument::default();
        for descriptor in doc.fields() {
            let (field, kind) = self.field(&descriptor.name)?;
            match (&descriptor.value, kind) {
                (FieldValue::Text(text), FieldKind::Text) => out.add_text(field, text),
                (FieldValue::Integer(value), FieldKind::Integer) => out.add_i64(field, *value),
                (value, kind) => {
                    return Err(CoreError::SchemaMismatch(format!(
                        "field '{}' is {} but got a {} value",
                        descriptor.name,
                        kind,
                        value.kind()
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Append a document to the writer's pending segment.
    pub fn index_document(&mut self, doc: &IndexedDocument) -> Result<(), CoreError> {
        let document = self
            .to_tantivy_doc(doc)
            .map_err(|e| self.report("add document", e))?;

        let handles = self.handles()?;
        handles
            .writer
            .add_document(document)
            .map_err(|e| self.report("add document", e.into()))?;

        self.documents_added += 1;
        debug!(fields = doc.len(), "Added document");
        Ok(())
    }

    /// Map `record` and index the result.
    ///
    /// Mapping never fails as a whole; skipped and failed fields are in the
    /// returned [`MappedDocument`].
    pub fn index_record<R>(
        &mut self,
        mapper: &FieldMapper<R>,
        record: &R,
    ) -> Result<MappedDocument, CoreError> {
        let mapped = mapper.map_to_document(record);
        self.index_document(&mapped.document)?;
        Ok(mapped)
    }

    /// A mapper for `R` that reports to this core's sink.
    pub fn mapper<R: Record>(&self) -> FieldMapper<R> {
        FieldMapper::new(self.sink.clone())
    }

    /// Documents visible in the construction-time snapshot.
    pub fn num_docs(&self) -> u64 {
        self.handles
            .as_ref()
            .map(|h| h.searcher.num_docs())
            .unwrap_or(0)
    }

    /// Segments in the construction-time snapshot.
    pub fn segment_count(&self) -> usize {
        self.handles
            .as_ref()
            .map(|h| h.searcher.segment_readers().len())
            .unwrap_or(0)
    }

    /// Documents whose text field contains any term of `text`.
    ///
    /// `text` is split with the core's analyzer, so under the exact strategy
    /// the whole value must match.
    pub fn match_text(
        &self,
        field: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<IndexedDocument>, CoreError> {
        let (field_handle, kind) = self.field(field)?;
        if kind != FieldKind::Text {
            return Err(CoreError::SchemaMismatch(format!(
                "field '{}' is {}, not text",
                field, kind
            )));
        }

        let terms: Vec<Term> = self
            .analyzer
            .terms(text)
            .iter()
            .map(|t| Term::from_field_text(field_handle, t))
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let query = BooleanQuery::new_multiterms_query(terms);
        self.collect(&query, limit)
    }

    /// Documents whose integer field lies in `range`.
    pub fn match_range<B: RangeBounds<i64>>(
        &self,
        field: &str,
        range: B,
        limit: usize,
    ) -> Result<Vec<IndexedDocument>, CoreError> {
        let (field_handle, kind) = self.field(field)?;
        if kind != FieldKind::Integer {
            return Err(CoreError::SchemaMismatch(format!(
                "field '{}' is {}, not integer",
                field, kind
            )));
        }

        let to_term = |v: &i64| Term::from_field_i64(field_handle, *v);
        let query = RangeQuery::new(
            map_bound(range.start_bound(), to_term),
            map_bound(range.end_bound(), to_term),
        );
        self.collect(&query, limit)
    }

    fn collect(&self, query: &dyn Query, limit: usize) -> Result<Vec<IndexedDocument>, CoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = &self.handles()?.searcher;
        let top_docs = searcher.search(query, &TopDocs::with_limit(limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            results.push(self.retrieve(searcher, address)?);
        }
        debug!(results = results.len(), "Snapshot query complete");
        Ok(results)
    }

    /// Rebuild a document from its stored fields.
    fn retrieve(&self, searcher: &Searcher, address: DocAddress) -> Result<IndexedDocument, CoreError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let mut out = IndexedDocument::new();
        for (field, spec) in &self.fields {
            let Some(value) = doc.get_first(*field) else {
                continue;
            };
            let value = match spec.kind {
                FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
                FieldKind::Integer => value.as_i64().map(FieldValue::Integer),
            };
            if let Some(value) = value {
                out.push(spec.name.clone(), value);
            }
        }
        Ok(out)
    }

    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    /// Filesystem location, `None` for in-memory cores.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.document_schema
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn documents_added(&self) -> u64 {
        self.documents_added
    }

    pub fn error_sink(&self) -> Arc<dyn ErrorSink> {
        self.sink.clone()
    }

    /// Merge pending segments into one, then close writer, directory and
    /// reader, in that order.
    ///
    /// Every step's failure is reported; handles are released regardless.
    /// Returns the first failure.
    pub fn shutdown(mut self) -> Result<ShutdownReport, CoreError> {
        let handles = self.handles.take().ok_or(CoreError::Closed)?;
        close_handles(handles, self.documents_added, self.sink.as_ref())
    }
}

impl Drop for IndexCore {
    fn drop(&mut self) {
        if let Some(handles) = self.handles.take() {
            warn!(location = ?self.location, "Index core dropped without shutdown, closing");
            // Failures were already reported to the sink
            let _ = close_handles(handles, self.documents_added, self.sink.as_ref());
        }
    }
}

impl std::fmt::Debug for IndexCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCore")
            .field("open", &self.handles.is_some())
            .field("open_mode", &self.open_mode)
            .field("location", &self.location)
            .field("analyzer", &self.analyzer)
            .field("documents_added", &self.documents_added)
            .finish()
    }
}

fn resolve_fields(
    schema: &Schema,
    document_schema: &DocumentSchema,
) -> Result<Vec<(Field, SchemaField)>, CoreError> {
    document_schema
        .fields()
        .iter()
        .map(|spec| Ok((schema.get_field(&spec.name)?, spec.clone())))
        .collect()
}

fn map_bound(bound: Bound<&i64>, f: impl Fn(&i64) -> Term) -> Bound<Term> {
    match bound {
        Bound::Included(v) => Bound::Included(f(v)),
        Bound::Excluded(v) => Bound::Excluded(f(v)),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn record_failure(
    sink: &dyn ErrorSink,
    context: &str,
    error: CoreError,
    first: &mut Option<CoreError>,
) {
    sink.notify(context, &error);
    if first.is_none() {
        *first = Some(error);
    }
}

fn close_handles(
    handles: CoreHandles,
    documents_added: u64,
    sink: &dyn ErrorSink,
) -> Result<ShutdownReport, CoreError> {
    let CoreHandles {
        mut writer,
        index,
        searcher,
        reader,
    } = handles;
    let mut report = ShutdownReport {
        documents_added,
        segments_merged: 0,
    };
    let mut first_error = None;

    // 1. Persist pending documents and merge all segments into one
    match writer.commit() {
        Ok(opstamp) => {
            debug!(opstamp, "Committed pending documents");
            match index.searchable_segment_ids() {
                Ok(segment_ids) if segment_ids.len() > 1 => {
                    match writer.merge(&segment_ids).wait() {
                        Ok(_) => report.segments_merged = segment_ids.len(),
                        Err(e) => record_failure(sink, "merge segments", e.into(), &mut first_error),
                    }
                }
                Ok(_) => {}
                Err(e) => record_failure(sink, "list segments", e.into(), &mut first_error),
            }
        }
        Err(e) => record_failure(sink, "commit pending documents", e.into(), &mut first_error),
    }

    // 2. Close the writer
    if let Err(e) = writer.wait_merging_threads() {
        record_failure(sink, "close writer", e.into(), &mut first_error);
    }

    // 3. Release the directory, then 4. the reader
    drop(index);
    drop(searcher);
    drop(reader);

    match first_error {
        Some(e) => Err(e),
        None => {
            info!(
                documents_added = report.documents_added,
                segments_merged = report.segments_merged,
                "Index core closed"
            );
            Ok(report)
        }
    }
}
