//! Document schema for index cores.
//!
//! Tantivy needs its schema up front, so a core is built over an explicit
//! list of fields. Each field maps to a fixed representation:
//! - Text: analyzed with the core's analyzer, stored verbatim
//! - Integer: i64, indexed + fast (range queries) + stored

use tantivy::schema::{
    IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED,
};

use crate::error::CoreError;

/// Representation of a supported field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a [`DocumentSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered set of indexable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSchema {
    fields: Vec<SchemaField>,
}

impl DocumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>) -> Self {
        self.push(name, FieldKind::Text);
        self
    }

    pub fn integer(mut self, name: impl Into<String>) -> Self {
        self.push(name, FieldKind::Integer);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, kind: FieldKind) {
        self.fields.push(SchemaField {
            name: name.into(),
            kind,
        });
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Kind of the named field, if present.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Reject schemas Tantivy would refuse or panic on.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fields.is_empty() {
            return Err(CoreError::Config(
                "document schema must declare at least one field".to_string(),
            ));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() || field.name.starts_with('-') {
                return Err(CoreError::Config(format!(
                    "invalid field name '{}'",
                    field.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CoreError::Config(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Build the Tantivy schema, analyzing text fields with `analyzer_name`.
    pub fn to_tantivy(&self, analyzer_name: &str) -> Schema {
        let mut schema_builder = Schema::builder();

        for field in &self.fields {
            match field.kind {
                FieldKind::Text => {
                    let indexing = TextFieldIndexing::default()
                        .set_tokenizer(analyzer_name)
                        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
                    let options = TextOptions::default()
                        .set_indexing_options(indexing)
                        .set_stored();
                    schema_builder.add_text_field(&field.name, options);
                }
                FieldKind::Integer => {
                    schema_builder.add_i64_field(&field.name, INDEXED | FAST | STORED);
                }
            }
        }

        schema_builder.build()
    }
}
