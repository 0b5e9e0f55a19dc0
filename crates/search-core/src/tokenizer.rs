//! Tokenization strategy selection.
//!
//! Maps a [`TokenizationStrategy`] to a concrete Tantivy analyzer. The
//! analyzer is registered on the index under its name, so the writer and the
//! reader of one core always share it.

use tantivy::tokenizer::{
    LowerCaser, RawTokenizer, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream,
};

use search_types::TokenizationStrategy;

/// Tokens longer than this many bytes are dropped by the general analyzer.
const MAX_TOKEN_LEN: usize = 255;

/// A named, immutable text analyzer.
#[derive(Clone)]
pub struct Analyzer {
    name: String,
    analyzer: TextAnalyzer,
}

impl Analyzer {
    /// Wrap a caller-built analyzer. `name` is what the schema refers to.
    pub fn custom(name: impl Into<String>, analyzer: TextAnalyzer) -> Self {
        Self {
            name: name.into(),
            analyzer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text_analyzer(&self) -> &TextAnalyzer {
        &self.analyzer
    }

    /// Split `text` into the terms this analyzer would index.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        terms
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer").field("name", &self.name).finish()
    }
}

/// Stateless strategy-to-analyzer mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenizerSelector;

impl TokenizerSelector {
    pub fn select(strategy: TokenizationStrategy) -> Analyzer {
        match strategy {
            TokenizationStrategy::General => Analyzer::custom(
                strategy.as_str(),
                TextAnalyzer::builder(SimpleTokenizer::default())
                    // The filter keeps tokens strictly shorter than its limit
                    .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN + 1))
                    .filter(LowerCaser)
                    .build(),
            ),
            TokenizationStrategy::Exact => {
                Analyzer::custom(strategy.as_str(), TextAnalyzer::from(RawTokenizer::default()))
            }
        }
    }
}
