//! Document tools - the capability set the solver consumes
//!
//! The solver never touches document text directly; every search goes
//! through [`DocumentTools`]. Symbol queries are optional capabilities and
//! report [`ToolError::Unavailable`] unless an implementation provides them.

pub mod document;
pub mod outline;

pub use document::Document;
pub use outline::{Outline, SymbolKind};

use serde::Serialize;

/// Failures raised by a tool call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{0} is unavailable for this document")]
    Unavailable(&'static str),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("unknown symbol kind: {0}")]
    UnknownKind(String),
}

/// A single grep hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrepMatch {
    /// The matched substring
    #[serde(rename = "match")]
    pub matched: String,
    /// The full line containing the match
    pub line: String,
    /// 1-indexed line number
    #[serde(rename = "lineNum")]
    pub line_num: usize,
    /// Byte offset of the match within the document
    pub index: usize,
    /// Capture groups 1..n; non-participating groups are empty strings
    pub groups: Vec<String>,
}

/// A fuzzy-search hit, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub line: String,
    #[serde(rename = "lineNum")]
    pub line_num: usize,
    /// Similarity in `0.0..=1.0`
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSample {
    pub start: String,
    pub middle: String,
    pub end: String,
}

/// Size and a three-point sample of the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub length: usize,
    #[serde(rename = "lineCount")]
    pub line_count: usize,
    pub sample: StatsSample,
}

/// An entry of a document's symbol outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(rename = "lineNum")]
    pub line_num: usize,
    #[serde(rename = "lineEnd")]
    pub line_end: usize,
    /// The defining line, trimmed
    pub signature: String,
}

/// Document-query primitives available to the solver.
///
/// Symbol queries have default implementations that report the capability
/// as unavailable; implementors override the ones they support.
pub trait DocumentTools {
    /// Every regex match over the document, in document order.
    fn grep(&self, pattern: &str) -> Result<Vec<GrepMatch>, ToolError>;

    /// Lines most similar to `query`, best first, at most `limit` of them.
    fn fuzzy_search(&self, query: &str, limit: usize) -> Vec<FuzzyMatch>;

    fn corpus_stats(&self) -> CorpusStats;

    fn list_symbols(&self, _kind: Option<&str>) -> Result<Vec<SymbolInfo>, ToolError> {
        Err(ToolError::Unavailable("list_symbols"))
    }

    fn get_symbol_body(&self, _name: &str) -> Result<String, ToolError> {
        Err(ToolError::Unavailable("get_symbol_body"))
    }

    fn find_references(&self, _name: &str) -> Result<Vec<GrepMatch>, ToolError> {
        Err(ToolError::Unavailable("find_references"))
    }
}
