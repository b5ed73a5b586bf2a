//! # Docscope - a constrained query language for exploring large documents
//!
//! Agents explore documents too large for their context by emitting small
//! S-expression programs instead of free-form code.
//!
//! Docscope provides:
//! - A Term AST with a parser and an inverse printer
//! - A constraint resolver and a static type inferencer
//! - A solver that executes resolved terms against a document tool set
//! - Example-driven synthesis of regexes, extractors and classifiers, with
//!   a knowledge base that memoizes and fuses what it has learned
//! - A compiler that lowers resolved terms to JavaScript

pub mod example;
pub mod term;
pub mod syntax;
pub mod resolve;
pub mod infer;
pub mod tools;
pub mod synthesis;
pub mod solver;
pub mod compile;
pub mod session;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use example::{Example, Output};
pub use term::{Marker, Term};
pub use syntax::{ParseError, parse, print};
pub use resolve::{Resolved, resolve};
pub use infer::{Type, TypeEnv, infer};
pub use tools::{Document, DocumentTools};
pub use solver::{Bindings, SolveResult, Value, solve};
pub use synthesis::{Coordinator, KnowledgeBase};
pub use compile::Compiler;
pub use session::Session;
pub use config::DocscopeConfig;

/// Result type alias for Docscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Docscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] syntax::ParseError),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Inference error: {0}")]
    Inference(#[from] infer::InferenceError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] solver::RuntimeError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] synthesis::SynthesisError),

    #[error("Compile error: {0}")]
    Compile(#[from] compile::CompileError),

    #[error("Tool error: {0}")]
    Tool(#[from] tools::ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<resolve::ResolutionError> for Error {
    fn from(err: resolve::ResolutionError) -> Self {
        Error::Resolution(err.0)
    }
}
