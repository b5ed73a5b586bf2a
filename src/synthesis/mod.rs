//! Synthesis - example-driven regexes, extractors and classifiers
//!
//! Every synthesizer is enumerate-and-verify: candidates come from closed
//! forms, a template table and a small generic lattice, and only candidates
//! reproducing every example survive. Conflicting examples are rejected
//! before any search starts.

pub mod regex_ast;
pub mod regex_synth;
pub mod extractor;
pub mod extractor_synth;
pub mod classifier;
pub mod knowledge;
pub mod coordinator;

pub use regex_ast::{CharClass, RegexAst};
pub use regex_synth::{RegexStrategy, RegexSynthesis};
pub use extractor::Extractor;
pub use classifier::Classifier;
pub use knowledge::{KnowledgeBase, KnowledgeEntry, SynthesisKind};
pub use coordinator::{Coordinator, SynthesisRequest, SynthesisResult};

use crate::example::{ExampleError, NUMERIC_EPSILON};
use serde::{Deserialize, Serialize};

/// Default cap on extractors returned by one synthesis
pub const DEFAULT_MAX_EXTRACTORS: usize = 5;

/// Default positive-count limit for literal alternation
pub const DEFAULT_ALTERNATION_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Examples(#[from] ExampleError),

    #[error("string \"{0}\" is both a positive and a negative example")]
    PolarityConflict(String),

    #[error("no regex accepts every positive and rejects every negative")]
    NoRegex,

    #[error("no extractor reproduces every example")]
    NoExtractor,

    #[error("cannot build a classifier: {0}")]
    NoClassifier(String),

    #[error("unsupported examples: {0}")]
    Unsupported(String),
}

/// Tunables shared by the synthesizers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub max_extractors: usize,
    pub alternation_limit: usize,
    pub epsilon: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_extractors: DEFAULT_MAX_EXTRACTORS,
            alternation_limit: DEFAULT_ALTERNATION_LIMIT,
            epsilon: NUMERIC_EPSILON,
        }
    }
}
