//! Term AST - the query language's data model
//!
//! A term is an immutable tree. Only `Lambda` introduces a bound name and
//! only `Var` consumes one; evaluation always goes through an environment.
//!
//! Every concern (parse, print, resolve, infer, solve, compile) is a
//! separate exhaustive match over [`Term`].

use crate::example::Example;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Advisory constraint markers an agent may attach to a term.
///
/// Markers never change result semantics; the resolver strips them and
/// only records the outermost one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// `Σ⚡μ` - maximize information, minimize complexity
    SigmaMu,
    /// `∞/0` - handle empty and edge cases
    InfinityZero,
    /// `ε⚡φ` - prefer exact, high-fidelity results
    EpsilonPhi,
}

impl Marker {
    /// Canonical symbol used by the printer
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::SigmaMu => "Σ⚡μ",
            Marker::InfinityZero => "∞/0",
            Marker::EpsilonPhi => "ε⚡φ",
        }
    }

    /// Human-readable meaning of the marker
    pub fn description(&self) -> &'static str {
        match self {
            Marker::SigmaMu => "maximize information, minimize complexity",
            Marker::InfinityZero => "handle empty and edge cases",
            Marker::EpsilonPhi => "prefer exact, high-fidelity results",
        }
    }

    pub fn all() -> &'static [Marker] {
        &[Marker::SigmaMu, Marker::InfinityZero, Marker::EpsilonPhi]
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Σ⚡μ" | "sigma-mu" => Ok(Marker::SigmaMu),
            "∞/0" | "inf-zero" => Ok(Marker::InfinityZero),
            "ε⚡φ" | "eps-phi" => Ok(Marker::EpsilonPhi),
            _ => Err(Error::Resolution(format!("Unknown constraint marker: {}", s))),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Literal scalar values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

/// What a `synthesize` form asks the coordinator for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisTarget {
    /// A string → value extraction function
    #[default]
    Extractor,
    /// A regular expression accepting the positive examples
    Regex,
}

impl SynthesisTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisTarget::Extractor => "extractor",
            SynthesisTarget::Regex => "regex",
        }
    }
}

impl FromStr for SynthesisTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "extractor" | "extract" | "function" | "fn" => Ok(SynthesisTarget::Extractor),
            "regex" | "pattern" => Ok(SynthesisTarget::Regex),
            _ => Err(Error::Resolution(format!("Unknown synthesis type: {}", s))),
        }
    }
}

/// A node in the query language's AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// The implicit input (the loaded document unless rebound)
    Input,
    Lit(Literal),

    // ========== Document tools ==========
    Grep {
        pattern: String,
    },
    FuzzySearch {
        query: String,
        limit: Option<usize>,
    },
    CorpusStats,

    // ========== Collections ==========
    Filter {
        collection: Box<Term>,
        predicate: Box<Term>,
    },
    Map {
        collection: Box<Term>,
        transform: Box<Term>,
    },
    /// `reducer` is curried: accumulator → item → accumulator
    Reduce {
        collection: Box<Term>,
        init: Box<Term>,
        reducer: Box<Term>,
    },
    Sum(Box<Term>),
    Count(Box<Term>),

    // ========== Strings ==========
    Match {
        text: Box<Term>,
        pattern: String,
        group: usize,
    },
    Replace {
        text: Box<Term>,
        pattern: String,
        replacement: String,
    },
    Split {
        text: Box<Term>,
        delimiter: String,
        index: Option<usize>,
    },

    // ========== Coercions ==========
    ParseInt(Box<Term>),
    ParseFloat(Box<Term>),
    ParseNumber {
        value: Box<Term>,
        examples: Option<Vec<Example>>,
    },
    ParseDate {
        value: Box<Term>,
        format: Option<String>,
        examples: Option<Vec<Example>>,
    },
    ParseCurrency {
        value: Box<Term>,
        examples: Option<Vec<Example>>,
    },

    Add(Box<Term>, Box<Term>),
    If {
        cond: Box<Term>,
        then: Box<Term>,
        otherwise: Box<Term>,
    },

    // ========== Synthesis ==========
    Classify {
        value: Box<Term>,
        examples: Vec<Example>,
    },
    Synthesize {
        target: SynthesisTarget,
        examples: Vec<Example>,
    },
    Predicate {
        examples: Vec<Example>,
    },
    DefineFn {
        name: String,
        examples: Vec<Example>,
    },
    ApplyFn {
        name: String,
        arg: Box<Term>,
    },

    // ========== Symbol index ==========
    ListSymbols {
        kind: Option<String>,
    },
    GetSymbolBody {
        name: Box<Term>,
    },
    FindReferences {
        name: String,
    },

    // ========== Lambda calculus ==========
    Var(String),
    App {
        func: Box<Term>,
        arg: Box<Term>,
    },
    Lambda {
        param: String,
        body: Box<Term>,
    },

    /// `[Marker] ⊗ term` - advisory annotation, removed by the resolver
    Constrained {
        marker: Marker,
        term: Box<Term>,
    },
}

impl Term {
    pub fn string(s: impl Into<String>) -> Self {
        Term::Lit(Literal::Str(s.into()))
    }

    pub fn number(n: f64) -> Self {
        Term::Lit(Literal::Number(n))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn grep(pattern: impl Into<String>) -> Self {
        Term::Grep {
            pattern: pattern.into(),
        }
    }

    pub fn lambda(param: impl Into<String>, body: Term) -> Self {
        Term::Lambda {
            param: param.into(),
            body: Box::new(body),
        }
    }

    pub fn app(func: Term, arg: Term) -> Self {
        Term::App {
            func: Box::new(func),
            arg: Box::new(arg),
        }
    }

    /// Operator name as written in the concrete syntax
    pub fn operator(&self) -> &'static str {
        match self {
            Term::Input => "input",
            Term::Lit(_) => "literal",
            Term::Grep { .. } => "grep",
            Term::FuzzySearch { .. } => "fuzzy_search",
            Term::CorpusStats => "text_stats",
            Term::Filter { .. } => "filter",
            Term::Map { .. } => "map",
            Term::Reduce { .. } => "reduce",
            Term::Sum(_) => "sum",
            Term::Count(_) => "count",
            Term::Match { .. } => "match",
            Term::Replace { .. } => "replace",
            Term::Split { .. } => "split",
            Term::ParseInt(_) => "parseInt",
            Term::ParseFloat(_) => "parseFloat",
            Term::ParseNumber { .. } => "parseNumber",
            Term::ParseDate { .. } => "parseDate",
            Term::ParseCurrency { .. } => "parseCurrency",
            Term::Add(..) => "add",
            Term::If { .. } => "if",
            Term::Classify { .. } => "classify",
            Term::Synthesize { .. } => "synthesize",
            Term::Predicate { .. } => "predicate",
            Term::DefineFn { .. } => "define-fn",
            Term::ApplyFn { .. } => "apply-fn",
            Term::ListSymbols { .. } => "list_symbols",
            Term::GetSymbolBody { .. } => "get_symbol_body",
            Term::FindReferences { .. } => "find_references",
            Term::Var(_) => "var",
            Term::App { .. } => "app",
            Term::Lambda { .. } => "lambda",
            Term::Constrained { .. } => "constrained",
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|c| c.size()).sum::<usize>()
    }

    /// Direct sub-terms, in evaluation order
    pub fn children(&self) -> Vec<&Term> {
        match self {
            Term::Input
            | Term::Lit(_)
            | Term::Grep { .. }
            | Term::FuzzySearch { .. }
            | Term::CorpusStats
            | Term::Synthesize { .. }
            | Term::Predicate { .. }
            | Term::DefineFn { .. }
            | Term::ListSymbols { .. }
            | Term::FindReferences { .. }
            | Term::Var(_) => Vec::new(),
            Term::Filter { collection, predicate } => vec![&**collection, &**predicate],
            Term::Map { collection, transform } => vec![&**collection, &**transform],
            Term::Reduce { collection, init, reducer } => {
                vec![&**collection, &**init, &**reducer]
            }
            Term::Sum(t) | Term::Count(t) | Term::ParseInt(t) | Term::ParseFloat(t) => vec![&**t],
            Term::Match { text, .. } | Term::Replace { text, .. } | Term::Split { text, .. } => {
                vec![&**text]
            }
            Term::ParseNumber { value, .. }
            | Term::ParseDate { value, .. }
            | Term::ParseCurrency { value, .. }
            | Term::Classify { value, .. } => vec![&**value],
            Term::Add(a, b) => vec![&**a, &**b],
            Term::If { cond, then, otherwise } => vec![&**cond, &**then, &**otherwise],
            Term::ApplyFn { arg, .. } => vec![&**arg],
            Term::GetSymbolBody { name } => vec![&**name],
            Term::App { func, arg } => vec![&**func, &**arg],
            Term::Lambda { body, .. } => vec![&**body],
            Term::Constrained { term, .. } => vec![&**term],
        }
    }

    /// Whether any constraint wrapper remains in the tree
    pub fn has_constraints(&self) -> bool {
        matches!(self, Term::Constrained { .. }) || self.children().iter().any(|c| c.has_constraints())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::syntax::print(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        for marker in Marker::all() {
            let parsed: Marker = marker.as_str().parse().unwrap();
            assert_eq!(*marker, parsed);
        }
    }

    #[test]
    fn test_marker_ascii_aliases() {
        assert_eq!(Marker::from_str("sigma-mu").unwrap(), Marker::SigmaMu);
        assert_eq!(Marker::from_str("inf-zero").unwrap(), Marker::InfinityZero);
        assert_eq!(Marker::from_str("eps-phi").unwrap(), Marker::EpsilonPhi);
        assert!(Marker::from_str("nope").is_err());
    }

    #[test]
    fn test_term_size_and_constraints() {
        let term = Term::Count(Box::new(Term::Constrained {
            marker: Marker::SigmaMu,
            term: Box::new(Term::grep("ERROR")),
        }));
        assert_eq!(term.size(), 3);
        assert!(term.has_constraints());
        assert_eq!(term.operator(), "count");
    }
}
