//! Runtime values produced by the solver

use crate::example::Output;
use crate::infer::Type;
use crate::synthesis::{Classifier, Extractor};
use crate::term::{Literal, Term};
use crate::tools::{CorpusStats, FuzzyMatch, GrepMatch, SymbolInfo};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Names visible to a term while it is being evaluated
pub type Env = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Match(GrepMatch),
    Fuzzy(FuzzyMatch),
    Stats(CorpusStats),
    Symbol(SymbolInfo),
    Function(Box<Function>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// A lambda together with the local environment it was created in
    Closure { param: String, body: Term, env: Env },
    Extractor(Extractor),
    Classifier(Classifier),
}

impl Function {
    pub fn describe(&self) -> String {
        match self {
            Function::Closure { param, body, .. } => format!("(lambda {} {})", param, crate::syntax::print(body)),
            Function::Extractor(extractor) => extractor.to_string(),
            Function::Classifier(classifier) => format!("<classifier: {} rule(s)>", classifier.rules.len()),
        }
    }
}

impl Value {
    pub fn function(function: Function) -> Self {
        Value::Function(Box::new(function))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Match(_) => "match",
            Value::Fuzzy(_) => "fuzzy-match",
            Value::Stats(_) => "stats",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
        }
    }

    /// Text seen by string operators; hits are read through their line.
    /// `None` for values that have no textual reading.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Str(s) => Some(Cow::Borrowed(s)),
            Value::Match(m) => Some(Cow::Borrowed(&m.line)),
            Value::Fuzzy(m) => Some(Cow::Borrowed(&m.line)),
            Value::Symbol(s) => Some(Cow::Borrowed(&s.signature)),
            Value::Number(n) => Some(Cow::Owned(format_number(*n))),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }

    pub fn from_output(output: Output) -> Self {
        match output {
            Output::Null => Value::Null,
            Output::Bool(b) => Value::Bool(b),
            Output::Number(n) => Value::Number(n),
            Output::Str(s) => Value::Str(s),
            Output::Array(items) => Value::Array(items.into_iter().map(Value::from_output).collect()),
        }
    }

    /// Static type of an already computed value
    pub fn type_of(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::Str(_) => Type::Str,
            Value::Array(items) => Type::array(
                items
                    .iter()
                    .map(Value::type_of)
                    .reduce(|a, b| a.join(&b))
                    .unwrap_or(Type::Any),
            ),
            Value::Match(_) => Type::Match,
            Value::Fuzzy(_) => Type::FuzzyMatch,
            Value::Stats(_) => Type::Stats,
            Value::Symbol(_) => Type::Symbol,
            Value::Function(f) => match **f {
                Function::Closure { .. } => Type::function(Type::Any, Type::Any),
                Function::Extractor(_) | Function::Classifier(_) => Type::function(Type::Str, Type::Any),
            },
        }
    }
}

/// Whole numbers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Match(m) => m.serialize(serializer),
            Value::Fuzzy(m) => m.serialize(serializer),
            Value::Stats(s) => s.serialize(serializer),
            Value::Symbol(s) => s.serialize(serializer),
            Value::Function(f) => serializer.serialize_str(&f.describe()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Function(func) => write!(f, "{}", func.describe()),
            other => match serde_json::to_string(other) {
                Ok(json) => write!(f, "{}", json),
                Err(_) => write!(f, "<{}>", other.kind_name()),
            },
        }
    }
}
