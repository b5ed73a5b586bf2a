//! Input/output examples - the training data for every synthesizer
//!
//! An example pairs an input string with the value the agent expects back.
//! Example sets must be non-empty and conflict-free (no shared input with
//! differing outputs); both checks run before any candidate search.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance used when comparing numeric outputs
pub const NUMERIC_EPSILON: f64 = 1e-9;

/// The expected output of an example: a scalar or an array of outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Output {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Output>),
}

impl Output {
    /// Compare two outputs, treating numbers as equal within `epsilon` (relative).
    pub fn matches(&self, other: &Output, epsilon: f64) -> bool {
        match (self, other) {
            (Output::Null, Output::Null) => true,
            (Output::Bool(a), Output::Bool(b)) => a == b,
            (Output::Number(a), Output::Number(b)) => numbers_close(*a, *b, epsilon),
            (Output::Str(a), Output::Str(b)) => a == b,
            (Output::Array(a), Output::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y, epsilon))
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Output::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Output::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Output::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the output's shape, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Output::Null => "null",
            Output::Bool(_) => "bool",
            Output::Number(_) => "number",
            Output::Str(_) => "string",
            Output::Array(_) => "array",
        }
    }
}

impl fmt::Display for Output {
    /// Renders the output in query-language literal syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Null => write!(f, "null"),
            Output::Bool(b) => write!(f, "{}", b),
            Output::Number(n) => write!(f, "{}", n),
            Output::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Output::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// True when `a` and `b` differ by at most `epsilon` relative to their magnitude.
pub fn numbers_close(a: f64, b: f64, epsilon: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= epsilon * scale
}

/// Escape a string for the query language's double-quoted literal syntax.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// A single input/output training pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: Output,
}

impl Example {
    pub fn new(input: impl Into<String>, output: Output) -> Self {
        Self {
            input: input.into(),
            output,
        }
    }

    /// Example whose output is a string
    pub fn text(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(input, Output::Str(output.into()))
    }

    /// Example whose output is a number
    pub fn number(input: impl Into<String>, output: f64) -> Self {
        Self::new(input, Output::Number(output))
    }

    /// Example whose output is a boolean
    pub fn flag(input: impl Into<String>, output: bool) -> Self {
        Self::new(input, Output::Bool(output))
    }
}

/// Parses `input=>output`. The output reads as a number, `true`, `false`
/// or `null` when it can, and as a string otherwise; wrap it in double
/// quotes to force a string.
impl std::str::FromStr for Example {
    type Err = ExampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (input, output) = s
            .split_once("=>")
            .ok_or_else(|| ExampleError::Malformed(s.to_string()))?;
        let output = output.trim();
        let output = match output {
            "true" => Output::Bool(true),
            "false" => Output::Bool(false),
            "null" => Output::Null,
            _ if output.len() >= 2 && output.starts_with('"') && output.ends_with('"') => {
                Output::Str(output[1..output.len() - 1].to_string())
            }
            _ => match output.parse::<f64>() {
                Ok(n) if n.is_finite() => Output::Number(n),
                _ => Output::Str(output.to_string()),
            },
        };
        Ok(Example::new(input, output))
    }
}

/// Rejections raised before any synthesis search starts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExampleError {
    #[error("no examples given")]
    Empty,

    #[error("malformed example '{0}' (expected input=>output)")]
    Malformed(String),

    #[error("conflicting examples for input \"{input}\": {first} vs {second}")]
    Conflict {
        input: String,
        first: String,
        second: String,
    },
}

/// Check that an example set is non-empty and conflict-free.
pub fn validate(examples: &[Example]) -> Result<(), ExampleError> {
    if examples.is_empty() {
        return Err(ExampleError::Empty);
    }
    for (i, a) in examples.iter().enumerate() {
        for b in &examples[i + 1..] {
            if a.input == b.input && !a.output.matches(&b.output, NUMERIC_EPSILON) {
                return Err(ExampleError::Conflict {
                    input: a.input.clone(),
                    first: a.output.to_string(),
                    second: b.output.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Structural identity of an ordered example set.
///
/// Two sets with the same inputs and outputs in the same order hash to the
/// same id; it is the memo key for synthesized converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExampleSetId(blake3::Hash);

impl ExampleSetId {
    pub fn of(examples: &[Example]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for example in examples {
            hasher.update(&(example.input.len() as u64).to_le_bytes());
            hasher.update(example.input.as_bytes());
            let output = example.output.to_string();
            hasher.update(&(output.len() as u64).to_le_bytes());
            hasher.update(output.as_bytes());
        }
        Self(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for ExampleSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for ExampleSetId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Fraction of `a`'s examples that also appear (same input and output) in `b`.
pub fn overlap(a: &[Example], b: &[Example]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let shared = a
        .iter()
        .filter(|x| {
            b.iter()
                .any(|y| x.input == y.input && x.output.matches(&y.output, NUMERIC_EPSILON))
        })
        .count();
    shared as f64 / a.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example_pairs() {
        let e: Example = "$1,234=>1234".parse().unwrap();
        assert_eq!(e, Example::number("$1,234", 1234.0));
        let e: Example = "ERROR x=>true".parse().unwrap();
        assert_eq!(e, Example::flag("ERROR x", true));
        let e: Example = "a-b=>\"42\"".parse().unwrap();
        assert_eq!(e, Example::text("a-b", "42"));
        let e: Example = "2024-01-15=>2024".parse().unwrap();
        assert_eq!(e.output, Output::Number(2024.0));
        assert!(matches!("no arrow".parse::<Example>(), Err(ExampleError::Malformed(_))));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(validate(&[]), Err(ExampleError::Empty));
    }

    #[test]
    fn test_validate_rejects_conflict() {
        let examples = vec![Example::number("a", 1.0), Example::number("a", 2.0)];
        assert!(matches!(validate(&examples), Err(ExampleError::Conflict { .. })));
    }

    #[test]
    fn test_duplicate_agreeing_examples_are_fine() {
        let examples = vec![Example::number("a", 1.0), Example::number("a", 1.0)];
        assert!(validate(&examples).is_ok());
    }

    #[test]
    fn test_numeric_match_within_epsilon() {
        assert!(Output::Number(1234.0).matches(&Output::Number(1234.0000000001), NUMERIC_EPSILON));
        assert!(!Output::Number(1234.0).matches(&Output::Number(1235.0), NUMERIC_EPSILON));
        assert!(!Output::Number(1.0).matches(&Output::Str("1".into()), NUMERIC_EPSILON));
    }

    #[test]
    fn test_example_set_id_is_structural() {
        let a = vec![Example::number("$1", 1.0), Example::number("$2", 2.0)];
        let b = vec![Example::number("$1", 1.0), Example::number("$2", 2.0)];
        let c = vec![Example::number("$2", 2.0), Example::number("$1", 1.0)];
        assert_eq!(ExampleSetId::of(&a), ExampleSetId::of(&b));
        assert_ne!(ExampleSetId::of(&a), ExampleSetId::of(&c));
    }

    #[test]
    fn test_output_display() {
        let out = Output::Array(vec![Output::Str("a\"b".into()), Output::Number(2.5), Output::Null]);
        assert_eq!(out.to_string(), "[\"a\\\"b\" 2.5 null]");
    }
}
