//! Surface syntax - S-expression text ↔ Term AST
//!
//! The printer is the parser's inverse: `parse(&print(t)) == Ok(t)` for every
//! constructible term.

pub mod lexer;
pub mod parser;
pub mod printer;

pub use parser::parse;
pub use printer::print;

/// Malformed query text. Reported verbatim to the agent; never auto-recovered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("empty query")]
    Empty,

    #[error("unbalanced delimiter at byte {pos}: {detail}")]
    Unbalanced { pos: usize, detail: String },

    #[error("unterminated string starting at byte {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid escape '\\{escape}' at byte {pos}")]
    InvalidEscape { pos: usize, escape: char },

    #[error("invalid number '{text}' at byte {pos}")]
    InvalidNumber { pos: usize, text: String },

    #[error("unexpected {found} at byte {pos}, expected {expected}")]
    UnexpectedToken {
        pos: usize,
        found: String,
        expected: String,
    },

    #[error("unknown operator '{name}' at byte {pos}")]
    UnknownOperator { pos: usize, name: String },

    #[error("'{op}' expects {expected} argument(s), got {found}")]
    Arity {
        op: String,
        expected: String,
        found: usize,
    },

    #[error("'{op}' expects {expected} for {argument}, got {found}")]
    WrongLiteral {
        op: String,
        argument: String,
        expected: String,
        found: String,
    },

    #[error("'{op}' does not accept keyword ':{keyword}'")]
    UnexpectedKeyword { op: String, keyword: String },

    #[error("unknown constraint marker '{name}' at byte {pos}")]
    UnknownMarker { pos: usize, name: String },

    #[error("malformed example list: {0}")]
    MalformedExamples(String),
}
