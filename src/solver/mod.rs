//! Solver - executes resolved terms against a document tool set
//!
//! Evaluation is big-step, depth-first and call-by-value. Lambdas close over
//! their local environment; application binds the parameter in a fresh
//! short-lived environment and never writes to the caller's [`Bindings`].
//!
//! A wrong-shape operand aborts the query with a [`RuntimeError`] rendered
//! into [`SolveResult::error`]; the solver itself never panics.

pub mod bindings;
pub mod coerce;
pub mod engine;
pub mod value;

pub use bindings::Bindings;
pub use coerce::DateConvention;
pub use value::{Env, Function, Value};

use crate::resolve::Resolved;
use crate::synthesis::{KnowledgeBase, SynthesisConfig};
use crate::tools::{DocumentTools, ToolError};
use engine::Engine;
use serde::{Deserialize, Serialize};

/// Default number of fuzzy-search hits
pub const DEFAULT_FUZZY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("{op} expects {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unbound variable '{0}'")]
    UnboundVariable(String),

    #[error("no function named '{0}' (define it with define-fn first)")]
    UnknownFunction(String),

    #[error("no input is bound")]
    NoInput,

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown date format '{0}' (expected US, EU or ISO)")]
    UnknownDateFormat(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("unresolved constraint reached the solver")]
    Unresolved,
}

impl RuntimeError {
    pub(crate) fn mismatch(op: &'static str, expected: &'static str, found: &Value) -> Self {
        RuntimeError::TypeMismatch {
            op,
            expected,
            found: found.kind_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub fuzzy_limit: usize,
    /// Reading of ambiguous `NN/NN/YYYY` dates without a `:format` hint
    pub date_convention: DateConvention,
    pub synthesis: SynthesisConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
            date_convention: DateConvention::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

/// Outcome of one solve call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub success: bool,
    pub value: Value,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolveResult {
    pub fn failure(error: impl ToString, logs: Vec<String>) -> Self {
        Self {
            success: false,
            value: Value::Null,
            logs,
            error: Some(error.to_string()),
        }
    }
}

/// Execute a resolved term.
///
/// Reads `bindings` for `input`, `RESULTS`, `_N` and named functions;
/// `define-fn` is the only operator that writes to it.
pub fn solve(
    resolved: &Resolved,
    tools: &dyn DocumentTools,
    bindings: &mut Bindings,
    kb: &mut KnowledgeBase,
    config: &SolverConfig,
) -> SolveResult {
    if let Some(marker) = resolved.marker() {
        tracing::debug!("Solving under constraint {}", marker);
    }
    let mut engine = Engine::new(tools, bindings, kb, config);
    let outcome = engine.eval(resolved.term(), &Env::new());
    let logs = engine.into_logs();
    match outcome {
        Ok(value) => SolveResult {
            success: true,
            value,
            logs,
            error: None,
        },
        Err(e) => {
            tracing::debug!("Solve failed: {}", e);
            SolveResult::failure(e, logs)
        }
    }
}
