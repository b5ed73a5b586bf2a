//! Session - one document, its bindings and its knowledge base
//!
//! Each turn runs parse → resolve → infer → solve and records the value as
//! `RESULTS` and `_N`. Sessions share nothing, so two of them never see each
//! other's bindings or synthesized functions.

use crate::config::DocscopeConfig;
use crate::infer::{Type, infer};
use crate::resolve::{Resolved, resolve};
use crate::solver::{Bindings, SolveResult, SolverConfig, Value, solve};
use crate::synthesis::{Coordinator, KnowledgeBase, SynthesisRequest, SynthesisResult};
use crate::syntax::parse;
use crate::tools::Document;
use crate::compile::Compiler;
use crate::Result;

pub struct Session {
    document: Document,
    bindings: Bindings,
    knowledge: KnowledgeBase,
    config: DocscopeConfig,
    solver: SolverConfig,
}

impl Session {
    pub fn new(text: impl Into<String>, config: DocscopeConfig) -> Self {
        let document = Document::new(text);
        let bindings = Bindings::with_input(document.text());
        let solver = config.solver();
        Self {
            document,
            bindings,
            knowledge: KnowledgeBase::new(),
            config,
            solver,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn config(&self) -> &DocscopeConfig {
        &self.config
    }

    /// Parse and resolve without executing.
    pub fn prepare(&self, query: &str) -> Result<Resolved> {
        Ok(resolve(&parse(query)?))
    }

    /// Static type of `query` against the current bindings.
    pub fn check(&self, query: &str) -> Result<Type> {
        let resolved = self.prepare(query)?;
        Ok(infer(resolved.term(), &self.bindings.type_env())?)
    }

    /// Run one turn. Failures come back inside the result; successful values
    /// are recorded as `RESULTS` and `_N`.
    pub fn execute(&mut self, query: &str) -> SolveResult {
        let mut logs = Vec::new();
        let resolved = match self.prepare(query) {
            Ok(resolved) => resolved,
            Err(e) => return SolveResult::failure(e, logs),
        };
        if let Some(marker) = resolved.marker() {
            logs.push(format!("constraint {} ({})", marker, marker.description()));
        }

        match infer(resolved.term(), &self.bindings.type_env()) {
            Ok(ty) => logs.push(format!("inferred type: {}", ty)),
            Err(e) if self.config.strict_inference => {
                return SolveResult::failure(format!("inference: {}", e), logs);
            }
            Err(e) => {
                tracing::warn!("Inference warning: {}", e);
                logs.push(format!("inference warning: {}", e));
            }
        }

        let mut result = solve(
            &resolved,
            &self.document,
            &mut self.bindings,
            &mut self.knowledge,
            &self.solver,
        );
        logs.append(&mut result.logs);
        result.logs = logs;

        if result.success {
            let turn = self.bindings.push_result(result.value.clone());
            result.logs.push(format!("stored as RESULTS and _{}", turn));
            tracing::info!("Turn {} succeeded", turn);
        }
        result
    }

    /// Synthesize through the session's knowledge base.
    pub fn synthesize(&mut self, request: &SynthesisRequest) -> SynthesisResult {
        Coordinator::new(&mut self.knowledge, &self.solver.synthesis).synthesize(request)
    }

    /// Lower `query` to a JavaScript program, synthesizing with the session's
    /// knowledge base where needed.
    pub fn compile(&mut self, query: &str) -> Result<String> {
        let resolved = self.prepare(query)?;
        let mut compiler = Compiler::with_knowledge(&mut self.knowledge, &self.solver);
        Ok(compiler.compile_program(&resolved)?)
    }

    /// Latest recorded result
    pub fn results(&self) -> Option<&Value> {
        self.bindings.get(crate::solver::bindings::RESULTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "ERROR disk full\nINFO started\nERROR network down\n";

    #[test]
    fn test_turns_are_recorded() {
        let mut session = Session::new(LOG, DocscopeConfig::default());
        let first = session.execute(r#"(grep "ERROR")"#);
        assert!(first.success);
        let second = session.execute("(count RESULTS)");
        assert_eq!(second.value, Value::Number(2.0));
        assert_eq!(session.bindings().get("_2"), Some(&Value::Number(2.0)));
        assert_eq!(session.results(), Some(&Value::Number(2.0)));
        assert_eq!(session.execute("(count _1)").value, Value::Number(2.0));
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut session = Session::new(LOG, DocscopeConfig::default());
        let result = session.execute("(grep \"ERROR\"");
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Parse error"));
        assert_eq!(session.bindings().turn(), 0);
    }

    #[test]
    fn test_strict_inference_rejects_early() {
        let config = DocscopeConfig {
            strict_inference: true,
            ..Default::default()
        };
        let mut session = Session::new(LOG, config);
        let result = session.execute(r#"(add "a" 1)"#);
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("inference:"));

        let mut lenient = Session::new(LOG, DocscopeConfig::default());
        let result = lenient.execute(r#"(add "a" 1)"#);
        assert!(result.logs.iter().any(|l| l.starts_with("inference warning")));
        assert_eq!(result.error.as_deref(), Some("add expects numbers, found string"));
    }

    #[test]
    fn test_define_fn_survives_across_turns() {
        let mut session = Session::new("", DocscopeConfig::default());
        assert!(session.execute(r#"(define-fn "price" :examples [("$1,234" 1234) ("$500" 500)])"#).success);
        let applied = session.execute(r#"(apply-fn "price" "$9,999")"#);
        assert_eq!(applied.value, Value::Number(9999.0));
        assert_eq!(session.knowledge().len(), 1);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = Session::new(LOG, DocscopeConfig::default());
        let b = Session::new(LOG, DocscopeConfig::default());
        a.execute(r#"(define-fn "f" :examples [("$1,234" 1234) ("$500" 500)])"#);
        assert!(a.bindings().function("f").is_some());
        assert!(b.bindings().function("f").is_none());
        assert!(b.knowledge().is_empty());
    }

    #[test]
    fn test_compile_uses_session_knowledge() {
        let mut session = Session::new("", DocscopeConfig::default());
        let program = session
            .compile(r#"(map (grep "x") (synthesize :examples [("$1,234" 1234) ("$500" 500)]))"#)
            .unwrap();
        assert!(program.contains("const result = "));
        assert_eq!(session.knowledge().len(), 1);
    }
}
