//! Compiler - lowers resolved terms to JavaScript for an external sandbox
//!
//! The sandbox is expected to provide the document tools as globals
//! (`grep`, `fuzzy_search`, `text_stats`, `list_symbols`, `get_symbol_body`,
//! `find_references`) plus `input` and the session bindings. Synthesis nodes
//! are synthesized at compile time, so they need a knowledge base.

use crate::resolve::Resolved;
use crate::solver::{DateConvention, SolverConfig};
use crate::synthesis::extractor::JS_HELPERS;
use crate::synthesis::{Coordinator, Extractor, KnowledgeBase, SynthesisKind, SynthesisRequest};
use crate::term::{Literal, SynthesisTarget, Term};
use crate::example::Example;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{0} needs a knowledge base to synthesize at compile time")]
    NeedsKnowledge(&'static str),

    #[error("synthesis failed for {op}: {message}")]
    Synthesis { op: &'static str, message: String },

    #[error("unknown date format '{0}' (expected US, EU or ISO)")]
    UnknownDateFormat(String),

    #[error("unresolved constraint reached the compiler")]
    Unresolved,
}

/// Runtime helpers for compiled queries, on top of [`JS_HELPERS`]
pub const PRELUDE: &str = r#"const __fns = {};
const __line = (v) => (v !== null && typeof v === "object" && typeof v.line === "string" ? v.line : typeof v === "number" ? String(v) : v);
const __arr = (v) => { if (!Array.isArray(v)) throw new TypeError("expected an array"); return v; };
const __cond = (v) => (Array.isArray(v) ? v.length > 0 : __truthy(v));
const __ungroup = (v) => (typeof v === "string" ? v.replace(/\d+(?:,\d+)+/g, (m) => (/^\d{1,3}(?:,\d{3})+$/.test(m) ? m.replace(/,/g, "") : m)) : v);
const __grouped = (s, preferComma) => {
  const t = s.replace(/[\s '_]/g, "");
  if (!/^(?:\d+(?:[.,]\d+)*|[.,]\d+)$/.test(t)) return null;
  const dot = t.lastIndexOf("."), comma = t.lastIndexOf(",");
  let point;
  if (dot < 0 && comma < 0) return Number(t);
  if (dot >= 0 && comma >= 0) point = dot > comma ? "." : ",";
  else {
    const sep = dot >= 0 ? "." : ",";
    const parts = t.split(sep);
    const three = parts[0].length <= 3 && parts.slice(1).every((p) => p.length === 3);
    const grouping = parts.length > 2 ? three : three && (sep === "," ? !preferComma : preferComma);
    point = grouping ? (sep === "." ? "," : ".") : sep;
  }
  const group = point === "." ? "," : ".";
  const at = t.lastIndexOf(point);
  if (t.split(point).length > 2 || (at >= 0 && t.slice(at).includes(group))) return null;
  return Number(t.split(group).join("").replace(point, "."));
};
const __sign = (s) => {
  s = s.trim();
  const m = /^\((.*)\)$/.exec(s);
  if (m) return [true, m[1].trim()];
  if (/^[-−]/.test(s)) return [true, s.slice(1).trim()];
  if (s.startsWith("+")) return [false, s.slice(1).trim()];
  if (s.endsWith("-")) return [true, s.slice(0, -1).trim()];
  return [false, s];
};
const __parseNumber = (v) => {
  if (typeof v === "number") return v;
  if (typeof v !== "string") return null;
  let [neg, s] = __sign(v);
  const pct = s.endsWith("%");
  if (pct) s = s.slice(0, -1).trimEnd();
  const n = /^\d+(?:\.\d+)?[eE][+-]?\d+$/.test(s) ? Number(s) : __grouped(s, false);
  if (n === null || !Number.isFinite(n)) return null;
  const r = pct ? n / 100 : n;
  return neg ? -r : r;
};
const __parseCurrency = (v) => {
  if (typeof v === "number") return v;
  if (typeof v !== "string") return null;
  const [neg, s] = __sign(v);
  const eu = s.includes("€") || /EUR/i.test(s);
  const [inner, digits] = __sign(s.replace(/[$€£¥]|USD|GBP|JPY|CAD|AUD|EUR|CHF/gi, ""));
  const n = __grouped(digits.trim(), eu);
  return n === null ? null : neg !== inner ? -n : n;
};
const __MONTHS = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
const __month = (name) => { const l = name.toLowerCase(); return l.length < 3 ? 0 : __MONTHS.findIndex((m) => l.startsWith(m)) + 1; };
const __iso = (y, m, d) => {
  const days = [31, (y % 4 === 0 && y % 100 !== 0) || y % 400 === 0 ? 29 : 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
  if (m < 1 || m > 12 || d < 1 || d > days[m - 1]) return null;
  return String(y).padStart(4, "0") + "-" + String(m).padStart(2, "0") + "-" + String(d).padStart(2, "0");
};
const __parseDate = (v, convention) => {
  if (typeof v !== "string") return null;
  const s = v.trim();
  let m;
  if ((m = /^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T ].*)?$/.exec(s))) return __iso(+m[1], +m[2], +m[3]);
  if ((m = /^(\d{1,2})([/.-])(\d{1,2})[/.-](\d{4})$/.exec(s))) {
    const a = +m[1], b = +m[3];
    const dayFirst = m[2] === "." || a > 12 ? true : b > 12 ? false : convention === "EU";
    return dayFirst ? __iso(+m[4], b, a) : __iso(+m[4], a, b);
  }
  if ((m = /^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$/.exec(s))) return __iso(+m[3], __month(m[1]), +m[2]);
  if ((m = /^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\.?,?\s+(\d{4})$/.exec(s))) return __iso(+m[3], __month(m[2]), +m[1]);
  return null;
};
const __or = (v, f) => (v === null ? f() : v);
const __sum = (xs) => __arr(xs).reduce((acc, x) => {
  if (x === null) return acc;
  const n = typeof x === "number" ? x : __parseNumber(x);
  if (n === null) throw new TypeError("sum expects numbers");
  return acc + n;
}, 0);
const __plus = (a, b) => { if (typeof a !== "number" || typeof b !== "number") throw new TypeError("add expects numbers"); return a + b; };
const __classify = (f, v) => (Array.isArray(v) ? v.map((x) => f(__line(x))) : f(__line(v)));
const __apply = (name, v) => { const f = __fns[name]; if (typeof f !== "function") throw new Error("no function named '" + name + "'"); return f(v); };
const __symbolName = (v) => (v !== null && typeof v === "object" && typeof v.name === "string" ? v.name : __line(v));
"#;

/// Lowers resolved terms to JavaScript expressions.
pub struct Compiler<'a> {
    kb: Option<&'a mut KnowledgeBase>,
    config: SolverConfig,
}

impl Compiler<'static> {
    /// A compiler without synthesis; synthesis nodes fail to compile.
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            kb: None,
            config: config.clone(),
        }
    }
}

impl<'a> Compiler<'a> {
    pub fn with_knowledge(kb: &'a mut KnowledgeBase, config: &SolverConfig) -> Self {
        Self {
            kb: Some(kb),
            config: config.clone(),
        }
    }

    /// A JavaScript expression computing the query's result
    pub fn compile(&mut self, resolved: &Resolved) -> Result<String, CompileError> {
        self.emit(resolved.term())
    }

    /// A self-contained script assigning the result to `const result`
    pub fn compile_program(&mut self, resolved: &Resolved) -> Result<String, CompileError> {
        let expr = self.compile(resolved)?;
        Ok(format!("{}{}const result = {};\n", JS_HELPERS, PRELUDE, expr))
    }

    fn emit(&mut self, term: &Term) -> Result<String, CompileError> {
        Ok(match term {
            Term::Input => "input".to_string(),
            Term::Lit(literal) => literal_js(literal),

            Term::Grep { pattern } => format!("grep({})", js_str(pattern)),
            Term::FuzzySearch { query, limit } => format!(
                "fuzzy_search({}, {})",
                js_str(query),
                limit.unwrap_or(self.config.fuzzy_limit)
            ),
            Term::CorpusStats => "text_stats()".to_string(),

            Term::Filter { collection, predicate } => format!(
                "__arr({}).filter((__v) => __cond(({})(__v)))",
                self.emit(collection)?,
                self.emit(predicate)?
            ),
            Term::Map { collection, transform } => format!(
                "__arr({}).map((__v) => ({})(__v))",
                self.emit(collection)?,
                self.emit(transform)?
            ),
            Term::Reduce { collection, init, reducer } => format!(
                "__arr({}).reduce((__a, __v) => ({})(__a)(__v), {})",
                self.emit(collection)?,
                self.emit(reducer)?,
                self.emit(init)?
            ),
            Term::Sum(inner) => format!("__sum({})", self.emit(inner)?),
            Term::Count(inner) => format!("__arr({}).length", self.emit(inner)?),

            Term::Match { text, pattern, group } => {
                format!("__match(__line({}), {}, {})", self.emit(text)?, js_str(pattern), group)
            }
            Term::Replace { text, pattern, replacement } => format!(
                "__replace(__line({}), {}, {})",
                self.emit(text)?,
                js_str(pattern),
                js_str(replacement)
            ),
            Term::Split { text, delimiter, index } => match index {
                Some(i) => format!("__split(__line({}), {}, {})", self.emit(text)?, js_str(delimiter), i),
                None => format!("__split(__line({}), {})", self.emit(text)?, js_str(delimiter)),
            },

            Term::ParseInt(inner) => format!("__parseInt(__ungroup(__line({})))", self.emit(inner)?),
            Term::ParseFloat(inner) => format!("__parseFloat(__ungroup(__line({})))", self.emit(inner)?),
            Term::ParseNumber { value, examples } => {
                let closed = "__parseNumber(__v)".to_string();
                self.coercion(value, closed, examples.as_deref())?
            }
            Term::ParseCurrency { value, examples } => {
                let closed = "__parseCurrency(__v)".to_string();
                self.coercion(value, closed, examples.as_deref())?
            }
            Term::ParseDate { value, format, examples } => {
                let convention = match format {
                    Some(f) => f
                        .parse::<DateConvention>()
                        .map_err(|_| CompileError::UnknownDateFormat(f.clone()))?,
                    None => self.config.date_convention,
                };
                let closed = format!("__parseDate(__v, {})", js_str(convention.as_str()));
                self.coercion(value, closed, examples.as_deref())?
            }

            Term::Add(a, b) => format!("__plus({}, {})", self.emit(a)?, self.emit(b)?),
            Term::If { cond, then, otherwise } => format!(
                "(__cond({}) ? {} : {})",
                self.emit(cond)?,
                self.emit(then)?,
                self.emit(otherwise)?
            ),

            Term::Classify { value, examples } => {
                let classifier = self
                    .coordinator("classify")?
                    .classify(examples)
                    .map_err(|e| CompileError::Synthesis {
                        op: "classify",
                        message: e.to_string(),
                    })?;
                format!("__classify({}, {})", classifier.to_js_function(), self.emit(value)?)
            }
            Term::Synthesize { target, examples } => match target {
                SynthesisTarget::Extractor => on_line(&self.extractor("synthesize", SynthesisKind::Extractor, examples)?),
                SynthesisTarget::Regex => {
                    let result = self
                        .coordinator("synthesize")?
                        .synthesize(&SynthesisRequest::new(SynthesisKind::Regex, examples.clone()));
                    match result.pattern {
                        Some(pattern) if result.success => js_str(&pattern),
                        _ => {
                            return Err(CompileError::Synthesis {
                                op: "synthesize",
                                message: result.error.unwrap_or_default(),
                            });
                        }
                    }
                }
            },
            Term::Predicate { examples } => {
                let classifier = self
                    .coordinator("predicate")?
                    .predicate(examples)
                    .map_err(|e| CompileError::Synthesis {
                        op: "predicate",
                        message: e.to_string(),
                    })?;
                format!("((__v) => ({})(__line(__v)))", classifier.to_js_function())
            }
            Term::DefineFn { name, examples } => {
                let function = on_line(&self.extractor("define-fn", SynthesisKind::Extractor, examples)?);
                format!("(__fns[{}] = {})", js_str(name), function)
            }
            Term::ApplyFn { name, arg } => format!("__apply({}, {})", js_str(name), self.emit(arg)?),

            Term::ListSymbols { kind } => match kind {
                Some(kind) => format!("list_symbols({})", js_str(kind)),
                None => "list_symbols(null)".to_string(),
            },
            Term::GetSymbolBody { name } => format!("get_symbol_body(__symbolName({}))", self.emit(name)?),
            Term::FindReferences { name } => format!("find_references({})", js_str(name)),

            Term::Var(name) => identifier(name),
            Term::App { func, arg } => format!("({})({})", self.emit(func)?, self.emit(arg)?),
            Term::Lambda { param, body } => format!("(({}) => {})", identifier(param), self.emit(body)?),

            Term::Constrained { .. } => return Err(CompileError::Unresolved),
        })
    }

    fn coordinator(&mut self, op: &'static str) -> Result<Coordinator<'_>, CompileError> {
        let kb = self.kb.as_deref_mut().ok_or(CompileError::NeedsKnowledge(op))?;
        Ok(Coordinator::new(kb, &self.config.synthesis))
    }

    fn extractor(&mut self, op: &'static str, kind: SynthesisKind, examples: &[Example]) -> Result<Extractor, CompileError> {
        let result = self
            .coordinator(op)?
            .synthesize(&SynthesisRequest::new(kind, examples.to_vec()));
        match result.extractor() {
            Some(extractor) if result.success => Ok(extractor.clone()),
            _ => Err(CompileError::Synthesis {
                op,
                message: result.error.clone().unwrap_or_default(),
            }),
        }
    }

    /// Closed-form coercion of `value` (bound to `__v` in `closed`), falling
    /// back to a converter synthesized from `examples` when there are any.
    fn coercion(&mut self, value: &Term, closed: String, examples: Option<&[Example]>) -> Result<String, CompileError> {
        let value = self.emit(value)?;
        let body = match examples {
            Some(examples) => {
                let converter = self.extractor("coercion", SynthesisKind::Transformer, examples)?;
                format!("__or({}, () => ({})(__v))", closed, converter.to_js_function())
            }
            None => closed,
        };
        Ok(format!("((__v) => {})(__line({}))", body, value))
    }
}

/// Synthesized extractors read text, so hits are unwrapped to their line.
fn on_line(extractor: &Extractor) -> String {
    format!("((__v) => ({})(__line(__v)))", extractor.to_js_function())
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn literal_js(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Number(n) => crate::solver::value::format_number(*n),
        Literal::Str(s) => js_str(s),
    }
}

/// Query identifiers may contain characters JavaScript rejects (`x-1`);
/// those are escaped as `$` plus their hex code point.
fn identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let valid = c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit());
        if valid {
            out.push(c);
        } else {
            out.push_str(&format!("${:x}", c as u32));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::syntax::parse;

    fn compile(source: &str) -> Result<String, CompileError> {
        Compiler::new(&SolverConfig::default()).compile(&resolve(&parse(source).unwrap()))
    }

    #[test]
    fn test_compile_count_of_grep() {
        assert_eq!(compile(r#"(count (grep "ERROR"))"#).unwrap(), r#"__arr(grep("ERROR")).length"#);
    }

    #[test]
    fn test_compile_lambda_map() {
        let js = compile(r#"(sum (map (grep "SALES") (lambda x (parseFloat (match x "[0-9,]+" 0)))))"#).unwrap();
        assert_eq!(
            js,
            r#"__sum(__arr(grep("SALES")).map((__v) => (((x) => __parseFloat(__ungroup(__line(__match(__line(x), "[0-9,]+", 0))))))(__v)))"#
        );
    }

    #[test]
    fn test_constraints_are_gone_after_resolution() {
        let js = compile(r#"[Σ⚡μ] ⊗ (count (grep "x"))"#).unwrap();
        assert_eq!(js, r#"__arr(grep("x")).length"#);
    }

    #[test]
    fn test_identifiers_are_escaped() {
        assert_eq!(identifier("x-1"), "x$2d1");
        assert_eq!(identifier("RESULTS"), "RESULTS");
    }

    #[test]
    fn test_synthesis_needs_knowledge() {
        let err = compile(r#"(synthesize :examples [("$1" 1) ("$2" 2)])"#).unwrap_err();
        assert_eq!(err, CompileError::NeedsKnowledge("synthesize"));
        // Closed-form coercions compile without one.
        assert!(compile(r#"(parseCurrency "€1.234,56")"#).unwrap().contains("__parseCurrency"));
    }

    #[test]
    fn test_synthesis_with_knowledge_emits_extractor() {
        let mut kb = KnowledgeBase::new();
        let config = SolverConfig::default();
        let resolved = resolve(&parse(r#"(define-fn "price" :examples [("$1,234" 1234) ("$500" 500)])"#).unwrap());
        let js = Compiler::with_knowledge(&mut kb, &config).compile(&resolved).unwrap();
        assert!(js.starts_with(r#"(__fns["price"] = ((__v) => (((input) =>"#));
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_program_has_helpers_and_result() {
        let resolved = resolve(&parse(r#"(text_stats)"#).unwrap());
        let program = Compiler::new(&SolverConfig::default()).compile_program(&resolved).unwrap();
        assert!(program.starts_with("const __text"));
        assert!(program.contains("const __fns = {};"));
        assert!(program.ends_with("const result = text_stats();\n"));
    }
}
