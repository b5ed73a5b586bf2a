//! Big-step evaluator
//!
//! One exhaustive match over [`Term`]. Document tools run eagerly; synthesis
//! goes through a [`Coordinator`] borrowed from the session's knowledge base.

use super::bindings::Bindings;
use super::coerce::{self, DateConvention};
use super::value::{Env, Function, Value};
use super::{RuntimeError, SolverConfig};
use crate::example::Example;
use crate::synthesis::extractor::cached_regex;
use crate::synthesis::{Coordinator, Extractor, KnowledgeBase, SynthesisKind, SynthesisRequest};
use crate::term::{SynthesisTarget, Term};
use crate::tools::DocumentTools;
use std::borrow::Cow;

type Eval = Result<Value, RuntimeError>;

pub struct Engine<'a> {
    tools: &'a dyn DocumentTools,
    bindings: &'a mut Bindings,
    kb: &'a mut KnowledgeBase,
    config: &'a SolverConfig,
    logs: Vec<String>,
}

impl<'a> Engine<'a> {
    pub fn new(
        tools: &'a dyn DocumentTools,
        bindings: &'a mut Bindings,
        kb: &'a mut KnowledgeBase,
        config: &'a SolverConfig,
    ) -> Self {
        Self {
            tools,
            bindings,
            kb,
            config,
            logs: Vec::new(),
        }
    }

    pub fn into_logs(self) -> Vec<String> {
        self.logs
    }

    fn log(&mut self, message: String) {
        tracing::debug!("{}", message);
        self.logs.push(message);
    }

    fn coordinator(&mut self) -> Coordinator<'_> {
        Coordinator::new(self.kb, &self.config.synthesis)
    }

    pub fn eval(&mut self, term: &Term, env: &Env) -> Eval {
        match term {
            Term::Input => self.bindings.input().cloned().ok_or(RuntimeError::NoInput),
            Term::Lit(literal) => Ok(Value::from_literal(literal)),

            // ========== Document tools ==========
            Term::Grep { pattern } => {
                let hits = self.tools.grep(pattern)?;
                self.log(format!("grep \"{}\": {} match(es)", pattern, hits.len()));
                Ok(Value::Array(hits.into_iter().map(Value::Match).collect()))
            }
            Term::FuzzySearch { query, limit } => {
                let limit = limit.unwrap_or(self.config.fuzzy_limit);
                let hits = self.tools.fuzzy_search(query, limit);
                self.log(format!("fuzzy_search \"{}\": {} hit(s)", query, hits.len()));
                Ok(Value::Array(hits.into_iter().map(Value::Fuzzy).collect()))
            }
            Term::CorpusStats => Ok(Value::Stats(self.tools.corpus_stats())),

            // ========== Collections ==========
            Term::Filter { collection, predicate } => {
                let items = self.array("filter", collection, env)?;
                let predicate = self.eval(predicate, env)?;
                let mut kept = Vec::new();
                for item in items {
                    if self.apply("filter", &predicate, item.clone())?.truthy() {
                        kept.push(item);
                    }
                }
                self.log(format!("filter: kept {} item(s)", kept.len()));
                Ok(Value::Array(kept))
            }
            Term::Map { collection, transform } => {
                let items = self.array("map", collection, env)?;
                let transform = self.eval(transform, env)?;
                let mapped = items
                    .into_iter()
                    .map(|item| self.apply("map", &transform, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(mapped))
            }
            Term::Reduce { collection, init, reducer } => {
                let items = self.array("reduce", collection, env)?;
                let mut acc = self.eval(init, env)?;
                let reducer = self.eval(reducer, env)?;
                for item in items {
                    let partial = self.apply("reduce", &reducer, acc)?;
                    acc = self.apply("reduce", &partial, item)?;
                }
                Ok(acc)
            }
            Term::Sum(inner) => {
                let items = self.array("sum", inner, env)?;
                let mut total = 0.0;
                for item in &items {
                    total += match item {
                        Value::Null => continue,
                        Value::Number(n) => *n,
                        Value::Str(s) => coerce::parse_number(s).ok_or(RuntimeError::mismatch("sum", "numbers", item))?,
                        other => return Err(RuntimeError::mismatch("sum", "numbers", other)),
                    };
                }
                Ok(Value::Number(total))
            }
            Term::Count(inner) => {
                let items = self.array("count", inner, env)?;
                Ok(Value::Number(items.len() as f64))
            }

            // ========== Strings ==========
            Term::Match { text, pattern, group } => {
                let value = self.eval(text, env)?;
                let Some(text) = textual("match", &value)? else {
                    return Ok(Value::Null);
                };
                let re = compile(pattern)?;
                Ok(re
                    .captures(&text)
                    .and_then(|caps| caps.get(*group))
                    .map(|m| Value::Str(m.as_str().to_string()))
                    .unwrap_or(Value::Null))
            }
            Term::Replace { text, pattern, replacement } => {
                let value = self.eval(text, env)?;
                let Some(text) = textual("replace", &value)? else {
                    return Ok(Value::Null);
                };
                let re = compile(pattern)?;
                Ok(Value::Str(re.replace_all(&text, replacement.as_str()).into_owned()))
            }
            Term::Split { text, delimiter, index } => {
                let value = self.eval(text, env)?;
                let Some(text) = textual("split", &value)? else {
                    return Ok(Value::Null);
                };
                let parts: Vec<&str> = if delimiter.is_empty() {
                    vec![&*text]
                } else {
                    text.split(delimiter.as_str()).collect()
                };
                Ok(match index {
                    Some(i) => parts.get(*i).map(|p| Value::Str(p.to_string())).unwrap_or(Value::Null),
                    None => Value::Array(parts.into_iter().map(|p| Value::Str(p.to_string())).collect()),
                })
            }

            // ========== Coercions ==========
            Term::ParseInt(inner) => {
                let value = self.eval(inner, env)?;
                match value {
                    Value::Number(n) => Ok(Value::Number(n.trunc())),
                    other => Ok(number_or_null(textual("parseInt", &other)?.and_then(|s| coerce::parse_int(&s)))),
                }
            }
            Term::ParseFloat(inner) => {
                let value = self.eval(inner, env)?;
                match value {
                    Value::Number(n) => Ok(Value::Number(n)),
                    other => Ok(number_or_null(textual("parseFloat", &other)?.and_then(|s| coerce::parse_float(&s)))),
                }
            }
            Term::ParseNumber { value, examples } => {
                let value = self.eval(value, env)?;
                if let Value::Number(n) = value {
                    return Ok(Value::Number(n));
                }
                let Some(text) = textual("parseNumber", &value)? else {
                    return Ok(Value::Null);
                };
                match coerce::parse_number(&text) {
                    Some(n) => Ok(Value::Number(n)),
                    None => self.transform("parseNumber", &text, examples.as_deref()),
                }
            }
            Term::ParseCurrency { value, examples } => {
                let value = self.eval(value, env)?;
                if let Value::Number(n) = value {
                    return Ok(Value::Number(n));
                }
                let Some(text) = textual("parseCurrency", &value)? else {
                    return Ok(Value::Null);
                };
                match coerce::parse_currency(&text) {
                    Some(n) => Ok(Value::Number(n)),
                    None => self.transform("parseCurrency", &text, examples.as_deref()),
                }
            }
            Term::ParseDate { value, format, examples } => {
                let convention = match format {
                    Some(f) => f.parse::<DateConvention>()?,
                    None => self.config.date_convention,
                };
                let value = self.eval(value, env)?;
                let Some(text) = textual("parseDate", &value)? else {
                    return Ok(Value::Null);
                };
                match coerce::parse_date(&text, convention) {
                    Some(date) => Ok(Value::Str(date)),
                    None => self.transform("parseDate", &text, examples.as_deref()),
                }
            }

            Term::Add(a, b) => {
                let a = self.eval(a, env)?;
                let b = self.eval(b, env)?;
                match (&a, &b) {
                    (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
                    (Value::Number(_), other) | (other, _) => Err(RuntimeError::mismatch("add", "numbers", other)),
                }
            }
            Term::If { cond, then, otherwise } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }

            // ========== Synthesis ==========
            Term::Classify { value, examples } => {
                let classifier = self
                    .coordinator()
                    .classify(examples)
                    .map_err(|e| RuntimeError::Synthesis(e.to_string()))?;
                self.log(format!("classify: trained {} rule(s)", classifier.rules.len()));
                let function = Value::function(Function::Classifier(classifier));
                match self.eval(value, env)? {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|item| self.apply("classify", &function, item))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array),
                    single => self.apply("classify", &function, single),
                }
            }
            Term::Synthesize { target, examples } => match target {
                SynthesisTarget::Extractor => {
                    let extractor = self.synthesize_extractor(SynthesisKind::Extractor, examples)?;
                    Ok(Value::function(Function::Extractor(extractor)))
                }
                SynthesisTarget::Regex => {
                    let result = self
                        .coordinator()
                        .synthesize(&SynthesisRequest::new(SynthesisKind::Regex, examples.clone()));
                    self.logs.extend(result.logs);
                    match result.pattern {
                        Some(pattern) if result.success => Ok(Value::Str(pattern)),
                        _ => Err(RuntimeError::Synthesis(result.error.unwrap_or_default())),
                    }
                }
            },
            Term::Predicate { examples } => {
                let classifier = self
                    .coordinator()
                    .predicate(examples)
                    .map_err(|e| RuntimeError::Synthesis(e.to_string()))?;
                Ok(Value::function(Function::Classifier(classifier)))
            }
            Term::DefineFn { name, examples } => {
                let extractor = self.synthesize_extractor(SynthesisKind::Extractor, examples)?;
                self.log(format!("define-fn {}: {}", name, extractor));
                self.bindings.define(name.clone(), Function::Extractor(extractor.clone()));
                Ok(Value::function(Function::Extractor(extractor)))
            }
            Term::ApplyFn { name, arg } => {
                let function = match env.get(name).or_else(|| self.bindings.get(name)) {
                    Some(f @ Value::Function(_)) => f.clone(),
                    _ => return Err(RuntimeError::UnknownFunction(name.clone())),
                };
                let arg = self.eval(arg, env)?;
                self.apply("apply-fn", &function, arg)
            }

            // ========== Symbol index ==========
            Term::ListSymbols { kind } => {
                let symbols = self.tools.list_symbols(kind.as_deref())?;
                self.log(format!("list_symbols: {} symbol(s)", symbols.len()));
                Ok(Value::Array(symbols.into_iter().map(Value::Symbol).collect()))
            }
            Term::GetSymbolBody { name } => {
                let name = match self.eval(name, env)? {
                    Value::Symbol(symbol) => symbol.name,
                    other => textual("get_symbol_body", &other)?
                        .ok_or(RuntimeError::mismatch("get_symbol_body", "a symbol name", &other))?
                        .into_owned(),
                };
                Ok(Value::Str(self.tools.get_symbol_body(&name)?))
            }
            Term::FindReferences { name } => {
                let hits = self.tools.find_references(name)?;
                self.log(format!("find_references \"{}\": {} reference(s)", name, hits.len()));
                Ok(Value::Array(hits.into_iter().map(Value::Match).collect()))
            }

            // ========== Lambda calculus ==========
            Term::Var(name) => env
                .get(name)
                .or_else(|| self.bindings.get(name))
                .cloned()
                .ok_or_else(|| RuntimeError::UnboundVariable(name.clone())),
            Term::App { func, arg } => {
                let func = self.eval(func, env)?;
                let arg = self.eval(arg, env)?;
                self.apply("app", &func, arg)
            }
            Term::Lambda { param, body } => Ok(Value::function(Function::Closure {
                param: param.clone(),
                body: (**body).clone(),
                env: env.clone(),
            })),

            Term::Constrained { .. } => Err(RuntimeError::Unresolved),
        }
    }

    fn array(&mut self, op: &'static str, term: &Term, env: &Env) -> Result<Vec<Value>, RuntimeError> {
        match self.eval(term, env)? {
            Value::Array(items) => Ok(items),
            other => Err(RuntimeError::mismatch(op, "an array", &other)),
        }
    }

    fn apply(&mut self, op: &'static str, func: &Value, arg: Value) -> Eval {
        let Value::Function(function) = func else {
            return Err(RuntimeError::mismatch(op, "a function", func));
        };
        match function.as_ref() {
            Function::Closure { param, body, env } => {
                let mut local = env.clone();
                local.insert(param.clone(), arg);
                self.eval(body, &local)
            }
            Function::Extractor(extractor) => Ok(match textual(op, &arg)? {
                Some(text) => Value::from_output(extractor.eval(&text)),
                None => Value::Null,
            }),
            Function::Classifier(classifier) => Ok(match textual(op, &arg)? {
                Some(text) => Value::from_output(classifier.classify(&text)),
                None => Value::Null,
            }),
        }
    }

    fn synthesize_extractor(&mut self, kind: SynthesisKind, examples: &[Example]) -> Result<Extractor, RuntimeError> {
        let result = self
            .coordinator()
            .synthesize(&SynthesisRequest::new(kind, examples.to_vec()));
        self.logs.extend(result.logs.iter().cloned());
        match result.extractor() {
            Some(extractor) if result.success => Ok(extractor.clone()),
            _ => Err(RuntimeError::Synthesis(result.error.clone().unwrap_or_default())),
        }
    }

    /// Example-driven conversion after the closed forms gave up
    fn transform(&mut self, op: &str, text: &str, examples: Option<&[Example]>) -> Eval {
        let Some(examples) = examples else {
            self.log(format!("{}: could not read \"{}\"", op, text));
            return Ok(Value::Null);
        };
        let converter = self.synthesize_extractor(SynthesisKind::Transformer, examples)?;
        self.log(format!("{}: converted via {}", op, converter));
        Ok(Value::from_output(converter.eval(text)))
    }
}

/// Text of `value` for string operators; `None` propagates null.
fn textual<'v>(op: &'static str, value: &'v Value) -> Result<Option<Cow<'v, str>>, RuntimeError> {
    match value {
        Value::Null => Ok(None),
        other => other
            .text()
            .map(Some)
            .ok_or_else(|| RuntimeError::mismatch(op, "text", other)),
    }
}

fn compile(pattern: &str) -> Result<regex::Regex, RuntimeError> {
    cached_regex(pattern).ok_or_else(|| RuntimeError::InvalidPattern {
        pattern: pattern.to_string(),
        message: regex::Regex::new(pattern)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default(),
    })
}

fn number_or_null(n: Option<f64>) -> Value {
    n.map(Value::Number).unwrap_or(Value::Null)
}
