//! Type Inferencer - static, non-executing shape prediction
//!
//! Inference is a hint. It only rejects a term when execution would fail
//! as well: a definite shape mismatch or an unbound variable. Everything it
//! cannot pin down is `Any`.

use crate::example::{Example, Output};
use crate::term::{Literal, SynthesisTarget, Term};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum Type {
    Any,
    Null,
    Bool,
    Number,
    Str,
    Array(Box<Type>),
    /// A grep hit
    Match,
    /// A fuzzy-search hit
    FuzzyMatch,
    Stats,
    Symbol,
    Function(Box<Type>, Box<Type>),
}

impl Type {
    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn function(arg: Type, result: Type) -> Self {
        Type::Function(Box::new(arg), Box::new(result))
    }

    /// Values that string operators accept (hits are read through their line)
    fn is_textual(&self) -> bool {
        !matches!(self, Type::Bool | Type::Array(_) | Type::Stats | Type::Function(..))
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Type::Any | Type::Number)
    }

    fn is_collection(&self) -> bool {
        matches!(self, Type::Any | Type::Array(_))
    }

    fn is_callable(&self) -> bool {
        matches!(self, Type::Any | Type::Function(..))
    }

    /// Element type of a collection (`Any` when unknown)
    fn element(&self) -> Type {
        match self {
            Type::Array(elem) => (**elem).clone(),
            _ => Type::Any,
        }
    }

    /// The most specific type covering both branches of a conditional
    pub fn join(&self, other: &Type) -> Type {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Type::Array(a), Type::Array(b)) => Type::array(a.join(b)),
            _ => Type::Any,
        }
    }

    pub fn of_output(output: &Output) -> Type {
        match output {
            Output::Null => Type::Null,
            Output::Bool(_) => Type::Bool,
            Output::Number(_) => Type::Number,
            Output::Str(_) => Type::Str,
            Output::Array(items) => Type::array(
                items
                    .iter()
                    .map(Type::of_output)
                    .reduce(|a, b| a.join(&b))
                    .unwrap_or(Type::Any),
            ),
        }
    }

    /// Common type of every example output
    fn of_examples(examples: &[Example]) -> Type {
        examples
            .iter()
            .map(|e| Type::of_output(&e.output))
            .reduce(|a, b| a.join(&b))
            .unwrap_or(Type::Any)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Null => write!(f, "null"),
            Type::Bool => write!(f, "bool"),
            Type::Number => write!(f, "number"),
            Type::Str => write!(f, "string"),
            Type::Array(elem) => write!(f, "array<{}>", elem),
            Type::Match => write!(f, "match"),
            Type::FuzzyMatch => write!(f, "fuzzy-match"),
            Type::Stats => write!(f, "stats"),
            Type::Symbol => write!(f, "symbol"),
            Type::Function(arg, result) => write!(f, "({} -> {})", arg, result),
        }
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

/// A definite type error found without executing the term.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} in {term}")]
pub struct InferenceError {
    pub message: String,
    /// The offending sub-term, printed
    pub term: String,
}

impl InferenceError {
    fn new(message: impl Into<String>, term: &Term) -> Self {
        Self {
            message: message.into(),
            term: crate::syntax::print(term),
        }
    }
}

/// Types of the names visible to a term
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    vars: HashMap<String, Type>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: Type) {
        self.vars.insert(name.into(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.vars.get(name)
    }

    /// A copy of this environment with `name` bound to `ty`
    fn extend(&self, name: &str, ty: Type) -> TypeEnv {
        let mut env = self.clone();
        env.insert(name, ty);
        env
    }
}

/// Predict the shape of `term`'s result.
pub fn infer(term: &Term, env: &TypeEnv) -> Result<Type, InferenceError> {
    match term {
        Term::Input => Ok(env.get("input").cloned().unwrap_or(Type::Str)),
        Term::Lit(literal) => Ok(match literal {
            Literal::Null => Type::Null,
            Literal::Bool(_) => Type::Bool,
            Literal::Number(_) => Type::Number,
            Literal::Str(_) => Type::Str,
        }),
        Term::Grep { .. } => Ok(Type::array(Type::Any)),
        Term::FuzzySearch { .. } => Ok(Type::array(Type::FuzzyMatch)),
        Term::CorpusStats => Ok(Type::Stats),

        Term::Filter { collection, predicate } => {
            let coll = collection_of(collection, env)?;
            apply_to(predicate, coll.element(), env)?;
            Ok(coll)
        }
        Term::Map { collection, transform } => {
            let coll = collection_of(collection, env)?;
            let result = apply_to(transform, coll.element(), env)?;
            Ok(Type::array(result))
        }
        Term::Reduce { collection, init, reducer } => {
            let coll = collection_of(collection, env)?;
            let init_ty = infer(init, env)?;
            match &**reducer {
                Term::Lambda { param: acc, body } => match &**body {
                    Term::Lambda { param: item, body } => {
                        let inner = env.extend(acc, init_ty.clone()).extend(item, coll.element());
                        Ok(init_ty.join(&infer(body, &inner)?))
                    }
                    _ => {
                        infer(body, &env.extend(acc, init_ty))?;
                        Ok(Type::Any)
                    }
                },
                other => {
                    require(other, env, Type::is_callable, "reducer must be a function")?;
                    Ok(Type::Any)
                }
            }
        }
        Term::Sum(inner) | Term::Count(inner) => {
            collection_of(inner, env)?;
            Ok(Type::Number)
        }

        Term::Match { text, .. } | Term::Replace { text, .. } => {
            textual(text, env)?;
            Ok(Type::Str)
        }
        Term::Split { text, index, .. } => {
            textual(text, env)?;
            Ok(if index.is_some() { Type::Str } else { Type::array(Type::Str) })
        }

        Term::ParseInt(value)
        | Term::ParseFloat(value)
        | Term::ParseNumber { value, .. }
        | Term::ParseCurrency { value, .. } => {
            textual(value, env)?;
            Ok(Type::Number)
        }
        Term::ParseDate { value, .. } => {
            textual(value, env)?;
            Ok(Type::Str)
        }

        Term::Add(a, b) => {
            require(a, env, Type::is_numeric, "add expects numbers")?;
            require(b, env, Type::is_numeric, "add expects numbers")?;
            Ok(Type::Number)
        }
        Term::If { cond, then, otherwise } => {
            infer(cond, env)?;
            Ok(infer(then, env)?.join(&infer(otherwise, env)?))
        }

        Term::Classify { value, examples } => {
            let label = Type::of_examples(examples);
            // Arrays are classified element-wise.
            match infer(value, env)? {
                Type::Any => Ok(Type::Any),
                Type::Array(elem) if elem.is_textual() => Ok(Type::array(label)),
                ty if ty.is_textual() => Ok(label),
                found => Err(InferenceError::new(format!("expected text or an array of text, found {}", found), value)),
            }
        }
        Term::Synthesize { target, examples } => Ok(match target {
            SynthesisTarget::Regex => Type::Str,
            SynthesisTarget::Extractor => Type::function(Type::Str, Type::of_examples(examples)),
        }),
        Term::Predicate { .. } => Ok(Type::function(Type::Str, Type::Bool)),
        Term::DefineFn { examples, .. } => Ok(Type::function(Type::Str, Type::of_examples(examples))),
        Term::ApplyFn { name, arg } => {
            textual(arg, env)?;
            // A function may be defined earlier in the same query.
            Ok(match env.get(name) {
                Some(Type::Function(_, result)) => (**result).clone(),
                _ => Type::Any,
            })
        }

        Term::ListSymbols { .. } => Ok(Type::array(Type::Symbol)),
        Term::GetSymbolBody { name } => {
            textual(name, env)?;
            Ok(Type::Str)
        }
        Term::FindReferences { .. } => Ok(Type::array(Type::Match)),

        Term::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| InferenceError::new(format!("unbound variable '{}'", name), term)),
        Term::App { func, arg } => {
            let arg_ty = infer(arg, env)?;
            apply_to(func, arg_ty, env)
        }
        Term::Lambda { param, body } => {
            let result = infer(body, &env.extend(param, Type::Any))?;
            Ok(Type::function(Type::Any, result))
        }
        Term::Constrained { term, .. } => infer(term, env),
    }
}

/// Result type of applying `func` to an argument of type `arg`
fn apply_to(func: &Term, arg: Type, env: &TypeEnv) -> Result<Type, InferenceError> {
    match func {
        Term::Lambda { param, body } => infer(body, &env.extend(param, arg)),
        Term::Constrained { term, .. } => apply_to(term, arg, env),
        other => match infer(other, env)? {
            Type::Function(_, result) => Ok(*result),
            Type::Any => Ok(Type::Any),
            found => Err(InferenceError::new(format!("expected a function, found {}", found), other)),
        },
    }
}

fn require(term: &Term, env: &TypeEnv, accepts: fn(&Type) -> bool, message: &str) -> Result<Type, InferenceError> {
    let ty = infer(term, env)?;
    if accepts(&ty) {
        Ok(ty)
    } else {
        Err(InferenceError::new(format!("{}, found {}", message, ty), term))
    }
}

fn collection_of(term: &Term, env: &TypeEnv) -> Result<Type, InferenceError> {
    require(term, env, Type::is_collection, "expected a collection")
}

fn textual(term: &Term, env: &TypeEnv) -> Result<Type, InferenceError> {
    require(term, env, Type::is_textual, "expected text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn infer_str(source: &str) -> Result<Type, InferenceError> {
        infer(&parse(source).unwrap(), &TypeEnv::new())
    }

    #[test]
    fn test_basic_shapes() {
        assert_eq!(infer_str(r#"(grep "x")"#).unwrap(), Type::array(Type::Any));
        assert_eq!(infer_str(r#"(count (grep "x"))"#).unwrap(), Type::Number);
        assert_eq!(infer_str("(add 1 2)").unwrap(), Type::Number);
        assert_eq!(infer_str("(text_stats)").unwrap(), Type::Stats);
    }

    #[test]
    fn test_map_threads_element_type() {
        let ty = infer_str(r#"(map (fuzzy_search "x") (lambda h (parseFloat h)))"#).unwrap();
        assert_eq!(ty, Type::array(Type::Number));
    }

    #[test]
    fn test_if_joins_branches() {
        assert_eq!(infer_str("(if true 1 2)").unwrap(), Type::Number);
        assert_eq!(infer_str(r#"(if true 1 "a")"#).unwrap(), Type::Any);
    }

    #[test]
    fn test_lambda_is_function() {
        assert_eq!(infer_str("(lambda x 1)").unwrap(), Type::function(Type::Any, Type::Number));
    }

    #[test]
    fn test_reduce_uses_init_type() {
        let ty = infer_str(r#"(reduce (grep "x") 0 (lambda acc (lambda l (add acc 1))))"#).unwrap();
        assert_eq!(ty, Type::Number);
    }

    #[test]
    fn test_rejects_definite_mismatch() {
        let err = infer_str(r#"(count "abc")"#).unwrap_err();
        assert!(err.message.contains("expected a collection"));
        assert!(infer_str(r#"(add "a" 1)"#).is_err());
        assert!(infer_str("(match (text_stats) \"a\" 0)").is_err());
        assert!(infer_str("(app 1 2)").is_err());
    }

    #[test]
    fn test_rejects_unbound_variable() {
        let err = infer_str("(count RESULTS)").unwrap_err();
        assert!(err.message.contains("unbound variable 'RESULTS'"));
        let mut env = TypeEnv::new();
        env.insert("RESULTS", Type::array(Type::Any));
        assert_eq!(infer(&parse("(count RESULTS)").unwrap(), &env).unwrap(), Type::Number);
    }

    #[test]
    fn test_synthesis_shapes() {
        assert_eq!(
            infer_str(r#"(synthesize :examples [("$1" 1) ("$2" 2)])"#).unwrap(),
            Type::function(Type::Str, Type::Number)
        );
        assert_eq!(infer_str(r#"(synthesize :type "regex" :examples [("a" true)])"#).unwrap(), Type::Str);
        assert_eq!(
            infer_str(r#"(classify "x" :examples [("a" "low") ("b" "high")])"#).unwrap(),
            Type::Str
        );
    }

    #[test]
    fn test_classify_over_arrays_yields_array_of_labels() {
        let examples = r#":examples [("ERROR x" "bad") ("INFO y" "good")]"#;
        assert_eq!(
            infer_str(&format!(r#"(classify (grep "ERROR|INFO") {})"#, examples)).unwrap(),
            Type::array(Type::Str)
        );
        assert_eq!(
            infer_str(&format!(r#"(classify (split "a,b" ",") {})"#, examples)).unwrap(),
            Type::array(Type::Str)
        );
        assert!(infer_str(&format!("(classify (text_stats) {})", examples)).is_err());
    }

    #[test]
    fn test_unknown_apply_fn_is_any() {
        assert_eq!(infer_str(r#"(apply-fn "later" "x")"#).unwrap(), Type::Any);
    }
}
