//! Cross-turn bindings of one session
//!
//! Every turn appends `_N` and rebinds `RESULTS`; `define-fn` adds named
//! functions. The caller owns the map and threads it through each solve.

use super::value::{Function, Value};
use crate::infer::{Type, TypeEnv};
use std::collections::BTreeMap;

/// Name that always refers to the latest turn's result
pub const RESULTS: &str = "RESULTS";

/// Name of the implicit input
pub const INPUT: &str = "input";

#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
    turn: usize,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings whose implicit input is `input`
    pub fn with_input(input: impl Into<String>) -> Self {
        let mut bindings = Self::new();
        bindings.set_input(Value::Str(input.into()));
        bindings
    }

    pub fn set_input(&mut self, value: Value) {
        self.values.insert(INPUT.to_string(), value);
    }

    pub fn input(&self) -> Option<&Value> {
        self.values.get(INPUT)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Bind a named function for `apply-fn`
    pub fn define(&mut self, name: impl Into<String>, function: Function) {
        self.insert(name, Value::function(function));
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        match self.values.get(name) {
            Some(Value::Function(f)) => Some(f.as_ref()),
            _ => None,
        }
    }

    /// Record a turn's result as `RESULTS` and `_N`; returns `N`.
    pub fn push_result(&mut self, value: Value) -> usize {
        self.turn += 1;
        self.values.insert(format!("_{}", self.turn), value.clone());
        self.values.insert(RESULTS.to_string(), value);
        self.turn
    }

    /// Number of recorded turns
    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Types of every bound name, for the inferencer
    pub fn type_env(&self) -> TypeEnv {
        let mut env = TypeEnv::new();
        for (name, value) in &self.values {
            env.insert(name.clone(), value.type_of());
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_result_appends_turns() {
        let mut bindings = Bindings::new();
        assert_eq!(bindings.push_result(Value::Number(1.0)), 1);
        assert_eq!(bindings.push_result(Value::Number(2.0)), 2);
        assert_eq!(bindings.get("_1"), Some(&Value::Number(1.0)));
        assert_eq!(bindings.get(RESULTS), Some(&Value::Number(2.0)));
        assert_eq!(bindings.turn(), 2);
    }

    #[test]
    fn test_type_env_reflects_values() {
        let mut bindings = Bindings::with_input("doc");
        bindings.push_result(Value::Array(vec![Value::Str("a".into())]));
        let env = bindings.type_env();
        assert_eq!(env.get(INPUT), Some(&Type::Str));
        assert_eq!(env.get(RESULTS), Some(&Type::array(Type::Str)));
    }
}
