//! Classifier - labelled examples → first-match rule list
//!
//! The most frequent label is the default. Every other label gets one rule,
//! tried in this order:
//! 1. A word present in all of its inputs and in no other input
//! 2. Every word absent from other inputs, when each of its inputs has one
//! 3. A synthesized regex accepting its inputs and rejecting all others
//!
//! The finished classifier must reproduce every training example.

use super::extractor::cached_regex;
use super::regex_synth;
use super::{SynthesisConfig, SynthesisError};
use crate::example::{Example, Output, validate};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRule {
    pub pattern: String,
    #[serde(rename = "ignoreCase")]
    pub ignore_case: bool,
    pub label: Output,
}

impl ClassRule {
    fn regex_source(&self) -> String {
        if self.ignore_case {
            format!("(?i){}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }

    pub fn matches(&self, input: &str) -> bool {
        cached_regex(&self.regex_source()).is_some_and(|re| re.is_match(input))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classifier {
    pub rules: Vec<ClassRule>,
    pub default: Output,
}

impl Classifier {
    /// Label for `input`: the first matching rule's, else the default
    pub fn classify(&self, input: &str) -> Output {
        self.rules
            .iter()
            .find(|rule| rule.matches(input))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| self.default.clone())
    }

    /// Train on labelled examples.
    pub fn train(examples: &[Example], config: &SynthesisConfig) -> Result<Classifier, SynthesisError> {
        validate(examples)?;

        let mut groups: Vec<(Output, Vec<&str>)> = Vec::new();
        for example in examples {
            match groups.iter_mut().find(|(label, _)| label.matches(&example.output, config.epsilon)) {
                Some((_, inputs)) => inputs.push(example.input.as_str()),
                None => groups.push((example.output.clone(), vec![example.input.as_str()])),
            }
        }

        // Ties go to the label seen first.
        let mut default_idx = 0;
        for (i, (_, inputs)) in groups.iter().enumerate() {
            if inputs.len() > groups[default_idx].1.len() {
                default_idx = i;
            }
        }

        let mut rules = Vec::new();
        for (i, (label, own)) in groups.iter().enumerate() {
            if i == default_idx {
                continue;
            }
            let others: Vec<&str> = groups
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, (_, inputs))| inputs.iter().copied())
                .collect();
            let rule = word_rule(own, &others, label)
                .or_else(|| regex_rule(own, &others, label, config))
                .ok_or_else(|| SynthesisError::NoClassifier(format!("no rule separates label {}", label)))?;
            rules.push(rule);
        }

        let classifier = Classifier {
            rules,
            default: groups[default_idx].0.clone(),
        };
        if let Some(missed) = examples
            .iter()
            .find(|e| !classifier.classify(&e.input).matches(&e.output, config.epsilon))
        {
            return Err(SynthesisError::NoClassifier(format!(
                "training example \"{}\" is misclassified",
                missed.input
            )));
        }
        tracing::debug!("Classifier trained: {} rule(s), default {}", classifier.rules.len(), classifier.default);
        Ok(classifier)
    }

    /// Train a boolean classifier; every output must be a bool.
    pub fn predicate(examples: &[Example], config: &SynthesisConfig) -> Result<Classifier, SynthesisError> {
        if let Some(bad) = examples.iter().find(|e| e.output.as_bool().is_none()) {
            return Err(SynthesisError::Unsupported(format!(
                "predicate outputs must be booleans, got {} for \"{}\"",
                bad.output.kind_name(),
                bad.input
            )));
        }
        Self::train(examples, config)
    }

    /// A standalone JavaScript arrow function; relies on the extractor helpers.
    pub fn to_js_function(&self) -> String {
        let mut body = String::from("((input) => { const s = __text(input) ?? \"\"; ");
        for rule in &self.rules {
            let pattern = serde_json::to_string(&rule.pattern).unwrap_or_else(|_| "\"\"".to_string());
            let flags = if rule.ignore_case { "\"i\"" } else { "\"\"" };
            let label = serde_json::to_string(&rule.label).unwrap_or_else(|_| "null".to_string());
            body.push_str(&format!("if (new RegExp({}, {}).test(s)) return {}; ", pattern, flags, label));
        }
        let default = serde_json::to_string(&self.default).unwrap_or_else(|_| "null".to_string());
        body.push_str(&format!("return {}; }})", default));
        body
    }
}

/// Lowercased words of `input` that contain at least one letter
fn words(input: &str) -> BTreeSet<String> {
    input
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| w.chars().any(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

/// Discriminating words: one word shared by all of `own`, else every word
/// never seen in `others` provided each input of `own` has one.
fn word_rule(own: &[&str], others: &[&str], label: &Output) -> Option<ClassRule> {
    let own_words: Vec<BTreeSet<String>> = own.iter().map(|s| words(s)).collect();
    let foreign: BTreeSet<String> = others.iter().flat_map(|s| words(s)).collect();

    let mut exclusive: Vec<&String> = own_words
        .iter()
        .flat_map(|ws| ws.iter())
        .filter(|w| !foreign.contains(*w))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    // Longest first, then alphabetical
    exclusive.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

    let shared = exclusive
        .iter()
        .find(|w| own_words.iter().all(|ws| ws.contains(**w)))
        .map(|w| vec![*w]);
    let chosen = match shared {
        Some(word) => word,
        None if own_words.iter().all(|ws| exclusive.iter().any(|w| ws.contains(*w))) => exclusive.clone(),
        None => return None,
    };

    let alternatives: Vec<String> = chosen.iter().map(|w| regex::escape(w)).collect();
    let pattern = if alternatives.len() == 1 {
        format!(r"\b{}\b", alternatives[0])
    } else {
        format!(r"\b(?:{})\b", alternatives.join("|"))
    };
    Some(ClassRule {
        pattern,
        ignore_case: true,
        label: label.clone(),
    })
}

fn regex_rule(own: &[&str], others: &[&str], label: &Output, config: &SynthesisConfig) -> Option<ClassRule> {
    let synthesized = regex_synth::synthesize(own, others, config).ok()?;
    Some(ClassRule {
        pattern: synthesized.anchored(),
        ignore_case: false,
        label: label.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train(examples: &[Example]) -> Classifier {
        Classifier::train(examples, &SynthesisConfig::default()).unwrap()
    }

    #[test]
    fn test_single_discriminating_word() {
        let classifier = train(&[
            Example::text("ERROR disk full", "bad"),
            Example::text("ERROR network down", "bad"),
            Example::text("INFO started", "good"),
            Example::text("INFO ok", "good"),
            Example::text("DEBUG tick", "good"),
        ]);
        assert_eq!(classifier.default, Output::Str("good".into()));
        assert_eq!(classifier.rules.len(), 1);
        assert_eq!(classifier.rules[0].pattern, r"\berror\b");
        assert_eq!(classifier.classify("ERROR again"), Output::Str("bad".into()));
        assert_eq!(classifier.classify("WARN something"), Output::Str("good".into()));
    }

    #[test]
    fn test_word_cover() {
        let classifier = train(&[
            Example::flag("timeout reached", true),
            Example::flag("connection refused", true),
            Example::flag("all good", false),
            Example::flag("still good", false),
            Example::flag("fine", false),
        ]);
        assert_eq!(classifier.default, Output::Bool(false));
        assert_eq!(classifier.classify("request timeout"), Output::Bool(true));
        assert_eq!(classifier.classify("refused by peer"), Output::Bool(true));
        assert_eq!(classifier.classify("nothing"), Output::Bool(false));
    }

    #[test]
    fn test_regex_rule_when_words_fail() {
        let classifier = train(&[
            Example::text("100", "number"),
            Example::text("250", "number"),
            Example::text("abc", "word"),
            Example::text("xyz", "word"),
            Example::text("qqq", "word"),
        ]);
        assert_eq!(classifier.classify("999"), Output::Str("number".into()));
        assert_eq!(classifier.classify("hello"), Output::Str("word".into()));
    }

    #[test]
    fn test_single_label() {
        let classifier = train(&[Example::number("a", 1.0), Example::number("b", 1.0)]);
        assert!(classifier.rules.is_empty());
        assert_eq!(classifier.classify("zzz"), Output::Number(1.0));
    }

    #[test]
    fn test_predicate_requires_booleans() {
        let err = Classifier::predicate(&[Example::text("a", "yes")], &SynthesisConfig::default()).unwrap_err();
        assert!(matches!(err, SynthesisError::Unsupported(_)));
    }

    #[test]
    fn test_to_js_mentions_rules() {
        let classifier = train(&[Example::flag("ERROR x", true), Example::flag("INFO y", false), Example::flag("INFO z", false)]);
        let js = classifier.to_js_function();
        assert!(js.contains(r#"new RegExp("\\berror\\b", "i")"#));
        assert!(js.ends_with("return false; })"));
    }
}
