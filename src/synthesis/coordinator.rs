//! Synthesis Coordinator - routes requests through the knowledge base
//!
//! Lookup order for a request:
//! 1. Memo hit on the exact example set
//! 2. A compatible prior entry of the same kind (re-verified)
//! 3. For extractors, a fused regex + transformer pair (re-verified)
//! 4. Fresh synthesis, stored for later turns

use super::classifier::Classifier;
use super::extractor::Extractor;
use super::extractor_synth::{self, reproduces};
use super::knowledge::{EntrySource, KnowledgeBase, KnowledgeEntry, SynthesisKind, split_polarity};
use super::regex_synth;
use super::{SynthesisConfig, SynthesisError};
use crate::example::{Example, validate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub kind: SynthesisKind,
    pub examples: Vec<Example>,
    /// Strings the regex must reject, on top of `false`-labelled examples
    pub negatives: Vec<String>,
}

impl SynthesisRequest {
    pub fn new(kind: SynthesisKind, examples: Vec<Example>) -> Self {
        Self {
            kind,
            examples,
            negatives: Vec::new(),
        }
    }

    pub fn with_negatives(mut self, negatives: Vec<String>) -> Self {
        self.negatives = negatives;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisResult {
    pub success: bool,
    pub kind: SynthesisKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub extractors: Vec<Extractor>,
    #[serde(rename = "entryId", skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<usize>,
    pub reused: bool,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SynthesisResult {
    fn failure(kind: SynthesisKind, logs: Vec<String>, error: &SynthesisError) -> Self {
        Self {
            success: false,
            kind,
            pattern: None,
            extractors: Vec::new(),
            entry_id: None,
            reused: false,
            logs,
            error: Some(error.to_string()),
        }
    }

    fn from_entry(entry: &KnowledgeEntry, reused: bool, logs: Vec<String>) -> Self {
        Self {
            success: true,
            kind: entry.kind,
            pattern: entry.source.pattern().map(str::to_string),
            extractors: entry.source.extractor().cloned().into_iter().collect(),
            entry_id: Some(entry.id),
            reused,
            logs,
            error: None,
        }
    }

    /// Best extractor, when one was produced
    pub fn extractor(&self) -> Option<&Extractor> {
        self.extractors.first()
    }
}

pub struct Coordinator<'a> {
    kb: &'a mut KnowledgeBase,
    config: SynthesisConfig,
}

impl<'a> Coordinator<'a> {
    pub fn new(kb: &'a mut KnowledgeBase, config: &SynthesisConfig) -> Self {
        Self {
            kb,
            config: config.clone(),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &*self.kb
    }

    pub fn synthesize(&mut self, request: &SynthesisRequest) -> SynthesisResult {
        let mut logs = Vec::new();
        match self.run(request, &mut logs) {
            Ok((id, reused, extractors)) => {
                let Some(entry) = self.kb.get(id) else {
                    return SynthesisResult::failure(request.kind, logs, &SynthesisError::NoExtractor);
                };
                let mut result = SynthesisResult::from_entry(entry, reused, logs);
                if !extractors.is_empty() {
                    result.extractors = extractors;
                }
                result
            }
            Err(e) => {
                tracing::debug!("Synthesis of {} failed: {}", request.kind, e);
                logs.push(format!("failed: {}", e));
                SynthesisResult::failure(request.kind, logs, &e)
            }
        }
    }

    /// Returns the entry id, whether it was reused, and any ranked alternatives.
    fn run(
        &mut self,
        request: &SynthesisRequest,
        logs: &mut Vec<String>,
    ) -> Result<(usize, bool, Vec<Extractor>), SynthesisError> {
        validate(&request.examples)?;
        let epsilon = self.config.epsilon;
        logs.push(format!("{} request with {} example(s)", request.kind, request.examples.len()));

        if let Some(entry) = self.kb.lookup(request.kind, &request.examples)
            && entry.verifies(&request.examples, &request.negatives, epsilon)
        {
            let id = entry.id;
            self.kb.record_use(id, true);
            logs.push(format!("memo hit: entry #{}", id));
            return Ok((id, true, Vec::new()));
        }

        if let Some(&id) = self
            .kb
            .find_compatible(request.kind, &request.examples, &request.negatives, epsilon)
            .first()
        {
            self.kb.record_use(id, true);
            logs.push(format!("reused compatible entry #{}", id));
            return Ok((id, true, Vec::new()));
        }

        if request.kind == SynthesisKind::Extractor
            && let Some(id) = self.fuse(&request.examples, logs)
        {
            return Ok((id, true, Vec::new()));
        }

        match request.kind {
            SynthesisKind::Regex => {
                let (positives, negatives) = split_polarity(&request.examples, &request.negatives);
                let synthesized = regex_synth::synthesize(&positives, &negatives, &self.config)?;
                logs.push(format!(
                    "synthesized regex via {}: {}",
                    synthesized.strategy.describe(),
                    synthesized.pattern
                ));
                let id = self.kb.insert(
                    SynthesisKind::Regex,
                    EntrySource::Regex {
                        pattern: synthesized.pattern,
                        ast: synthesized.ast,
                    },
                    request.examples.clone(),
                );
                Ok((id, false, Vec::new()))
            }
            SynthesisKind::Extractor | SynthesisKind::Transformer => {
                let candidates = extractor_synth::synthesize(&request.examples, &self.config)?;
                let best = candidates.first().cloned().ok_or(SynthesisError::NoExtractor)?;
                logs.push(format!("synthesized {} candidate(s), best: {}", candidates.len(), best));
                let id = self.kb.insert(
                    request.kind,
                    EntrySource::Program { extractor: best },
                    request.examples.clone(),
                );
                Ok((id, false, candidates))
            }
        }
    }

    /// Try every stored regex against every stored transformer.
    fn fuse(&mut self, examples: &[Example], logs: &mut Vec<String>) -> Option<usize> {
        let regexes = self.kb.ranked(SynthesisKind::Regex);
        let transformers = self.kb.ranked(SynthesisKind::Transformer);
        for &r in &regexes {
            for &t in &transformers {
                let (Some(regex), Some(transformer)) = (self.kb.get(r), self.kb.get(t)) else {
                    continue;
                };
                let Some(fused) = KnowledgeBase::fusion(regex, transformer) else {
                    continue;
                };
                if !reproduces(&fused, examples, self.config.epsilon) {
                    continue;
                }
                let id = self.kb.compose(r, t)?;
                self.kb.record_use(r, true);
                self.kb.record_use(t, true);
                logs.push(format!("fused regex #{} with transformer #{} into entry #{}", r, t, id));
                return Some(id);
            }
        }
        None
    }

    pub fn classify(&self, examples: &[Example]) -> Result<Classifier, SynthesisError> {
        Classifier::train(examples, &self.config)
    }

    pub fn predicate(&self, examples: &[Example]) -> Result<Classifier, SynthesisError> {
        Classifier::predicate(examples, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example::Output;

    fn currency_examples() -> Vec<Example> {
        vec![
            Example::number("$1,234", 1234.0),
            Example::number("$50", 50.0),
            Example::number("$2,000,000", 2_000_000.0),
        ]
    }

    #[test]
    fn test_fresh_then_memo() {
        let mut kb = KnowledgeBase::new();
        let config = SynthesisConfig::default();
        let request = SynthesisRequest::new(SynthesisKind::Extractor, currency_examples());

        let first = Coordinator::new(&mut kb, &config).synthesize(&request);
        assert!(first.success, "{:?}", first.error);
        assert!(!first.reused);
        let f = first.extractor().unwrap();
        assert_eq!(f.eval("$9,999"), Output::Number(9999.0));

        let second = Coordinator::new(&mut kb, &config).synthesize(&request);
        assert!(second.reused);
        assert_eq!(second.entry_id, first.entry_id);
        assert_eq!(kb.len(), 1);
        assert_eq!(kb.get(first.entry_id.unwrap()).unwrap().usage_count, 2);
    }

    #[test]
    fn test_compatible_entry_is_reused() {
        let mut kb = KnowledgeBase::new();
        let config = SynthesisConfig::default();
        let mut coordinator = Coordinator::new(&mut kb, &config);
        let first = coordinator.synthesize(&SynthesisRequest::new(SynthesisKind::Extractor, currency_examples()));
        let second = coordinator.synthesize(&SynthesisRequest::new(
            SynthesisKind::Extractor,
            vec![Example::number("$7,777", 7777.0)],
        ));
        assert!(second.reused);
        assert_eq!(second.entry_id, first.entry_id);
    }

    #[test]
    fn test_regex_request() {
        let mut kb = KnowledgeBase::new();
        let config = SynthesisConfig::default();
        let request = SynthesisRequest::new(
            SynthesisKind::Regex,
            vec![Example::flag("$999", true), Example::flag("$1,234,567", true)],
        )
        .with_negatives(vec!["hello".to_string()]);
        let result = Coordinator::new(&mut kb, &config).synthesize(&request);
        assert!(result.success);
        let pattern = result.pattern.unwrap();
        assert!(regex_synth::verify(&pattern, &["$999", "$1,234,567"], &["hello"]));
    }

    #[test]
    fn test_conflict_fails_before_search() {
        let mut kb = KnowledgeBase::new();
        let config = SynthesisConfig::default();
        let request = SynthesisRequest::new(
            SynthesisKind::Extractor,
            vec![Example::number("a", 1.0), Example::number("a", 2.0)],
        );
        let result = Coordinator::new(&mut kb, &config).synthesize(&request);
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(kb.is_empty());
    }

    #[test]
    fn test_fusion_of_regex_and_transformer() {
        let mut kb = KnowledgeBase::new();
        let config = SynthesisConfig::default();
        kb.insert(
            SynthesisKind::Regex,
            EntrySource::Regex {
                pattern: r"#\d+".to_string(),
                ast: crate::synthesis::RegexAst::literal("#"),
            },
            vec![Example::flag("#12", true)],
        );
        kb.insert(
            SynthesisKind::Transformer,
            EntrySource::Program {
                extractor: Extractor::parse_int(Extractor::replace(Extractor::Input, "#", "")),
            },
            vec![Example::number("#12", 12.0)],
        );
        let request = SynthesisRequest::new(
            SynthesisKind::Extractor,
            vec![Example::number("ticket #40 closed", 40.0), Example::number("see #7", 7.0)],
        );
        let result = Coordinator::new(&mut kb, &config).synthesize(&request);
        assert!(result.success);
        assert!(result.reused);
        assert!(result.logs.iter().any(|l| l.contains("fused")));
        assert_eq!(result.extractor().unwrap().eval("ref #3"), Output::Number(3.0));
    }
}
