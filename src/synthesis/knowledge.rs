//! Knowledge Base - memoized synthesis results for one session
//!
//! Entries are only ever appended; counters and timestamps mutate in place.
//! Timestamps are logical ticks, so ranking never depends on wall-clock time.

use super::extractor::Extractor;
use super::extractor_synth::reproduces;
use super::regex_ast::RegexAst;
use super::regex_synth;
use crate::example::{Example, ExampleSetId, Output, overlap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What a synthesis request asks for, and what an entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisKind {
    /// Whole-string regex over the example inputs
    Regex,
    /// Free-text → value program
    Extractor,
    /// Already-isolated value → value program (`1.234,56` → 1234.56)
    Transformer,
}

impl SynthesisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisKind::Regex => "regex",
            SynthesisKind::Extractor => "extractor",
            SynthesisKind::Transformer => "transformer",
        }
    }

    pub fn all() -> &'static [SynthesisKind] {
        &[SynthesisKind::Regex, SynthesisKind::Extractor, SynthesisKind::Transformer]
    }
}

impl FromStr for SynthesisKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "regex" | "pattern" => Ok(SynthesisKind::Regex),
            "extractor" | "extract" => Ok(SynthesisKind::Extractor),
            "transformer" | "transform" | "converter" => Ok(SynthesisKind::Transformer),
            _ => Err(crate::Error::Resolution(format!("Unknown synthesis kind: {}", s))),
        }
    }
}

impl fmt::Display for SynthesisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntrySource {
    Regex { pattern: String, ast: RegexAst },
    Program { extractor: Extractor },
}

impl EntrySource {
    pub fn describe(&self) -> String {
        match self {
            EntrySource::Regex { pattern, .. } => pattern.clone(),
            EntrySource::Program { extractor } => extractor.to_string(),
        }
    }

    pub fn extractor(&self) -> Option<&Extractor> {
        match self {
            EntrySource::Program { extractor } => Some(extractor),
            EntrySource::Regex { .. } => None,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            EntrySource::Regex { pattern, .. } => Some(pattern),
            EntrySource::Program { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    pub id: usize,
    pub kind: SynthesisKind,
    pub source: EntrySource,
    /// Examples that produced the entry (empty for fused entries)
    pub examples: Vec<Example>,
    #[serde(rename = "usageCount")]
    pub usage_count: u64,
    #[serde(rename = "successCount")]
    pub success_count: u64,
    #[serde(rename = "lastUsed")]
    pub last_used: u64,
    #[serde(rename = "composesWith")]
    pub composes_with: Vec<usize>,
}

impl KnowledgeEntry {
    /// Whether this entry reproduces `examples` (and rejects `negatives`,
    /// for regex entries).
    pub fn verifies(&self, examples: &[Example], negatives: &[String], epsilon: f64) -> bool {
        match &self.source {
            EntrySource::Regex { pattern, .. } => {
                let (positives, rejected) = split_polarity(examples, negatives);
                regex_synth::verify(pattern, &positives, &rejected)
            }
            EntrySource::Program { extractor } => reproduces(extractor, examples, epsilon),
        }
    }
}

/// Regex examples: `false` outputs (and explicit negatives) must not match,
/// everything else must.
pub fn split_polarity<'a>(examples: &'a [Example], negatives: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut positives = Vec::new();
    let mut rejected: Vec<&str> = negatives.iter().map(String::as_str).collect();
    for example in examples {
        if example.output == Output::Bool(false) {
            rejected.push(&example.input);
        } else {
            positives.push(example.input.as_str());
        }
    }
    (positives, rejected)
}

/// Process-lifetime store of synthesized regexes and programs
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    memo: HashMap<(SynthesisKind, ExampleSetId), usize>,
    clock: u64,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, id: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(id)
    }

    /// Append an entry; it counts as used once, successfully.
    pub fn insert(&mut self, kind: SynthesisKind, source: EntrySource, examples: Vec<Example>) -> usize {
        let id = self.entries.len();
        let now = self.tick();
        if !examples.is_empty() {
            self.memo.insert((kind, ExampleSetId::of(&examples)), id);
        }
        tracing::debug!("Knowledge base: inserted {} entry #{}: {}", kind, id, source.describe());
        self.entries.push(KnowledgeEntry {
            id,
            kind,
            source,
            examples,
            usage_count: 1,
            success_count: 1,
            last_used: now,
            composes_with: Vec::new(),
        });
        id
    }

    /// Entry synthesized from exactly this example set
    pub fn lookup(&self, kind: SynthesisKind, examples: &[Example]) -> Option<&KnowledgeEntry> {
        self.memo
            .get(&(kind, ExampleSetId::of(examples)))
            .and_then(|id| self.entries.get(*id))
    }

    /// Ids of same-kind entries that re-verify on `examples`, best first:
    /// example overlap, then success count, then usage count, then age.
    pub fn find_compatible(
        &self,
        kind: SynthesisKind,
        examples: &[Example],
        negatives: &[String],
        epsilon: f64,
    ) -> Vec<usize> {
        let mut found: Vec<(f64, &KnowledgeEntry)> = self
            .entries
            .iter()
            .filter(|e| e.kind == kind && e.verifies(examples, negatives, epsilon))
            .map(|e| (overlap(examples, &e.examples), e))
            .collect();
        found.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then(b.success_count.cmp(&a.success_count))
                .then(b.usage_count.cmp(&a.usage_count))
                .then(a.id.cmp(&b.id))
        });
        found.into_iter().map(|(_, e)| e.id).collect()
    }

    /// Ids of entries of `kind`, most successful first
    pub fn ranked(&self, kind: SynthesisKind) -> Vec<usize> {
        let mut ids: Vec<&KnowledgeEntry> = self.entries.iter().filter(|e| e.kind == kind).collect();
        ids.sort_by(|a, b| {
            b.success_count
                .cmp(&a.success_count)
                .then(b.usage_count.cmp(&a.usage_count))
                .then(a.id.cmp(&b.id))
        });
        ids.into_iter().map(|e| e.id).collect()
    }

    pub fn record_use(&mut self, id: usize, success: bool) {
        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(id) {
            entry.usage_count += 1;
            if success {
                entry.success_count += 1;
            }
            entry.last_used = now;
        }
    }

    /// Fuse a regex entry with a transformer entry into an extractor entry
    /// that isolates the regex match and then applies the transformer.
    pub fn compose(&mut self, regex_id: usize, transformer_id: usize) -> Option<usize> {
        let fused = Self::fusion(self.get(regex_id)?, self.get(transformer_id)?)?;
        if let Some(existing) = self.entries.iter().find(|e| e.source.extractor() == Some(&fused)) {
            return Some(existing.id);
        }
        let id = self.insert(SynthesisKind::Extractor, EntrySource::Program { extractor: fused }, Vec::new());
        for part in [regex_id, transformer_id] {
            if let Some(entry) = self.entries.get_mut(part) {
                entry.composes_with.push(id);
            }
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.composes_with = vec![regex_id, transformer_id];
        }
        Some(id)
    }

    /// The match-then-apply program for a regex and a transformer entry
    pub fn fusion(regex: &KnowledgeEntry, transformer: &KnowledgeEntry) -> Option<Extractor> {
        if regex.kind != SynthesisKind::Regex || transformer.kind != SynthesisKind::Transformer {
            return None;
        }
        let pattern = regex.source.pattern()?;
        let program = transformer.source.extractor()?;
        Some(program.substitute_input(&Extractor::matching(Extractor::Input, pattern, 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex_entry(kb: &mut KnowledgeBase, pattern: &str, examples: Vec<Example>) -> usize {
        let synthesized = RegexAst::literal(pattern);
        kb.insert(
            SynthesisKind::Regex,
            EntrySource::Regex {
                pattern: synthesized.to_pattern(),
                ast: synthesized,
            },
            examples,
        )
    }

    #[test]
    fn test_insert_and_lookup_by_example_set() {
        let mut kb = KnowledgeBase::new();
        let examples = vec![Example::number("$1", 1.0)];
        let id = kb.insert(
            SynthesisKind::Extractor,
            EntrySource::Program {
                extractor: Extractor::parse_float(Extractor::Input),
            },
            examples.clone(),
        );
        assert_eq!(kb.lookup(SynthesisKind::Extractor, &examples).map(|e| e.id), Some(id));
        assert!(kb.lookup(SynthesisKind::Transformer, &examples).is_none());
    }

    #[test]
    fn test_find_compatible_reverifies_and_ranks() {
        let mut kb = KnowledgeBase::new();
        let float = kb.insert(
            SynthesisKind::Transformer,
            EntrySource::Program {
                extractor: Extractor::parse_float(Extractor::Input),
            },
            vec![Example::number("1.5", 1.5)],
        );
        let int = kb.insert(
            SynthesisKind::Transformer,
            EntrySource::Program {
                extractor: Extractor::parse_int(Extractor::Input),
            },
            vec![Example::number("2", 2.0)],
        );
        let ids = kb.find_compatible(SynthesisKind::Transformer, &[Example::number("2", 2.0)], &[], 1e-9);
        assert_eq!(ids, vec![int, float]);
        let ids = kb.find_compatible(SynthesisKind::Transformer, &[Example::number("2.5", 2.5)], &[], 1e-9);
        assert_eq!(ids, vec![float]);
    }

    #[test]
    fn test_record_use_advances_logical_clock() {
        let mut kb = KnowledgeBase::new();
        let id = regex_entry(&mut kb, "abc", vec![Example::flag("abc", true)]);
        let before = kb.get(id).unwrap().last_used;
        kb.record_use(id, false);
        let entry = kb.get(id).unwrap();
        assert_eq!(entry.usage_count, 2);
        assert_eq!(entry.success_count, 1);
        assert!(entry.last_used > before);
    }

    #[test]
    fn test_compose_regex_and_transformer() {
        let mut kb = KnowledgeBase::new();
        let regex = kb.insert(
            SynthesisKind::Regex,
            EntrySource::Regex {
                pattern: r"\d+,\d+".to_string(),
                ast: RegexAst::literal("unused"),
            },
            vec![Example::flag("7,5", true)],
        );
        let transformer = kb.insert(
            SynthesisKind::Transformer,
            EntrySource::Program {
                extractor: Extractor::parse_float(Extractor::replace(Extractor::Input, ",", ".")),
            },
            vec![Example::number("7,5", 7.5)],
        );
        let fused = kb.compose(regex, transformer).unwrap();
        let entry = kb.get(fused).unwrap();
        assert_eq!(entry.kind, SynthesisKind::Extractor);
        assert_eq!(entry.composes_with, vec![regex, transformer]);
        assert_eq!(entry.source.extractor().unwrap().eval("price 12,5 EUR"), Output::Number(12.5));
        assert!(kb.get(regex).unwrap().composes_with.contains(&fused));
        assert_eq!(kb.compose(regex, transformer), Some(fused));
    }

    #[test]
    fn test_regex_entry_verifies_polarity() {
        let mut kb = KnowledgeBase::new();
        let id = regex_entry(&mut kb, "abc", vec![]);
        let entry = kb.get(id).unwrap();
        assert!(entry.verifies(&[Example::flag("abc", true), Example::flag("abd", false)], &[], 1e-9));
        assert!(!entry.verifies(&[Example::flag("abc", true)], &["abc".to_string()], 1e-9));
    }
}
