//! In-memory document - the line-oriented [`DocumentTools`] implementation
//!
//! Matching is per line: a grep hit never spans a newline, and every hit
//! carries its full line so string operators can read it.

use super::{CorpusStats, DocumentTools, FuzzyMatch, GrepMatch, Outline, StatsSample, SymbolInfo, SymbolKind, ToolError};
use regex::Regex;
use std::str::FromStr;

/// Characters taken for each of the start/middle/end stats samples
const SAMPLE_CHARS: usize = 200;

/// Lines scoring below this are never returned by fuzzy search
const MIN_FUZZY_SCORE: f64 = 0.5;

pub struct Document {
    text: String,
    /// (byte offset, line text) for every line
    lines: Vec<(usize, String)>,
    outline: Outline,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in text.split_inclusive('\n') {
            let line = raw.trim_end_matches('\n').trim_end_matches('\r');
            lines.push((offset, line.to_string()));
            offset += raw.len();
        }
        let refs: Vec<&str> = lines.iter().map(|(_, l)| l.as_str()).collect();
        let outline = Outline::scan(&refs);
        tracing::debug!("Loaded document: {} bytes, {} lines", text.len(), lines.len());
        Self { text, lines, outline }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn compile(pattern: &str) -> Result<Regex, ToolError> {
        Regex::new(pattern).map_err(|e| ToolError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
    }

    fn search(&self, re: &Regex) -> Vec<GrepMatch> {
        let mut hits = Vec::new();
        for (idx, (offset, line)) in self.lines.iter().enumerate() {
            for caps in re.captures_iter(line) {
                let Some(whole) = caps.get(0) else { continue };
                if whole.as_str().is_empty() {
                    continue;
                }
                hits.push(GrepMatch {
                    matched: whole.as_str().to_string(),
                    line: line.clone(),
                    line_num: idx + 1,
                    index: offset + whole.start(),
                    groups: caps
                        .iter()
                        .skip(1)
                        .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                        .collect(),
                });
            }
        }
        hits
    }
}

impl DocumentTools for Document {
    fn grep(&self, pattern: &str) -> Result<Vec<GrepMatch>, ToolError> {
        let re = Self::compile(pattern)?;
        let hits = self.search(&re);
        tracing::debug!("grep {:?}: {} hit(s)", pattern, hits.len());
        Ok(hits)
    }

    fn fuzzy_search(&self, query: &str, limit: usize) -> Vec<FuzzyMatch> {
        let mut scored: Vec<FuzzyMatch> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, (_, line))| !line.trim().is_empty())
            .filter_map(|(idx, (_, line))| {
                let score = similarity(query, line);
                (score >= MIN_FUZZY_SCORE).then(|| FuzzyMatch {
                    line: line.clone(),
                    line_num: idx + 1,
                    score,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.line_num.cmp(&b.line_num)));
        scored.truncate(limit);
        scored
    }

    fn corpus_stats(&self) -> CorpusStats {
        let chars: Vec<char> = self.text.chars().collect();
        let take = |from: usize| -> String { chars[from..(from + SAMPLE_CHARS).min(chars.len())].iter().collect() };
        let middle_start = (chars.len() / 2).saturating_sub(SAMPLE_CHARS / 2);
        CorpusStats {
            length: chars.len(),
            line_count: self.lines.len(),
            sample: StatsSample {
                start: take(0),
                middle: take(middle_start),
                end: take(chars.len().saturating_sub(SAMPLE_CHARS)),
            },
        }
    }

    fn list_symbols(&self, kind: Option<&str>) -> Result<Vec<SymbolInfo>, ToolError> {
        let kind = kind.map(SymbolKind::from_str).transpose()?;
        Ok(self.outline.symbols(kind))
    }

    fn get_symbol_body(&self, name: &str) -> Result<String, ToolError> {
        let symbol = self
            .outline
            .find(name)
            .ok_or_else(|| ToolError::SymbolNotFound(name.to_string()))?;
        Ok(self.lines[symbol.line_num - 1..symbol.line_end]
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn find_references(&self, name: &str) -> Result<Vec<GrepMatch>, ToolError> {
        let escaped = regex::escape(name);
        let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        let pattern = match (word(name.chars().next()), word(name.chars().last())) {
            (true, true) => format!(r"\b{}\b", escaped),
            (true, false) => format!(r"\b{}", escaped),
            (false, true) => format!(r"{}\b", escaped),
            (false, false) => escaped,
        };
        let re = Self::compile(&pattern)?;
        Ok(self
            .search(&re)
            .into_iter()
            .filter(|hit| !self.outline.is_definition_line(name, hit.line_num))
            .collect())
    }
}

/// Similarity of `line` to `query` in `0.0..=1.0`.
///
/// A case-insensitive substring hit scores 1.0. Otherwise each query word
/// is scored against its closest line word by edit distance, and the
/// average is returned.
pub fn similarity(query: &str, line: &str) -> f64 {
    let query = query.to_lowercase();
    let line = line.to_lowercase();
    if query.trim().is_empty() {
        return 0.0;
    }
    if line.contains(query.trim()) {
        return 1.0;
    }

    let words: Vec<&str> = line.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    let terms: Vec<Vec<char>> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.chars().collect())
        .collect();
    if terms.is_empty() || words.is_empty() {
        return 0.0;
    }

    let total: f64 = terms
        .iter()
        .map(|term| {
            let max_dist = term.len() / 2;
            words
                .iter()
                .map(|word| {
                    let dist = levenshtein_with_max(word, term, max_dist);
                    if dist > max_dist {
                        0.0
                    } else {
                        1.0 - dist as f64 / term.len().max(word.chars().count()) as f64
                    }
                })
                .fold(0.0, f64::max)
        })
        .sum();
    total / terms.len() as f64
}

/// Edit distance between `value` and `needle_chars`, giving up (returning
/// `max_dist + 1`) once every alignment exceeds `max_dist`.
fn levenshtein_with_max(value: &str, needle_chars: &[char], max_dist: usize) -> usize {
    if max_dist == 0 {
        return if value.chars().eq(needle_chars.iter().copied()) { 0 } else { 1 };
    }

    let n = needle_chars.len();
    if n == 0 {
        return value.chars().count();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = if c == needle_chars[j - 1] { 0 } else { 1 };
            let d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "INFO start\nERROR disk full\nINFO ok\nERROR network down\n";

    #[test]
    fn test_grep_reports_line_and_offset() {
        let doc = Document::new(LOG);
        let hits = doc.grep("ERROR").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].line, "ERROR disk full");
        assert_eq!(hits[0].line_num, 2);
        assert_eq!(hits[0].index, 11);
        assert_eq!(hits[1].line_num, 4);
    }

    #[test]
    fn test_grep_groups() {
        let doc = Document::new("total: 42\n");
        let hits = doc.grep(r"(\w+): (\d+)(x)?").unwrap();
        assert_eq!(hits[0].groups, vec!["total".to_string(), "42".to_string(), String::new()]);
    }

    #[test]
    fn test_grep_invalid_pattern() {
        let doc = Document::new(LOG);
        assert!(matches!(doc.grep("("), Err(ToolError::InvalidPattern { .. })));
    }

    #[test]
    fn test_fuzzy_search_tolerates_typos() {
        let doc = Document::new(LOG);
        let hits = doc.fuzzy_search("netwrk", 10);
        assert_eq!(hits[0].line_num, 4);
        assert!(hits[0].score < 1.0);
        assert!(hits.iter().all(|h| h.line_num != 1));
    }

    #[test]
    fn test_fuzzy_search_respects_limit() {
        let doc = Document::new(LOG);
        assert_eq!(doc.fuzzy_search("error", 1).len(), 1);
    }

    #[test]
    fn test_corpus_stats() {
        let doc = Document::new(LOG);
        let stats = doc.corpus_stats();
        assert_eq!(stats.length, LOG.len());
        assert_eq!(stats.line_count, 4);
        assert_eq!(stats.sample.start, LOG);
    }

    #[test]
    fn test_symbol_queries() {
        let doc = Document::new("fn helper() {}\n\nfn main() {\n    helper();\n}\n");
        let symbols = doc.list_symbols(Some("function")).unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(doc.get_symbol_body("main").unwrap(), "fn main() {\n    helper();\n}");
        let refs = doc.find_references("helper").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].line_num, 4);
        assert!(matches!(doc.get_symbol_body("nope"), Err(ToolError::SymbolNotFound(_))));
    }

    #[test]
    fn test_levenshtein_bounds() {
        let needle: Vec<char> = "kitten".chars().collect();
        assert_eq!(levenshtein_with_max("sitting", &needle, 5), 3);
        assert_eq!(levenshtein_with_max("completely", &needle, 2), 3);
    }
}
