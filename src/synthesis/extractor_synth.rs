//! Extractor Synthesizer - examples → verified extraction programs
//!
//! Enumerate-and-verify in three tiers:
//! 1. Closed forms: identity and constant output
//! 2. Template library: currencies, percentages, key/value pairs,
//!    delimited fields, prefix/suffix stripping, bracket unwrapping
//! 3. Generic lattice: matches of common sub-patterns (group 0, or group 1
//!    after a shared context), of a pattern synthesized from the outputs,
//!    and numeric coercions of each
//!
//! Every surviving candidate reproduces every example. Results are ranked
//! by tier and table position, then size, then canonical text, so the
//! output is deterministic.

use super::extractor::{Extractor, cached_regex};
use super::regex_synth;
use super::{SynthesisConfig, SynthesisError};
use crate::example::{Example, Output, validate};
use std::collections::HashSet;

const TEMPLATE_RANK: usize = 10;
const LATTICE_RANK: usize = 100;
const FALLBACK_RANK: usize = 1000;

/// Loose numeric token used to locate numbers inside inputs
const NUMBER_TOKEN: &str = r"-?\d[\d,.]*";

const SUB_PATTERNS: &[&str] = &[
    r"-?\d+(?:\.\d+)?",
    r"-?[\d,]+(?:\.\d+)?",
    r"\d+",
    r"[A-Za-z]+",
    r"[A-Z][a-z]+",
    r"[A-Z]{2,}",
    r"\w+",
    r"\S+",
    r"\d{4}-\d{2}-\d{2}",
    r"\d{1,2}/\d{1,2}/\d{4}",
    r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+",
    r"https?://\S+",
];

const DELIMITERS: &[&str] = &[",", "\t", "|", ";", ":", "/", " ", "-"];

/// Fields tried per delimiter
const MAX_FIELDS: usize = 8;

/// Longest shared context considered before a group-1 capture
const MAX_CONTEXT: usize = 12;

const BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}'), ('<', '>'), ('"', '"'), ('\'', '\'')];

/// Synthesize extractors reproducing every example, best first.
pub fn synthesize(examples: &[Example], config: &SynthesisConfig) -> Result<Vec<Extractor>, SynthesisError> {
    validate(examples)?;

    if examples.iter().all(|e| e.output.as_str() == Some(e.input.as_str())) {
        return Ok(vec![Extractor::Input]);
    }
    let distinct_inputs: HashSet<&str> = examples.iter().map(|e| e.input.as_str()).collect();
    let first = &examples[0].output;
    if distinct_inputs.len() > 1 && examples.iter().all(|e| e.output.matches(first, config.epsilon)) {
        return Ok(vec![Extractor::Lit(first.clone())]);
    }

    let shape = Shape::of(examples);
    let mut candidates: Vec<(usize, Extractor)> = Vec::new();
    for (i, extractor) in templates(examples, shape).into_iter().enumerate() {
        candidates.push((TEMPLATE_RANK + i, extractor));
    }
    for (i, extractor) in lattice(examples, shape, config).into_iter().enumerate() {
        candidates.push((LATTICE_RANK + i, extractor));
    }
    candidates.push((FALLBACK_RANK, Extractor::Lit(first.clone())));

    let total = candidates.len();
    let mut seen = HashSet::new();
    let mut verified: Vec<(usize, usize, String, Extractor)> = candidates
        .into_iter()
        .filter(|(_, e)| reproduces(e, examples, config.epsilon))
        .filter_map(|(rank, e)| {
            let text = e.to_string();
            seen.insert(text.clone()).then(|| (rank, e.size(), text, e))
        })
        .collect();
    verified.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));

    tracing::debug!(
        "Extractor synthesis: {} candidate(s), {} verified",
        total,
        verified.len()
    );
    if verified.is_empty() {
        return Err(SynthesisError::NoExtractor);
    }
    Ok(verified
        .into_iter()
        .take(config.max_extractors.max(1))
        .map(|(_, _, _, e)| e)
        .collect())
}

/// Whether `extractor` reproduces every example exactly
pub fn reproduces(extractor: &Extractor, examples: &[Example], epsilon: f64) -> bool {
    examples
        .iter()
        .all(|e| extractor.eval(&e.input).matches(&e.output, epsilon))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Numeric,
    Text,
    Other,
}

impl Shape {
    fn of(examples: &[Example]) -> Shape {
        if examples.iter().all(|e| matches!(e.output, Output::Number(_))) {
            Shape::Numeric
        } else if examples.iter().all(|e| matches!(e.output, Output::Str(_))) {
            Shape::Text
        } else {
            Shape::Other
        }
    }
}

/// `base` plus the numeric coercions of it when outputs are numbers
fn variants(base: Extractor, shape: Shape) -> Vec<Extractor> {
    match shape {
        Shape::Numeric => vec![
            Extractor::parse_float(base.clone()),
            Extractor::parse_float(Extractor::replace(base.clone(), ",", "")),
            Extractor::parse_int(base),
        ],
        _ => vec![base],
    }
}

/// Where an example's output appears in its input: (byte offset, text)
fn locate(example: &Example) -> Option<(usize, String)> {
    match &example.output {
        Output::Str(s) if !s.is_empty() => example.input.find(s.as_str()).map(|p| (p, s.clone())),
        Output::Number(n) => {
            let re = cached_regex(NUMBER_TOKEN)?;
            re.find_iter(&example.input)
                .find(|m| {
                    let cleaned = m.as_str().trim_end_matches(['.', ',']).replace(',', "");
                    cleaned.parse::<f64>().is_ok_and(|v| crate::example::numbers_close(v, *n, 1e-9))
                })
                .map(|m| (m.start(), m.as_str().trim_end_matches(['.', ',']).to_string()))
        }
        _ => None,
    }
}

// ========== Templates ==========

fn templates(examples: &[Example], shape: Shape) -> Vec<Extractor> {
    let mut out = Vec::new();

    if shape == Shape::Numeric {
        out.push(Extractor::parse_float(Extractor::replace(
            Extractor::matching(Extractor::Input, r"-?[\d,]+(?:\.\d+)?", 0),
            ",",
            "",
        )));
        out.push(Extractor::parse_float(Extractor::replace(
            Extractor::replace(
                Extractor::matching(Extractor::Input, r"-?\d{1,3}(?:\.\d{3})*(?:,\d+)?", 0),
                r"\.",
                "",
            ),
            ",",
            ".",
        )));
        out.push(Extractor::parse_float(Extractor::matching(
            Extractor::Input,
            r"(-?\d+(?:\.\d+)?)\s*%",
            1,
        )));
    }

    out.extend(key_value(examples, shape));

    for delimiter in DELIMITERS {
        if !examples.iter().all(|e| e.input.contains(delimiter)) {
            continue;
        }
        let fields = examples
            .iter()
            .map(|e| e.input.split(delimiter).count())
            .min()
            .unwrap_or(0)
            .min(MAX_FIELDS);
        for i in 0..fields {
            let field = Extractor::split(Extractor::Input, *delimiter, Some(i));
            out.extend(variants(field.clone(), shape));
            if shape != Shape::Numeric {
                out.push(Extractor::replace(field, r"^\s+|\s+$", ""));
            }
        }
    }

    if shape == Shape::Text {
        out.extend(strip_affixes(examples));
    }

    for (open, close) in BRACKETS {
        let pattern = format!(
            "{}([^{}]*){}",
            regex::escape(&open.to_string()),
            regex::escape(&close.to_string()),
            regex::escape(&close.to_string())
        );
        out.extend(variants(Extractor::matching(Extractor::Input, pattern, 1), shape));
    }

    out
}

/// `key: value` / `key=value` pairs, with the output on either side
fn key_value(examples: &[Example], shape: Shape) -> Vec<Extractor> {
    let mut out = Vec::new();
    if shape == Shape::Text {
        out.push(Extractor::matching(Extractor::Input, r"([A-Za-z_][\w-]*)\s*[:=]", 1));
    }

    let Some((start, _)) = locate(&examples[0]) else {
        return out;
    };
    let before = examples[0].input[..start].trim_end();
    let Some(before_sep) = before.strip_suffix(':').or_else(|| before.strip_suffix('=')) else {
        return out;
    };
    let key: String = before_sep
        .trim_end()
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.is_empty() {
        return out;
    }

    let key = regex::escape(&key);
    let token = Extractor::matching(Extractor::Input, format!(r"{}\s*[:=]\s*([^\s,;]+)", key), 1);
    let phrase = Extractor::matching(Extractor::Input, format!(r"{}\s*[:=]\s*([^,;\n]+?)\s*(?:[,;]|$)", key), 1);
    out.extend(variants(token, shape));
    out.extend(variants(phrase, shape));
    out
}

/// Common literal prefix/suffix removal, and constant-offset slices
fn strip_affixes(examples: &[Example]) -> Vec<Extractor> {
    let mut out = Vec::new();
    let inputs: Vec<Vec<char>> = examples.iter().map(|e| e.input.chars().collect()).collect();
    let shortest = inputs.iter().map(Vec::len).min().unwrap_or(0);

    let prefix: String = (0..shortest)
        .take_while(|&i| inputs.iter().all(|s| s[i] == inputs[0][i]))
        .map(|i| inputs[0][i])
        .collect();
    let prefix_len = prefix.chars().count();
    let suffix: String = {
        let n = (0..shortest - prefix_len)
            .take_while(|&i| inputs.iter().all(|s| s[s.len() - 1 - i] == inputs[0][inputs[0].len() - 1 - i]))
            .count();
        inputs[0][inputs[0].len() - n..].iter().collect()
    };
    if !prefix.is_empty() || !suffix.is_empty() {
        let mut stripped = Extractor::Input;
        if !prefix.is_empty() {
            stripped = Extractor::replace(stripped, format!("^{}", regex::escape(&prefix)), "");
        }
        if !suffix.is_empty() {
            stripped = Extractor::replace(stripped, format!("{}$", regex::escape(&suffix)), "");
        }
        out.push(stripped);
    }

    let offsets: Option<Vec<(i64, i64)>> = examples
        .iter()
        .map(|e| {
            let (start, text) = locate(e)?;
            let head = e.input[..start].chars().count() as i64;
            let tail = e.input.chars().count() as i64 - head - text.chars().count() as i64;
            Some((head, tail))
        })
        .collect();
    if let Some(offsets) = offsets
        && offsets.iter().all(|o| *o == offsets[0])
    {
        let (head, tail) = offsets[0];
        out.push(Extractor::Slice {
            source: Box::new(Extractor::Input),
            start: head,
            end: (tail > 0).then_some(-tail),
        });
    }
    out
}

// ========== Lattice ==========

fn lattice(examples: &[Example], shape: Shape, config: &SynthesisConfig) -> Vec<Extractor> {
    let mut out = Vec::new();

    out.extend(variants(Extractor::Input, shape));
    if shape == Shape::Text {
        out.push(Extractor::replace(Extractor::Input, r"^\s+|\s+$", ""));
    }

    for pattern in SUB_PATTERNS {
        out.extend(variants(Extractor::matching(Extractor::Input, *pattern, 0), shape));
    }

    if let Some(context) = shared_context(examples) {
        let context = regex::escape(&context);
        for pattern in SUB_PATTERNS {
            let captured = Extractor::matching(Extractor::Input, format!(r"{}\s*({})", context, pattern), 1);
            out.extend(variants(captured, shape));
        }
    }

    // A pattern generalized from the outputs' own text
    let located: Option<Vec<String>> = examples.iter().map(|e| locate(e).map(|(_, text)| text)).collect();
    if let Some(texts) = located {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        if let Ok(synthesized) = regex_synth::synthesize(&refs, &[], config) {
            let pattern = synthesized.pattern;
            out.extend(variants(Extractor::matching(Extractor::Input, pattern.clone(), 0), shape));
            out.extend(variants(
                Extractor::matching(Extractor::Input, format!(r"\b({})\b", pattern), 1),
                shape,
            ));
        }
    }

    out
}

/// Longest text (up to [`MAX_CONTEXT`] chars) that immediately precedes the
/// output in every example, ignoring whitespace right before the output
fn shared_context(examples: &[Example]) -> Option<String> {
    let befores: Vec<Vec<char>> = examples
        .iter()
        .map(|e| locate(e).map(|(start, _)| e.input[..start].trim_end().chars().collect()))
        .collect::<Option<_>>()?;
    let shortest = befores.iter().map(Vec::len).min()?.min(MAX_CONTEXT);
    let n = (0..shortest)
        .take_while(|&i| {
            let at = |s: &Vec<char>| s[s.len() - 1 - i];
            befores.iter().all(|b| at(b) == at(&befores[0]))
        })
        .count();
    if n == 0 {
        return None;
    }
    let first = &befores[0];
    Some(first[first.len() - n..].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(examples: &[Example]) -> Vec<Extractor> {
        synthesize(examples, &SynthesisConfig::default()).unwrap()
    }

    #[test]
    fn test_currency_scenario() {
        let found = run(&[Example::number("$1,234", 1234.0), Example::number("$500", 500.0)]);
        assert_eq!(found[0].eval("$9,999"), Output::Number(9999.0));
    }

    #[test]
    fn test_closed_forms() {
        let identity = run(&[Example::text("a", "a"), Example::text("b", "b")]);
        assert_eq!(identity, vec![Extractor::Input]);
        let constant = run(&[Example::number("a", 7.0), Example::number("b", 7.0)]);
        assert_eq!(constant, vec![Extractor::Lit(Output::Number(7.0))]);
    }

    #[test]
    fn test_eu_currency() {
        let found = run(&[Example::number("€1.234,56", 1234.56), Example::number("€7,50", 7.5)]);
        assert_eq!(found[0].eval("€2.000,25"), Output::Number(2000.25));
    }

    #[test]
    fn test_key_value() {
        let found = run(&[
            Example::text("name: alice, age: 30", "alice"),
            Example::text("age: 41, name: bob", "bob"),
        ]);
        assert_eq!(found[0].eval("name: carol"), Output::Str("carol".into()));
    }

    #[test]
    fn test_delimited_field() {
        let found = run(&[Example::text("a|b|c", "b"), Example::text("x|yy|z", "yy")]);
        assert_eq!(found[0].eval("1|2|3"), Output::Str("2".into()));
    }

    #[test]
    fn test_bracket_unwrap() {
        let found = run(&[Example::text("call (first) now", "first"), Example::text("(second)", "second")]);
        assert_eq!(found[0].eval("x (third) y"), Output::Str("third".into()));
    }

    #[test]
    fn test_percentage() {
        let found = run(&[Example::number("up 12.5%", 12.5), Example::number("down 3 %", 3.0)]);
        assert_eq!(found[0].eval("flat 0%"), Output::Number(0.0));
    }

    #[test]
    fn test_every_result_reproduces_examples() {
        let examples = vec![Example::number("Total: 42 items", 42.0), Example::number("Total: 7 boxes", 7.0)];
        let found = run(&examples);
        assert!(!found.is_empty());
        assert!(found.len() <= SynthesisConfig::default().max_extractors);
        for extractor in &found {
            assert!(reproduces(extractor, &examples, 1e-9), "{}", extractor);
        }
    }

    #[test]
    fn test_conflicts_rejected_before_search() {
        let err = synthesize(
            &[Example::number("x", 1.0), Example::number("x", 2.0)],
            &SynthesisConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SynthesisError::Examples(_)));
    }

    #[test]
    fn test_deterministic() {
        let examples = vec![Example::text("id=17;", "17"), Example::text("id=204;", "204")];
        assert_eq!(run(&examples), run(&examples));
    }
}
