//! Regex Synthesizer - positive/negative strings → verified regex
//!
//! Strategies run in a fixed order and the first verified candidate wins:
//! 1. Template table of recurring structured-text shapes
//! 2. Positional character-class analysis (equal lengths), or common
//!    prefix/suffix around one bounded repeat (unequal lengths)
//! 3. Literal alternation of the positives
//!
//! Verification uses whole-string semantics: every positive must match
//! `^(?:pattern)$` and no negative may.

use super::regex_ast::{CharClass, RegexAst};
use super::{SynthesisConfig, SynthesisError};
use crate::example::ExampleError;
use regex::Regex;
use serde::Serialize;

/// How a synthesized regex was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexStrategy {
    Template(&'static str),
    Positional,
    PrefixSuffix,
    Alternation,
}

impl RegexStrategy {
    pub fn describe(&self) -> String {
        match self {
            RegexStrategy::Template(name) => format!("template '{}'", name),
            RegexStrategy::Positional => "positional character classes".to_string(),
            RegexStrategy::PrefixSuffix => "common prefix/suffix with bounded repeat".to_string(),
            RegexStrategy::Alternation => "literal alternation".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegexSynthesis {
    pub pattern: String,
    pub ast: RegexAst,
    pub strategy: RegexStrategy,
}

impl RegexSynthesis {
    fn new(ast: RegexAst, strategy: RegexStrategy) -> Self {
        Self {
            pattern: ast.to_pattern(),
            ast,
            strategy,
        }
    }

    /// The pattern wrapped for whole-string matching
    pub fn anchored(&self) -> String {
        anchored(&self.pattern)
    }
}

pub fn anchored(pattern: &str) -> String {
    format!("^(?:{})$", pattern)
}

/// Whether `pattern` accepts every positive and no negative as a whole string.
pub fn verify(pattern: &str, positives: &[&str], negatives: &[&str]) -> bool {
    match Regex::new(&anchored(pattern)) {
        Ok(re) => positives.iter().all(|p| re.is_match(p)) && !negatives.iter().any(|n| re.is_match(n)),
        Err(_) => false,
    }
}

/// Synthesize a regex accepting `positives` and rejecting `negatives`.
pub fn synthesize(positives: &[&str], negatives: &[&str], config: &SynthesisConfig) -> Result<RegexSynthesis, SynthesisError> {
    if positives.is_empty() {
        return Err(ExampleError::Empty.into());
    }
    if let Some(both) = positives.iter().find(|p| negatives.contains(*p)) {
        return Err(SynthesisError::PolarityConflict(both.to_string()));
    }

    for &(name, build) in TEMPLATES {
        let candidate = RegexSynthesis::new(build(), RegexStrategy::Template(name));
        if verify(&candidate.pattern, positives, negatives) {
            tracing::debug!("Regex synthesized via template '{}': {}", name, candidate.pattern);
            return Ok(candidate);
        }
    }

    if let Some(candidate) = structural(positives)
        && verify(&candidate.pattern, positives, negatives)
    {
        tracing::debug!("Regex synthesized via {}: {}", candidate.strategy.describe(), candidate.pattern);
        return Ok(candidate);
    }

    if let Some(candidate) = alternation(positives, config.alternation_limit)
        && verify(&candidate.pattern, positives, negatives)
    {
        tracing::debug!("Regex synthesized via literal alternation: {}", candidate.pattern);
        return Ok(candidate);
    }

    Err(SynthesisError::NoRegex)
}

// ========== Templates ==========

type Template = (&'static str, fn() -> RegexAst);

/// Ordered template table; earlier shapes are narrower.
const TEMPLATES: &[Template] = &[
    ("integer", integer),
    ("decimal", decimal),
    ("grouped number", grouped_number),
    ("currency", currency),
    ("percentage", percentage),
    ("iso date", iso_date),
    ("us date", us_date),
    ("time", time),
    ("email", email),
    ("ipv4", ipv4),
    ("hex color", hex_color),
    ("semantic version", semver),
    ("phone", phone),
    ("uuid", uuid),
];

fn lit(s: &str) -> RegexAst {
    RegexAst::literal(s)
}

fn digits(min: usize, max: Option<usize>) -> RegexAst {
    RegexAst::repeat(RegexAst::class(CharClass::Digit), min, max)
}

fn non_capturing(inner: RegexAst) -> RegexAst {
    RegexAst::Group {
        inner: Box::new(inner),
        capturing: false,
    }
}

fn sign() -> RegexAst {
    RegexAst::optional(lit("-"))
}

fn fraction() -> RegexAst {
    RegexAst::Seq(vec![lit("."), digits(1, None)])
}

fn integer() -> RegexAst {
    RegexAst::Seq(vec![sign(), digits(1, None)])
}

fn decimal() -> RegexAst {
    RegexAst::Seq(vec![sign(), digits(1, None), fraction()])
}

/// `1,234,567` with an optional fraction; plain digits allowed too
fn grouped_digits() -> RegexAst {
    RegexAst::Alt(vec![
        RegexAst::Seq(vec![
            digits(1, Some(3)),
            RegexAst::one_or_more(RegexAst::Seq(vec![lit(","), digits(3, Some(3))])),
        ]),
        digits(1, None),
    ])
}

fn grouped_number() -> RegexAst {
    RegexAst::Seq(vec![sign(), grouped_digits(), RegexAst::optional(fraction())])
}

fn currency() -> RegexAst {
    RegexAst::Seq(vec![
        RegexAst::optional(lit("-")),
        RegexAst::class(CharClass::Custom(vec!['$', '€', '£', '¥'])),
        grouped_digits(),
        RegexAst::optional(RegexAst::Seq(vec![lit("."), digits(1, Some(2))])),
    ])
}

fn percentage() -> RegexAst {
    RegexAst::Seq(vec![sign(), digits(1, None), RegexAst::optional(fraction()), lit("%")])
}

fn iso_date() -> RegexAst {
    RegexAst::Seq(vec![digits(4, Some(4)), lit("-"), digits(2, Some(2)), lit("-"), digits(2, Some(2))])
}

fn us_date() -> RegexAst {
    RegexAst::Seq(vec![digits(1, Some(2)), lit("/"), digits(1, Some(2)), lit("/"), digits(4, Some(4))])
}

fn time() -> RegexAst {
    RegexAst::Seq(vec![
        digits(1, Some(2)),
        lit(":"),
        digits(2, Some(2)),
        RegexAst::optional(RegexAst::Seq(vec![lit(":"), digits(2, Some(2))])),
    ])
}

fn email() -> RegexAst {
    let local: Vec<char> = "._%+-".chars().collect();
    let domain: Vec<char> = ".-".chars().collect();
    let with = |extra: &[char]| {
        let mut set: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
        set.extend_from_slice(extra);
        RegexAst::one_or_more(RegexAst::class(CharClass::Custom(set)))
    };
    RegexAst::Seq(vec![
        with(&local),
        lit("@"),
        with(&domain),
        lit("."),
        RegexAst::repeat(RegexAst::class(CharClass::Alpha), 2, None),
    ])
}

fn ipv4() -> RegexAst {
    RegexAst::Seq(vec![
        digits(1, Some(3)),
        RegexAst::repeat(RegexAst::Seq(vec![lit("."), digits(1, Some(3))]), 3, Some(3)),
    ])
}

fn hex_color() -> RegexAst {
    let hex = |n| RegexAst::repeat(RegexAst::class(CharClass::Hex), n, Some(n));
    RegexAst::Seq(vec![lit("#"), non_capturing(RegexAst::Alt(vec![hex(6), hex(3)]))])
}

fn semver() -> RegexAst {
    let mut tag: Vec<char> = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
    tag.extend(['.', '-']);
    RegexAst::Seq(vec![
        RegexAst::optional(lit("v")),
        digits(1, None),
        lit("."),
        digits(1, None),
        lit("."),
        digits(1, None),
        RegexAst::optional(RegexAst::Seq(vec![
            lit("-"),
            RegexAst::one_or_more(RegexAst::class(CharClass::Custom(tag))),
        ])),
    ])
}

fn phone() -> RegexAst {
    let area = RegexAst::Alt(vec![
        RegexAst::Seq(vec![lit("("), digits(3, Some(3)), lit(")"), RegexAst::optional(lit(" "))]),
        RegexAst::Seq(vec![digits(3, Some(3)), lit("-")]),
    ]);
    RegexAst::Seq(vec![
        RegexAst::optional(non_capturing(area)),
        digits(3, Some(3)),
        lit("-"),
        digits(4, Some(4)),
    ])
}

fn uuid() -> RegexAst {
    let hex = |n| RegexAst::repeat(RegexAst::class(CharClass::Hex), n, Some(n));
    RegexAst::Seq(vec![hex(8), lit("-"), hex(4), lit("-"), hex(4), lit("-"), hex(4), lit("-"), hex(12)])
}

// ========== Structural analysis ==========

fn structural(positives: &[&str]) -> Option<RegexSynthesis> {
    let columns: Vec<Vec<char>> = positives.iter().map(|p| p.chars().collect()).collect();
    let len = columns[0].len();
    if columns.iter().all(|c| c.len() == len) {
        positional(&columns).map(|ast| RegexSynthesis::new(ast, RegexStrategy::Positional))
    } else {
        prefix_suffix(&columns).map(|ast| RegexSynthesis::new(ast, RegexStrategy::PrefixSuffix))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Fixed(char),
    Class(CharClass),
}

/// Equal-length positives: each column is a fixed literal or the narrowest
/// shared class; runs of the same class are collapsed into one repeat.
fn positional(strings: &[Vec<char>]) -> Option<RegexAst> {
    let len = strings[0].len();
    if len == 0 {
        return None;
    }

    let columns: Vec<Column> = (0..len)
        .map(|i| {
            let first = strings[0][i];
            if strings.iter().all(|s| s[i] == first) {
                Column::Fixed(first)
            } else {
                Column::Class(CharClass::narrowest(strings.iter().map(|s| s[i]).collect::<Vec<_>>()))
            }
        })
        .collect();

    let mut parts = Vec::new();
    let mut i = 0;
    while i < columns.len() {
        match &columns[i] {
            Column::Fixed(_) => {
                let mut text = String::new();
                while let Some(Column::Fixed(c)) = columns.get(i) {
                    text.push(*c);
                    i += 1;
                }
                parts.push(RegexAst::Literal(text));
            }
            Column::Class(class) => {
                let mut run = 0;
                while columns.get(i) == Some(&Column::Class(class.clone())) {
                    run += 1;
                    i += 1;
                }
                parts.push(RegexAst::repeat(RegexAst::class(class.clone()), run, Some(run)));
            }
        }
    }

    Some(if parts.len() == 1 { parts.remove(0) } else { RegexAst::Seq(parts) })
}

/// Unequal-length positives: common literal prefix and suffix around one
/// bounded repeat of the narrowest class covering every middle.
fn prefix_suffix(strings: &[Vec<char>]) -> Option<RegexAst> {
    let shortest = strings.iter().map(Vec::len).min()?;

    let prefix = (0..shortest)
        .take_while(|&i| strings.iter().all(|s| s[i] == strings[0][i]))
        .count();
    let suffix = (0..shortest - prefix)
        .take_while(|&i| {
            let at = |s: &Vec<char>| s[s.len() - 1 - i];
            strings.iter().all(|s| at(s) == at(&strings[0]))
        })
        .count();

    let middles: Vec<&[char]> = strings.iter().map(|s| &s[prefix..s.len() - suffix]).collect();
    let min = middles.iter().map(|m| m.len()).min()?;
    let max = middles.iter().map(|m| m.len()).max()?;
    if max == 0 {
        return None;
    }
    let class = CharClass::narrowest(middles.iter().flat_map(|m| m.iter().copied()).collect::<Vec<_>>());

    let mut parts = Vec::new();
    if prefix > 0 {
        parts.push(RegexAst::Literal(strings[0][..prefix].iter().collect()));
    }
    parts.push(RegexAst::repeat(RegexAst::class(class), min, Some(max)));
    if suffix > 0 {
        let first = &strings[0];
        parts.push(RegexAst::Literal(first[first.len() - suffix..].iter().collect()));
    }
    Some(RegexAst::Seq(parts))
}

/// Literal alternation of the distinct positives, longest first.
fn alternation(positives: &[&str], limit: usize) -> Option<RegexSynthesis> {
    let mut distinct: Vec<&str> = Vec::new();
    for p in positives {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    if distinct.len() > limit {
        return None;
    }
    distinct.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    let ast = RegexAst::Alt(distinct.into_iter().map(RegexAst::literal).collect());
    Some(RegexSynthesis::new(ast, RegexStrategy::Alternation))
}
