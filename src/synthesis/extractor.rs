//! Extractor AST - small pure string → value programs
//!
//! Evaluation is total: a failed step (no match, bad index, unparseable
//! number) yields `null` and null propagates, so an extractor never errors.
//! Each extractor has a canonical S-expression form and a JavaScript form.

use crate::example::{Output, escape_string};
use regex::Regex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Extractor {
    /// The input string itself
    Input,
    Lit(Output),
    /// Capture `group` of the first match, or null
    Match {
        source: Box<Extractor>,
        pattern: String,
        group: usize,
    },
    /// Every whole match, as an array
    MatchAll {
        source: Box<Extractor>,
        pattern: String,
    },
    Replace {
        source: Box<Extractor>,
        pattern: String,
        replacement: String,
    },
    /// Char slice with JavaScript semantics: negative bounds count from the end
    Slice {
        source: Box<Extractor>,
        start: i64,
        end: Option<i64>,
    },
    Split {
        source: Box<Extractor>,
        delimiter: String,
        index: Option<usize>,
    },
    ParseInt(Box<Extractor>),
    ParseFloat(Box<Extractor>),
    Add(Box<Extractor>, Box<Extractor>),
    If {
        cond: Box<Extractor>,
        then: Box<Extractor>,
        otherwise: Box<Extractor>,
    },
}

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<String, Option<Regex>>> = RefCell::new(HashMap::new());
}

/// Patterns kept per thread before the cache starts over
const REGEX_CACHE_LIMIT: usize = 256;

/// Compile `pattern` once per thread; invalid patterns are remembered as `None`.
/// Agent-supplied patterns land here too, so the cache is flushed whenever it
/// reaches [`REGEX_CACHE_LIMIT`].
pub(crate) fn cached_regex(pattern: &str) -> Option<Regex> {
    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(re) = cache.get(pattern) {
            return re.clone();
        }
        if cache.len() >= REGEX_CACHE_LIMIT {
            tracing::debug!("Regex cache full ({} patterns), flushing", cache.len());
            cache.clear();
        }
        let re = Regex::new(pattern).ok();
        cache.insert(pattern.to_string(), re.clone());
        re
    })
}

const FLOAT_PREFIX: &str = r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?";
const INT_PREFIX: &str = r"^[+-]?\d+";

/// JavaScript `parseFloat`: the longest numeric prefix after leading whitespace.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let re = cached_regex(FLOAT_PREFIX)?;
    let m = re.find(s.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JavaScript `parseInt` (base 10): leading sign and digits.
pub fn parse_int_prefix(s: &str) -> Option<f64> {
    let re = cached_regex(INT_PREFIX)?;
    let m = re.find(s.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JavaScript-style truthiness
pub fn truthy(output: &Output) -> bool {
    match output {
        Output::Null => false,
        Output::Bool(b) => *b,
        Output::Number(n) => *n != 0.0 && !n.is_nan(),
        Output::Str(s) => !s.is_empty(),
        Output::Array(_) => true,
    }
}

fn slice_chars(s: &str, start: i64, end: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let clamp = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };
    let from = clamp(start);
    let to = end.map(clamp).unwrap_or(len);
    if from >= to {
        return String::new();
    }
    chars[from as usize..to as usize].iter().collect()
}

impl Extractor {
    pub fn matching(source: Extractor, pattern: impl Into<String>, group: usize) -> Self {
        Extractor::Match {
            source: Box::new(source),
            pattern: pattern.into(),
            group,
        }
    }

    pub fn replace(source: Extractor, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Extractor::Replace {
            source: Box::new(source),
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    pub fn split(source: Extractor, delimiter: impl Into<String>, index: Option<usize>) -> Self {
        Extractor::Split {
            source: Box::new(source),
            delimiter: delimiter.into(),
            index,
        }
    }

    pub fn parse_float(source: Extractor) -> Self {
        Extractor::ParseFloat(Box::new(source))
    }

    pub fn parse_int(source: Extractor) -> Self {
        Extractor::ParseInt(Box::new(source))
    }

    /// Run the extractor on `input`. Never fails; failed steps yield null.
    pub fn eval(&self, input: &str) -> Output {
        match self {
            Extractor::Input => Output::Str(input.to_string()),
            Extractor::Lit(output) => output.clone(),
            Extractor::Match { source, pattern, group } => match (source.eval(input), cached_regex(pattern)) {
                (Output::Str(s), Some(re)) => re
                    .captures(&s)
                    .and_then(|caps| caps.get(*group))
                    .map(|m| Output::Str(m.as_str().to_string()))
                    .unwrap_or(Output::Null),
                _ => Output::Null,
            },
            Extractor::MatchAll { source, pattern } => match (source.eval(input), cached_regex(pattern)) {
                (Output::Str(s), Some(re)) => Output::Array(
                    re.find_iter(&s)
                        .map(|m| Output::Str(m.as_str().to_string()))
                        .collect(),
                ),
                _ => Output::Null,
            },
            Extractor::Replace { source, pattern, replacement } => {
                match (source.eval(input), cached_regex(pattern)) {
                    (Output::Str(s), Some(re)) => Output::Str(re.replace_all(&s, replacement.as_str()).into_owned()),
                    _ => Output::Null,
                }
            }
            Extractor::Slice { source, start, end } => match source.eval(input) {
                Output::Str(s) => Output::Str(slice_chars(&s, *start, *end)),
                _ => Output::Null,
            },
            Extractor::Split { source, delimiter, index } => match source.eval(input) {
                Output::Str(s) if !delimiter.is_empty() => {
                    let mut parts = s.split(delimiter.as_str()).map(|p| Output::Str(p.to_string()));
                    match index {
                        Some(i) => parts.nth(*i).unwrap_or(Output::Null),
                        None => Output::Array(parts.collect()),
                    }
                }
                _ => Output::Null,
            },
            Extractor::ParseInt(source) => match source.eval(input) {
                Output::Str(s) => parse_int_prefix(&s).map(Output::Number).unwrap_or(Output::Null),
                Output::Number(n) => Output::Number(n.trunc()),
                _ => Output::Null,
            },
            Extractor::ParseFloat(source) => match source.eval(input) {
                Output::Str(s) => parse_float_prefix(&s).map(Output::Number).unwrap_or(Output::Null),
                Output::Number(n) => Output::Number(n),
                _ => Output::Null,
            },
            Extractor::Add(a, b) => match (a.eval(input), b.eval(input)) {
                (Output::Number(x), Output::Number(y)) => Output::Number(x + y),
                _ => Output::Null,
            },
            Extractor::If { cond, then, otherwise } => {
                if truthy(&cond.eval(input)) {
                    then.eval(input)
                } else {
                    otherwise.eval(input)
                }
            }
        }
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        1 + match self {
            Extractor::Input | Extractor::Lit(_) => 0,
            Extractor::Match { source, .. }
            | Extractor::MatchAll { source, .. }
            | Extractor::Replace { source, .. }
            | Extractor::Slice { source, .. }
            | Extractor::Split { source, .. }
            | Extractor::ParseInt(source)
            | Extractor::ParseFloat(source) => source.size(),
            Extractor::Add(a, b) => a.size() + b.size(),
            Extractor::If { cond, then, otherwise } => cond.size() + then.size() + otherwise.size(),
        }
    }

    /// Replace every `Input` leaf with `inner`, composing `self ∘ inner`.
    pub fn substitute_input(&self, inner: &Extractor) -> Extractor {
        let sub = |e: &Extractor| Box::new(e.substitute_input(inner));
        match self {
            Extractor::Input => inner.clone(),
            Extractor::Lit(output) => Extractor::Lit(output.clone()),
            Extractor::Match { source, pattern, group } => Extractor::Match {
                source: sub(source),
                pattern: pattern.clone(),
                group: *group,
            },
            Extractor::MatchAll { source, pattern } => Extractor::MatchAll {
                source: sub(source),
                pattern: pattern.clone(),
            },
            Extractor::Replace { source, pattern, replacement } => Extractor::Replace {
                source: sub(source),
                pattern: pattern.clone(),
                replacement: replacement.clone(),
            },
            Extractor::Slice { source, start, end } => Extractor::Slice {
                source: sub(source),
                start: *start,
                end: *end,
            },
            Extractor::Split { source, delimiter, index } => Extractor::Split {
                source: sub(source),
                delimiter: delimiter.clone(),
                index: *index,
            },
            Extractor::ParseInt(source) => Extractor::ParseInt(sub(source)),
            Extractor::ParseFloat(source) => Extractor::ParseFloat(sub(source)),
            Extractor::Add(a, b) => Extractor::Add(sub(a), sub(b)),
            Extractor::If { cond, then, otherwise } => Extractor::If {
                cond: sub(cond),
                then: sub(then),
                otherwise: sub(otherwise),
            },
        }
    }

    /// JavaScript expression over a variable named `input`
    pub fn to_js(&self) -> String {
        let js_str = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
        let as_text = |e: &Extractor| format!("__text({})", e.to_js());
        match self {
            Extractor::Input => "input".to_string(),
            Extractor::Lit(output) => serde_json::to_string(output).unwrap_or_else(|_| "null".to_string()),
            Extractor::Match { source, pattern, group } => {
                format!("__match({}, {}, {})", as_text(source), js_str(pattern), group)
            }
            Extractor::MatchAll { source, pattern } => {
                format!("__matchAll({}, {})", as_text(source), js_str(pattern))
            }
            Extractor::Replace { source, pattern, replacement } => {
                format!("__replace({}, {}, {})", as_text(source), js_str(pattern), js_str(replacement))
            }
            Extractor::Slice { source, start, end } => match end {
                Some(end) => format!("__slice({}, {}, {})", as_text(source), start, end),
                None => format!("__slice({}, {})", as_text(source), start),
            },
            Extractor::Split { source, delimiter, index } => match index {
                Some(i) => format!("__split({}, {}, {})", as_text(source), js_str(delimiter), i),
                None => format!("__split({}, {})", as_text(source), js_str(delimiter)),
            },
            Extractor::ParseInt(source) => format!("__parseInt({})", source.to_js()),
            Extractor::ParseFloat(source) => format!("__parseFloat({})", source.to_js()),
            Extractor::Add(a, b) => format!("__add({}, {})", a.to_js(), b.to_js()),
            Extractor::If { cond, then, otherwise } => {
                format!("(__truthy({}) ? {} : {})", cond.to_js(), then.to_js(), otherwise.to_js())
            }
        }
    }

    /// A standalone JavaScript arrow function
    pub fn to_js_function(&self) -> String {
        format!("((input) => {})", self.to_js())
    }
}

/// Helpers every emitted extractor relies on. Mirrors [`Extractor::eval`].
pub const JS_HELPERS: &str = r#"const __text = (v) => (typeof v === "string" ? v : null);
const __match = (s, p, g) => { if (s === null) return null; const m = s.match(new RegExp(p)); return m && m[g] !== undefined ? m[g] : null; };
const __matchAll = (s, p) => (s === null ? null : Array.from(s.matchAll(new RegExp(p, "g")), (m) => m[0]));
const __replace = (s, p, r) => (s === null ? null : s.replace(new RegExp(p, "g"), r));
const __slice = (s, a, b) => (s === null ? null : Array.from(s).slice(a, b).join(""));
const __split = (s, d, i) => { if (s === null || d === "") return null; const parts = s.split(d); return i === undefined ? parts : (i < parts.length ? parts[i] : null); };
const __num = (n) => (Number.isFinite(n) ? n : null);
const __parseInt = (v) => (typeof v === "number" ? Math.trunc(v) : typeof v === "string" ? __num(parseInt(v, 10)) : null);
const __parseFloat = (v) => (typeof v === "number" ? v : typeof v === "string" ? __num(parseFloat(v)) : null);
const __add = (a, b) => (typeof a === "number" && typeof b === "number" ? a + b : null);
const __truthy = (v) => v !== null && v !== false && v !== 0 && v !== "" && !Number.isNaN(v);
"#;

impl fmt::Display for Extractor {
    /// Canonical S-expression form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Input => write!(f, "(input)"),
            Extractor::Lit(output) => write!(f, "{}", output),
            Extractor::Match { source, pattern, group } => {
                write!(f, "(match {} \"{}\" {})", source, escape_string(pattern), group)
            }
            Extractor::MatchAll { source, pattern } => {
                write!(f, "(match_all {} \"{}\")", source, escape_string(pattern))
            }
            Extractor::Replace { source, pattern, replacement } => write!(
                f,
                "(replace {} \"{}\" \"{}\")",
                source,
                escape_string(pattern),
                escape_string(replacement)
            ),
            Extractor::Slice { source, start, end } => match end {
                Some(end) => write!(f, "(slice {} {} {})", source, start, end),
                None => write!(f, "(slice {} {})", source, start),
            },
            Extractor::Split { source, delimiter, index } => match index {
                Some(i) => write!(f, "(split {} \"{}\" {})", source, escape_string(delimiter), i),
                None => write!(f, "(split {} \"{}\")", source, escape_string(delimiter)),
            },
            Extractor::ParseInt(source) => write!(f, "(parseInt {})", source),
            Extractor::ParseFloat(source) => write!(f, "(parseFloat {})", source),
            Extractor::Add(a, b) => write!(f, "(add {} {})", a, b),
            Extractor::If { cond, then, otherwise } => write!(f, "(if {} {} {})", cond, then, otherwise),
        }
    }
}

impl Serialize for Extractor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_cache_stays_bounded() {
        for i in 0..REGEX_CACHE_LIMIT * 2 + 7 {
            assert!(cached_regex(&format!("line {}", i)).is_some());
        }
        let size = REGEX_CACHE.with(|cache| cache.borrow().len());
        assert!(size <= REGEX_CACHE_LIMIT, "cache holds {} patterns", size);
        assert!(cached_regex("(").is_none());
        assert!(cached_regex(r"\d+").is_some_and(|re| re.is_match("42")));
    }

    fn us_currency() -> Extractor {
        Extractor::parse_float(Extractor::replace(
            Extractor::matching(Extractor::Input, r"-?[\d,]+(?:\.\d+)?", 0),
            ",",
            "",
        ))
    }

    #[test]
    fn test_eval_currency_pipeline() {
        let f = us_currency();
        assert_eq!(f.eval("$1,234"), Output::Number(1234.0));
        assert_eq!(f.eval("$9,999"), Output::Number(9999.0));
        assert_eq!(f.eval("no digits"), Output::Null);
    }

    #[test]
    fn test_eval_is_total() {
        let bad = Extractor::matching(Extractor::Input, "(", 0);
        assert_eq!(bad.eval("anything"), Output::Null);
        let split = Extractor::split(Extractor::Input, ",", Some(5));
        assert_eq!(split.eval("a,b"), Output::Null);
        let parsed = Extractor::parse_int(Extractor::Lit(Output::Bool(true)));
        assert_eq!(parsed.eval("x"), Output::Null);
    }

    #[test]
    fn test_slice_negative_end() {
        let strip = Extractor::Slice {
            source: Box::new(Extractor::Input),
            start: 1,
            end: Some(-1),
        };
        assert_eq!(strip.eval("[value]"), Output::Str("value".into()));
        assert_eq!(strip.eval("x"), Output::Str(String::new()));
    }

    #[test]
    fn test_js_float_semantics() {
        assert_eq!(parse_float_prefix("  12.5kg"), Some(12.5));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-42.9"), Some(-42.0));
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(
            us_currency().to_string(),
            r#"(parseFloat (replace (match (input) "-?[\\d,]+(?:\\.\\d+)?" 0) "," ""))"#
        );
    }

    #[test]
    fn test_substitute_input_composes() {
        let transformer = Extractor::parse_float(Extractor::Input);
        let isolate = Extractor::matching(Extractor::Input, r"\d+", 0);
        let fused = transformer.substitute_input(&isolate);
        assert_eq!(fused.eval("total 42 items"), Output::Number(42.0));
        assert_eq!(fused.size(), 3);
    }

    #[test]
    fn test_to_js_uses_helpers() {
        let js = us_currency().to_js_function();
        assert!(js.starts_with("((input) => __parseFloat(__replace(__text(__match(__text(input)"));
        assert!(JS_HELPERS.contains("const __match"));
    }
}
