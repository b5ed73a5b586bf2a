//! Regex AST with one canonical serializer to `regex`-crate syntax

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character classes, narrowest first in the generalization chain
/// `Digit < Upper < Lower < Alpha < Word < Any`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Digit,
    Word,
    Space,
    Upper,
    Lower,
    Alpha,
    Hex,
    Any,
    /// An explicit set of characters
    Custom(Vec<char>),
}

impl CharClass {
    /// Classes tried when generalizing a column, narrowest first
    pub const CHAIN: [CharClass; 6] = [
        CharClass::Digit,
        CharClass::Upper,
        CharClass::Lower,
        CharClass::Alpha,
        CharClass::Word,
        CharClass::Any,
    ];

    pub fn contains(&self, c: char) -> bool {
        match self {
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Word => c.is_ascii_alphanumeric() || c == '_',
            CharClass::Space => c.is_whitespace(),
            CharClass::Upper => c.is_ascii_uppercase(),
            CharClass::Lower => c.is_ascii_lowercase(),
            CharClass::Alpha => c.is_ascii_alphabetic(),
            CharClass::Hex => c.is_ascii_hexdigit(),
            CharClass::Any => c != '\n',
            CharClass::Custom(set) => set.contains(&c),
        }
    }

    /// Narrowest class of the chain containing every char of `chars`
    pub fn narrowest(chars: impl IntoIterator<Item = char> + Clone) -> CharClass {
        Self::CHAIN
            .iter()
            .find(|class| chars.clone().into_iter().all(|c| class.contains(c)))
            .cloned()
            .unwrap_or(CharClass::Any)
    }

    fn write_pattern(&self, out: &mut String) {
        match self {
            CharClass::Digit => out.push_str(r"\d"),
            CharClass::Word => out.push_str(r"\w"),
            CharClass::Space => out.push_str(r"\s"),
            CharClass::Upper => out.push_str("[A-Z]"),
            CharClass::Lower => out.push_str("[a-z]"),
            CharClass::Alpha => out.push_str("[A-Za-z]"),
            CharClass::Hex => out.push_str("[0-9A-Fa-f]"),
            CharClass::Any => out.push('.'),
            CharClass::Custom(set) => {
                out.push('[');
                for c in set {
                    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
                        out.push('\\');
                    }
                    out.push(*c);
                }
                out.push(']');
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexAst {
    Literal(String),
    Class(CharClass),
    Repeat {
        inner: Box<RegexAst>,
        min: usize,
        max: Option<usize>,
    },
    Seq(Vec<RegexAst>),
    Alt(Vec<RegexAst>),
    Group {
        inner: Box<RegexAst>,
        capturing: bool,
    },
}

impl RegexAst {
    pub fn literal(s: impl Into<String>) -> Self {
        RegexAst::Literal(s.into())
    }

    pub fn class(class: CharClass) -> Self {
        RegexAst::Class(class)
    }

    pub fn repeat(inner: RegexAst, min: usize, max: Option<usize>) -> Self {
        RegexAst::Repeat {
            inner: Box::new(inner),
            min,
            max,
        }
    }

    pub fn optional(inner: RegexAst) -> Self {
        Self::repeat(inner, 0, Some(1))
    }

    pub fn one_or_more(inner: RegexAst) -> Self {
        Self::repeat(inner, 1, None)
    }

    pub fn group(inner: RegexAst) -> Self {
        RegexAst::Group {
            inner: Box::new(inner),
            capturing: true,
        }
    }

    /// Serialize to `regex`-crate syntax.
    pub fn to_pattern(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    /// Whether a quantifier can follow this node without a wrapping group
    fn is_atomic(&self) -> bool {
        match self {
            RegexAst::Literal(s) => s.chars().count() == 1,
            RegexAst::Class(_) | RegexAst::Group { .. } => true,
            RegexAst::Seq(items) => items.len() == 1 && items[0].is_atomic(),
            RegexAst::Repeat { .. } | RegexAst::Alt(_) => false,
        }
    }

    fn write(&self, out: &mut String) {
        match self {
            RegexAst::Literal(s) => out.push_str(&::regex::escape(s)),
            RegexAst::Class(class) => class.write_pattern(out),
            RegexAst::Repeat { inner, min, max } => {
                if inner.is_atomic() {
                    inner.write(out);
                } else {
                    out.push_str("(?:");
                    inner.write(out);
                    out.push(')');
                }
                match (*min, *max) {
                    (0, None) => out.push('*'),
                    (1, None) => out.push('+'),
                    (0, Some(1)) => out.push('?'),
                    (1, Some(1)) => {}
                    (n, None) => out.push_str(&format!("{{{},}}", n)),
                    (n, Some(m)) if n == m => out.push_str(&format!("{{{}}}", n)),
                    (n, Some(m)) => out.push_str(&format!("{{{},{}}}", n, m)),
                }
            }
            RegexAst::Seq(items) => {
                for item in items {
                    if matches!(item, RegexAst::Alt(_)) {
                        out.push_str("(?:");
                        item.write(out);
                        out.push(')');
                    } else {
                        item.write(out);
                    }
                }
            }
            RegexAst::Alt(options) => {
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    option.write(out);
                }
            }
            RegexAst::Group { inner, capturing } => {
                out.push_str(if *capturing { "(" } else { "(?:" });
                inner.write(out);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for RegexAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pattern())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_quantifiers() {
        let digit = || RegexAst::class(CharClass::Digit);
        assert_eq!(RegexAst::repeat(digit(), 3, Some(3)).to_pattern(), r"\d{3}");
        assert_eq!(RegexAst::repeat(digit(), 1, Some(3)).to_pattern(), r"\d{1,3}");
        assert_eq!(RegexAst::repeat(digit(), 2, None).to_pattern(), r"\d{2,}");
        assert_eq!(RegexAst::one_or_more(digit()).to_pattern(), r"\d+");
        assert_eq!(RegexAst::optional(RegexAst::literal("ab")).to_pattern(), "(?:ab)?");
    }

    #[test]
    fn test_serialize_escapes_literals() {
        assert_eq!(RegexAst::literal("$1.5").to_pattern(), r"\$1\.5");
        let set = RegexAst::class(CharClass::Custom(vec!['$', '-', ']']));
        assert_eq!(set.to_pattern(), r"[$\-\]]");
    }

    #[test]
    fn test_alternation_inside_sequence_is_grouped() {
        let ast = RegexAst::Seq(vec![
            RegexAst::literal("x"),
            RegexAst::Alt(vec![RegexAst::literal("a"), RegexAst::literal("b")]),
        ]);
        assert_eq!(ast.to_pattern(), "x(?:a|b)");
    }

    #[test]
    fn test_narrowest_class() {
        assert_eq!(CharClass::narrowest("123".chars()), CharClass::Digit);
        assert_eq!(CharClass::narrowest("aB".chars()), CharClass::Alpha);
        assert_eq!(CharClass::narrowest("a1".chars()), CharClass::Word);
        assert_eq!(CharClass::narrowest("a,".chars()), CharClass::Any);
    }

    #[test]
    fn test_serialized_patterns_compile() {
        let ast = RegexAst::Seq(vec![
            RegexAst::class(CharClass::Custom(vec!['$', '€'])),
            RegexAst::repeat(RegexAst::class(CharClass::Hex), 1, Some(4)),
            RegexAst::optional(RegexAst::group(RegexAst::literal(".5"))),
        ]);
        assert!(::regex::Regex::new(&ast.to_pattern()).is_ok());
    }
}
