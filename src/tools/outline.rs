//! Symbol outline - a line-based index of headings and definitions
//!
//! Documents are mostly prose, logs and source listings, so the outline
//! recognises four shapes:
//! - `Section`: Markdown headings
//! - `Container`: class, struct, trait, interface, enum
//! - `Callable`: fn, def, function, func
//! - `Value`: const, static
//!
//! A section's body runs until the next heading of the same or higher level.
//! A definition's body runs until the next definition at the same or lower
//! indentation, or the first line that dedents to its level. A closing
//! bracket at that level is kept as the last line of the body.

use super::{SymbolInfo, ToolError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Markdown heading
    Section,
    /// Class, struct, trait - types that contain other symbols
    Container,
    /// Function, method - executable code
    Callable,
    /// Constant or static
    Value,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Section => "section",
            SymbolKind::Container => "container",
            SymbolKind::Callable => "callable",
            SymbolKind::Value => "value",
        }
    }

    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Section,
            SymbolKind::Container,
            SymbolKind::Callable,
            SymbolKind::Value,
        ]
    }
}

impl FromStr for SymbolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "section" | "heading" | "header" => Ok(SymbolKind::Section),
            "container" | "class" | "struct" | "trait" | "interface" | "enum" => Ok(SymbolKind::Container),
            "callable" | "function" | "method" | "fn" | "def" => Ok(SymbolKind::Callable),
            "value" | "const" | "constant" | "static" => Ok(SymbolKind::Value),
            _ => Err(ToolError::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const HEADING: &str = r"^(#{1,6})\s+(.+?)\s*#*\s*$";

const DEFINITIONS: &[(SymbolKind, &str)] = &[
    (
        SymbolKind::Container,
        r"^(\s*)(?:(?:pub(?:\([^)]*\))?|export|default|abstract|public|private)\s+)*(?:class|struct|trait|interface|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
    ),
    (
        SymbolKind::Callable,
        r"^(\s*)(?:(?:pub(?:\([^)]*\))?|export|default|async|static|public|private)\s+)*(?:fn|def|function|func)\s+([A-Za-z_][A-Za-z0-9_]*)",
    ),
    (
        SymbolKind::Value,
        r"^(\s*)(?:(?:pub(?:\([^)]*\))?|export)\s+)*(?:const|static)\s+([A-Za-z_][A-Za-z0-9_]*)\s*[:=]",
    ),
];

struct Rules {
    heading: Option<Regex>,
    definitions: Vec<(SymbolKind, Regex)>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        heading: Regex::new(HEADING).ok(),
        definitions: DEFINITIONS
            .iter()
            .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (*kind, re)))
            .collect(),
    })
}

/// How an entry nests: heading level for sections, indentation for code
#[derive(Debug, Clone, Copy, PartialEq)]
enum Depth {
    Heading(usize),
    Indent(usize),
}

impl Depth {
    /// Whether an entry at `self` ends the body of an entry at `open`
    fn closes(self, open: Depth) -> bool {
        match (open, self) {
            (Depth::Heading(open), Depth::Heading(next)) => next <= open,
            (Depth::Heading(_), Depth::Indent(_)) => false,
            (Depth::Indent(_), Depth::Heading(_)) => true,
            (Depth::Indent(open), Depth::Indent(next)) => next <= open,
        }
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Last line (1-based) of a definition on line `start` indented by `open`
fn dedent_end(lines: &[&str], start: usize, open: usize) -> usize {
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let trimmed = line.trim();
        if trimmed.is_empty() || indentation(line) > open {
            continue;
        }
        if trimmed.starts_with(['}', ')', ']']) {
            // `) -> T {` and `} else {` reopen the body
            if trimmed.ends_with(['{', '(', '[']) {
                continue;
            }
            return idx + 1;
        }
        return idx;
    }
    lines.len()
}

/// The outline of one document
#[derive(Debug, Clone, Default)]
pub struct Outline {
    symbols: Vec<SymbolInfo>,
}

impl Outline {
    /// Scan `lines` for headings and definitions.
    pub fn scan(lines: &[&str]) -> Self {
        let rules = rules();
        let mut found: Vec<(SymbolInfo, Depth)> = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let entry = if let Some(caps) = rules.heading.as_ref().and_then(|re| re.captures(line)) {
                Some((SymbolKind::Section, caps[2].to_string(), Depth::Heading(caps[1].len())))
            } else {
                rules.definitions.iter().find_map(|(kind, re)| {
                    re.captures(line)
                        .map(|caps| (*kind, caps[2].to_string(), Depth::Indent(caps[1].len())))
                })
            };

            if let Some((kind, name, depth)) = entry {
                found.push((
                    SymbolInfo {
                        name,
                        kind,
                        line_num: idx + 1,
                        line_end: lines.len(),
                        signature: line.trim().to_string(),
                    },
                    depth,
                ));
            }
        }

        for i in 0..found.len() {
            let open = found[i].1;
            let mut end = found[i + 1..]
                .iter()
                .find(|(_, depth)| depth.closes(open))
                .map(|(next, _)| next.line_num - 1)
                .unwrap_or(lines.len());
            if let Depth::Indent(indent) = open {
                end = end.min(dedent_end(lines, found[i].0.line_num, indent));
            }
            while end > found[i].0.line_num && lines[end - 1].trim().is_empty() {
                end -= 1;
            }
            found[i].0.line_end = end;
        }

        Self {
            symbols: found.into_iter().map(|(info, _)| info).collect(),
        }
    }

    pub fn symbols(&self, kind: Option<SymbolKind>) -> Vec<SymbolInfo> {
        self.symbols
            .iter()
            .filter(|s| kind.is_none_or(|k| s.kind == k))
            .cloned()
            .collect()
    }

    /// First symbol named `name`
    pub fn find(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn is_definition_line(&self, name: &str, line_num: usize) -> bool {
        self.symbols.iter().any(|s| s.name == name && s.line_num == line_num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
# Guide

Intro text.

## Install

Run the installer.

# Code

class Parser:
    def parse(self):
        return 1

    def reset(self):
        pass

def main():
    Parser().parse()
";

    fn outline() -> Outline {
        let lines: Vec<&str> = SOURCE.lines().collect();
        Outline::scan(&lines)
    }

    #[test]
    fn test_scan_finds_headings_and_definitions() {
        let names: Vec<String> = outline().symbols(None).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Guide", "Install", "Code", "Parser", "parse", "reset", "main"]);
    }

    #[test]
    fn test_kind_filter() {
        let callables = outline().symbols(Some(SymbolKind::Callable));
        assert_eq!(callables.len(), 3);
        assert!(callables.iter().all(|s| s.kind == SymbolKind::Callable));
    }

    #[test]
    fn test_section_body_stops_at_same_level_heading() {
        let outline = outline();
        let guide = outline.find("Guide").unwrap();
        assert_eq!((guide.line_num, guide.line_end), (1, 7));
        let install = outline.find("Install").unwrap();
        assert_eq!((install.line_num, install.line_end), (5, 7));
    }

    #[test]
    fn test_code_body_uses_indentation() {
        let outline = outline();
        let parser = outline.find("Parser").unwrap();
        assert_eq!((parser.line_num, parser.line_end), (11, 16));
        let parse = outline.find("parse").unwrap();
        assert_eq!((parse.line_num, parse.line_end), (12, 13));
    }

    #[test]
    fn test_code_body_ends_at_dedent() {
        let source = "\
fn helper() {
    let x = 1;
}

Some closing prose.

fn long(
    a: i32,
) -> i32 {
    a
}
struct Point {
    x: i32,
}
impl Point {
    fn norm(&self) -> f64 {
        0.0
    }
}
def f():
    return 1
Unrelated text
";
        let lines: Vec<&str> = source.lines().collect();
        let outline = Outline::scan(&lines);
        let span = |name: &str| {
            let s = outline.find(name).unwrap();
            (s.line_num, s.line_end)
        };
        assert_eq!(span("helper"), (1, 3));
        assert_eq!(span("long"), (7, 11));
        assert_eq!(span("Point"), (12, 14));
        assert_eq!(span("norm"), (16, 18));
        assert_eq!(span("f"), (20, 21));
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(SymbolKind::from_str("function").unwrap(), SymbolKind::Callable);
        assert_eq!(SymbolKind::from_str("heading").unwrap(), SymbolKind::Section);
        assert!(SymbolKind::from_str("widget").is_err());
    }
}
