//! Parser - tokens → S-expressions → Term
//!
//! Parsing runs in two stages:
//! 1. A reader builds a generic S-expression tree and checks delimiters,
//!    recognising the `[Marker] ⊗ term` prefix before plain brackets.
//! 2. A builder maps each form onto a [`Term`], validating operator names,
//!    arity and literal kinds.

use super::lexer::{Token, tokenize};
use super::ParseError;
use crate::example::{Example, Output};
use crate::term::{Literal, Marker, SynthesisTarget, Term};
use std::str::FromStr;

/// Parse query text into a term.
pub fn parse(input: &str) -> Result<Term, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut reader = Reader {
        tokens,
        index: 0,
        end: input.len(),
    };
    let sexp = reader.read()?;
    if let Some((token, pos)) = reader.tokens.get(reader.index) {
        return Err(match token {
            Token::RParen | Token::RBracket => ParseError::Unbalanced {
                pos: *pos,
                detail: format!("unmatched {}", token.describe()),
            },
            other => ParseError::UnexpectedToken {
                pos: *pos,
                found: other.describe(),
                expected: "end of input".to_string(),
            },
        });
    }

    build(&sexp)
}

// ========== Reader ==========

#[derive(Debug, Clone, PartialEq)]
enum Sexp {
    Str(String, usize),
    Num(f64, usize),
    Ident(String, usize),
    Keyword(String, usize),
    List(Vec<Sexp>, usize),
    Vector(Vec<Sexp>, usize),
    Constrained(Marker, Box<Sexp>, usize),
}

impl Sexp {
    fn pos(&self) -> usize {
        match self {
            Sexp::Str(_, p)
            | Sexp::Num(_, p)
            | Sexp::Ident(_, p)
            | Sexp::Keyword(_, p)
            | Sexp::List(_, p)
            | Sexp::Vector(_, p)
            | Sexp::Constrained(_, _, p) => *p,
        }
    }

    fn kind_name(&self) -> String {
        match self {
            Sexp::Str(..) => "string".to_string(),
            Sexp::Num(..) => "number".to_string(),
            Sexp::Ident(name, _) => format!("identifier '{}'", name),
            Sexp::Keyword(name, _) => format!("keyword ':{}'", name),
            Sexp::List(..) => "form".to_string(),
            Sexp::Vector(..) => "bracket list".to_string(),
            Sexp::Constrained(..) => "constrained term".to_string(),
        }
    }
}

struct Reader {
    tokens: Vec<(Token, usize)>,
    index: usize,
    end: usize,
}

impl Reader {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.index).cloned();
        if item.is_some() {
            self.index += 1;
        }
        item
    }

    fn read(&mut self) -> Result<Sexp, ParseError> {
        let (token, pos) = self.next().ok_or_else(|| ParseError::Unbalanced {
            pos: self.end,
            detail: "unexpected end of input".to_string(),
        })?;

        match token {
            Token::LParen => Ok(Sexp::List(self.read_until(Token::RParen, pos)?, pos)),
            Token::LBracket => {
                let items = self.read_until(Token::RBracket, pos)?;
                if self.peek() == Some(&Token::Tensor) {
                    self.next();
                    let marker = marker_of(&items, pos)?;
                    let inner = self.read()?;
                    Ok(Sexp::Constrained(marker, Box::new(inner), pos))
                } else {
                    Ok(Sexp::Vector(items, pos))
                }
            }
            Token::RParen | Token::RBracket => Err(ParseError::Unbalanced {
                pos,
                detail: format!("unmatched {}", token.describe()),
            }),
            Token::Tensor => Err(ParseError::UnexpectedToken {
                pos,
                found: token.describe(),
                expected: "a term".to_string(),
            }),
            Token::Str(s) => Ok(Sexp::Str(s, pos)),
            Token::Num(n) => Ok(Sexp::Num(n, pos)),
            Token::Ident(s) => Ok(Sexp::Ident(s, pos)),
            Token::Keyword(s) => Ok(Sexp::Keyword(s, pos)),
        }
    }

    fn read_until(&mut self, close: Token, open_pos: usize) -> Result<Vec<Sexp>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => {
                    let opener = if close == Token::RParen { "'('" } else { "'['" };
                    return Err(ParseError::Unbalanced {
                        pos: open_pos,
                        detail: format!("{} is never closed", opener),
                    });
                }
                Some(t) if *t == close => {
                    self.next();
                    return Ok(items);
                }
                Some(Token::RParen) | Some(Token::RBracket) => {
                    let (found, pos) = self.next().unwrap_or((Token::RParen, self.end));
                    return Err(ParseError::Unbalanced {
                        pos,
                        detail: format!("expected {} but found {}", close.describe(), found.describe()),
                    });
                }
                Some(_) => items.push(self.read()?),
            }
        }
    }
}

fn marker_of(items: &[Sexp], pos: usize) -> Result<Marker, ParseError> {
    match items {
        [Sexp::Ident(name, at)] => Marker::from_str(name).map_err(|_| ParseError::UnknownMarker {
            pos: *at,
            name: name.clone(),
        }),
        _ => Err(ParseError::UnexpectedToken {
            pos,
            found: "bracket list".to_string(),
            expected: "a single constraint marker before '⊗'".to_string(),
        }),
    }
}

// ========== Builder ==========

fn is_reserved(name: &str) -> bool {
    matches!(name, "true" | "false" | "null")
}

fn build(sexp: &Sexp) -> Result<Term, ParseError> {
    match sexp {
        Sexp::Str(s, _) => Ok(Term::Lit(Literal::Str(s.clone()))),
        Sexp::Num(n, _) => Ok(Term::Lit(Literal::Number(*n))),
        Sexp::Ident(name, _) => Ok(match name.as_str() {
            "true" => Term::Lit(Literal::Bool(true)),
            "false" => Term::Lit(Literal::Bool(false)),
            "null" => Term::Lit(Literal::Null),
            _ => Term::Var(name.clone()),
        }),
        Sexp::Keyword(name, pos) => Err(ParseError::UnexpectedToken {
            pos: *pos,
            found: format!("keyword ':{}'", name),
            expected: "a term".to_string(),
        }),
        Sexp::Vector(_, pos) => Err(ParseError::UnexpectedToken {
            pos: *pos,
            found: "bracket list".to_string(),
            expected: "a term".to_string(),
        }),
        Sexp::Constrained(marker, inner, _) => Ok(Term::Constrained {
            marker: *marker,
            term: Box::new(build(inner)?),
        }),
        Sexp::List(items, pos) => build_list(items, *pos),
    }
}

fn build_list(items: &[Sexp], pos: usize) -> Result<Term, ParseError> {
    let Some((head, rest)) = items.split_first() else {
        return Err(ParseError::UnexpectedToken {
            pos,
            found: "empty form '()'".to_string(),
            expected: "an operator".to_string(),
        });
    };

    match head {
        Sexp::Ident(op, op_pos) => {
            let mut form = Form::split(op, *op_pos, rest)?;
            let markers = form.take_constraints()?;
            let term = build_operator(&mut form)?;
            Ok(markers.into_iter().rev().fold(term, |term, marker| Term::Constrained {
                marker,
                term: Box::new(term),
            }))
        }
        Sexp::List(..) | Sexp::Constrained(..) => {
            // ((lambda x body) arg)
            if rest.len() != 1 {
                return Err(ParseError::Arity {
                    op: "application".to_string(),
                    expected: "1".to_string(),
                    found: rest.len(),
                });
            }
            Ok(Term::App {
                func: Box::new(build(head)?),
                arg: Box::new(build(&rest[0])?),
            })
        }
        other => Err(ParseError::UnexpectedToken {
            pos: other.pos(),
            found: other.kind_name(),
            expected: "an operator".to_string(),
        }),
    }
}

/// A form split into positional arguments and `:keyword value` pairs
struct Form<'a> {
    op: &'a str,
    pos: usize,
    positional: Vec<&'a Sexp>,
    keywords: Vec<(&'a str, &'a Sexp)>,
}

impl<'a> Form<'a> {
    fn split(op: &'a str, pos: usize, args: &'a [Sexp]) -> Result<Self, ParseError> {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Sexp::Keyword(name, at) = arg {
                let value = iter.next().ok_or_else(|| ParseError::UnexpectedToken {
                    pos: *at,
                    found: "end of form".to_string(),
                    expected: format!("a value after ':{}'", name),
                })?;
                keywords.push((name.as_str(), value));
            } else {
                positional.push(arg);
            }
        }
        Ok(Self {
            op,
            pos,
            positional,
            keywords,
        })
    }

    fn take_keyword(&mut self, name: &str) -> Option<&'a Sexp> {
        let index = self.keywords.iter().position(|(k, _)| *k == name)?;
        Some(self.keywords.remove(index).1)
    }

    /// `:constraints [Marker ...]` sugar, outermost first
    fn take_constraints(&mut self) -> Result<Vec<Marker>, ParseError> {
        let Some(value) = self.take_keyword("constraints") else {
            return Ok(Vec::new());
        };
        let names: Vec<&Sexp> = match value {
            Sexp::Vector(items, _) => items.iter().collect(),
            single => vec![single],
        };
        names
            .into_iter()
            .map(|sexp| match sexp {
                Sexp::Ident(name, at) | Sexp::Str(name, at) => {
                    Marker::from_str(name).map_err(|_| ParseError::UnknownMarker {
                        pos: *at,
                        name: name.clone(),
                    })
                }
                other => Err(ParseError::UnknownMarker {
                    pos: other.pos(),
                    name: other.kind_name(),
                }),
            })
            .collect()
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.keywords.first() {
            Some((keyword, _)) => Err(ParseError::UnexpectedKeyword {
                op: self.op.to_string(),
                keyword: keyword.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn arity(&self, min: usize, max: usize) -> Result<(), ParseError> {
        let found = self.positional.len();
        if found < min || found > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{}-{}", min, max)
            };
            return Err(ParseError::Arity {
                op: self.op.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn term(&self, index: usize) -> Result<Box<Term>, ParseError> {
        Ok(Box::new(build(self.positional[index])?))
    }

    fn wrong(&self, argument: &str, expected: &str, found: &Sexp) -> ParseError {
        ParseError::WrongLiteral {
            op: self.op.to_string(),
            argument: argument.to_string(),
            expected: expected.to_string(),
            found: found.kind_name(),
        }
    }

    fn string(&self, sexp: &Sexp, argument: &str) -> Result<String, ParseError> {
        match sexp {
            Sexp::Str(s, _) => Ok(s.clone()),
            other => Err(self.wrong(argument, "a string literal", other)),
        }
    }

    /// String literal or bare identifier
    fn name(&self, sexp: &Sexp, argument: &str) -> Result<String, ParseError> {
        match sexp {
            Sexp::Str(s, _) => Ok(s.clone()),
            Sexp::Ident(s, _) if !is_reserved(s) => Ok(s.clone()),
            other => Err(self.wrong(argument, "a name", other)),
        }
    }

    fn index(&self, sexp: &Sexp, argument: &str) -> Result<usize, ParseError> {
        match sexp {
            Sexp::Num(n, _) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => Ok(*n as usize),
            other => Err(self.wrong(argument, "a non-negative integer", other)),
        }
    }

    /// Examples from `:examples [...]`, or a trailing bare `(("in" out) ...)` list
    fn take_examples(&mut self) -> Result<Option<Vec<Example>>, ParseError> {
        if let Some(value) = self.take_keyword("examples") {
            return examples_of(value).map(Some);
        }
        if self.positional.last().is_some_and(|last| looks_like_examples(last)) {
            if let Some(value) = self.positional.pop() {
                return examples_of(value).map(Some);
            }
        }
        Ok(None)
    }

    fn require_examples(&mut self) -> Result<Vec<Example>, ParseError> {
        self.take_examples()?.ok_or_else(|| {
            ParseError::MalformedExamples(format!("'{}' requires :examples [(\"in\" out) ...]", self.op))
        })
    }
}

fn looks_like_examples(sexp: &Sexp) -> bool {
    match sexp {
        Sexp::List(items, _) => {
            !items.is_empty()
                && items
                    .iter()
                    .all(|item| matches!(item, Sexp::List(pair, _) if pair.len() == 2 && matches!(pair[0], Sexp::Str(..))))
        }
        _ => false,
    }
}

fn examples_of(sexp: &Sexp) -> Result<Vec<Example>, ParseError> {
    let items = match sexp {
        Sexp::Vector(items, _) | Sexp::List(items, _) => items,
        other => {
            return Err(ParseError::MalformedExamples(format!(
                "expected a list of (\"input\" output) pairs, got {}",
                other.kind_name()
            )));
        }
    };

    items
        .iter()
        .map(|item| match item {
            Sexp::List(pair, _) if pair.len() == 2 => match &pair[0] {
                Sexp::Str(input, _) => Ok(Example::new(input.clone(), output_of(&pair[1])?)),
                other => Err(ParseError::MalformedExamples(format!(
                    "example input must be a string, got {}",
                    other.kind_name()
                ))),
            },
            other => Err(ParseError::MalformedExamples(format!(
                "expected (\"input\" output), got {}",
                other.kind_name()
            ))),
        })
        .collect()
}

fn output_of(sexp: &Sexp) -> Result<Output, ParseError> {
    match sexp {
        Sexp::Str(s, _) => Ok(Output::Str(s.clone())),
        Sexp::Num(n, _) => Ok(Output::Number(*n)),
        Sexp::Ident(name, _) => match name.as_str() {
            "true" => Ok(Output::Bool(true)),
            "false" => Ok(Output::Bool(false)),
            "null" => Ok(Output::Null),
            other => Err(ParseError::MalformedExamples(format!(
                "example output must be a literal, got identifier '{}'",
                other
            ))),
        },
        Sexp::Vector(items, _) => items.iter().map(output_of).collect::<Result<_, _>>().map(Output::Array),
        other => Err(ParseError::MalformedExamples(format!(
            "example output must be a literal, got {}",
            other.kind_name()
        ))),
    }
}

fn build_operator(form: &mut Form<'_>) -> Result<Term, ParseError> {
    let term = match form.op {
        "input" => {
            form.arity(0, 0)?;
            Term::Input
        }
        "grep" => {
            form.arity(1, 1)?;
            Term::Grep {
                pattern: form.string(form.positional[0], "pattern")?,
            }
        }
        "fuzzy_search" => {
            let keyword_limit = form.take_keyword("limit");
            form.arity(1, 2)?;
            let limit = match (form.positional.get(1).copied(), keyword_limit) {
                (Some(sexp), _) | (None, Some(sexp)) => Some(form.index(sexp, "limit")?),
                (None, None) => None,
            };
            Term::FuzzySearch {
                query: form.string(form.positional[0], "query")?,
                limit,
            }
        }
        "text_stats" => {
            form.arity(0, 0)?;
            Term::CorpusStats
        }
        "filter" => {
            form.arity(2, 2)?;
            Term::Filter {
                collection: form.term(0)?,
                predicate: form.term(1)?,
            }
        }
        "map" => {
            form.arity(2, 2)?;
            Term::Map {
                collection: form.term(0)?,
                transform: form.term(1)?,
            }
        }
        "reduce" => {
            form.arity(3, 3)?;
            Term::Reduce {
                collection: form.term(0)?,
                init: form.term(1)?,
                reducer: form.term(2)?,
            }
        }
        "sum" => {
            form.arity(1, 1)?;
            Term::Sum(form.term(0)?)
        }
        "count" => {
            form.arity(1, 1)?;
            Term::Count(form.term(0)?)
        }
        "match" => {
            form.arity(2, 3)?;
            let group = match form.positional.get(2) {
                Some(sexp) => form.index(sexp, "group")?,
                None => 0,
            };
            Term::Match {
                text: form.term(0)?,
                pattern: form.string(form.positional[1], "pattern")?,
                group,
            }
        }
        "replace" => {
            form.arity(3, 3)?;
            Term::Replace {
                text: form.term(0)?,
                pattern: form.string(form.positional[1], "pattern")?,
                replacement: form.string(form.positional[2], "replacement")?,
            }
        }
        "split" => {
            form.arity(2, 3)?;
            let index = match form.positional.get(2) {
                Some(sexp) => Some(form.index(sexp, "index")?),
                None => None,
            };
            Term::Split {
                text: form.term(0)?,
                delimiter: form.string(form.positional[1], "delimiter")?,
                index,
            }
        }
        "parseInt" => {
            form.arity(1, 1)?;
            Term::ParseInt(form.term(0)?)
        }
        "parseFloat" => {
            form.arity(1, 1)?;
            Term::ParseFloat(form.term(0)?)
        }
        "parseNumber" => {
            let examples = form.take_examples()?;
            form.arity(1, 1)?;
            Term::ParseNumber {
                value: form.term(0)?,
                examples,
            }
        }
        "parseCurrency" => {
            let examples = form.take_examples()?;
            form.arity(1, 1)?;
            Term::ParseCurrency {
                value: form.term(0)?,
                examples,
            }
        }
        "parseDate" => {
            let examples = form.take_examples()?;
            let keyword_format = form.take_keyword("format");
            form.arity(1, 2)?;
            let format = match (form.positional.get(1).copied(), keyword_format) {
                (Some(sexp), _) | (None, Some(sexp)) => Some(form.string(sexp, "format")?),
                (None, None) => None,
            };
            Term::ParseDate {
                value: form.term(0)?,
                format,
                examples,
            }
        }
        "add" => {
            form.arity(2, 2)?;
            Term::Add(form.term(0)?, form.term(1)?)
        }
        "if" => {
            form.arity(3, 3)?;
            Term::If {
                cond: form.term(0)?,
                then: form.term(1)?,
                otherwise: form.term(2)?,
            }
        }
        "classify" => {
            let examples = form.require_examples()?;
            form.arity(1, 1)?;
            Term::Classify {
                value: form.term(0)?,
                examples,
            }
        }
        "synthesize" => {
            let examples = form.require_examples()?;
            let target = match form.take_keyword("type") {
                Some(sexp) => {
                    let name = form.name(sexp, "type")?;
                    SynthesisTarget::from_str(&name)
                        .map_err(|_| form.wrong("type", "\"extractor\" or \"regex\"", sexp))?
                }
                None => SynthesisTarget::Extractor,
            };
            form.arity(0, 0)?;
            Term::Synthesize { target, examples }
        }
        "predicate" => {
            let examples = form.require_examples()?;
            form.arity(0, 0)?;
            Term::Predicate { examples }
        }
        "define-fn" => {
            let examples = form.require_examples()?;
            form.arity(1, 1)?;
            Term::DefineFn {
                name: form.name(form.positional[0], "name")?,
                examples,
            }
        }
        "apply-fn" => {
            form.arity(2, 2)?;
            Term::ApplyFn {
                name: form.name(form.positional[0], "name")?,
                arg: form.term(1)?,
            }
        }
        "list_symbols" => {
            form.arity(0, 1)?;
            let kind = match form.positional.first() {
                Some(sexp) => Some(form.string(sexp, "kind")?),
                None => None,
            };
            Term::ListSymbols { kind }
        }
        "get_symbol_body" => {
            form.arity(1, 1)?;
            Term::GetSymbolBody { name: form.term(0)? }
        }
        "find_references" => {
            form.arity(1, 1)?;
            Term::FindReferences {
                name: form.string(form.positional[0], "name")?,
            }
        }
        "lambda" => {
            form.arity(2, 2)?;
            let param = match form.positional[0] {
                Sexp::Ident(name, _) if !is_reserved(name) => name.clone(),
                Sexp::Str(name, _) => name.clone(),
                Sexp::List(items, _) => match items.as_slice() {
                    [Sexp::Ident(name, _)] if !is_reserved(name) => name.clone(),
                    _ => return Err(form.wrong("parameter", "an identifier", form.positional[0])),
                },
                other => return Err(form.wrong("parameter", "an identifier", other)),
            };
            Term::Lambda {
                param,
                body: form.term(1)?,
            }
        }
        "var" => {
            form.arity(1, 1)?;
            Term::Var(form.string(form.positional[0], "name")?)
        }
        "app" => {
            form.arity(2, 2)?;
            Term::App {
                func: form.term(0)?,
                arg: form.term(1)?,
            }
        }
        other => {
            return Err(ParseError::UnknownOperator {
                pos: form.pos,
                name: other.to_string(),
            });
        }
    };

    form.finish()?;
    Ok(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grep() {
        assert_eq!(parse("(grep \"ERROR\")").unwrap(), Term::grep("ERROR"));
    }

    #[test]
    fn test_parse_nested_lambda() {
        let term = parse(r#"(sum (map (grep "SALES") (lambda x (parseFloat (match x "[0-9,]+" 0)))))"#).unwrap();
        let expected = Term::Sum(Box::new(Term::Map {
            collection: Box::new(Term::grep("SALES")),
            transform: Box::new(Term::lambda(
                "x",
                Term::ParseFloat(Box::new(Term::Match {
                    text: Box::new(Term::var("x")),
                    pattern: "[0-9,]+".to_string(),
                    group: 0,
                })),
            )),
        }));
        assert_eq!(term, expected);
    }

    #[test]
    fn test_parse_examples_both_forms() {
        let keyword = parse(r#"(synthesize :examples [("$1,234" 1234) ("$500" 500)])"#).unwrap();
        let bare = parse(r#"(synthesize (("$1,234" 1234) ("$500" 500)))"#).unwrap();
        assert_eq!(keyword, bare);
        match keyword {
            Term::Synthesize { target, examples } => {
                assert_eq!(target, SynthesisTarget::Extractor);
                assert_eq!(examples.len(), 2);
                assert_eq!(examples[0].output, Output::Number(1234.0));
            }
            other => panic!("unexpected term {:?}", other),
        }
    }

    #[test]
    fn test_parse_constrained_prefix() {
        let term = parse(r#"[Σ⚡μ] ⊗ (count (grep "x"))"#).unwrap();
        assert!(matches!(term, Term::Constrained { marker: Marker::SigmaMu, .. }));
    }

    #[test]
    fn test_parse_constraints_keyword_sugar() {
        let sugar = parse(r#"(grep "x" :constraints [∞/0])"#).unwrap();
        let prefix = parse(r#"[∞/0] ⊗ (grep "x")"#).unwrap();
        assert_eq!(sugar, prefix);
    }

    #[test]
    fn test_parse_application_forms() {
        let explicit = parse("(app (lambda x x) 1)").unwrap();
        let implicit = parse("((lambda x x) 1)").unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_parse_literals_and_vars() {
        assert_eq!(parse("true").unwrap(), Term::Lit(Literal::Bool(true)));
        assert_eq!(parse("null").unwrap(), Term::Lit(Literal::Null));
        assert_eq!(parse("-2.5").unwrap(), Term::number(-2.5));
        assert_eq!(parse("RESULTS").unwrap(), Term::var("RESULTS"));
    }

    #[test]
    fn test_parse_date_format_keyword() {
        let term = parse(r#"(parseDate x :format "EU")"#).unwrap();
        assert!(matches!(term, Term::ParseDate { format: Some(ref f), examples: None, .. } if f == "EU"));
    }

    #[test]
    fn test_unbalanced_errors() {
        assert!(matches!(parse("(grep \"x\""), Err(ParseError::Unbalanced { .. })));
        assert!(matches!(parse("(grep \"x\"))"), Err(ParseError::Unbalanced { .. })));
        assert!(matches!(parse("(grep \"x\"]"), Err(ParseError::Unbalanced { .. })));
    }

    #[test]
    fn test_unknown_operator() {
        assert!(matches!(parse("(frobnicate 1)"), Err(ParseError::UnknownOperator { .. })));
    }

    #[test]
    fn test_arity_mismatch() {
        assert!(matches!(parse("(count)"), Err(ParseError::Arity { .. })));
        assert!(matches!(parse("(add 1 2 3)"), Err(ParseError::Arity { .. })));
    }

    #[test]
    fn test_wrong_literal_kind() {
        assert!(matches!(parse("(grep 5)"), Err(ParseError::WrongLiteral { .. })));
        assert!(matches!(parse("(match x \"a\" \"b\")"), Err(ParseError::WrongLiteral { .. })));
    }

    #[test]
    fn test_unknown_marker_and_keyword() {
        assert!(matches!(parse("[Foo] ⊗ (input)"), Err(ParseError::UnknownMarker { .. })));
        assert!(matches!(parse("(grep \"x\" :format \"US\")"), Err(ParseError::UnexpectedKeyword { .. })));
    }

    #[test]
    fn test_empty_and_trailing() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert!(matches!(parse("(input) (input)"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse("()"), Err(ParseError::UnexpectedToken { .. })));
    }
}
