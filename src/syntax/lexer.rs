//! Tokenizer for the S-expression surface syntax

use super::ParseError;

/// A lexical token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// `⊗` (or ASCII `*`) joining a constraint marker to its term
    Tensor,
    Str(String),
    Num(f64),
    Ident(String),
    /// `:name`, stored without the colon
    Keyword(String),
}

impl Token {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Tensor => "'⊗'".to_string(),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Num(n) => format!("number {}", n),
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Keyword(s) => format!("keyword ':{}'", s),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';' | '⊗')
}

/// Split `input` into tokens. `;` starts a comment running to end of line.
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                while let Some(&(_, c)) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, pos));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, pos));
            }
            '[' => {
                chars.next();
                tokens.push((Token::LBracket, pos));
            }
            ']' => {
                chars.next();
                tokens.push((Token::RBracket, pos));
            }
            '⊗' => {
                chars.next();
                tokens.push((Token::Tensor, pos));
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((at, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let (_, escaped) = chars
                                .next()
                                .ok_or(ParseError::UnterminatedString { pos })?;
                            value.push(match escaped {
                                '\\' => '\\',
                                '"' => '"',
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                other => {
                                    return Err(ParseError::InvalidEscape { pos: at, escape: other });
                                }
                            });
                        }
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(ParseError::UnterminatedString { pos });
                }
                tokens.push((Token::Str(value), pos));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_delimiter(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((classify_word(word, pos)?, pos));
            }
        }
    }

    Ok(tokens)
}

/// Whether `name` reads back as a single bare identifier. Other names are
/// printed quoted: `(var "name")` and `(lambda "name" body)`.
pub fn is_identifier(name: &str) -> bool {
    if matches!(name, "true" | "false" | "null") {
        return false;
    }
    matches!(tokenize(name).as_deref(), Ok([(Token::Ident(word), 0)]) if word == name)
}

fn classify_word(word: String, pos: usize) -> Result<Token, ParseError> {
    if word == "*" {
        return Ok(Token::Tensor);
    }
    if let Some(name) = word.strip_prefix(':') {
        if name.is_empty() {
            return Err(ParseError::UnexpectedToken {
                pos,
                found: "':'".to_string(),
                expected: "keyword name".to_string(),
            });
        }
        return Ok(Token::Keyword(name.to_string()));
    }

    let digits = word.strip_prefix('-').unwrap_or(&word);
    let numeric_start = digits
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || (c == '.' && digits.len() > 1))
        .unwrap_or(false);
    if numeric_start {
        return match word.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Num(n)),
            _ => Err(ParseError::InvalidNumber { pos, text: word }),
        };
    }

    Ok(Token::Ident(word))
}
