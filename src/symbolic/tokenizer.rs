//! Lexer for expression text.
//!
//! Built from `nom` combinators the same way the task-document parser is:
//! each token kind is a small parser, `alt` picks the first that matches and
//! the driver loop records the byte span of every token for error messages.

use crate::global::MAX_EXPRESSION_LENGTH;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0_count,
};
use std::fmt;
use thiserror::Error;

/// Byte range of a token in the input, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }
}

/// 1-indexed for users
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end <= self.start + 1 {
            write!(f, "position {}", self.start + 1)
        } else {
            write!(f, "positions {}-{}", self.start + 1, self.end)
        }
    }
}

/// Errors raised while turning text into an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("expression is too long: {len} characters, limit is {limit}")]
    TooLong { len: usize, limit: usize },
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedCharacter { ch: char, span: Span },
    #[error("invalid number '{text}' at {span}")]
    InvalidNumber { text: String, span: Span },
    #[error("unknown identifier '{name}' at {span}: only the variable x, the constants pi and e and named functions are allowed")]
    UnknownIdentifier { name: String, span: Span },
    #[error("function '{name}' at {span} must be followed by a parenthesised argument")]
    MissingArgument { name: String, span: Span },
    #[error("expected {expected} at {span}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("unexpected end of expression: expected {expected}")]
    UnexpectedEnd { expected: String },
    #[error("unmatched '(' at {span}")]
    UnclosedParen { span: Span },
    #[error("unmatched ')' at {span}")]
    UnopenedParen { span: Span },
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Caret => "^",
        };
        write!(f, "'{}'", symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Op(Operator),
    LeftParen,
    RightParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::Op(op) => write!(f, "{}", op),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// exponent part of a float literal: e-3, E+10, e5
fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

/// 12, 1.5, 3., .25, 6.02e23
fn number_text(input: &str) -> IResult<&str, &str> {
    let digits_first = recognize((digit1, opt((char('.'), opt(digit1))), opt(exponent)));
    let dot_first = recognize((char('.'), digit1, opt(exponent)));
    alt((digits_first, dot_first)).parse(input)
}

fn number(input: &str) -> IResult<&str, TokenKind> {
    map_res(number_text, |s: &str| s.parse::<f64>().map(TokenKind::Number)).parse(input)
}

/// same shape as a task-document key: letter or '_' then word characters
fn identifier(input: &str) -> IResult<&str, TokenKind> {
    let parser = recognize((
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, |s: &str| TokenKind::Ident(s.to_string())).parse(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Op(Operator::Caret), tag("**")),
        value(TokenKind::Op(Operator::Plus), char('+')),
        value(TokenKind::Op(Operator::Minus), char('-')),
        value(TokenKind::Op(Operator::Star), char('*')),
        value(TokenKind::Op(Operator::Slash), char('/')),
        value(TokenKind::Op(Operator::Caret), char('^')),
    ))
    .parse(input)
}

fn paren(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::LeftParen, char('(')),
        value(TokenKind::RightParen, char(')')),
    ))
    .parse(input)
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((number, identifier, operator, paren)).parse(input)
}

/// Splits `input` into spanned tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    if input.len() > MAX_EXPRESSION_LENGTH {
        return Err(ParseError::TooLong {
            len: input.len(),
            limit: MAX_EXPRESSION_LENGTH,
        });
    }
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        let start = input.len() - rest.len();
        match token(rest) {
            Ok((remaining, kind)) => {
                let end = input.len() - remaining.len();
                if matches!(kind, TokenKind::Number(n) if !n.is_finite()) {
                    return Err(ParseError::InvalidNumber {
                        text: input[start..end].to_string(),
                        span: Span::new(start, end),
                    });
                }
                tokens.push(Token {
                    kind,
                    span: Span::new(start, end),
                });
                rest = remaining.trim_start();
            }
            Err(_) => {
                let ch = rest.chars().next().unwrap_or(' ');
                // a digit that failed to lex can only be a malformed literal
                if ch.is_ascii_digit() || ch == '.' {
                    let text: String = rest
                        .chars()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.')
                        .collect();
                    let end = start + text.len();
                    return Err(ParseError::InvalidNumber {
                        text,
                        span: Span::new(start, end),
                    });
                }
                return Err(ParseError::UnexpectedCharacter {
                    ch,
                    span: Span::at(start),
                });
            }
        }
    }
    Ok(tokens)
}
