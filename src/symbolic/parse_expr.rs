//! turns a String expression into an [`Expr`]
//!
//! Pipeline: tokenize -> insert implicit multiplication -> Pratt parse.
//!
//! Precedence, loosest first:
//!
//! | operators      | binding power (left, right) | associativity |
//! |----------------|-----------------------------|---------------|
//! | `+ -`          | (1, 2)                      | left          |
//! | `* /`          | (3, 4)                      | left          |
//! | unary `- +`    | prefix 5                    |               |
//! | `^` (or `**`)  | (7, 6)                      | right         |
//!
//! so `-x^2` is `-(x^2)`, `2^3^2` is `2^(3^2)` and `2^-x` is `2^(-x)`.
//!
//!# Example
//! ```
//! use numerica::symbolic::symbolic_engine::Expr;
//! let f = Expr::parse_expression("x^4 - 5x^2 + 4").unwrap();
//! assert_eq!(f.eval(2.0).unwrap(), 0.0);
//! ```
use crate::global::MAX_EXPRESSION_DEPTH;
use crate::symbolic::symbolic_engine::{Expr, Func, VARIABLE, named_constant};
use crate::symbolic::tokenizer::{Operator, ParseError, Span, Token, TokenKind, tokenize};

const PREFIX_BINDING_POWER: u8 = 5;

fn infix_binding_power(op: Operator) -> (u8, u8) {
    match op {
        Operator::Plus | Operator::Minus => (1, 2),
        Operator::Star | Operator::Slash => (3, 4),
        Operator::Caret => (7, 6),
    }
}

fn is_function(token: &Token) -> bool {
    matches!(&token.kind, TokenKind::Ident(name) if Func::lookup(name).is_some())
}

fn is_atom_ident(token: &Token) -> bool {
    matches!(&token.kind, TokenKind::Ident(_)) && !is_function(token)
}

/// Check if implicit multiplication should be inserted between two tokens
fn should_insert_mul(current: &Token, next: &Token) -> bool {
    let ends_operand = matches!(current.kind, TokenKind::Number(_) | TokenKind::RightParen)
        || is_atom_ident(current);
    if !ends_operand {
        return false;
    }
    match &next.kind {
        // 5x, x pi, (x+1)x, 2 sin(x)
        TokenKind::Ident(_) => true,
        // 2(x+1), x(x+1), (x)(x)
        TokenKind::LeftParen => true,
        // x 2, (x+1)2 ; number after number stays an error
        TokenKind::Number(_) => !matches!(current.kind, TokenKind::Number(_)),
        _ => false,
    }
}

/// Insert `*` tokens where multiplication is implied, e.g. `5x^2` -> `5 * x^2`
fn insert_implicit_multiplication(tokens: Vec<Token>) -> Vec<Token> {
    let needs_insertion = tokens.windows(2).any(|w| should_insert_mul(&w[0], &w[1]));
    if !needs_insertion {
        return tokens;
    }

    let mut result = Vec::with_capacity(tokens.len() * 3 / 2);
    let mut it = tokens.into_iter().peekable();
    while let Some(current) = it.next() {
        let needs_mul = it
            .peek()
            .is_some_and(|next| should_insert_mul(&current, next));
        let gap = Span::at(current.span.end);
        result.push(current);
        if needs_mul {
            result.push(Token {
                kind: TokenKind::Op(Operator::Star),
                span: gap,
            });
        }
    }
    result
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_EXPRESSION_DEPTH,
            });
        }
        Ok(())
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        self.descend()?;
        let mut left = self.parse_prefix()?;

        while let Some(token) = self.current() {
            let op = match &token.kind {
                TokenKind::Op(op) => *op,
                TokenKind::RightParen => break,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "an operator".to_string(),
                        found: other.to_string(),
                        span: token.span,
                    });
                }
            };
            let (left_bp, right_bp) = infix_binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let right = self.parse_expr(right_bp)?;
            left = match op {
                Operator::Plus => left + right,
                Operator::Minus => left - right,
                Operator::Star => left * right,
                Operator::Slash => left / right,
                Operator::Caret => left.pow(right),
            };
        }

        self.depth -= 1;
        Ok(left)
    }

    /// consumes `( expr )` and returns the inner expression
    fn parse_parenthesised(&mut self, open: Span) -> Result<Expr, ParseError> {
        let inner = self.parse_expr(0)?;
        match self.current() {
            Some(Token {
                kind: TokenKind::RightParen,
                ..
            }) => {
                self.advance();
                Ok(inner)
            }
            _ => Err(ParseError::UnclosedParen { span: open }),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().ok_or_else(|| ParseError::UnexpectedEnd {
            expected: "a number, x, a function or '('".to_string(),
        })?;
        self.advance();

        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Const(*n)),

            TokenKind::Ident(name) => {
                if let Some(func) = Func::lookup(name) {
                    return match self.current() {
                        Some(Token {
                            kind: TokenKind::LeftParen,
                            span,
                        }) => {
                            self.advance();
                            let arg = self.parse_parenthesised(*span)?;
                            Ok(Expr::call(func, arg))
                        }
                        _ => Err(ParseError::MissingArgument {
                            name: name.clone(),
                            span: token.span,
                        }),
                    };
                }
                if name == VARIABLE {
                    Ok(Expr::x())
                } else if let Some(value) = named_constant(name) {
                    Ok(Expr::Const(value))
                } else {
                    Err(ParseError::UnknownIdentifier {
                        name: name.clone(),
                        span: token.span,
                    })
                }
            }

            TokenKind::LeftParen => self.parse_parenthesised(token.span),

            TokenKind::Op(Operator::Minus) => {
                let operand = self.parse_expr(PREFIX_BINDING_POWER)?;
                Ok(match operand {
                    Expr::Const(c) => Expr::Const(-c),
                    other => -other,
                })
            }
            TokenKind::Op(Operator::Plus) => self.parse_expr(PREFIX_BINDING_POWER),

            other => Err(ParseError::UnexpectedToken {
                expected: "a number, x, a function or '('".to_string(),
                found: other.to_string(),
                span: token.span,
            }),
        }
    }
}

/// Parses expression text into an [`Expr`].
pub fn parse_expression_func(input: &str) -> Result<Expr, ParseError> {
    let tokens = insert_implicit_multiplication(tokenize(input)?);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr(0)?;

    match parser.current() {
        None => Ok(expr),
        Some(Token {
            kind: TokenKind::RightParen,
            span,
        }) => Err(ParseError::UnopenedParen { span: *span }),
        Some(token) => Err(ParseError::UnexpectedToken {
            expected: "end of expression".to_string(),
            found: token.kind.to_string(),
            span: token.span,
        }),
    }
}

impl Expr {
    /// Parses expression text, see [`parse_expression_func`].
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input)
    }
}

/// Syntax check only; nothing is evaluated.
pub fn is_valid_expression(input: &str) -> bool {
    parse_expression_func(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::x()
    }

    fn c(value: f64) -> Expr {
        Expr::Const(value)
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!(parse_expression_func("42").unwrap(), c(42.0));
        assert_eq!(parse_expression_func("1.5e-3").unwrap(), c(1.5e-3));
        assert_eq!(parse_expression_func("-4").unwrap(), c(-4.0));
    }

    #[test]
    fn test_parse_variable_and_constants() {
        assert_eq!(parse_expression_func("x").unwrap(), x());
        assert_eq!(parse_expression_func("pi").unwrap(), c(std::f64::consts::PI));
        assert_eq!(parse_expression_func("e").unwrap(), c(std::f64::consts::E));
    }

    #[test]
    fn test_parse_subtraction_is_left_associative() {
        let expr = parse_expression_func("x^2 - x - 1").unwrap();
        assert_eq!(expr, x().pow(c(2.0)) - x() - c(1.0));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_expression_func("1 + 2 * x").unwrap(),
            c(1.0) + c(2.0) * x()
        );
        assert_eq!(
            parse_expression_func("(1 + 2) * x").unwrap(),
            (c(1.0) + c(2.0)) * x()
        );
        assert_eq!(
            parse_expression_func("x / 2 * 3").unwrap(),
            x() / c(2.0) * c(3.0)
        );
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_unary_minus() {
        assert_eq!(
            parse_expression_func("2^3^2").unwrap(),
            c(2.0).pow(c(3.0).pow(c(2.0)))
        );
        assert_eq!(parse_expression_func("-x^2").unwrap(), -(x().pow(c(2.0))));
        assert_eq!(parse_expression_func("2^-x").unwrap(), c(2.0).pow(-x()));
        assert_eq!(parse_expression_func("x**3").unwrap(), x().pow(c(3.0)));
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_product() {
        assert_eq!(parse_expression_func("-x*3").unwrap(), (-x()) * c(3.0));
        assert_eq!(parse_expression_func("+x").unwrap(), x());
        assert_eq!(parse_expression_func("--x").unwrap(), -(-x()));
    }

    #[test]
    fn test_functions_and_aliases() {
        assert_eq!(
            parse_expression_func("sin(cos(x))").unwrap(),
            Expr::call(Func::Sin, Expr::call(Func::Cos, x()))
        );
        assert_eq!(
            parse_expression_func("tg(x)").unwrap(),
            Expr::call(Func::Tan, x())
        );
        assert_eq!(
            parse_expression_func("log(x)").unwrap(),
            Expr::call(Func::Ln, x())
        );
        assert_eq!(
            parse_expression_func("sin(x)^2").unwrap(),
            Expr::call(Func::Sin, x()).pow(c(2.0))
        );
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(
            parse_expression_func("x^4 - 5x^2 + 4").unwrap(),
            x().pow(c(4.0)) - c(5.0) * x().pow(c(2.0)) + c(4.0)
        );
        assert_eq!(
            parse_expression_func("2(x + 1)").unwrap(),
            c(2.0) * (x() + c(1.0))
        );
        assert_eq!(
            parse_expression_func("(x)(x)").unwrap(),
            x() * x()
        );
        assert_eq!(
            parse_expression_func("2 sin(x)").unwrap(),
            c(2.0) * Expr::call(Func::Sin, x())
        );
        assert_eq!(
            parse_expression_func("x(x - 1)").unwrap(),
            x() * (x() - c(1.0))
        );
    }

    #[test]
    fn test_decimal_literal_at_end() {
        assert_eq!(parse_expression_func("2.25").unwrap(), c(2.25));
        assert_eq!(parse_expression_func("x^0.5").unwrap(), x().pow(c(0.5)));
        assert_eq!(
            parse_expression_func("cos(x) - 0.5").unwrap(),
            Expr::call(Func::Cos, x()) - c(0.5)
        );
        assert!(matches!(
            parse_expression_func("x * 1e400"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_fixture_expressions_parse() {
        for text in [
            "x^2 - 4",
            "x^3 - x",
            "sin(x)",
            "cos(x) - 0.5",
            "exp(x) - 2",
            "ln(x)",
            "sin(x^2)",
            "exp(-x^2) * sin(x)",
            "1/(x^2 + 1)",
            "(x^2 - 1)/(x^2 + 1)",
            "abs(x) - 1",
            "sinh(x)",
            "sqrt(abs(x)) * sin(x)",
            "exp(-x/2) * cos(2*x)",
        ] {
            assert!(is_valid_expression(text), "{} should parse", text);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["x^2 - 4", "-x^2 + 2^-x", "exp(-x/2) * cos(2x)", "-3.25 * x / (1 - x)"] {
            let expr = parse_expression_func(text).unwrap();
            let reparsed = parse_expression_func(&expr.to_string()).unwrap();
            assert_eq!(expr, reparsed, "round trip of {}", text);
        }
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(matches!(
            parse_expression_func("(x +"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_expression_func("(x + 1"),
            Err(ParseError::UnclosedParen { span }) if span == Span::new(0, 1)
        ));
        assert!(matches!(
            parse_expression_func("x + 1)"),
            Err(ParseError::UnopenedParen { .. })
        ));
        assert!(matches!(
            parse_expression_func("y + 1"),
            Err(ParseError::UnknownIdentifier { name, .. }) if name == "y"
        ));
        assert!(matches!(
            parse_expression_func("sin x"),
            Err(ParseError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_expression_func("2 3"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_expression_func("* x"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(parse_expression_func(""), Err(ParseError::Empty)));
        assert!(!is_valid_expression("invalid"));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_EXPRESSION_DEPTH + 1), ")".repeat(MAX_EXPRESSION_DEPTH + 1));
        assert_eq!(
            parse_expression_func(&deep),
            Err(ParseError::TooDeep {
                limit: MAX_EXPRESSION_DEPTH
            })
        );
        let shallow = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_expression_func(&shallow).unwrap(), x());
    }
}
