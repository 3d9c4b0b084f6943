#![allow(non_snake_case)]
/// # Symbolic engine
/// the expression tree: node kinds, named functions and constants, operator
/// overloading and a re-parseable `Display`
///# Example
/// ```
/// use numerica::symbolic::symbolic_engine::{Expr, Func};
/// let f = Expr::call(Func::Sin, Expr::x()) + Expr::Const(1.0);
/// assert_eq!(f.to_string(), "(sin(x) + 1)");
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///____________________________________________________________________________________________________________________________
/// splits expression text into spanned tokens (nom based)
pub mod tokenizer;
///____________________________________________________________________________________________________________________________
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use numerica::symbolic::symbolic_engine::Expr;
/// let input = "2x^2 + 3x - 1";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let parsed_function = parsed_expression.lambdify1D();
/// assert_eq!(parsed_function(1.0).unwrap(), 4.0);
/// ```
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// checked evaluation: every node is tested for domain errors, division by
/// zero and non-finite results
pub mod symbolic_eval;
