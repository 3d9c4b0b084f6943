//! # Symbolic Engine Module
//!
//! The expression tree every calculation is built on. A request's function
//! text is parsed once into an [`Expr`], evaluated many times by the engines
//! and dropped when the request ends.
//!
//! ## Main Structures
//!
//! ### `Expr` Enum
//! A closed set of node kinds:
//! - **Variable**: `Var(String)` - in practice always `x`
//! - **Literal**: `Const(f64)`
//! - **Unary**: `Neg`
//! - **Binary**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Call**: `Call(Func, arg)` - one of the named functions in [`Func`]
//!
//! ### `Func` Enum
//! Named functions of one argument. Parsing a name goes through `strum`, so
//! aliases (`tg`, `arcsin`, `log`, ...) resolve to the same variant.
//!
//! ## Interesting Code Features
//!
//! 1. **Operator Overloading**: `std::ops` traits build trees naturally:
//!    `Expr::x() * Expr::x() - Expr::Const(4.0)`
//! 2. **Re-parseable Display**: `Display` prints a fully parenthesised form that
//!    `Expr::parse_expression` reads back to the same tree.

use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Name of the only free variable the engines evaluate.
pub const VARIABLE: &str = "x";

/// Named functions of one real argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Func {
    Sin,
    Cos,
    #[strum(to_string = "tan", serialize = "tg")]
    Tan,
    Sinh,
    Cosh,
    Tanh,
    #[strum(to_string = "asin", serialize = "arcsin")]
    Asin,
    #[strum(to_string = "acos", serialize = "arccos")]
    Acos,
    #[strum(to_string = "atan", serialize = "arctan", serialize = "arctg")]
    Atan,
    Exp,
    #[strum(to_string = "ln", serialize = "log")]
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Func {
    /// Resolves a function name or one of its aliases.
    pub fn lookup(name: &str) -> Option<Func> {
        Func::from_str(name).ok()
    }

    /// Raw IEEE evaluation, no domain checks.
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Func::Sin => value.sin(),
            Func::Cos => value.cos(),
            Func::Tan => value.tan(),
            Func::Sinh => value.sinh(),
            Func::Cosh => value.cosh(),
            Func::Tanh => value.tanh(),
            Func::Asin => value.asin(),
            Func::Acos => value.acos(),
            Func::Atan => value.atan(),
            Func::Exp => value.exp(),
            Func::Ln => value.ln(),
            Func::Log10 => value.log10(),
            Func::Sqrt => value.sqrt(),
            Func::Abs => value.abs(),
        }
    }

    /// Describes why `value` lies outside the real domain of the function.
    pub fn domain_violation(self, value: f64) -> Option<&'static str> {
        match self {
            Func::Sqrt if value < 0.0 => Some("square root of a negative number"),
            Func::Ln | Func::Log10 if value <= 0.0 => Some("logarithm of a non-positive number"),
            Func::Asin | Func::Acos if !(-1.0..=1.0).contains(&value) => {
                Some("inverse sine/cosine outside [-1, 1]")
            }
            _ => None,
        }
    }
}

/// Named constants recognised by the parser.
pub fn named_constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(PI),
        "e" => Some(E),
        _ => None,
    }
}

/// Expression tree of a function of one real variable.
///
/// # Examples
/// ```rust, ignore
/// use numerica::symbolic::symbolic_engine::Expr;
/// let f = Expr::x().pow(Expr::Const(2.0)) - Expr::Const(4.0);
/// assert_eq!(f.to_string(), "((x ^ 2) - 4)");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Variable with a name
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Unary minus: -arg
    Neg(Box<Expr>),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Named function applied to one argument
    Call(Func, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) if *val < 0.0 => write!(f, "({})", val),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Neg(arg) => write!(f, "(-{})", arg),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Call(func, arg) => write!(f, "{}({})", func, arg),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Neg(self.boxed())
    }
}

impl Expr {
    /// The free variable `x`.
    pub fn x() -> Expr {
        Expr::Var(VARIABLE.to_string())
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn call(func: Func, arg: Expr) -> Expr {
        Expr::Call(func, arg.boxed())
    }

    /// true if `var` occurs anywhere in the tree
    pub fn contains_variable(&self, var: &str) -> bool {
        match self {
            Expr::Var(name) => name == var,
            Expr::Const(_) => false,
            Expr::Neg(arg) | Expr::Call(_, arg) => arg.contains_variable(var),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.contains_variable(var) || rhs.contains_variable(var),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Var(_) | Expr::Const(_) => 1,
            Expr::Neg(arg) | Expr::Call(_, arg) => 1 + arg.node_count(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => 1 + lhs.node_count() + rhs.node_count(),
        }
    }
}
