//! Checked evaluation of an [`Expr`] at a real point.
//!
//! IEEE arithmetic quietly turns `sqrt(-1)` into NaN and `1/0` into infinity.
//! Here every node is checked and the first offending sub-expression is
//! reported together with the `x` it was evaluated at, so callers can tell
//! "no real value at this point" apart from a real value.

use crate::symbolic::symbolic_engine::{Expr, VARIABLE};
use thiserror::Error;

/// Reasons an expression has no finite real value at a point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{reason} in '{expr}' at x = {x}")]
    Domain {
        expr: String,
        reason: &'static str,
        x: f64,
    },
    #[error("division by zero in '{expr}' at x = {x}")]
    DivisionByZero { expr: String, x: f64 },
    #[error("'{expr}' is not finite at x = {x}")]
    Overflow { expr: String, x: f64 },
    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },
}

impl EvalError {
    /// the point the evaluation failed at, if known
    pub fn x(&self) -> Option<f64> {
        match self {
            EvalError::Domain { x, .. }
            | EvalError::DivisionByZero { x, .. }
            | EvalError::Overflow { x, .. } => Some(*x),
            EvalError::UnboundVariable { .. } => None,
        }
    }
}

fn finite(node: &Expr, value: f64, x: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::Overflow {
            expr: node.to_string(),
            x,
        })
    }
}

impl Expr {
    /// Evaluates the expression with `x` bound to the given value.
    pub fn eval(&self, x: f64) -> Result<f64, EvalError> {
        match self {
            Expr::Var(name) if name == VARIABLE => Ok(x),
            Expr::Var(name) => Err(EvalError::UnboundVariable { name: name.clone() }),
            Expr::Const(val) => finite(self, *val, x),
            Expr::Neg(arg) => Ok(-arg.eval(x)?),
            Expr::Add(lhs, rhs) => finite(self, lhs.eval(x)? + rhs.eval(x)?, x),
            Expr::Sub(lhs, rhs) => finite(self, lhs.eval(x)? - rhs.eval(x)?, x),
            Expr::Mul(lhs, rhs) => finite(self, lhs.eval(x)? * rhs.eval(x)?, x),
            Expr::Div(lhs, rhs) => {
                let numerator = lhs.eval(x)?;
                let denominator = rhs.eval(x)?;
                if denominator == 0.0 {
                    return Err(EvalError::DivisionByZero {
                        expr: self.to_string(),
                        x,
                    });
                }
                finite(self, numerator / denominator, x)
            }
            Expr::Pow(base, exp) => {
                let b = base.eval(x)?;
                let e = exp.eval(x)?;
                if b < 0.0 && e.fract() != 0.0 {
                    return Err(EvalError::Domain {
                        expr: self.to_string(),
                        reason: "negative base with a fractional exponent",
                        x,
                    });
                }
                if b == 0.0 && e < 0.0 {
                    return Err(EvalError::DivisionByZero {
                        expr: self.to_string(),
                        x,
                    });
                }
                finite(self, b.powf(e), x)
            }
            Expr::Call(func, arg) => {
                let value = arg.eval(x)?;
                if let Some(reason) = func.domain_violation(value) {
                    return Err(EvalError::Domain {
                        expr: self.to_string(),
                        reason,
                        x,
                    });
                }
                finite(self, func.apply(value), x)
            }
        }
    }

    /// Turns the expression into a plain Rust closure of one argument.
    pub fn lambdify1D(&self) -> Box<dyn Fn(f64) -> Result<f64, EvalError> + Send + Sync> {
        let expr = self.clone();
        Box::new(move |x| expr.eval(x))
    }

    /// Central difference `(f(x+h) - f(x-h)) / 2h`.
    pub fn numeric_derivative(&self, x: f64, h: f64) -> Result<f64, EvalError> {
        let forward = self.eval(x + h)?;
        let backward = self.eval(x - h)?;
        Ok((forward - backward) / (2.0 * h))
    }
}
