//! Forward, central and backward finite differences of a function of one variable.
//!
//! There is no closed-form derivative to compare against, so the reported
//! error is the truncation order of the stencil: `h` for the one-sided rules
//! and `h^2` for the central rule.
use crate::symbolic::symbolic_eval::EvalError;
use log::debug;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FiniteDifference {
    /// (f(x+h) - f(x)) / h
    Forward,
    /// (f(x+h) - f(x-h)) / 2h
    Central,
    /// (f(x) - f(x-h)) / h
    Backward,
}

impl FiniteDifference {
    /// order of accuracy of the stencil
    pub fn order(self) -> i32 {
        match self {
            FiniteDifference::Central => 2,
            FiniteDifference::Forward | FiniteDifference::Backward => 1,
        }
    }

    /// Sample abscissae in ascending order.
    pub fn stencil(self, x: f64, h: f64) -> Vec<f64> {
        match self {
            FiniteDifference::Forward => vec![x, x + h],
            FiniteDifference::Central => vec![x - h, x + h],
            FiniteDifference::Backward => vec![x - h, x],
        }
    }

    pub fn truncation_error(self, h: f64) -> f64 {
        h.powi(self.order())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DifferentiationError {
    #[error("step size must be finite and > 0, got {0}")]
    InvalidStep(f64),
    #[error("point must be finite, got {0}")]
    InvalidPoint(f64),
    #[error("step {h} is lost in rounding next to x = {x}")]
    StepUnderflow { x: f64, h: f64 },
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeEstimate {
    pub method: FiniteDifference,
    pub value: f64,
    /// truncation error estimate, not a measured residual
    pub error: f64,
    /// the (x, f(x)) samples the stencil used
    pub samples: Vec<(f64, f64)>,
}

/// Estimates f'(x) with the given stencil and step.
pub fn differentiate<F>(
    function: &F,
    method: FiniteDifference,
    x: f64,
    h: f64,
) -> Result<DerivativeEstimate, DifferentiationError>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    if !x.is_finite() {
        return Err(DifferentiationError::InvalidPoint(x));
    }
    if !(h.is_finite() && h > 0.0) {
        return Err(DifferentiationError::InvalidStep(h));
    }
    if x + h == x || x - h == x {
        return Err(DifferentiationError::StepUnderflow { x, h });
    }

    let samples = method
        .stencil(x, h)
        .into_iter()
        .map(|xi| function(xi).map(|yi| (xi, yi)))
        .collect::<Result<Vec<_>, _>>()?;
    let (lo, hi) = (samples[0].1, samples[samples.len() - 1].1);
    let value = match method {
        FiniteDifference::Central => (hi - lo) / (2.0 * h),
        FiniteDifference::Forward | FiniteDifference::Backward => (hi - lo) / h,
    };
    if !value.is_finite() {
        return Err(EvalError::Overflow {
            expr: format!("{} difference quotient", method),
            x,
        }
        .into());
    }
    debug!(
        "{} difference at x = {}, h = {:e}: f' = {}",
        method, x, h, value
    );
    Ok(DerivativeEstimate {
        method,
        value,
        error: method.truncation_error(h),
        samples,
    })
}
