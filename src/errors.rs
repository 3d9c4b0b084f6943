//! Error taxonomy seen by callers of the dispatcher.
//!
//! ┌ [`CalcError::Parse`]                 : malformed expression
//! ├ [`CalcError::Eval`]                  : no real value at a sampled point
//! ├ [`CalcError::InvalidParameter`]      : missing / out-of-range parameter, bad bracket
//! ├ [`CalcError::UnknownMethod`]         : method id not in the registry
//! ├ [`CalcError::Divergence`]            : runaway, cycling or flat iteration
//! └ [`CalcError::MaxIterationsExceeded`] : iteration cap hit
//!
//! Engine errors convert with `From`; none of them is retried.
use crate::numerical::differentiation::DifferentiationError;
use crate::numerical::quadrature::QuadratureError;
use crate::numerical::root_finding::RootFindingError;
use crate::symbolic::symbolic_eval::EvalError;
use crate::symbolic::tokenizer::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("evaluation error: {0}")]
    Eval(String),
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("divergence: {0}")]
    Divergence(String),
    #[error("maximum iterations exceeded: {0}")]
    MaxIterationsExceeded(String),
}

impl CalcError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status of the error response
    pub fn http_status(&self) -> u16 {
        match self {
            CalcError::Parse(_) | CalcError::InvalidParameter { .. } | CalcError::UnknownMethod(_) => {
                400
            }
            CalcError::Eval(_) | CalcError::Divergence(_) | CalcError::MaxIterationsExceeded(_) => {
                422
            }
        }
    }

    /// stable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::Parse(_) => "ParseError",
            CalcError::Eval(_) => "EvalError",
            CalcError::InvalidParameter { .. } => "InvalidParameterError",
            CalcError::UnknownMethod(_) => "UnknownMethodError",
            CalcError::Divergence(_) => "DivergenceError",
            CalcError::MaxIterationsExceeded(_) => "MaxIterationsExceeded",
        }
    }
}

impl From<EvalError> for CalcError {
    fn from(err: EvalError) -> Self {
        CalcError::Eval(err.to_string())
    }
}

impl From<RootFindingError> for CalcError {
    fn from(err: RootFindingError) -> Self {
        match err {
            RootFindingError::InvalidBracket { .. } => {
                CalcError::invalid("lowerBound, upperBound", err.to_string())
            }
            RootFindingError::InvalidInput { field, reason } => CalcError::invalid(field, reason),
            RootFindingError::DerivativeZero { .. }
            | RootFindingError::DenominatorUnderflow { .. }
            | RootFindingError::Diverged { .. } => CalcError::Divergence(err.to_string()),
            RootFindingError::MaxIterationsReached { .. } => {
                CalcError::MaxIterationsExceeded(err.to_string())
            }
            RootFindingError::Eval(eval) => eval.into(),
        }
    }
}

impl From<DifferentiationError> for CalcError {
    fn from(err: DifferentiationError) -> Self {
        match err {
            DifferentiationError::InvalidStep(_) | DifferentiationError::StepUnderflow { .. } => {
                CalcError::invalid("stepSize", err.to_string())
            }
            DifferentiationError::InvalidPoint(_) => CalcError::invalid("point", err.to_string()),
            DifferentiationError::Eval(eval) => eval.into(),
        }
    }
}

impl From<QuadratureError> for CalcError {
    fn from(err: QuadratureError) -> Self {
        match err {
            QuadratureError::InvalidBounds { .. } => CalcError::invalid("upperBound", err.to_string()),
            QuadratureError::TooFewIntervals { .. } | QuadratureError::TooManyIntervals { .. } => {
                CalcError::invalid("numPoints", err.to_string())
            }
            QuadratureError::NonFinite => CalcError::Eval(err.to_string()),
            QuadratureError::Eval(eval) => eval.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_kind() {
        let parse: CalcError = ParseError::Empty.into();
        assert_eq!(parse.http_status(), 400);
        assert_eq!(parse.kind(), "ParseError");

        let div: CalcError = RootFindingError::DerivativeZero { x: 0.0, slope: 0.0 }.into();
        assert_eq!(div.http_status(), 422);
        assert_eq!(div.kind(), "DivergenceError");

        let max: CalcError = RootFindingError::MaxIterationsReached {
            iterations: 100,
            x: 1.0,
        }
        .into();
        assert_eq!(max.kind(), "MaxIterationsExceeded");
        assert_eq!(CalcError::UnknownMethod("euler".into()).http_status(), 400);
    }

    #[test]
    fn engine_errors_name_the_field() {
        let err: CalcError = QuadratureError::TooFewIntervals {
            rule: crate::numerical::quadrature::QuadratureRule::Simpson,
            n: 1,
            min: 2,
        }
        .into();
        match err {
            CalcError::InvalidParameter { field, .. } => assert_eq!(field, "numPoints"),
            other => panic!("unexpected {:?}", other),
        }
        let err: CalcError = DifferentiationError::InvalidStep(0.0).into();
        assert!(err.to_string().contains("stepSize"));

        let solver = crate::numerical::root_finding::ScalarRootFinder::new();
        let f = crate::numerical::root_finding::ClosureFunction::new(|x: f64| x, "x".to_string());
        let err: CalcError = solver.secant(&f, 1.0, 1.0).unwrap_err().into();
        match err {
            CalcError::InvalidParameter { field, .. } => assert_eq!(field, "secondGuess"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn eval_errors_keep_their_context() {
        let eval = EvalError::Domain {
            expr: "sqrt(x)".to_string(),
            reason: "square root of a negative number",
            x: -1.0,
        };
        let err: CalcError = RootFindingError::Eval(eval).into();
        assert_eq!(err.kind(), "EvalError");
        assert!(err.to_string().contains("sqrt(x)"));
        assert!(err.to_string().contains("-1"));
    }
}
