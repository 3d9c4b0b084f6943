//! Turns the loose `name -> number` map of a request into one strongly typed
//! variant per algorithm family, rejecting anything outside its domain.
use crate::api::registry::{MethodId, ParameterKind};
use crate::errors::CalcError;
use crate::global::{DEFAULT_NUM_POINTS, DEFAULT_STEP_SIZE, DEFAULT_TOLERANCE, EngineConfig, MAX_ITERATIONS_CEILING};
use crate::numerical::differentiation::FiniteDifference;
use crate::numerical::quadrature::QuadratureRule;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum MethodParams {
    Newton {
        initial_guess: f64,
        tolerance: f64,
        max_iterations: usize,
    },
    Bisection {
        lower_bound: f64,
        upper_bound: f64,
        tolerance: f64,
        max_iterations: usize,
    },
    Secant {
        first_guess: f64,
        second_guess: f64,
        tolerance: f64,
        max_iterations: usize,
    },
    Difference {
        rule: FiniteDifference,
        point: f64,
        step_size: f64,
    },
    Quadrature {
        rule: QuadratureRule,
        lower_bound: f64,
        upper_bound: f64,
        num_points: usize,
    },
}

/// Read-only view of the numeric parameters of one request.
struct ParamReader<'a> {
    method: MethodId,
    values: &'a BTreeMap<String, f64>,
}

impl<'a> ParamReader<'a> {
    fn new(method: MethodId, values: &'a BTreeMap<String, f64>) -> Result<Self, CalcError> {
        let accepted = method.parameters();
        for name in values.keys() {
            let known = accepted
                .iter()
                .any(|p| p.name == name.as_str() && p.kind != ParameterKind::Expression);
            if !known {
                return Err(CalcError::invalid(
                    name,
                    format!("not a parameter of {}", method),
                ));
            }
        }
        Ok(Self { method, values })
    }

    fn optional(&self, name: &str) -> Result<Option<f64>, CalcError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(v) if v.is_finite() => Ok(Some(*v)),
            Some(v) => Err(CalcError::invalid(name, format!("must be a finite number, got {}", v))),
        }
    }

    fn required(&self, name: &str) -> Result<f64, CalcError> {
        self.optional(name)?
            .ok_or_else(|| CalcError::invalid(name, format!("is required by {}", self.method)))
    }

    fn positive(&self, name: &str, default: f64) -> Result<f64, CalcError> {
        let value = self.optional(name)?.unwrap_or(default);
        if value <= 0.0 {
            return Err(CalcError::invalid(name, format!("must be > 0, got {}", value)));
        }
        Ok(value)
    }

    fn whole(&self, name: &str, default: usize, min: usize, max: usize) -> Result<usize, CalcError> {
        let Some(value) = self.optional(name)? else {
            return Ok(default);
        };
        if value.fract() != 0.0 {
            return Err(CalcError::invalid(name, format!("must be a whole number, got {}", value)));
        }
        if value < min as f64 || value > max as f64 {
            return Err(CalcError::invalid(
                name,
                format!("must be in {}..={}, got {}", min, max, value),
            ));
        }
        Ok(value as usize)
    }

    fn tolerance(&self) -> Result<f64, CalcError> {
        self.positive("tolerance", DEFAULT_TOLERANCE)
    }

    fn max_iterations(&self, config: &EngineConfig) -> Result<usize, CalcError> {
        self.whole("maxIterations", config.max_iterations, 1, MAX_ITERATIONS_CEILING)
    }

    fn bounds(&self) -> Result<(f64, f64), CalcError> {
        let lower = self.required("lowerBound")?;
        let upper = self.required("upperBound")?;
        if lower >= upper {
            return Err(CalcError::invalid(
                "upperBound",
                format!("must be greater than lowerBound, got [{}, {}]", lower, upper),
            ));
        }
        Ok((lower, upper))
    }
}

impl MethodParams {
    /// Validates `values` against the parameters `method` declares.
    pub fn from_values(
        method: MethodId,
        values: &BTreeMap<String, f64>,
        config: &EngineConfig,
    ) -> Result<Self, CalcError> {
        let reader = ParamReader::new(method, values)?;
        let params = match method {
            MethodId::Newton => MethodParams::Newton {
                initial_guess: reader.required("initialGuess")?,
                tolerance: reader.tolerance()?,
                max_iterations: reader.max_iterations(config)?,
            },
            MethodId::Bisection => {
                let (lower_bound, upper_bound) = reader.bounds()?;
                MethodParams::Bisection {
                    lower_bound,
                    upper_bound,
                    tolerance: reader.tolerance()?,
                    max_iterations: reader.max_iterations(config)?,
                }
            }
            MethodId::Secant => {
                let first_guess = reader.required("firstGuess")?;
                let second_guess = reader.required("secondGuess")?;
                if first_guess == second_guess {
                    return Err(CalcError::invalid(
                        "secondGuess",
                        "must differ from firstGuess",
                    ));
                }
                MethodParams::Secant {
                    first_guess,
                    second_guess,
                    tolerance: reader.tolerance()?,
                    max_iterations: reader.max_iterations(config)?,
                }
            }
            MethodId::Forward | MethodId::Central | MethodId::Backward => {
                let rule = match method {
                    MethodId::Forward => FiniteDifference::Forward,
                    MethodId::Backward => FiniteDifference::Backward,
                    _ => FiniteDifference::Central,
                };
                MethodParams::Difference {
                    rule,
                    point: reader.required("point")?,
                    step_size: reader.positive("stepSize", DEFAULT_STEP_SIZE)?,
                }
            }
            MethodId::Trapezoidal | MethodId::Simpson | MethodId::Midpoint => {
                let rule = match method {
                    MethodId::Simpson => QuadratureRule::Simpson,
                    MethodId::Midpoint => QuadratureRule::Midpoint,
                    _ => QuadratureRule::Trapezoidal,
                };
                let (lower_bound, upper_bound) = reader.bounds()?;
                MethodParams::Quadrature {
                    rule,
                    lower_bound,
                    upper_bound,
                    num_points: reader.whole(
                        "numPoints",
                        DEFAULT_NUM_POINTS,
                        rule.min_intervals(),
                        config.max_num_points,
                    )?,
                }
            }
        };
        Ok(params)
    }
}
