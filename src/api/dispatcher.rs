//! Maps a method id and a parameter set onto an engine call and normalises
//! the outcome into the common result shape.
//!
//! A [`Calculator`] holds nothing but its read-only [`EngineConfig`], so one
//! instance can serve any number of threads; every expression, trace and
//! result lives only for the request that created it.
use crate::api::parameters::MethodParams;
use crate::api::registry::MethodId;
use crate::api::wire::{
    CalculationRequest, CalculationResponse, CalculationResult, Point, RequestParameters,
    ValidateRequest, ValidateResponse,
};
use crate::errors::CalcError;
use crate::global::EngineConfig;
use crate::numerical::differentiation::differentiate;
use crate::numerical::quadrature::{QuadratureConfig, integrate};
use crate::numerical::root_finding::{
    RootFindingConfig, RootFindingResult, ScalarRootFinder, SymbolicFunction,
};
use crate::symbolic::parse_expr::{is_valid_expression, parse_expression_func};
use crate::symbolic::symbolic_engine::Expr;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Calculator {
    config: EngineConfig,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, String> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one calculation: parse, resolve the method, validate, compute.
    pub fn calculate(
        &self,
        method_id: &str,
        expression: &str,
        parameters: &BTreeMap<String, f64>,
    ) -> Result<CalculationResult, CalcError> {
        self.calculate_with_derivative(method_id, expression, None, parameters)
    }

    /// Same as [`Calculator::calculate`] with an optional analytic derivative
    /// for Newton's method.
    pub fn calculate_with_derivative(
        &self,
        method_id: &str,
        expression: &str,
        derivative: Option<&str>,
        parameters: &BTreeMap<String, f64>,
    ) -> Result<CalculationResult, CalcError> {
        let expr = parse_expression_func(expression)?;
        let method = MethodId::resolve(method_id)?;
        let derivative_expr = match derivative {
            Some(_) if method != MethodId::Newton => {
                return Err(CalcError::invalid(
                    "derivative",
                    format!("only newton accepts a derivative, not {}", method),
                ));
            }
            Some(text) => Some(parse_expression_func(text).map_err(|e| {
                CalcError::invalid("derivative", e.to_string())
            })?),
            None => None,
        };
        let params = MethodParams::from_values(method, parameters, &self.config)?;
        info!("{} for f(x) = {}", method, expr);
        self.run(method, expr, derivative_expr, params)
    }

    pub fn calculate_request(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, CalcError> {
        let RequestParameters {
            function,
            derivative,
            values,
        } = &request.parameters;
        self.calculate_with_derivative(&request.method_id, function, derivative.as_deref(), values)
    }

    /// Independent requests in parallel; results keep the input order.
    pub fn calculate_batch(
        &self,
        requests: &[CalculationRequest],
    ) -> Vec<Result<CalculationResult, CalcError>> {
        requests
            .par_iter()
            .map(|request| self.calculate_request(request))
            .collect()
    }

    fn root_finder(&self, tolerance: f64, max_iterations: usize) -> ScalarRootFinder {
        let config = RootFindingConfig {
            max_iterations,
            ..RootFindingConfig::from_engine(&self.config, tolerance)
        };
        ScalarRootFinder::with_config(config)
    }

    fn run(
        &self,
        method: MethodId,
        expr: Expr,
        derivative: Option<Expr>,
        params: MethodParams,
    ) -> Result<CalculationResult, CalcError> {
        match params {
            MethodParams::Newton {
                initial_guess,
                tolerance,
                max_iterations,
            } => {
                let function = SymbolicFunction::from_expr(expr, derivative);
                let result = self
                    .root_finder(tolerance, max_iterations)
                    .newton_raphson(&function, initial_guess)?;
                Ok(root_result(method, result))
            }
            MethodParams::Bisection {
                lower_bound,
                upper_bound,
                tolerance,
                max_iterations,
            } => {
                let function = SymbolicFunction::from_expr(expr, None);
                let result = self
                    .root_finder(tolerance, max_iterations)
                    .bisection(&function, lower_bound, upper_bound)?;
                Ok(root_result(method, result))
            }
            MethodParams::Secant {
                first_guess,
                second_guess,
                tolerance,
                max_iterations,
            } => {
                let function = SymbolicFunction::from_expr(expr, None);
                let result = self
                    .root_finder(tolerance, max_iterations)
                    .secant(&function, first_guess, second_guess)?;
                Ok(root_result(method, result))
            }
            MethodParams::Difference {
                rule,
                point,
                step_size,
            } => {
                let f = expr.lambdify1D();
                let estimate = differentiate(&f, rule, point, step_size)?;
                Ok(CalculationResult {
                    method: method.to_string(),
                    value: estimate.value,
                    error: Some(estimate.error),
                    iterations: None,
                    points: Some(estimate.samples.into_iter().map(Point::from).collect()),
                })
            }
            MethodParams::Quadrature {
                rule,
                lower_bound,
                upper_bound,
                num_points,
            } => {
                let f = expr.lambdify1D();
                let result = integrate(
                    &f,
                    rule,
                    lower_bound,
                    upper_bound,
                    num_points,
                    &QuadratureConfig::from_engine(&self.config),
                )?;
                Ok(CalculationResult {
                    method: method.to_string(),
                    value: result.value,
                    error: result.error,
                    iterations: None,
                    points: Some(result.samples.into_iter().map(Point::from).collect()),
                })
            }
        }
    }

    /// Request in, `(http status, response body)` out.
    pub fn handle_request(&self, request: &CalculationRequest) -> (u16, CalculationResponse) {
        match self.calculate_request(request) {
            Ok(data) => (200, CalculationResponse::Success { data }),
            Err(err) => {
                warn!("{} request failed: {} ({})", request.method_id, err, err.kind());
                (
                    err.http_status(),
                    CalculationResponse::Error {
                        message: err.to_string(),
                    },
                )
            }
        }
    }

    /// JSON text in, `(http status, JSON text)` out; malformed JSON is a 400.
    pub fn handle_json(&self, body: &str) -> (u16, String) {
        let (status, response) = match serde_json::from_str::<CalculationRequest>(body) {
            Ok(request) => self.handle_request(&request),
            Err(err) => {
                warn!("malformed request body: {}", err);
                (
                    400,
                    CalculationResponse::Error {
                        message: format!("malformed request: {}", err),
                    },
                )
            }
        };
        (status, to_json(&response))
    }
}

fn root_result(method: MethodId, result: RootFindingResult) -> CalculationResult {
    CalculationResult {
        method: method.to_string(),
        value: result.root,
        error: Some(result.residual()),
        iterations: Some(result.iterations),
        points: Some(result.trace.into_iter().map(Point::from).collect()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        format!(
            r#"{{"status":"error","message":"response serialization failed: {}"}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

/// Parser-only check; the expression is never evaluated.
pub fn validate_expression(expression: &str) -> ValidateResponse {
    ValidateResponse {
        valid: is_valid_expression(expression),
    }
}

/// `{"expression": ...}` in, `(http status, {"valid": ...})` out.
pub fn handle_validate_json(body: &str) -> (u16, String) {
    match serde_json::from_str::<ValidateRequest>(body) {
        Ok(request) => (200, to_json(&validate_expression(&request.expression))),
        Err(err) => {
            warn!("malformed validate body: {}", err);
            (
                400,
                to_json(&CalculationResponse::Error {
                    message: format!("malformed request: {}", err),
                }),
            )
        }
    }
}
