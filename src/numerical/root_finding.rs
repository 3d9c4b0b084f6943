//! Bisection, secant and Newton-Raphson for scalar equations f(x) = 0.
//!
//! Every iterate is recorded in a [`ConvergenceTrace`]; the trace decides
//! when an iteration is running away or cycling so that a hopeless start
//! ends in an error instead of burning the whole iteration budget.
use crate::global::{DEFAULT_TOLERANCE, EngineConfig};
use crate::symbolic::parse_expr::parse_expression_func;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_eval::EvalError;
use crate::symbolic::tokenizer::ParseError;
use itertools::Itertools;
use log::{debug, info, warn};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Enum to represent the root finding methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RootFindingMethod {
    Bisection,
    Secant,
    Newton,
}

/// Error types for root finding methods
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RootFindingError {
    #[error("f(a) and f(b) must have opposite signs, got f({a}) = {fa} and f({b}) = {fb}")]
    InvalidBracket { a: f64, fa: f64, b: f64, fb: f64 },
    #[error("derivative {slope:e} at x = {x} is too close to zero")]
    DerivativeZero { x: f64, slope: f64 },
    #[error("secant denominator f(x_n) - f(x_n-1) vanished at x = {x}")]
    DenominatorUnderflow { x: f64 },
    #[error("iteration diverged: {reason}")]
    Diverged { reason: String },
    #[error("no convergence after {iterations} iterations, last iterate x = {x}")]
    MaxIterationsReached { iterations: usize, x: f64 },
    /// `field` uses the request parameter name
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error(transparent)]
    Eval(#[from] EvalError),
}

//////////////////////////////////TRAITS AND IMPLEMENTATIONS/////////////////////////////////

/// Trait for representing a nonlinear equation f(x) = 0
pub trait NonlinearFunction {
    /// Evaluate the function at point x
    fn evaluate(&self, x: f64) -> Result<f64, EvalError>;

    /// Evaluate the derivative at point x (optional, for methods that can use it)
    fn derivative(&self, _x: f64) -> Option<Result<f64, EvalError>> {
        None
    }

    /// Get function name for debugging/logging
    fn name(&self) -> &str {
        "unnamed_function"
    }
}

/// Simple function wrapper for closures
pub struct ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    func: F,
    name: String,
}

impl<F> ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    pub fn new(func: F, name: String) -> Self {
        Self { func, name }
    }
}

impl<F> NonlinearFunction for ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        let value = (self.func)(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::Overflow {
                expr: self.name.clone(),
                x,
            })
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

////////////////////////SYMBOLIC FUNCTIONS//////////////////////////////////////////
/// A parsed expression, optionally paired with a parsed expression of its derivative.
pub struct SymbolicFunction {
    expr: Expr,
    derivative_expr: Option<Expr>,
    name: String,
}

impl SymbolicFunction {
    pub fn from_expr(expr: Expr, derivative_expr: Option<Expr>) -> Self {
        let name = expr.to_string();
        Self {
            expr,
            derivative_expr,
            name,
        }
    }

    /// Parses the function and, if given, its derivative.
    pub fn from_string(expr_str: &str, derivative_str: Option<&str>) -> Result<Self, ParseError> {
        let expr = parse_expression_func(expr_str)?;
        let derivative_expr = derivative_str.map(parse_expression_func).transpose()?;
        Ok(Self {
            expr,
            derivative_expr,
            name: expr_str.trim().to_string(),
        })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn has_derivative(&self) -> bool {
        self.derivative_expr.is_some()
    }
}

impl NonlinearFunction for SymbolicFunction {
    fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        self.expr.eval(x)
    }

    fn derivative(&self, x: f64) -> Option<Result<f64, EvalError>> {
        self.derivative_expr.as_ref().map(|d| d.eval(x))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/////////////////////////////////////CONVERGENCE TRACE/////////////////////////////////////////

/// Ordered `(x, f(x))` pairs visited by one solver run.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceTrace {
    points: Vec<(f64, f64)>,
    divergence_bound: f64,
    divergence_window: usize,
}

impl ConvergenceTrace {
    pub fn new(divergence_bound: f64, divergence_window: usize) -> Self {
        Self {
            points: Vec::new(),
            divergence_bound,
            divergence_window,
        }
    }

    pub fn push(&mut self, x: f64, fx: f64) {
        self.points.push((x, fx));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// |x_{n+1} - x_n| for consecutive iterates
    pub fn step_lengths(&self) -> Vec<f64> {
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| (b.0 - a.0).abs())
            .collect()
    }

    /// Returns a description of the divergence pattern seen in the trace, if any.
    pub fn divergence(&self, tolerance: f64) -> Option<String> {
        let &(x, _) = self.points.last()?;
        if !x.is_finite() || x.abs() > self.divergence_bound {
            return Some(format!(
                "iterate {} left the region |x| <= {:e}",
                x, self.divergence_bound
            ));
        }

        let steps = self.step_lengths();
        if steps.len() > self.divergence_window {
            let recent = &steps[steps.len() - self.divergence_window - 1..];
            if recent.iter().tuple_windows().all(|(a, b)| b > a) {
                return Some(format!(
                    "step length grew for {} consecutive iterations (last step {:e})",
                    self.divergence_window,
                    recent[recent.len() - 1]
                ));
            }
        }

        if let [.., (x_prev2, _), (x_prev, _), (x_last, _)] = self.points.as_slice() {
            let last_step = (x_last - x_prev).abs();
            if (x_last - x_prev2).abs() < tolerance && last_step >= tolerance {
                return Some(format!(
                    "iterates oscillate between {} and {}",
                    x_prev, x_last
                ));
            }
        }
        None
    }
}

///////////////////////////////////////////SETTERS AND GETTERS///////////////////////////////////////////
/// Result structure for root finding methods
#[derive(Debug, Clone)]
pub struct RootFindingResult {
    pub root: f64,
    pub function_value: f64,
    pub iterations: usize,
    pub method: RootFindingMethod,
    pub trace: Vec<(f64, f64)>,
}

impl RootFindingResult {
    /// achieved residual |f(root)|
    pub fn residual(&self) -> f64 {
        self.function_value.abs()
    }
}

/// Configuration for root finding methods
#[derive(Debug, Clone)]
pub struct RootFindingConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub derivative_step: f64,
    pub slope_floor: f64,
    pub denominator_floor: f64,
    pub divergence_bound: f64,
    pub divergence_window: usize,
}

impl Default for RootFindingConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default(), DEFAULT_TOLERANCE)
    }
}

impl RootFindingConfig {
    pub fn from_engine(engine: &EngineConfig, tolerance: f64) -> Self {
        Self {
            tolerance,
            max_iterations: engine.max_iterations,
            derivative_step: engine.derivative_step,
            slope_floor: engine.slope_floor,
            denominator_floor: engine.denominator_floor,
            divergence_bound: engine.divergence_bound,
            divergence_window: engine.divergence_window,
        }
    }
}

/// Main structure for scalar root finding methods
pub struct ScalarRootFinder {
    config: RootFindingConfig,
}

impl ScalarRootFinder {
    /// Create a new ScalarRootFinder with default configuration
    pub fn new() -> Self {
        Self {
            config: RootFindingConfig::default(),
        }
    }

    /// Create a new ScalarRootFinder with custom configuration
    pub fn with_config(config: RootFindingConfig) -> Self {
        Self { config }
    }

    /// Set tolerance for convergence
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.config.tolerance = tolerance;
    }

    /// Set maximum number of iterations
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    pub fn config(&self) -> &RootFindingConfig {
        &self.config
    }

    fn check_config(&self) -> Result<(), RootFindingError> {
        if !(self.config.tolerance.is_finite() && self.config.tolerance > 0.0) {
            return Err(RootFindingError::InvalidInput {
                field: "tolerance",
                reason: format!("must be positive, got {}", self.config.tolerance),
            });
        }
        if self.config.max_iterations == 0 {
            return Err(RootFindingError::InvalidInput {
                field: "maxIterations",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Runaway bound of one run, scaled by the magnitude of the starting point.
    fn run_bound(&self, start: f64) -> f64 {
        self.config.divergence_bound * start.abs().max(1.0)
    }

    fn new_trace(&self, bound: f64) -> ConvergenceTrace {
        ConvergenceTrace::new(bound, self.config.divergence_window)
    }

    fn finish(
        &self,
        method: RootFindingMethod,
        root: f64,
        function_value: f64,
        iterations: usize,
        trace: ConvergenceTrace,
    ) -> RootFindingResult {
        info!(
            "{} converged to x = {} (|f| = {:e}) after {} iterations",
            method,
            root,
            function_value.abs(),
            iterations
        );
        RootFindingResult {
            root,
            function_value,
            iterations,
            method,
            trace: trace.into_points(),
        }
    }

    fn check_bound(&self, x: f64, bound: f64) -> Result<(), RootFindingError> {
        if !x.is_finite() || x.abs() > bound {
            warn!("iterate {} left the region |x| <= {:e}", x, bound);
            return Err(RootFindingError::Diverged {
                reason: format!("iterate {} left the region |x| <= {:e}", x, bound),
            });
        }
        Ok(())
    }

    fn check_trace(&self, trace: &ConvergenceTrace) -> Result<(), RootFindingError> {
        match trace.divergence(self.config.tolerance) {
            Some(reason) => {
                warn!("{}", reason);
                Err(RootFindingError::Diverged { reason })
            }
            None => Ok(()),
        }
    }

    /////////////////////////////////////////METHODS///////////////////////////////////////////

    /// Bisection method for finding roots.
    /// Requires that f(a) and f(b) have opposite signs; an endpoint where f is
    /// exactly zero is returned at once.
    pub fn bisection<F>(
        &self,
        function: &F,
        mut a: f64,
        mut b: f64,
    ) -> Result<RootFindingResult, RootFindingError>
    where
        F: NonlinearFunction,
    {
        self.check_config()?;
        if !(a.is_finite() && b.is_finite() && a < b) {
            return Err(RootFindingError::InvalidInput {
                field: "upperBound",
                reason: format!("bracket must satisfy a < b, got [{}, {}]", a, b),
            });
        }
        let method = RootFindingMethod::Bisection;
        let mut trace = self.new_trace(self.run_bound(a.abs().max(b.abs())));

        let mut fa = function.evaluate(a)?;
        let fb = function.evaluate(b)?;
        trace.push(a, fa);
        trace.push(b, fb);

        if fa == 0.0 {
            return Ok(self.finish(method, a, fa, 0, trace));
        }
        if fb == 0.0 {
            return Ok(self.finish(method, b, fb, 0, trace));
        }
        if fa.signum() == fb.signum() {
            warn!("no sign change of {} on [{}, {}]", function.name(), a, b);
            return Err(RootFindingError::InvalidBracket { a, fa, b, fb });
        }

        debug!(
            "bisection for {} on [{}, {}], tolerance {:e}",
            function.name(),
            a,
            b,
            self.config.tolerance
        );

        for iteration in 1..=self.config.max_iterations {
            let c = a + (b - a) / 2.0;
            // the bracket is as narrow as f64 allows
            if c <= a || c >= b {
                let fc = function.evaluate(c)?;
                return Ok(self.finish(method, c, fc, iteration - 1, trace));
            }
            let fc = function.evaluate(c)?;
            trace.push(c, fc);
            debug!(
                "iteration {}: x = {:.12}, f(x) = {:.3e}, bracket = [{:.12}, {:.12}]",
                iteration, c, fc, a, b
            );

            if fc == 0.0 {
                return Ok(self.finish(method, c, fc, iteration, trace));
            }
            if fa.signum() != fc.signum() {
                b = c;
            } else {
                a = c;
                fa = fc;
            }
            if b - a < self.config.tolerance {
                return Ok(self.finish(method, c, fc, iteration, trace));
            }
        }

        warn!("bisection exhausted {} iterations", self.config.max_iterations);
        Err(RootFindingError::MaxIterationsReached {
            iterations: self.config.max_iterations,
            x: a + (b - a) / 2.0,
        })
    }

    /// Secant method for finding roots
    /// Requires two distinct initial guesses x0 and x1
    pub fn secant<F>(
        &self,
        function: &F,
        mut x0: f64,
        mut x1: f64,
    ) -> Result<RootFindingResult, RootFindingError>
    where
        F: NonlinearFunction,
    {
        self.check_config()?;
        if !(x0.is_finite() && x1.is_finite()) || x0 == x1 {
            return Err(RootFindingError::InvalidInput {
                field: "secondGuess",
                reason: format!("secant needs two distinct finite guesses, got {} and {}", x0, x1),
            });
        }
        let method = RootFindingMethod::Secant;
        let tol = self.config.tolerance;
        let bound = self.run_bound(x0.abs().max(x1.abs()));
        let mut trace = self.new_trace(bound);

        let mut f0 = function.evaluate(x0)?;
        let mut f1 = function.evaluate(x1)?;
        trace.push(x0, f0);
        trace.push(x1, f1);

        debug!(
            "secant for {} from x0 = {}, x1 = {}, tolerance {:e}",
            function.name(),
            x0,
            x1,
            tol
        );

        // Check if we already have a root
        if f1.abs() < tol {
            return Ok(self.finish(method, x1, f1, 0, trace));
        }
        if f0.abs() < tol {
            return Ok(self.finish(method, x0, f0, 0, trace));
        }

        for iteration in 1..=self.config.max_iterations {
            if (f1 - f0).abs() < self.config.denominator_floor {
                warn!("secant denominator vanished at x = {}", x1);
                return Err(RootFindingError::DenominatorUnderflow { x: x1 });
            }

            let x2 = x1 - f1 * (x1 - x0) / (f1 - f0);
            self.check_bound(x2, bound)?;
            let f2 = function.evaluate(x2)?;
            trace.push(x2, f2);
            debug!("iteration {}: x = {:.12}, f(x) = {:.3e}", iteration, x2, f2);

            if f2.abs() < tol || (x2 - x1).abs() < tol {
                return Ok(self.finish(method, x2, f2, iteration, trace));
            }
            self.check_trace(&trace)?;

            x0 = x1;
            f0 = f1;
            x1 = x2;
            f1 = f2;
        }

        warn!("secant exhausted {} iterations", self.config.max_iterations);
        Err(RootFindingError::MaxIterationsReached {
            iterations: self.config.max_iterations,
            x: x1,
        })
    }

    /// Newton-Raphson method. Uses the analytic derivative when the function
    /// provides one, a central difference otherwise.
    pub fn newton_raphson<F>(
        &self,
        function: &F,
        mut x: f64,
    ) -> Result<RootFindingResult, RootFindingError>
    where
        F: NonlinearFunction,
    {
        self.check_config()?;
        if !x.is_finite() {
            return Err(RootFindingError::InvalidInput {
                field: "initialGuess",
                reason: format!("must be finite, got {}", x),
            });
        }
        let method = RootFindingMethod::Newton;
        let tol = self.config.tolerance;
        let bound = self.run_bound(x);
        let mut trace = self.new_trace(bound);

        debug!(
            "newton for {} from x0 = {}, tolerance {:e}",
            function.name(),
            x,
            tol
        );

        let mut fx = function.evaluate(x)?;
        trace.push(x, fx);

        for iteration in 1..=self.config.max_iterations {
            if fx.abs() < tol {
                return Ok(self.finish(method, x, fx, iteration - 1, trace));
            }

            let fpx = match function.derivative(x) {
                Some(deriv) => deriv?,
                None => {
                    // relative step, x + h must differ from x
                    let h = self.config.derivative_step * x.abs().max(1.0);
                    (function.evaluate(x + h)? - function.evaluate(x - h)?) / (2.0 * h)
                }
            };
            if !fpx.is_finite() || fpx.abs() < self.config.slope_floor {
                warn!("derivative {:e} at x = {} is too close to zero", fpx, x);
                return Err(RootFindingError::DerivativeZero { x, slope: fpx });
            }

            let x_new = x - fx / fpx;
            self.check_bound(x_new, bound)?;
            let fx_new = function.evaluate(x_new)?;
            trace.push(x_new, fx_new);
            debug!(
                "iteration {}: x = {:.12}, f(x) = {:.3e}, f'(x) = {:.3e}",
                iteration, x_new, fx_new, fpx
            );

            if (x_new - x).abs() < tol {
                return Ok(self.finish(method, x_new, fx_new, iteration, trace));
            }
            self.check_trace(&trace)?;

            x = x_new;
            fx = fx_new;
        }

        if fx.abs() < tol {
            return Ok(self.finish(method, x, fx, self.config.max_iterations, trace));
        }
        warn!("newton exhausted {} iterations", self.config.max_iterations);
        Err(RootFindingError::MaxIterationsReached {
            iterations: self.config.max_iterations,
            x,
        })
    }
}

impl Default for ScalarRootFinder {
    fn default() -> Self {
        Self::new()
    }
}

// Convenience functions for quick usage
pub fn bisection<F>(function: F, a: f64, b: f64, tolerance: f64) -> Result<f64, RootFindingError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "bisection_function".to_string());
    let mut solver = ScalarRootFinder::new();
    solver.set_tolerance(tolerance);
    let result = solver.bisection(&func, a, b)?;
    Ok(result.root)
}

pub fn secant<F>(function: F, x0: f64, x1: f64, tolerance: f64) -> Result<f64, RootFindingError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "secant_function".to_string());
    let mut solver = ScalarRootFinder::new();
    solver.set_tolerance(tolerance);
    let result = solver.secant(&func, x0, x1)?;
    Ok(result.root)
}

pub fn newton<F>(function: F, x0: f64, tolerance: f64) -> Result<f64, RootFindingError>
where
    F: Fn(f64) -> f64,
{
    let func = ClosureFunction::new(function, "newton_function".to_string());
    let mut solver = ScalarRootFinder::new();
    solver.set_tolerance(tolerance);
    let result = solver.newton_raphson(&func, x0)?;
    Ok(result.root)
}
