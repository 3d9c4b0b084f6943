//! Numerical defaults shared by every engine.
//!
//! The front end only ever sends the values a user typed in; everything the
//! engines need beyond that (iteration caps, slope floors, chart sizes) lives
//! here. `EngineConfig` bundles the tunable subset and is what the dispatcher
//! carries around; the constants are its defaults.

/// tolerance used when a caller asks for a root without giving one
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// iteration cap of Newton, secant and bisection
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
/// hard ceiling for a user supplied `maxIterations`
pub const MAX_ITERATIONS_CEILING: usize = 100_000;
/// relative step of the central difference that replaces f'(x) in Newton's method,
/// scaled by max(1, |x|)
pub const NEWTON_DERIVATIVE_STEP: f64 = 1e-7;
/// |f'(x)| below this is treated as a stationary point
pub const SLOPE_FLOOR: f64 = 1e-12;
/// |f(x_n) - f(x_{n-1})| below this stops the secant method
pub const SECANT_DENOMINATOR_FLOOR: f64 = 1e-15;
/// iterates beyond this multiple of max(1, |starting point|) are reported as divergent
pub const DIVERGENCE_BOUND: f64 = 1e15;
/// number of consecutive growing steps that counts as runaway iteration
pub const DIVERGENCE_WINDOW: usize = 4;
/// default finite-difference step
pub const DEFAULT_STEP_SIZE: f64 = 1e-6;
/// default number of quadrature subintervals
pub const DEFAULT_NUM_POINTS: usize = 100;
/// upper bound on quadrature subintervals accepted from a request
pub const MAX_NUM_POINTS: usize = 10_000_000;
/// at most this many (x, y) samples are returned for charting
pub const MAX_CHART_POINTS: usize = 1001;
/// longest expression text accepted by the parser
pub const MAX_EXPRESSION_LENGTH: usize = 4096;
/// deepest nesting accepted by the parser
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// Tunable engine settings. Built once, then shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_iterations: usize,
    pub derivative_step: f64,
    pub slope_floor: f64,
    pub denominator_floor: f64,
    pub divergence_bound: f64,
    pub divergence_window: usize,
    pub max_num_points: usize,
    pub max_chart_points: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            derivative_step: NEWTON_DERIVATIVE_STEP,
            slope_floor: SLOPE_FLOOR,
            denominator_floor: SECANT_DENOMINATOR_FLOOR,
            divergence_bound: DIVERGENCE_BOUND,
            divergence_window: DIVERGENCE_WINDOW,
            max_num_points: MAX_NUM_POINTS,
            max_chart_points: MAX_CHART_POINTS,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that every field is usable by the engines.
    pub fn check(&self) -> Result<(), String> {
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_CEILING {
            return Err(format!(
                "max_iterations must be in 1..={}, got {}",
                MAX_ITERATIONS_CEILING, self.max_iterations
            ));
        }
        for (name, value) in [
            ("derivative_step", self.derivative_step),
            ("slope_floor", self.slope_floor),
            ("denominator_floor", self.denominator_floor),
            ("divergence_bound", self.divergence_bound),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be finite and > 0, got {}", name, value));
            }
        }
        if self.divergence_window < 2 {
            return Err(format!(
                "divergence_window must be at least 2, got {}",
                self.divergence_window
            ));
        }
        if self.max_num_points == 0 {
            return Err("max_num_points must be at least 1".to_string());
        }
        if self.max_chart_points < 2 {
            return Err(format!(
                "max_chart_points must be at least 2, got {}",
                self.max_chart_points
            ));
        }
        Ok(())
    }
}
