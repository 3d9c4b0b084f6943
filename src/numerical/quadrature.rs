//! Composite trapezoidal, Simpson and midpoint rules on a uniform grid.
//!
//! The reported error is a Richardson estimate: the rule is run again with
//! twice as many subintervals and `|I(2n) - I(n)| / (2^p - 1)` is returned,
//! `p` being the order of the rule.
use crate::global::{EngineConfig, MAX_CHART_POINTS, MAX_NUM_POINTS};
use crate::symbolic::symbolic_eval::EvalError;
use log::{debug, info};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum QuadratureRule {
    Trapezoidal,
    Simpson,
    Midpoint,
}

impl QuadratureRule {
    pub fn order(self) -> i32 {
        match self {
            QuadratureRule::Simpson => 4,
            QuadratureRule::Trapezoidal | QuadratureRule::Midpoint => 2,
        }
    }

    pub fn min_intervals(self) -> usize {
        match self {
            QuadratureRule::Simpson => 2,
            QuadratureRule::Trapezoidal | QuadratureRule::Midpoint => 1,
        }
    }

    /// Simpson needs an even count; odd counts are rounded up.
    pub fn adjust_intervals(self, n: usize) -> usize {
        match self {
            QuadratureRule::Simpson if n % 2 == 1 => n + 1,
            _ => n,
        }
    }

    /// number of abscissae the rule evaluates for `n` subintervals
    fn node_count(self, n: usize) -> usize {
        match self {
            QuadratureRule::Midpoint => n,
            QuadratureRule::Trapezoidal | QuadratureRule::Simpson => n + 1,
        }
    }

    fn node(self, a: f64, b: f64, n: usize, i: usize) -> f64 {
        let h = (b - a) / n as f64;
        match self {
            QuadratureRule::Midpoint => a + (i as f64 + 0.5) * h,
            _ if i == n => b,
            _ => a + i as f64 * h,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadratureError {
    #[error("bounds must be finite with lower < upper, got [{a}, {b}]")]
    InvalidBounds { a: f64, b: f64 },
    #[error("{rule} needs at least {min} subintervals, got {n}")]
    TooFewIntervals {
        rule: QuadratureRule,
        n: usize,
        min: usize,
    },
    #[error("{n} subintervals exceed the limit of {limit}")]
    TooManyIntervals { n: usize, limit: usize },
    #[error("integral sum is not finite")]
    NonFinite,
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Limits applied to every integration request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureConfig {
    pub max_num_points: usize,
    pub max_chart_points: usize,
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            max_num_points: MAX_NUM_POINTS,
            max_chart_points: MAX_CHART_POINTS,
        }
    }
}

impl QuadratureConfig {
    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self {
            max_num_points: engine.max_num_points,
            max_chart_points: engine.max_chart_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureResult {
    pub rule: QuadratureRule,
    pub value: f64,
    /// Richardson estimate, `None` when the refined pass cannot be evaluated
    pub error: Option<f64>,
    /// subintervals actually used (after Simpson's rounding)
    pub intervals: usize,
    /// integrand on the rule's nodes, thinned for charting
    pub samples: Vec<(f64, f64)>,
}

/// Composite rule with `n` uniform subintervals, no validation.
pub fn composite<F>(
    function: &F,
    rule: QuadratureRule,
    a: f64,
    b: f64,
    n: usize,
) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    let h = (b - a) / n as f64;
    let sum = match rule {
        QuadratureRule::Trapezoidal => {
            let mut sum = 0.5 * (function(a)? + function(b)?);
            for i in 1..n {
                sum += function(rule.node(a, b, n, i))?;
            }
            sum * h
        }
        QuadratureRule::Simpson => {
            let mut sum = function(a)? + function(b)?;
            for i in 1..n {
                let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
                sum += weight * function(rule.node(a, b, n, i))?;
            }
            sum * h / 3.0
        }
        QuadratureRule::Midpoint => {
            let mut sum = 0.0;
            for i in 0..n {
                sum += function(rule.node(a, b, n, i))?;
            }
            sum * h
        }
    };
    if sum.is_finite() {
        Ok(sum)
    } else {
        Err(QuadratureError::NonFinite)
    }
}

/// Evenly spaced subset of the rule's nodes, at most `max_points` long.
pub fn chart_samples<F>(
    function: &F,
    rule: QuadratureRule,
    a: f64,
    b: f64,
    n: usize,
    max_points: usize,
) -> Result<Vec<(f64, f64)>, EvalError>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    let count = rule.node_count(n);
    let take = count.min(max_points.max(2));
    let indices: Vec<usize> = if take >= count {
        (0..count).collect()
    } else {
        (0..take)
            .map(|j| ((j as f64) * (count - 1) as f64 / (take - 1) as f64).round() as usize)
            .collect()
    };
    indices
        .into_iter()
        .map(|i| {
            let x = rule.node(a, b, n, i);
            function(x).map(|y| (x, y))
        })
        .collect()
}

/// Integrates over [a, b] with `n` subintervals.
pub fn integrate<F>(
    function: &F,
    rule: QuadratureRule,
    a: f64,
    b: f64,
    n: usize,
    config: &QuadratureConfig,
) -> Result<QuadratureResult, QuadratureError>
where
    F: Fn(f64) -> Result<f64, EvalError>,
{
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(QuadratureError::InvalidBounds { a, b });
    }
    if n < rule.min_intervals() {
        return Err(QuadratureError::TooFewIntervals {
            rule,
            n,
            min: rule.min_intervals(),
        });
    }
    if n > config.max_num_points {
        return Err(QuadratureError::TooManyIntervals {
            n,
            limit: config.max_num_points,
        });
    }
    let intervals = rule.adjust_intervals(n);
    if intervals != n {
        info!("simpson: odd count {} rounded up to {}", n, intervals);
    }

    let coarse = composite(function, rule, a, b, intervals)?;
    let error = match composite(function, rule, a, b, 2 * intervals) {
        Ok(fine) => Some((fine - coarse).abs() / (2f64.powi(rule.order()) - 1.0)),
        Err(e) => {
            debug!("no error estimate for {} on [{}, {}]: {}", rule, a, b, e);
            None
        }
    };
    let samples = chart_samples(function, rule, a, b, intervals, config.max_chart_points)?;
    debug!(
        "{} on [{}, {}] with {} subintervals: {} (error estimate {:?})",
        rule, a, b, intervals, coarse, error
    );
    Ok(QuadratureResult {
        rule,
        value: coarse,
        error,
        intervals,
        samples,
    })
}
