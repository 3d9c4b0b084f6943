//! # Calculation API
//!
//! The layer between a caller (CLI, HTTP handler, test) and the numerical engines.
//!
//! ## Flow of one request
//! 1. the `function` text is parsed into an [`Expr`](crate::symbolic::symbolic_engine::Expr)
//! 2. the `methodId` is resolved against the [`registry`]
//! 3. the numeric parameters are checked and typed by [`parameters`]
//! 4. the [`dispatcher`] runs the engine and normalises the outcome into
//!    `{ method, value, error, iterations?, points? }`
//!
//! Errors at any step surface as [`CalcError`](crate::errors::CalcError).
//!
//! ## Example
//! ```
//! use numerica::api::dispatcher::Calculator;
//! use numerica::api::wire::CalculationRequest;
//!
//! let calc = Calculator::new();
//! let request = CalculationRequest::new("bisection", "x^2 - 4", &[("lowerBound", 0.0), ("upperBound", 3.0)]);
//! let result = calc.calculate_request(&request).unwrap();
//! assert!((result.value - 2.0).abs() < 1e-5);
//! ```

/// method ids, families and their parameter descriptors
pub mod registry;

/// request parameters as a typed tagged union
pub mod parameters;

/// JSON request/response bodies
pub mod wire;

/// `calculate`, `calculate_batch`, `handle_json`, `validate_expression`
pub mod dispatcher;
mod dispatcher_tests;
