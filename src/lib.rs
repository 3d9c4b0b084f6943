// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]
//! # numerica
//!
//! Numerical methods for functions of one variable given as text:
//! - parse `x^4 - 5x^2 + 4`, `exp(-x/2) * cos(2x)` ... into an [`Expr`](symbolic::symbolic_engine::Expr)
//! - find roots (Newton, bisection, secant)
//! - differentiate at a point (forward, central, backward differences)
//! - integrate over an interval (trapezoidal, Simpson, midpoint rules)
//!
//! Requests and responses follow one JSON shape, see [`api`].
//!
//! ```
//! use numerica::api::dispatcher::Calculator;
//! use std::collections::BTreeMap;
//!
//! let mut params = BTreeMap::new();
//! params.insert("point".to_string(), 2.0);
//! let result = Calculator::new().calculate("central", "x^2", &params).unwrap();
//! assert!((result.value - 4.0).abs() < 1e-4);
//! ```
pub mod Utils;
pub mod api;
pub mod errors;
pub mod global;
pub mod numerical;
pub mod symbolic;
