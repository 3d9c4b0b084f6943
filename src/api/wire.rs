//! JSON request and response bodies exchanged with the front end.
//!
//! ```json
//! {"methodId": "newton", "parameters": {"function": "x^2 - 4", "initialGuess": 3, "tolerance": 1e-6}}
//! ```
//! answered by
//! ```json
//! {"status": "success", "data": {"method": "newton", "value": 2.0, "error": 1e-10, "iterations": 4, "points": [...]}}
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub method_id: String,
    pub parameters: RequestParameters,
}

/// `function` plus the method-specific numbers, kept by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestParameters {
    pub function: String,
    /// analytic f'(x) for Newton's method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative: Option<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl CalculationRequest {
    pub fn new(method_id: &str, function: &str, values: &[(&str, f64)]) -> Self {
        Self {
            method_id: method_id.to_string(),
            parameters: RequestParameters {
                function: function.to_string(),
                derivative: None,
                values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            },
        }
    }

    pub fn with_derivative(mut self, derivative: &str) -> Self {
        self.parameters.derivative = Some(derivative.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub method: String,
    pub value: f64,
    /// unset when an integration error estimate could not be computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CalculationResponse {
    Success { data: CalculationResult },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub expression: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
}
