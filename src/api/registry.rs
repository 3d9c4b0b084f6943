//! Fixed registry of the nine methods: family, display data and the
//! parameters each one accepts.
//!
//! The catalog is built once and shared; it backs both request validation
//! and the `/methods` style listing.
use crate::errors::CalcError;
use crate::global::{DEFAULT_NUM_POINTS, DEFAULT_STEP_SIZE, DEFAULT_TOLERANCE, MAX_ITERATIONS_CEILING};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MethodId {
    Newton,
    Bisection,
    Secant,
    Forward,
    Central,
    Backward,
    Trapezoidal,
    Simpson,
    Midpoint,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MethodFamily {
    RootFinding,
    Differentiation,
    Integration,
}

impl MethodFamily {
    pub fn name(self) -> &'static str {
        match self {
            MethodFamily::RootFinding => "Root Finding",
            MethodFamily::Differentiation => "Differentiation",
            MethodFamily::Integration => "Integration",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MethodFamily::RootFinding => "Find zeros of functions",
            MethodFamily::Differentiation => "Calculate derivatives",
            MethodFamily::Integration => "Compute definite integrals",
        }
    }

    pub fn methods(self) -> Vec<MethodId> {
        MethodId::iter().filter(|m| m.family() == self).collect()
    }
}

impl MethodId {
    /// Case-insensitive lookup of a method id.
    pub fn resolve(id: &str) -> Result<MethodId, CalcError> {
        MethodId::from_str(id.trim()).map_err(|_| CalcError::UnknownMethod(id.to_string()))
    }

    pub fn family(self) -> MethodFamily {
        match self {
            MethodId::Newton | MethodId::Bisection | MethodId::Secant => MethodFamily::RootFinding,
            MethodId::Forward | MethodId::Central | MethodId::Backward => {
                MethodFamily::Differentiation
            }
            MethodId::Trapezoidal | MethodId::Simpson | MethodId::Midpoint => {
                MethodFamily::Integration
            }
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MethodId::Newton => "Newton-Raphson",
            MethodId::Bisection => "Bisection",
            MethodId::Secant => "Secant",
            MethodId::Forward => "Forward Difference",
            MethodId::Central => "Central Difference",
            MethodId::Backward => "Backward Difference",
            MethodId::Trapezoidal => "Trapezoidal Rule",
            MethodId::Simpson => "Simpson's Rule",
            MethodId::Midpoint => "Midpoint Rule",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MethodId::Newton => "x_{n+1} = x_n - f(x_n)/f'(x_n) from one initial guess",
            MethodId::Bisection => "Halves a bracket [a, b] with a sign change of f",
            MethodId::Secant => "Newton's iteration with the slope through the last two iterates",
            MethodId::Forward => "(f(x+h) - f(x)) / h, first order",
            MethodId::Central => "(f(x+h) - f(x-h)) / 2h, second order",
            MethodId::Backward => "(f(x) - f(x-h)) / h, first order",
            MethodId::Trapezoidal => "Composite trapezoidal rule on a uniform grid",
            MethodId::Simpson => "Composite Simpson rule, odd counts rounded up to even",
            MethodId::Midpoint => "Composite midpoint rule on a uniform grid",
        }
    }

    /// Parameters accepted by the method, `function` excluded.
    pub fn parameters(self) -> Vec<ParameterDescriptor> {
        use ParameterDescriptor as P;
        match self {
            MethodId::Newton => vec![
                P::number("initialGuess", "Initial Guess", Some(0.0)).required(),
                P::tolerance(),
                P::max_iterations(),
                P::expression("derivative", "Derivative f'(x)"),
            ],
            MethodId::Bisection => vec![
                P::number("lowerBound", "Lower Bound", Some(-2.0)).required(),
                P::number("upperBound", "Upper Bound", Some(2.0)).required(),
                P::tolerance(),
                P::max_iterations(),
            ],
            MethodId::Secant => vec![
                P::number("firstGuess", "First Point", Some(0.0)).required(),
                P::number("secondGuess", "Second Point", Some(1.0)).required(),
                P::tolerance(),
                P::max_iterations(),
            ],
            MethodId::Forward | MethodId::Central | MethodId::Backward => vec![
                P::number("point", "Point", Some(0.0)).required(),
                P::number("stepSize", "Step Size", Some(DEFAULT_STEP_SIZE)).range(1e-10, 1e-2, 1e-6),
            ],
            MethodId::Trapezoidal | MethodId::Simpson | MethodId::Midpoint => vec![
                P::number("lowerBound", "Lower Bound", Some(-1.0)).required(),
                P::number("upperBound", "Upper Bound", Some(1.0)).required(),
                P::integer("numPoints", "Number of Points", DEFAULT_NUM_POINTS as f64)
                    .range(10.0, 1000.0, 10.0),
            ],
        }
    }

    pub fn info(self) -> MethodInfo {
        MethodInfo {
            id: self,
            name: self.display_name(),
            family: self.family(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// One input of a method. `min`/`max`/`step` are the suggested UI range;
/// the hard domain is enforced by request validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Number,
    Integer,
    Expression,
}

impl ParameterDescriptor {
    fn new(name: &'static str, label: &'static str, kind: ParameterKind, default: Option<f64>) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default,
            min: None,
            max: None,
            step: None,
        }
    }

    fn number(name: &'static str, label: &'static str, default: Option<f64>) -> Self {
        Self::new(name, label, ParameterKind::Number, default)
    }

    fn integer(name: &'static str, label: &'static str, default: f64) -> Self {
        Self::new(name, label, ParameterKind::Integer, Some(default))
    }

    fn expression(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, ParameterKind::Expression, None)
    }

    fn tolerance() -> Self {
        Self::number("tolerance", "Tolerance", Some(DEFAULT_TOLERANCE)).range(1e-10, 1e-2, 1e-6)
    }

    fn max_iterations() -> Self {
        Self::new("maxIterations", "Max Iterations", ParameterKind::Integer, None).range(
            1.0,
            MAX_ITERATIONS_CEILING as f64,
            1.0,
        )
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub id: MethodId,
    pub name: &'static str,
    pub family: MethodFamily,
    pub description: &'static str,
    pub parameters: Vec<ParameterDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyInfo {
    pub id: MethodFamily,
    pub name: &'static str,
    pub description: &'static str,
    pub algorithms: Vec<MethodId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCatalog {
    pub families: Vec<FamilyInfo>,
    pub methods: Vec<MethodInfo>,
}

impl MethodCatalog {
    fn build() -> Self {
        let families = MethodFamily::iter()
            .map(|family| FamilyInfo {
                id: family,
                name: family.name(),
                description: family.description(),
                algorithms: family.methods(),
            })
            .collect();
        let methods = MethodId::iter().map(MethodId::info).collect();
        Self { families, methods }
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.id == id)
    }
}

/// Every family and method with its parameter descriptors.
pub fn method_catalog() -> &'static MethodCatalog {
    static CATALOG: OnceLock<MethodCatalog> = OnceLock::new();
    CATALOG.get_or_init(MethodCatalog::build)
}

/// Catalog entry of one method, looked up by id.
pub fn describe_method(id: &str) -> Result<&'static MethodInfo, CalcError> {
    let method = MethodId::resolve(id)?;
    method_catalog()
        .method(method)
        .ok_or_else(|| CalcError::UnknownMethod(id.to_string()))
}
