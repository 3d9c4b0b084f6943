/// Bisection, secant and Newton-Raphson for f(x) = 0
///  Example#1
/// ```
/// use numerica::numerical::root_finding::{ScalarRootFinder, SymbolicFunction};
/// let f = SymbolicFunction::from_string("x^3 - x - 1", None).unwrap();
/// let solver = ScalarRootFinder::new();
/// let result = solver.newton_raphson(&f, 1.5).unwrap();
/// assert!((result.root - 1.3247179572).abs() < 1e-6);
/// println!("root = {}, |f| = {:e} after {} iterations", result.root, result.residual(), result.iterations);
/// ```
/// Example#2
/// ```
/// // plain closures work too
/// use numerica::numerical::root_finding::bisection;
/// let root = bisection(|x| x.cos() - x, 0.0, 1.0, 1e-10).unwrap();
/// assert!((root - 0.739085133).abs() < 1e-8);
/// ```
pub mod root_finding;
/// forward, central and backward finite differences
pub mod differentiation;
/// composite trapezoidal, Simpson and midpoint rules
///  Example
/// ```
/// use numerica::numerical::quadrature::{integrate, QuadratureConfig, QuadratureRule};
/// use numerica::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("sin(x)").unwrap().lambdify1D();
/// let result = integrate(&f, QuadratureRule::Simpson, 0.0, std::f64::consts::PI, 100, &QuadratureConfig::default()).unwrap();
/// assert!((result.value - 2.0).abs() < 1e-6);
/// ```
pub mod quadrature;
