#[cfg(test)]
mod tests {
    use crate::api::dispatcher::{Calculator, handle_validate_json, validate_expression};
    use crate::api::wire::{CalculationRequest, CalculationResponse, CalculationResult, Point};
    use crate::errors::CalcError;
    use crate::global::EngineConfig;
    use std::collections::BTreeMap;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{E, FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, LN_2, PI};

    fn params(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn kind_of(result: Result<CalculationResult, CalcError>) -> &'static str {
        match result {
            Ok(r) => panic!("expected an error, got {:?}", r),
            Err(err) => err.kind(),
        }
    }

    /// What a root-finding run on a fixture must produce.
    #[derive(Debug, Clone, Copy)]
    enum Expect {
        /// converges within 1e-5 of this root
        Root(f64),
        /// converges, only the residual is checked
        Residual,
        /// fails with this error class
        Fails(&'static str),
    }

    struct Fixture {
        function: &'static str,
        newton: (f64, Expect),
        bisection: ((f64, f64), Expect),
        secant: ((f64, f64), Expect),
        derivative: (f64, f64),
        integral: ((f64, f64), f64),
    }

    fn fixtures() -> Vec<Fixture> {
        use Expect::*;
        vec![
            Fixture {
                function: "x^2 - 4",
                newton: (2.0, Root(2.0)),
                bisection: ((0.0, 3.0), Root(2.0)),
                secant: ((1.0, 3.0), Root(2.0)),
                derivative: (2.0, 4.0),
                integral: ((0.0, 2.0), -16.0 / 3.0),
            },
            Fixture {
                function: "x^3 - x",
                newton: (1.0, Root(1.0)),
                // f(-1) = 0 at the left end of the bracket
                bisection: ((-1.0, 1.5), Root(-1.0)),
                secant: ((0.5, 1.5), Root(1.0)),
                derivative: (1.0, 2.0),
                integral: ((0.0, 1.0), -0.25),
            },
            Fixture {
                function: "x^4 - 5x^2 + 4",
                newton: (2.0, Root(2.0)),
                bisection: ((1.0, 3.0), Root(1.0)),
                secant: ((1.5, 2.5), Root(2.0)),
                derivative: (2.0, 12.0),
                integral: ((-2.0, 2.0), 32.0 / 15.0),
            },
            Fixture {
                function: "sin(x)",
                newton: (3.0, Root(PI)),
                bisection: ((3.0, 3.5), Root(PI)),
                secant: ((3.0, 3.5), Root(PI)),
                derivative: (0.0, 1.0),
                integral: ((0.0, PI), 2.0),
            },
            Fixture {
                function: "cos(x) - 0.5",
                newton: (1.0, Root(FRAC_PI_3)),
                bisection: ((0.0, 2.0), Root(FRAC_PI_3)),
                secant: ((0.5, 1.5), Root(FRAC_PI_3)),
                derivative: (0.0, 0.0),
                integral: ((0.0, PI), -FRAC_PI_2),
            },
            Fixture {
                function: "exp(x) - 2",
                newton: (0.5, Root(LN_2)),
                bisection: ((0.0, 1.0), Root(LN_2)),
                secant: ((0.5, 1.0), Root(LN_2)),
                derivative: (0.0, 1.0),
                integral: ((0.0, 1.0), E - 3.0),
            },
            Fixture {
                function: "ln(x)",
                newton: (0.9, Root(1.0)),
                bisection: ((0.5, 2.0), Root(1.0)),
                secant: ((0.8, 1.2), Root(1.0)),
                derivative: (1.0, 1.0),
                integral: ((1.0, E), 1.0),
            },
            Fixture {
                function: "sin(x^2)",
                newton: (1.7, Root(PI.sqrt())),
                bisection: ((1.5, 2.0), Root(PI.sqrt())),
                secant: ((1.6, 1.9), Root(PI.sqrt())),
                derivative: (0.0, 0.0),
                integral: ((0.0, PI.sqrt()), 0.894_831_469_484),
            },
            Fixture {
                function: "exp(-x^2) * sin(x)",
                // f is below 1e-6 well before pi, so Newton and secant stop early
                newton: (3.0, Residual),
                bisection: ((3.0, 3.5), Root(PI)),
                secant: ((3.0, 3.5), Residual),
                derivative: (0.0, 1.0),
                integral: ((0.0, PI), 0.424_437_510_772),
            },
            Fixture {
                function: "1/(x^2 + 1)",
                newton: (100.0, Fails("DivergenceError")),
                bisection: ((-2.0, 2.0), Fails("InvalidParameterError")),
                secant: ((99.0, 101.0), Fails("DivergenceError")),
                derivative: (0.0, 0.0),
                integral: ((0.0, 1.0), FRAC_PI_4),
            },
            Fixture {
                function: "(x^2 - 1)/(x^2 + 1)",
                newton: (0.9, Root(1.0)),
                bisection: ((0.5, 1.5), Root(1.0)),
                secant: ((0.8, 1.2), Root(1.0)),
                derivative: (0.0, 0.0),
                integral: ((0.0, 1.0), 1.0 - FRAC_PI_2),
            },
            Fixture {
                function: "abs(x) - 1",
                newton: (1.5, Root(1.0)),
                bisection: ((0.0, 2.0), Root(1.0)),
                secant: ((0.5, 1.5), Root(1.0)),
                derivative: (2.0, 1.0),
                integral: ((-1.0, 1.0), -1.0),
            },
            Fixture {
                function: "sinh(x)",
                newton: (0.1, Root(0.0)),
                bisection: ((-1.0, 1.0), Root(0.0)),
                secant: ((-0.1, 0.1), Root(0.0)),
                derivative: (0.0, 1.0),
                integral: ((0.0, 1.0), 1f64.cosh() - 1.0),
            },
            Fixture {
                function: "sqrt(abs(x)) * sin(x)",
                newton: (3.0, Root(PI)),
                bisection: ((3.0, 3.5), Root(PI)),
                secant: ((3.0, 3.5), Root(PI)),
                derivative: (1.0, 0.5 * 1f64.sin() + 1f64.cos()),
                integral: ((0.0, PI), 2.435_321_164),
            },
            Fixture {
                function: "exp(-x/2) * cos(2*x)",
                newton: (0.7, Root(FRAC_PI_4)),
                bisection: ((0.5, 1.0), Root(FRAC_PI_4)),
                secant: ((0.7, 0.9), Root(FRAC_PI_4)),
                derivative: (0.0, -0.5),
                integral: ((0.0, PI), 0.5 * (1.0 - (-FRAC_PI_2).exp()) / 4.25),
            },
        ]
    }

    fn check_root(
        calc: &Calculator,
        method: &str,
        function: &str,
        values: BTreeMap<String, f64>,
        expect: Expect,
    ) {
        let result = calc.calculate(method, function, &values);
        match expect {
            Expect::Root(root) => {
                let r = result.unwrap_or_else(|e| panic!("{} on {}: {}", method, function, e));
                assert_abs_diff_eq!(r.value, root, epsilon = 1e-5);
                assert!(r.iterations.is_some());
            }
            Expect::Residual => {
                let r = result.unwrap_or_else(|e| panic!("{} on {}: {}", method, function, e));
                assert!(r.error.unwrap() < 1e-6, "{} on {}: residual {:?}", method, function, r.error);
            }
            Expect::Fails(kind) => {
                assert_eq!(kind_of(result), kind, "{} on {}", method, function);
            }
        }
    }

    #[test]
    fn fixture_table() {
        let calc = Calculator::new();
        for f in fixtures() {
            let (guess, expect) = f.newton;
            check_root(
                &calc,
                "newton",
                f.function,
                params(&[("initialGuess", guess), ("tolerance", 1e-6)]),
                expect,
            );

            let ((a, b), expect) = f.bisection;
            check_root(
                &calc,
                "bisection",
                f.function,
                params(&[("lowerBound", a), ("upperBound", b), ("tolerance", 1e-6)]),
                expect,
            );

            let ((x0, x1), expect) = f.secant;
            check_root(
                &calc,
                "secant",
                f.function,
                params(&[("firstGuess", x0), ("secondGuess", x1), ("tolerance", 1e-6)]),
                expect,
            );

            let (point, slope) = f.derivative;
            let d = calc
                .calculate("central", f.function, &params(&[("point", point), ("stepSize", 1e-6)]))
                .unwrap();
            assert_abs_diff_eq!(d.value, slope, epsilon = 1e-5);

            let ((a, b), area) = f.integral;
            let q = calc
                .calculate(
                    "trapezoidal",
                    f.function,
                    &params(&[("lowerBound", a), ("upperBound", b), ("numPoints", 1000.0)]),
                )
                .unwrap();
            assert_abs_diff_eq!(q.value, area, epsilon = 1e-4);
        }
    }

    #[test]
    fn newton_from_the_root_takes_no_steps() {
        let r = Calculator::new()
            .calculate("newton", "x^2 - 4", &params(&[("initialGuess", 2.0), ("tolerance", 1e-6)]))
            .unwrap();
        assert_eq!(r.method, "newton");
        assert_eq!(r.value, 2.0);
        assert_eq!(r.iterations, Some(0));
        assert_eq!(r.points.unwrap().len(), 1);
    }

    #[test]
    fn newton_at_stationary_point_diverges() {
        let calc = Calculator::new();
        let err = calc
            .calculate("newton", "x^2 - 4", &params(&[("initialGuess", 0.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), "DivergenceError");
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn newton_with_analytic_derivative() {
        let calc = Calculator::new();
        let request = CalculationRequest::new("newton", "x^2 - 4", &[("initialGuess", 3.0)])
            .with_derivative("2x");
        let r = calc.calculate_request(&request).unwrap();
        assert_abs_diff_eq!(r.value, 2.0, epsilon = 1e-9);

        let bad = CalculationRequest::new("bisection", "x^2 - 4", &[("lowerBound", 0.0), ("upperBound", 3.0)])
            .with_derivative("2x");
        match calc.calculate_request(&bad).unwrap_err() {
            CalcError::InvalidParameter { field, .. } => assert_eq!(field, "derivative"),
            other => panic!("unexpected {:?}", other),
        }

        let unparsable = CalculationRequest::new("newton", "x^2 - 4", &[("initialGuess", 3.0)])
            .with_derivative("2x +");
        assert_eq!(kind_of(calc.calculate_request(&unparsable)), "InvalidParameterError");
    }

    #[test]
    fn bisection_returns_boundary_root() {
        let r = Calculator::new()
            .calculate(
                "bisection",
                "x^2 - 4",
                &params(&[("lowerBound", -2.0), ("upperBound", 2.0), ("tolerance", 1e-6)]),
            )
            .unwrap();
        assert_eq!(r.value, -2.0);
        assert_eq!(r.error, Some(0.0));
        assert_eq!(r.iterations, Some(0));
    }

    #[test]
    fn bisection_trace_is_returned_as_points() {
        let r = Calculator::new()
            .calculate(
                "bisection",
                "x^2 - 4",
                &params(&[("lowerBound", 0.0), ("upperBound", 3.0), ("tolerance", 1e-6)]),
            )
            .unwrap();
        assert_eq!(r.iterations, Some(22));
        let points = r.points.unwrap();
        assert_eq!(points.len(), 24);
        assert_eq!(points[0], Point { x: 0.0, y: -4.0 });
        assert_eq!(points[1], Point { x: 3.0, y: 5.0 });
    }

    #[test]
    fn root_finding_far_from_unit_scale() {
        let calc = Calculator::new();
        let r = calc
            .calculate("newton", "x^2 - 1e20", &params(&[("initialGuess", 1.1e10)]))
            .unwrap();
        assert_abs_diff_eq!(r.value, 1e10, epsilon = 1e-3);

        let r = calc
            .calculate("newton", "x - 2e15", &params(&[("initialGuess", 1.9e15)]))
            .unwrap();
        assert_eq!(r.value, 2e15);

        let r = calc
            .calculate(
                "secant",
                "x - 2e15",
                &params(&[("firstGuess", 1.9e15), ("secondGuess", 1.95e15)]),
            )
            .unwrap();
        assert_eq!(r.value, 2e15);
    }

    #[test]
    fn integral_without_error_estimate() {
        // the 2n pass lands on the pole at 0.25, the n = 2 grid does not
        let calc = Calculator::new();
        let request = CalculationRequest::new(
            "trapezoidal",
            "ln(abs(x - 0.25))",
            &[("lowerBound", 0.0), ("upperBound", 1.0), ("numPoints", 2.0)],
        );
        let r = calc.calculate_request(&request).unwrap();
        assert_abs_diff_eq!(r.value, -1.111641288952863, epsilon = 1e-12);
        assert_eq!(r.error, None);

        let (status, body) = calc.handle_json(
            r#"{"methodId": "trapezoidal", "parameters": {"function": "ln(abs(x - 0.25))", "lowerBound": 0, "upperBound": 1, "numPoints": 2}}"#,
        );
        assert_eq!(status, 200);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["data"].get("error").is_none());
    }

    #[test]
    fn spot_checks() {
        let calc = Calculator::new();
        let q = calc
            .calculate(
                "trapezoidal",
                "x^2",
                &params(&[("lowerBound", 0.0), ("upperBound", 1.0), ("numPoints", 1000.0)]),
            )
            .unwrap();
        assert_abs_diff_eq!(q.value, 1.0 / 3.0, epsilon = 1e-3);
        assert_eq!(q.iterations, None);
        assert!(q.points.unwrap().len() <= calc.config().max_chart_points);

        let d = calc
            .calculate("central", "x^2", &params(&[("point", 2.0), ("stepSize", 1e-6)]))
            .unwrap();
        assert_abs_diff_eq!(d.value, 4.0, epsilon = 1e-4);
        assert_abs_diff_eq!(d.error.unwrap(), 1e-12, epsilon = 1e-20);
        assert_eq!(d.points.unwrap().len(), 2);

        let s = calc
            .calculate(
                "simpson",
                "x^3",
                &params(&[("lowerBound", 0.0), ("upperBound", 2.0), ("numPoints", 3.0)]),
            )
            .unwrap();
        assert_abs_diff_eq!(s.value, 4.0, epsilon = 1e-12);

        let m = calc
            .calculate("midpoint", "1", &params(&[("lowerBound", -1.0), ("upperBound", 1.0)]))
            .unwrap();
        assert_abs_diff_eq!(m.value, 2.0, epsilon = 1e-12);

        let fwd = calc
            .calculate("forward", "3x + 1", &params(&[("point", 5.0), ("stepSize", 1e-3)]))
            .unwrap();
        assert_abs_diff_eq!(fwd.value, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fwd.error.unwrap(), 1e-3, epsilon = 1e-15);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let calc = Calculator::new();
        let cases = [
            ("newton", "cos(x) - 0.5", params(&[("initialGuess", 1.0)])),
            ("secant", "exp(x) - 2", params(&[("firstGuess", 0.5), ("secondGuess", 1.0)])),
            ("backward", "sin(x^2)", params(&[("point", 0.3)])),
            ("simpson", "ln(x)", params(&[("lowerBound", 1.0), ("upperBound", 2.0)])),
        ];
        for (method, function, values) in cases {
            let first = calc.calculate(method, function, &values).unwrap();
            let second = calc.calculate(method, function, &values).unwrap();
            assert_eq!(first, second, "{}", method);
            assert_eq!(first.value.to_bits(), second.value.to_bits());
        }
    }

    #[test]
    fn boundary_parameters_are_rejected() {
        let calc = Calculator::new();
        let cases = [
            ("newton", params(&[("initialGuess", 1.0), ("tolerance", 0.0)])),
            ("newton", params(&[("initialGuess", 1.0), ("tolerance", -1e-6)])),
            ("bisection", params(&[("lowerBound", 3.0), ("upperBound", 0.0)])),
            ("bisection", params(&[("lowerBound", 1.0), ("upperBound", 1.0)])),
            ("trapezoidal", params(&[("lowerBound", 0.0), ("upperBound", 1.0), ("numPoints", 0.0)])),
            ("midpoint", params(&[("lowerBound", 0.0), ("upperBound", 1.0), ("numPoints", -5.0)])),
            ("simpson", params(&[("lowerBound", 0.0), ("upperBound", 1.0), ("numPoints", 1.0)])),
            ("central", params(&[("point", 1.0), ("stepSize", -1e-3)])),
            ("central", params(&[])),
            ("secant", params(&[("firstGuess", 1.0), ("secondGuess", 1.0)])),
        ];
        for (method, values) in cases {
            let err = calc.calculate(method, "x^2 - 4", &values).unwrap_err();
            assert_eq!(err.kind(), "InvalidParameterError", "{} {:?}", method, values);
            assert_eq!(err.http_status(), 400);
        }
    }

    #[test]
    fn error_classes() {
        let calc = Calculator::new();

        let err = calc.calculate("euler", "x", &params(&[])).unwrap_err();
        assert_eq!(err, CalcError::UnknownMethod("euler".to_string()));
        assert_eq!(err.http_status(), 400);

        // the expression is parsed before the method is resolved
        let err = calc.calculate("euler", "x +* 2", &params(&[])).unwrap_err();
        assert_eq!(err.kind(), "ParseError");

        let err = calc
            .calculate("bisection", "sqrt(x)", &params(&[("lowerBound", -1.0), ("upperBound", 1.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), "EvalError");
        assert_eq!(err.http_status(), 422);

        let err = calc
            .calculate(
                "bisection",
                "x^2 - 2",
                &params(&[("lowerBound", 0.0), ("upperBound", 2.0), ("maxIterations", 5.0)]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "MaxIterationsExceeded");

        let err = calc
            .calculate("newton", "x^3 - 2x + 2", &params(&[("initialGuess", 0.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), "DivergenceError");

        let err = calc
            .calculate(
                "trapezoidal",
                "1/x",
                &params(&[("lowerBound", -1.0), ("upperBound", 1.0), ("numPoints", 2.0)]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "EvalError");
    }

    #[test]
    fn method_ids_are_case_insensitive() {
        let calc = Calculator::new();
        let r = calc
            .calculate(" Newton ", "x^2 - 4", &params(&[("initialGuess", 3.0)]))
            .unwrap();
        assert_eq!(r.method, "newton");
    }

    #[test]
    fn batch_keeps_input_order() {
        let calc = Calculator::new();
        let requests: Vec<CalculationRequest> = (1..=40)
            .map(|k| {
                let target = k as f64;
                CalculationRequest::new(
                    "bisection",
                    &format!("x - {}", target),
                    &[("lowerBound", 0.0), ("upperBound", 100.5)],
                )
            })
            .chain(std::iter::once(CalculationRequest::new("euler", "x", &[])))
            .collect();
        let results = calc.calculate_batch(&requests);
        assert_eq!(results.len(), 41);
        for (k, result) in results[..40].iter().enumerate() {
            let r = result.as_ref().unwrap();
            assert_abs_diff_eq!(r.value, (k + 1) as f64, epsilon = 1e-5);
        }
        assert!(matches!(results[40], Err(CalcError::UnknownMethod(_))));
    }

    #[test]
    fn handle_request_wraps_results() {
        let calc = Calculator::new();
        let request = CalculationRequest::new("central", "x^2", &[("point", 2.0)]);
        let (status, response) = calc.handle_request(&request);
        assert_eq!(status, 200);
        match response {
            CalculationResponse::Success { data } => assert_abs_diff_eq!(data.value, 4.0, epsilon = 1e-4),
            other => panic!("unexpected {:?}", other),
        }

        let request = CalculationRequest::new("newton", "x^2 - 4", &[("initialGuess", 0.0)]);
        let (status, response) = calc.handle_request(&request);
        assert_eq!(status, 422);
        assert!(matches!(response, CalculationResponse::Error { .. }));
    }

    #[test]
    fn handle_json_round() {
        let calc = Calculator::new();
        let (status, body) = calc.handle_json(
            r#"{"methodId": "newton", "parameters": {"function": "x^2 - 4", "initialGuess": 3, "tolerance": 1e-6}}"#,
        );
        assert_eq!(status, 200);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["method"], "newton");
        assert_abs_diff_eq!(value["data"]["value"].as_f64().unwrap(), 2.0, epsilon = 1e-6);
        assert!(value["data"]["iterations"].as_u64().unwrap() > 0);

        let (status, body) = calc.handle_json(r#"{"methodId": "rk4", "parameters": {"function": "x"}}"#);
        assert_eq!(status, 400);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "error");
        assert!(value["message"].as_str().unwrap().contains("rk4"));

        let (status, body) = calc.handle_json("{not json");
        assert_eq!(status, 400);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "error");
    }

    #[test]
    fn validation_uses_only_the_parser() {
        assert!(validate_expression("x^4 - 5x^2 + 4").valid);
        // parses fine even though it has no real value anywhere near x = -1
        assert!(validate_expression("sqrt(x - 10)").valid);
        assert!(!validate_expression("sin(").valid);
        assert!(!validate_expression("").valid);
        assert!(!validate_expression("y + 1").valid);
        assert!(!validate_expression("1e400").valid);

        let (status, body) = handle_validate_json(r#"{"expression": "exp(-x^2)"}"#);
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"valid":true}"#);
        let (status, _) = handle_validate_json(r#"{"text": "x"}"#);
        assert_eq!(status, 400);
    }

    #[test]
    fn invalid_engine_config_is_refused() {
        let config = EngineConfig {
            max_iterations: 0,
            ..EngineConfig::default()
        };
        assert!(Calculator::with_config(config).is_err());

        let tight = EngineConfig {
            max_iterations: 3,
            ..EngineConfig::default()
        };
        let calc = Calculator::with_config(tight).unwrap();
        let err = calc
            .calculate("bisection", "x^2 - 2", &params(&[("lowerBound", 0.0), ("upperBound", 2.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), "MaxIterationsExceeded");
    }
}
