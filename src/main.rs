#![allow(non_snake_case)]
use log::{error, info};
use numerica::Utils::logger::{LoggingConfig, init_logger, save_points_to_csv};
use numerica::Utils::task_parser::parse_task_file;
use numerica::api::dispatcher::{Calculator, validate_expression};
use numerica::api::registry::{describe_method, method_catalog};
use numerica::api::wire::{CalculationRequest, CalculationResponse, CalculationResult};
use std::env;
use std::fs;
use std::process::ExitCode;
use tabled::{builder::Builder, settings::Style};

const USAGE: &str = "usage:
  numerica <task.txt> [--csv <points.csv>]          run a task document
  numerica --json <request.json> [--csv <points.csv>] run a JSON request
  numerica --validate \"<expression>\"               check an expression
  numerica --catalog [<method>]                      list methods and parameters";

#[derive(Debug, PartialEq)]
enum Command {
    Task { path: String, csv: Option<String> },
    Json { path: String, csv: Option<String> },
    Validate(String),
    Catalog(Option<String>),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut csv = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--csv" {
            let path = iter.next().ok_or("--csv needs a file name")?;
            csv = Some(path.clone());
        } else {
            rest.push(arg.as_str());
        }
    }
    match rest.as_slice() {
        ["--json", path] => Ok(Command::Json {
            path: path.to_string(),
            csv,
        }),
        ["--validate", expression] if csv.is_none() => Ok(Command::Validate(expression.to_string())),
        ["--catalog"] if csv.is_none() => Ok(Command::Catalog(None)),
        ["--catalog", id] if csv.is_none() => Ok(Command::Catalog(Some(id.to_string()))),
        [path] if !path.starts_with("--") => Ok(Command::Task {
            path: path.to_string(),
            csv,
        }),
        _ => Err("unrecognised arguments".to_string()),
    }
}

fn usage_error(message: &str) -> ExitCode {
    error!("{}", message);
    eprintln!("{}\n{}", message, USAGE);
    ExitCode::from(2)
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("cannot serialize output: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match write_json(value) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => usage_error(&message),
    }
}

fn summary_table(request: &CalculationRequest, result: &CalculationResult) -> String {
    let mut builder = Builder::default();
    builder.push_record(["method", result.method.as_str()]);
    builder.push_record(["f(x)", request.parameters.function.as_str()]);
    for (name, value) in &request.parameters.values {
        builder.push_record([name.clone(), value.to_string()]);
    }
    builder.push_record(["value".to_string(), result.value.to_string()]);
    if let Some(error) = result.error {
        builder.push_record(["error".to_string(), format!("{:e}", error)]);
    }
    if let Some(iterations) = result.iterations {
        builder.push_record(["iterations".to_string(), iterations.to_string()]);
    }
    if let Some(points) = &result.points {
        builder.push_record(["points".to_string(), points.len().to_string()]);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn run_request(
    calc: &Calculator,
    request: &CalculationRequest,
    csv: Option<&str>,
    table: bool,
) -> ExitCode {
    let (status, response) = calc.handle_request(request);
    info!("{} finished with status {}", request.method_id, status);
    if let Err(message) = write_json(&response) {
        return usage_error(&message);
    }
    let CalculationResponse::Success { data } = &response else {
        return ExitCode::from(1);
    };
    if table {
        println!("{}", summary_table(request, data));
    }
    if let (Some(path), Some(points)) = (csv, &data.points) {
        if let Err(e) = save_points_to_csv(points, path, "x", "f(x)") {
            return usage_error(&format!("cannot write {}: {}", path, e));
        }
        info!("{} points saved to {}", points.len(), path);
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => return usage_error(&message),
    };

    match command {
        Command::Task { path, csv } => {
            let task = match parse_task_file(&path) {
                Ok(task) => task,
                Err(e) => return usage_error(&e.to_string()),
            };
            if let Err(e) = init_logger(&task.logging) {
                return usage_error(&e);
            }
            let calc = match Calculator::with_config(task.engine) {
                Ok(calc) => calc,
                Err(e) => return usage_error(&e),
            };
            run_request(&calc, &task.request, csv.as_deref(), true)
        }
        Command::Json { path, csv } => {
            let quiet = LoggingConfig {
                loglevel: Some("warn".to_string()),
                log_to_file: false,
            };
            if let Err(e) = init_logger(&quiet) {
                return usage_error(&e);
            }
            let body = match fs::read_to_string(&path) {
                Ok(body) => body,
                Err(e) => return usage_error(&format!("cannot read {}: {}", path, e)),
            };
            let request: CalculationRequest = match serde_json::from_str(&body) {
                Ok(request) => request,
                Err(e) => return usage_error(&format!("malformed request: {}", e)),
            };
            run_request(&Calculator::new(), &request, csv.as_deref(), false)
        }
        Command::Validate(expression) => print_json(&validate_expression(&expression)),
        Command::Catalog(None) => print_json(method_catalog()),
        Command::Catalog(Some(id)) => match describe_method(&id) {
            Ok(info) => print_json(info),
            Err(e) => usage_error(&e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn commands() {
        assert_eq!(
            parse_args(&args(&["task.txt"])).unwrap(),
            Command::Task {
                path: "task.txt".to_string(),
                csv: None
            }
        );
        assert_eq!(
            parse_args(&args(&["--json", "req.json", "--csv", "out.csv"])).unwrap(),
            Command::Json {
                path: "req.json".to_string(),
                csv: Some("out.csv".to_string())
            }
        );
        assert_eq!(
            parse_args(&args(&["--validate", "sin(x"])).unwrap(),
            Command::Validate("sin(x".to_string())
        );
        assert_eq!(parse_args(&args(&["--catalog"])).unwrap(), Command::Catalog(None));
        assert_eq!(
            parse_args(&args(&["--catalog", "simpson"])).unwrap(),
            Command::Catalog(Some("simpson".to_string()))
        );
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--json"])).is_err());
        assert!(parse_args(&args(&["task.txt", "--csv"])).is_err());
        assert!(parse_args(&args(&["--fast"])).is_err());
        assert!(parse_args(&args(&["--catalog", "--csv", "x.csv"])).is_err());
    }

    #[test]
    fn table_lists_the_result() {
        let request = CalculationRequest::new("central", "x^2", &[("point", 2.0)]);
        let (_, response) = Calculator::new().handle_request(&request);
        let CalculationResponse::Success { data } = response else {
            panic!("central difference failed");
        };
        let table = summary_table(&request, &data);
        assert!(table.contains("central"));
        assert!(table.contains("point"));
        assert!(table.contains("points"));
    }
}
