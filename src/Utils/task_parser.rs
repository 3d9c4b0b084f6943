/// parse a task document with structure like "title1 key1: value1, value2 key2: value2 title2 key3: value3"
/// into sections of key -> list of values, then into the settings and the request of one calculation.
///
/// ```text
/// // lines starting with //, #, % or ; are comments
/// logging
/// loglevel: info
/// log_to_file: false
/// engine
/// max_iterations: 200
/// calculation
/// method: newton
/// function: "x^4 - 5x^2 + 4"
/// initialGuess: 2.5
/// tolerance: 1e-8
/// ```
use crate::Utils::logger::LoggingConfig;
use crate::api::wire::CalculationRequest;
use crate::global::EngineConfig;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0, space0},
    combinator::{map, map_res, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub type DocumentMap = HashMap<String, SectionMap>;
pub type SectionMap = HashMap<String, Vec<Value>>;

const LOGGING_KEYS: [&str; 2] = ["loglevel", "log_to_file"];
const ENGINE_KEYS: [&str; 8] = [
    "max_iterations",
    "derivative_step",
    "slope_floor",
    "denominator_floor",
    "divergence_bound",
    "divergence_window",
    "max_num_points",
    "max_chart_points",
];

/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_string(&self) -> Option<&String> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// integers are widened to f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskParseError {
    #[error("task document could not be parsed: {0}")]
    Syntax(String),
    #[error("unknown section '{0}', expected logging, engine or calculation")]
    UnknownSection(String),
    #[error("unknown key '{key}' in section '{section}'")]
    UnknownKey { section: String, key: String },
    #[error("'{key}' in section '{section}' expects {expected}")]
    BadValue {
        section: String,
        key: String,
        expected: &'static str,
    },
    #[error("section '{section}' is missing '{key}'")]
    MissingKey { section: String, key: String },
    #[error("invalid engine settings: {0}")]
    InvalidConfig(String),
    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Parses a title (word characters without spaces)
pub fn parse_title(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, String::from);
    let (input, result) = parser.parse(input)?;
    Ok((input.trim(), result))
}

/// Parses a key (word characters without spaces)
pub fn parse_key(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, String::from);
    parser.parse(input)
}

/// `"..."`, kept verbatim including spaces and commas
fn parse_quoted(input: &str) -> IResult<&str, Value> {
    let mut parser = map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        |s: &str| Value::String(s.to_string()),
    );
    parser.parse(input)
}

fn parse_bare(input: &str) -> IResult<&str, Value> {
    let value_parser = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\r' | '\n' | ';' | '"'));
    let mut value_parser = map_res(value_parser, |s: &str| -> Result<Value, String> {
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    });
    value_parser.parse(input)
}

pub fn parse_value(input: &str) -> IResult<&str, Value> {
    alt((parse_quoted, parse_bare)).parse(input)
}

/// Comma-separated values on the rest of the line
pub fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let (input, _) = space0(input)?;
    let separator_coma = delimited(space0, tag(","), space0);
    let mut value_parser = separated_list0(separator_coma, parse_value);
    value_parser.parse(input)
}

/// Parses a key-value pair where value is a list
pub fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let mut parser = separated_pair(parse_key, colon_separator, parse_value_list);
    let (input, result) = parser.parse(input)?;
    Ok((input.trim(), result))
}

/// Parses a section with a title and multiple key-value pairs
pub fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_title(input)?;
    let (input, _) = multispace0(input)?;
    let mut parser = many1(terminated(parse_key_value_pair, space0));
    let (input, pairs) = parser.parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

/// Drops comment lines (starting with //, #, % or ;) and blank lines
pub fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.starts_with(';')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the entire document into a HashMap; a repeated section is merged
pub fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let mut parser = many1(delimited(space0, parse_section, multispace0));
    let (input, sections) = parser.parse(input)?;
    let mut result: DocumentMap = HashMap::new();
    for (title, section_map) in sections {
        result.entry(title).or_default().extend(section_map);
    }
    Ok((input, result))
}

/// Comments filtered, whole input consumed.
pub fn parse_document_text(input: &str) -> Result<DocumentMap, TaskParseError> {
    let filtered = filter_comments(input);
    match parse_document(&filtered) {
        Ok((remaining, parsed)) => {
            if !remaining.trim().is_empty() {
                return Err(TaskParseError::Syntax(format!(
                    "failed to parse entire document, remaining: '{}'",
                    remaining
                )));
            }
            Ok(parsed)
        }
        Err(e) => Err(TaskParseError::Syntax(format!("{:?}", e))),
    }
}

/// Everything a task document describes.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub request: CalculationRequest,
}

/// Reads one value of a section, rejecting lists.
struct SectionReader<'a> {
    title: &'a str,
    map: &'a SectionMap,
}

impl<'a> SectionReader<'a> {
    fn new(title: &'a str, map: &'a SectionMap, known: Option<&[&str]>) -> Result<Self, TaskParseError> {
        if let Some(known) = known {
            if let Some(key) = map.keys().find(|k| !known.contains(&k.as_str())) {
                return Err(TaskParseError::UnknownKey {
                    section: title.to_string(),
                    key: key.clone(),
                });
            }
        }
        Ok(Self { title, map })
    }

    fn bad(&self, key: &str, expected: &'static str) -> TaskParseError {
        TaskParseError::BadValue {
            section: self.title.to_string(),
            key: key.to_string(),
            expected,
        }
    }

    fn single(&self, key: &str) -> Result<Option<&'a Value>, TaskParseError> {
        match self.map.get(key).map(Vec::as_slice) {
            None => Ok(None),
            Some([value]) => Ok(Some(value)),
            Some(_) => Err(self.bad(key, "exactly one value")),
        }
    }

    fn text(&self, key: &str) -> Result<Option<String>, TaskParseError> {
        match self.single(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            // a bare number is a valid constant expression
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    fn float(&self, key: &str) -> Result<Option<f64>, TaskParseError> {
        self.single(key)?
            .map(|v| v.as_float().ok_or_else(|| self.bad(key, "a number")))
            .transpose()
    }

    fn count(&self, key: &str) -> Result<Option<usize>, TaskParseError> {
        self.single(key)?
            .map(|v| {
                v.as_integer()
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| self.bad(key, "a non-negative integer"))
            })
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, TaskParseError> {
        self.single(key)?
            .map(|v| v.as_boolean().ok_or_else(|| self.bad(key, "true or false")))
            .transpose()
    }
}

fn logging_config(map: Option<&SectionMap>) -> Result<LoggingConfig, TaskParseError> {
    let mut config = LoggingConfig::default();
    let Some(map) = map else {
        return Ok(config);
    };
    let reader = SectionReader::new("logging", map, Some(&LOGGING_KEYS[..]))?;
    if let Some(level) = reader.text("loglevel")? {
        config.loglevel = Some(level);
    }
    if let Some(to_file) = reader.flag("log_to_file")? {
        config.log_to_file = to_file;
    }
    config.level().map_err(|_| reader.bad("loglevel", "debug, info, warn, error, off or none"))?;
    Ok(config)
}

fn engine_config(map: Option<&SectionMap>) -> Result<EngineConfig, TaskParseError> {
    let mut config = EngineConfig::default();
    let Some(map) = map else {
        return Ok(config);
    };
    let reader = SectionReader::new("engine", map, Some(&ENGINE_KEYS[..]))?;
    if let Some(v) = reader.count("max_iterations")? {
        config.max_iterations = v;
    }
    if let Some(v) = reader.float("derivative_step")? {
        config.derivative_step = v;
    }
    if let Some(v) = reader.float("slope_floor")? {
        config.slope_floor = v;
    }
    if let Some(v) = reader.float("denominator_floor")? {
        config.denominator_floor = v;
    }
    if let Some(v) = reader.float("divergence_bound")? {
        config.divergence_bound = v;
    }
    if let Some(v) = reader.count("divergence_window")? {
        config.divergence_window = v;
    }
    if let Some(v) = reader.count("max_num_points")? {
        config.max_num_points = v;
    }
    if let Some(v) = reader.count("max_chart_points")? {
        config.max_chart_points = v;
    }
    config.check().map_err(TaskParseError::InvalidConfig)?;
    Ok(config)
}

fn calculation_request(map: Option<&SectionMap>) -> Result<CalculationRequest, TaskParseError> {
    let missing = |key: &str| TaskParseError::MissingKey {
        section: "calculation".to_string(),
        key: key.to_string(),
    };
    let empty = SectionMap::new();
    let map = map.unwrap_or(&empty);
    let reader = SectionReader::new("calculation", map, None)?;
    let method = reader.text("method")?.ok_or_else(|| missing("method"))?;
    let function = reader.text("function")?.ok_or_else(|| missing("function"))?;
    let derivative = reader.text("derivative")?;

    let mut values = BTreeMap::new();
    for key in map.keys() {
        if matches!(key.as_str(), "method" | "function" | "derivative") {
            continue;
        }
        let value = reader.float(key)?.ok_or_else(|| missing(key))?;
        values.insert(key.clone(), value);
    }

    let mut request = CalculationRequest::new(&method, &function, &[]);
    request.parameters.values = values;
    request.parameters.derivative = derivative;
    Ok(request)
}

/// Parses a task document: optional `logging` and `engine`, required `calculation`.
pub fn parse_task(text: &str) -> Result<Task, TaskParseError> {
    let document = parse_document_text(text)?;
    if let Some(title) = document
        .keys()
        .find(|t| !matches!(t.as_str(), "logging" | "engine" | "calculation"))
    {
        return Err(TaskParseError::UnknownSection(title.clone()));
    }
    if !document.contains_key("calculation") {
        return Err(TaskParseError::MissingKey {
            section: "document".to_string(),
            key: "calculation".to_string(),
        });
    }
    Ok(Task {
        logging: logging_config(document.get("logging"))?,
        engine: engine_config(document.get("engine"))?,
        request: calculation_request(document.get("calculation"))?,
    })
}

pub fn parse_task_file<P: AsRef<Path>>(path: P) -> Result<Task, TaskParseError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| TaskParseError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_task(&text)
}
