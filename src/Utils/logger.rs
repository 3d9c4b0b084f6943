use crate::api::wire::Point;
use chrono::Local;
use csv::Writer;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::io;
use std::path::Path;

/// `logging` section of a task document
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// "debug", "info", "warn", "error", "off" or "none"
    pub loglevel: Option<String>,
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            loglevel: Some("info".to_string()),
            log_to_file: false,
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<LevelFilter, String> {
        match &self.loglevel {
            Some(level) => parse_level(level),
            None => Ok(LevelFilter::Info),
        }
    }
}

pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" | "none" => Ok(LevelFilter::Off),
        other => Err(format!(
            "loglevel must be debug, info, warn, error, off or none, got '{}'",
            other
        )),
    }
}

/// name of the log file written next to the working directory
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("numerica_log_{}.txt", date_and_time)
}

/// Installs the terminal logger (stderr) and, if asked, a timestamped file logger.
/// A logger installed earlier stays in place.
pub fn init_logger(config: &LoggingConfig) -> Result<(), String> {
    let level = config.level()?;
    if level == LevelFilter::Off {
        return Ok(());
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if config.log_to_file {
        let name = log_file_name();
        let file = File::create(&name).map_err(|e| format!("cannot create {}: {}", name, e))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

/// Writes result points as a two-column CSV with the given header names.
pub fn save_points_to_csv<P: AsRef<Path>>(
    points: &[Point],
    filename: P,
    x_name: &str,
    y_name: &str,
) -> io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record([x_name, y_name])?;
    for point in points {
        writer.write_record([point.x.to_string(), point.y.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
