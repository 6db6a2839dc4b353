//! Logging configuration and initialization
//!
//! All binaries log through `tracing`. This module builds the global
//! subscriber from a [`LogConfig`]:
//!
//! - console, daily-rotated file, or both
//! - human-readable text or JSON lines
//! - level plus extra `EnvFilter` directives (e.g. `sqlx=warn`)
//!
//! Environment variables override whatever the binary configured:
//!
//! | Variable     | Values                                  |
//! |--------------|-----------------------------------------|
//! | `LOG_LEVEL`  | trace, debug, info, warn, error         |
//! | `LOG_FORMAT` | text, json                              |
//! | `LOG_OUTPUT` | console, file, both                     |
//! | `LOG_DIR`    | directory for rotated log files         |
//! | `LOG_FILTER` | comma-separated filter directives       |
//!
//! # Example
//!
//! ```no_run
//! use companies_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! let config = LogConfig::new("companies-import")
//!     .with_level(LogLevel::Debug)
//!     .merge_env()?;
//! let _guard = init_logging(&config)?;
//!
//! tracing::info!("ready");
//! # Ok::<(), companies_common::CommonError>(())
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::{CommonError, Result};

/// Minimum level of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CommonError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(CommonError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Where lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(CommonError::InvalidLogOutput(s.to_string())),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Directory for rotated files (file output only)
    pub log_dir: PathBuf,
    /// File name prefix, e.g. `companies-import` -> `companies-import.2024-01-18`
    pub log_file_prefix: String,
    /// Extra directives, e.g. `sqlx=warn,reqwest=info`
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("companies")
    }
}

impl LogConfig {
    /// Console text logging at info level
    pub fn new(log_file_prefix: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            output: LogOutput::Console,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: log_file_prefix.into(),
            filter_directives: None,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter_directives = Some(directives.into());
        self
    }

    /// Apply `LOG_*` environment overrides on top of this config
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(level) = var("LOG_LEVEL") {
            self.level = level.parse()?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(output) = var("LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(filter) = var("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }
        Ok(self)
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter =
            EnvFilter::from_default_env().add_directive(self.level.as_tracing_level().into());

        for directive in self
            .filter_directives
            .iter()
            .flat_map(|d| d.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let parsed = directive.parse().map_err(|e: tracing_subscriber::filter::ParseError| {
                CommonError::InvalidFilter {
                    directive: directive.to_string(),
                    reason: e.to_string(),
                }
            })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// in `main`. It is `None` for console-only output.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = config.env_filter()?;

    let (file_writer, guard) = if config.output.file() {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = config
        .output
        .console()
        .then(|| fmt_layer(config.format, std::io::stdout, true));
    let file_layer = file_writer.map(|writer| fmt_layer(config.format, writer, false));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CommonError::LoggingInit(e.to_string()))?;

    Ok(guard)
}
