//! Logging setup on `tracing-subscriber`.
//!
//! Console output goes through an [`EnvFilter`] (`RUST_LOG` wins over the
//! configured level). A log file, when configured, gets its own layer with an
//! independent level so warnings can be kept on disk while the console stays
//! verbose.
//!
//! ```rust,ignore
//! use reinhard_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .with_level(tracing::Level::DEBUG)
//!     .directive("reinhard_framework=trace")
//!     .file_path("reinhard.log".into())
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Parses a level name, accepting the `warning` and `critical` aliases.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" | "critical" => Some(Level::ERROR),
        _ => None,
    }
}

/// Span event configuration for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

impl SpanEvents {
    /// No span events will be logged.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Log span creation and close events.
    ///
    /// Shows each dispatch span opening and closing without enter/exit noise.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Log all span events.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.enter {
            span |= fmt::format::FmtSpan::ENTER;
        }
        if self.exit {
            span |= fmt::format::FmtSpan::EXIT;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

// =============================================================================
// Configuration-Based Initialization
// =============================================================================

/// Initialize logging from a `LoggingConfig`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// A builder for configuring logging.
#[derive(Debug)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Level,
    file_level: Level,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    file_path: Option<PathBuf>,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Create a new logging builder: `info` to stdout, no log file.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: Level::INFO,
            file_level: Level::WARN,
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            with_target: true,
            with_thread_ids: false,
            file_path: None,
        }
    }

    /// Create a LoggingBuilder from a LoggingConfig.
    ///
    /// Unparseable levels fall back to the defaults; [`validate_config`]
    /// rejects them earlier.
    ///
    /// [`validate_config`]: crate::config::validate_config
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();
        builder.level = parse_level(&config.level).unwrap_or(Level::INFO);
        builder.file_level = parse_level(&config.file_level).unwrap_or(Level::WARN);
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = SpanEvents::from(&config.span_events);
        builder.with_thread_ids = config.thread_ids;
        builder.file_path.clone_from(&config.file_path);

        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort();
        for (target, level) in filters {
            if let Some(level) = parse_level(level) {
                builder
                    .directives
                    .push(format!("{target}={}", level.as_str().to_lowercase()));
            }
        }
        builder
    }

    /// Set the console log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the log file level.
    pub fn with_file_level(mut self, level: Level) -> Self {
        self.file_level = level;
        self
    }

    /// Add a console filter directive such as `reinhard_framework=debug`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Configure span events.
    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    /// Set the console format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the console destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Include the target (module path) in console output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include thread IDs in console output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Also write logs to this file.
    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let base_filter = self.level.as_str().to_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
        filter
    }

    fn console_layer(&self) -> BoxedLayer {
        let filter = self.build_filter();
        let span_events = self.span_events.to_fmt_span();
        let writer = match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        };

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events)
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_writer(writer)
                    .with_filter(filter)
                    .boxed()
            };
        }

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => fmt::layer()
                .json()
                .with_span_events(span_events)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => configure_layer!(fmt::layer()),
            LogFormat::Compact => configure_layer!(fmt::layer().compact()),
            LogFormat::Full => configure_layer!(fmt::layer()),
            LogFormat::Pretty => configure_layer!(fmt::layer().pretty()),
        }
    }

    fn file_layer(&self) -> Option<BoxedLayer> {
        let path = self.file_path.as_ref()?;
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("reinhard.log");

        let appender = match RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(directory)
        {
            Ok(appender) => appender,
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", path.display());
                return None;
            }
        };

        Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(appender)
                .with_filter(LevelFilter::from_level(self.file_level))
                .boxed(),
        )
    }

    /// Initialize the logging system, ignoring an already installed subscriber.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let mut layers = vec![self.console_layer()];
        layers.extend(self.file_layer());
        tracing_subscriber::registry().with(layers).try_init()
    }
}
