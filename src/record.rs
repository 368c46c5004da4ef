//! Log record input contract.
//!
//! A [`LogRecord`] is the immutable value a formatter consumes; it is
//! produced by a logger hierarchy this crate has no opinion about.
//! Caller locations arrive already parsed (the stack-trace parser is an
//! external collaborator); the raw trace string is carried through for
//! continuation-line rendering only.

use time::OffsetDateTime;

use crate::layout::LayoutMode;

/// Severity level: a display label plus a numeric rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Level {
    /// Display label, e.g. `INFO`.
    pub label: String,
    /// Numeric severity; higher is more severe.
    pub severity: u8,
}

impl Level {
    #[must_use]
    pub fn trace() -> Self {
        Self::custom("TRACE", 10)
    }

    #[must_use]
    pub fn debug() -> Self {
        Self::custom("DEBUG", 20)
    }

    #[must_use]
    pub fn info() -> Self {
        Self::custom("INFO", 30)
    }

    #[must_use]
    pub fn warn() -> Self {
        Self::custom("WARN", 40)
    }

    #[must_use]
    pub fn error() -> Self {
        Self::custom("ERROR", 50)
    }

    /// A level with a caller-chosen label and severity.
    #[must_use]
    pub fn custom(label: impl Into<String>, severity: u8) -> Self {
        Self {
            label: label.into(),
            severity,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Self::trace(),
            log::Level::Debug => Self::debug(),
            log::Level::Info => Self::info(),
            log::Level::Warn => Self::warn(),
            log::Level::Error => Self::error(),
        }
    }
}

/// Structured caller location, as produced by an external stack-trace
/// parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerLocation {
    /// Fully qualified method name, possibly including closure markers.
    pub method: String,
    /// Source file.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number; 0 when unknown.
    pub column: u32,
}

impl CallerLocation {
    #[must_use]
    pub fn new(method: impl Into<String>, file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            method: method.into(),
            file: file.into(),
            line,
            column,
        }
    }

    /// The `file:line` label shown in headers.
    #[must_use]
    pub fn file_line(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// Method name with closure markers (`<anonymous closure>`,
    /// `<fn>`, ...) stripped out.
    #[must_use]
    pub fn clean_method(&self) -> String {
        self.method
            .split('.')
            .filter(|part| !(part.starts_with('<') && part.ends_with('>')))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// One log event, as handed to the formatter.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Message text; may span multiple lines.
    pub message: String,
    /// Event time.
    pub timestamp: OffsetDateTime,
    /// Severity.
    pub level: Level,
    /// Optional logger name.
    pub logger: Option<String>,
    /// Optional originating-instance tag.
    pub instance: Option<String>,
    /// Optional structured caller location.
    pub caller: Option<CallerLocation>,
    /// Optional error text.
    pub error: Option<String>,
    /// Optional raw stack trace; rendered one continuation line per
    /// frame line, never parsed here.
    pub stack_trace: Option<String>,
    /// Ordered key-value data entries.
    pub data: Vec<(String, String)>,
    /// Per-record layout override; wins over the formatter default.
    pub layout: Option<LayoutMode>,
}

impl LogRecord {
    /// Create a record with the current time and no optional fields.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self {
            message: message.into(),
            timestamp: now,
            level,
            logger: None,
            instance: None,
            caller: None,
            error: None,
            stack_trace: None,
            data: Vec::new(),
            layout: None,
        }
    }

    /// Override the event time.
    #[must_use]
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the logger name.
    #[must_use]
    pub fn logger(mut self, name: impl Into<String>) -> Self {
        self.logger = Some(name.into());
        self
    }

    /// Set the originating-instance tag.
    #[must_use]
    pub fn instance(mut self, name: impl Into<String>) -> Self {
        self.instance = Some(name.into());
        self
    }

    /// Set the caller location.
    #[must_use]
    pub fn caller(mut self, caller: CallerLocation) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Set the error text.
    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the raw stack trace.
    #[must_use]
    pub fn stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Add one key-value data entry; order is preserved.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    /// Override the layout mode for this record only.
    #[must_use]
    pub fn layout(mut self, layout: LayoutMode) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Convert a `log` facade record. The facade supplies no column or
    /// method name, so the caller location carries the target module as
    /// its method.
    #[must_use]
    pub fn from_log(record: &log::Record<'_>) -> Self {
        let mut out = Self::new(record.level().into(), record.args().to_string());
        if !record.target().is_empty() {
            out.logger = Some(record.target().to_string());
        }
        if let Some(file) = record.file() {
            out.caller = Some(CallerLocation::new(
                record.module_path().unwrap_or_default(),
                file,
                record.line().unwrap_or(0),
                0,
            ));
        }
        out
    }
}
