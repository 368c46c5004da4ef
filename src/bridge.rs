//! Bridge from the `log` facade.
//!
//! Converts `log::Record`s into [`LogRecord`]s, formats them, and hands
//! each rendered line to a caller-supplied sink. Destinations stay the
//! caller's business; no I/O happens here.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::format::Formatter;
use crate::record::LogRecord;

/// Receives rendered lines.
pub type Sink = Box<dyn Fn(&str) + Send + Sync>;

/// `log::Log` implementation backed by a [`Formatter`].
pub struct LogBridge {
    formatter: Formatter,
    level: LevelFilter,
    sink: Sink,
}

impl LogBridge {
    /// Create a bridge delivering rendered lines to `sink`.
    #[must_use]
    pub fn new<F>(formatter: Formatter, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            formatter,
            level: LevelFilter::Info,
            sink: Box::new(sink),
        }
    }

    /// Set the minimum log level.
    #[must_use]
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Install as the global logger.
    ///
    /// # Errors
    ///
    /// Returns [`SetLoggerError`] if a global logger is already set.
    pub fn init(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.level);
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let converted = LogRecord::from_log(record);
        match self.formatter.format(&converted) {
            Ok(text) => (self.sink)(&text),
            // A build-chain overflow is a configuration error; report it
            // through the sink rather than dropping it silently.
            Err(err) => (self.sink)(&format!("spanlog: {err}")),
        }
    }

    fn flush(&self) {}
}
