//! Logging handle injected into a submission.
//!
//! The session never reaches for the global logger on its own: it logs
//! through whatever sink it was given, and a [`SessionLogger::silent`] handle
//! drops everything.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

const TARGET: &str = "opus_invoice";

/// Optional `log` sink.
#[derive(Clone, Default)]
pub struct SessionLogger {
    sink: Option<Arc<dyn Log>>,
}

impl SessionLogger {
    pub fn new(sink: Arc<dyn Log>) -> Self {
        SessionLogger { sink: Some(sink) }
    }

    /// Discards every record.
    pub fn silent() -> Self {
        SessionLogger { sink: None }
    }

    /// Forwards to the process-wide logger installed through the `log`
    /// facade (e.g. by `env_logger::init`).
    pub fn global() -> Self {
        SessionLogger::new(Arc::new(GlobalSink))
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let Some(sink) = &self.sink else {
            return;
        };
        let record = Record::builder()
            .args(args)
            .level(level)
            .target(TARGET)
            .build();
        if sink.enabled(record.metadata()) {
            sink.log(&record);
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }
}

impl fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLogger")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

struct GlobalSink;

impl Log for GlobalSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}
