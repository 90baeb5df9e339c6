//! Operator-facing progress output.
//!
//! Structured logs go through `tracing` to stderr. The reporter is the
//! short human summary printed on stdout while a run progresses.

use std::cell::RefCell;

use colored::Colorize;

/// Kind of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Header,
    Info,
    Success,
    Warning,
    Failure,
}

/// Sink for progress messages.
pub trait Reporter {
    fn report(&self, level: Level, message: &str);

    fn header(&self, message: &str) {
        self.report(Level::Header, message);
    }

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn failure(&self, message: &str) {
        self.report(Level::Failure, message);
    }
}

/// Prints messages to stdout with status symbols.
///
/// Colors follow the global `colored` setting, which `--no-color` and
/// `NO_COLOR` switch off.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn format(level: Level, message: &str) -> String {
        match level {
            Level::Header => format!("\n{}", message.bold()),
            Level::Info => format!("  {}", message),
            Level::Success => format!("{} {}", "✓".green(), message),
            Level::Warning => format!("{} {}", "⚠".yellow(), message),
            Level::Failure => format!("{} {}", "✗".red(), message.red()),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, level: Level, message: &str) {
        println!("{}", Self::format(level, message));
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: RefCell<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Messages reported at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
