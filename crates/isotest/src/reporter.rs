//! Result reporter - print events and count them

use crate::session::{Counters, Session};
use colored::*;
use std::fmt;
use std::io::{self, Write};

/// Kind of a reported event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// Unrecoverable error; ends the reporting process
    Error,
    /// Informative message, not counted
    Info,
    Pass,
    Fail,
    Skip,
}

impl ResultKind {
    /// Numeric code, also the exit status of a process ended by `Error`
    pub fn code(self) -> i32 {
        match self {
            ResultKind::Error => -1,
            ResultKind::Info => 0,
            ResultKind::Pass => 1,
            ResultKind::Fail => 2,
            ResultKind::Skip => 3,
        }
    }

    /// Console label
    pub fn label(self) -> &'static str {
        match self {
            ResultKind::Error => "ERROR",
            ResultKind::Info => "INFO",
            ResultKind::Pass => "PASS",
            ResultKind::Fail => "FAIL",
            ResultKind::Skip => "SKIP",
        }
    }

    fn colorize(self, text: &str) -> ColoredString {
        match self {
            ResultKind::Error => text.magenta().bold(),
            ResultKind::Info => text.blue().bold(),
            ResultKind::Pass => text.green().bold(),
            ResultKind::Fail => text.red().bold(),
            ResultKind::Skip => text.yellow().bold(),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formats result lines and the final summary
#[derive(Debug, Clone)]
pub struct Reporter {
    /// Colorize labels
    color: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter {
    /// Create a new reporter
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    fn paint(&self, kind: ResultKind, text: &str) -> String {
        if self.color {
            kind.colorize(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// `<file>:<line> <KIND> <message>`
    pub fn format_event(
        &self,
        file: &str,
        line: u32,
        kind: ResultKind,
        message: &dyn fmt::Display,
    ) -> String {
        format!(
            "{}:{} {} {}",
            file,
            line,
            self.paint(kind, kind.label()),
            message
        )
    }

    /// Print one event immediately, without counting it
    pub fn print_event(&self, file: &str, line: u32, kind: ResultKind, message: &dyn fmt::Display) {
        println!("{}", self.format_event(file, line, kind, message));
        let _ = io::stdout().flush();
    }

    /// Count an event in the session and print it
    pub fn emit(
        &self,
        session: &Session<'_>,
        file: &str,
        line: u32,
        kind: ResultKind,
        message: &dyn fmt::Display,
    ) {
        session.record(kind);
        self.print_event(file, line, kind, message);
    }

    /// Summary block printed at the end of a run
    pub fn format_summary(&self, counters: &Counters) -> String {
        format!(
            "\nSummary:\n{}:  {}\n{}:  {}\n{}: {}\n{}:  {}",
            self.paint(ResultKind::Pass, "Passed"),
            counters.passed,
            self.paint(ResultKind::Fail, "Failed"),
            counters.failed,
            self.paint(ResultKind::Skip, "Skipped"),
            counters.skipped,
            self.paint(ResultKind::Error, "Errors"),
            counters.errors,
        )
    }
}
