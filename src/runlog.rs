//! The per-run log file.
//!
//! Every line written to the [RunLog] ends up in the plain log. Messages
//! (as opposed to raw duplicacy output) are additionally collected into a
//! summary and forwarded to the [log] facade.

use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;

use chrono::Local;

const SEPARATOR: &str =
    "######################################################################";

/// Append-only log of a single job run.
pub struct RunLog {
    out: Box<dyn Write>,
    timestamps: bool,
    summary: Vec<String>,
    write_failed: bool,
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog")
            .field("timestamps", &self.timestamps)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl RunLog {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        log::debug!(target: "runlog", "Writing run log to {}", path.display());
        Ok(Self::new(LineWriter::new(file)))
    }

    /// Log into an arbitrary writer, with timestamps.
    pub fn new(out: impl Write + 'static) -> Self {
        Self {
            out: Box::new(out),
            timestamps: true,
            summary: Vec::new(),
            write_failed: false,
        }
    }

    /// Disable the time prefix of every line.
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Write a raw line to the plain log only.
    pub fn line(&mut self, line: &str) {
        log::debug!(target: "duplicacy", "{line}");
        self.write(line);
    }

    /// Write the phase separator.
    pub fn separator(&mut self) {
        self.write(SEPARATOR);
    }

    /// Write an informational message.
    pub fn info(&mut self, message: &str) {
        log::info!(target: "job", "{message}");
        self.message(message);
    }

    /// Write a warning, e.g. a hint on a likely misconfiguration.
    pub fn warn(&mut self, message: &str) {
        log::warn!(target: "job", "{message}");
        self.message(message);
    }

    /// Write an error message.
    pub fn error(&mut self, message: &str) {
        log::error!(target: "job", "{message}");
        self.message(message);
    }

    /// Highlighted messages written so far.
    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    /// Close the log, returning the highlighted messages.
    pub fn into_summary(mut self) -> Vec<String> {
        if let Err(e) = self.out.flush() {
            log::warn!(target: "runlog", "Flushing the run log failed: {e}");
        }
        std::mem::take(&mut self.summary)
    }

    fn message(&mut self, message: &str) {
        self.write(message);
        self.summary.push(message.to_string());
    }

    fn write(&mut self, line: &str) {
        let res = if self.timestamps {
            writeln!(self.out, "{} {line}", Local::now().format("%H:%M:%S"))
        } else {
            writeln!(self.out, "{line}")
        };

        if let Err(e) = res {
            // report only once, the log is most likely gone for good
            if !self.write_failed {
                log::warn!(target: "runlog", "Writing to the run log failed: {e}");
                self.write_failed = true;
            }
        }
    }
}
