//! Human-readable host output.
//!
//! Listings and progress go to "out", problems go to "err". Each call writes
//! one whole line under a lock, so lines from concurrent brews interleave but
//! never tear.

use crate::module::Descriptor;
use crate::runner::{Progress, RunOutcome, RunReport, RunStatus};
use colored::{ColoredString, Colorize};
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

type Sink = Mutex<Box<dyn Write + Send>>;

pub struct Console {
    out: Sink,
    err: Sink,
    color: bool,
}

impl Console {
    pub fn stdio(color: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), color)
    }

    pub fn new<O, E>(out: O, err: E, color: bool) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            out: Mutex::new(Box::new(out)),
            err: Mutex::new(Box::new(err)),
            color,
        }
    }

    pub fn println(&self, line: impl Display) {
        Self::write_line(&self.out, line);
    }

    pub fn eprintln(&self, line: impl Display) {
        Self::write_line(&self.err, line);
    }

    fn write_line(sink: &Sink, line: impl Display) {
        // A poisoned lock only means another writer panicked mid-line.
        let mut writer = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }

    /// Applies `style` only when this console is colored.
    pub fn paint(&self, text: impl Into<String>, style: fn(ColoredString) -> ColoredString) -> String {
        let text = text.into();
        if self.color {
            style(text.as_str().normal()).to_string()
        } else {
            text
        }
    }

    pub fn summary(&self, report: &RunReport) {
        let line = format!(
            "{} completed, {} failed, {} cancelled",
            report.completed(),
            report.failed(),
            report.cancelled()
        );
        let line = if report.failed() > 0 {
            self.paint(line, |s| s.yellow())
        } else {
            self.paint(line, |s| s.green())
        };
        self.println(line);
    }
}

impl Progress for Console {
    fn started(&self, descriptor: &Descriptor) {
        self.println(format!("[{}] Starting...", descriptor.identity()));
    }

    fn finished(&self, outcome: &RunOutcome) {
        let identity = outcome.identity();
        match outcome.status() {
            RunStatus::Completed => {
                let line = format!("[{identity}] Completed ({} ms)", outcome.elapsed().as_millis());
                self.println(self.paint(line, |s| s.green()));
            }
            RunStatus::Failed(message) => {
                let line = format!("[{identity}] Error: {message}");
                self.eprintln(self.paint(line, |s| s.red()));
            }
            RunStatus::Cancelled => {
                let line = format!("[{identity}] Cancelled");
                self.eprintln(self.paint(line, |s| s.yellow()));
            }
        }
    }
}

/// In-memory writer whose contents stay readable after it was handed to a
/// [`Console`].
#[derive(Debug, Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
