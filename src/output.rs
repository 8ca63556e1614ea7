//! Labeled console output on stderr.
//!
//! The pipeline swallows recoverable provisioning failures but aborts on
//! fatal ones, so warnings and errors must be distinguishable at a glance:
//! every line carries a severity-colored label when stderr is a TTY and a
//! plain one when it is not.

use console::{Color, Term, style};
use std::io::{self, Write};

/// Line severity. Drives the label color; `Warning` also fixes the label
/// text so recoverable problems always look the same in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A pipeline stage starting work.
    Action,
    /// A pipeline stage completing.
    Success,
    /// A recoverable problem the pipeline continues past.
    Warning,
    /// A fatal error. The caller decides whether to abort.
    Error,
}

impl Severity {
    fn color(self) -> Color {
        match self {
            Self::Action => Color::Cyan,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

fn stderr_is_tty() -> bool {
    Term::stderr().is_term()
}

/// Writes one labeled line. Exposed with an explicit writer and TTY flag so
/// tests can capture undecorated output.
pub fn emit_with_tty(
    w: &mut dyn Write,
    severity: Severity,
    label: &str,
    msg: &str,
    is_tty: bool,
) {
    let label = if is_tty {
        style(label).bold().fg(severity.color()).to_string()
    } else {
        label.to_string()
    };
    let _ = if msg.is_empty() {
        writeln!(w, "{label}")
    } else {
        writeln!(w, "{label} {msg}")
    };
}

/// Writes a dimmed supplementary detail line.
pub fn detail_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let line = if is_tty {
        style(format!("  {msg}")).dim().to_string()
    } else {
        format!("  {msg}")
    };
    let _ = writeln!(w, "{line}");
}

fn emit(severity: Severity, label: &str, msg: &str) {
    emit_with_tty(&mut io::stderr(), severity, label, msg, stderr_is_tty());
}

/// A pipeline stage starting work, e.g. `Provision <url>`.
pub fn action(label: &str, msg: &str) {
    emit(Severity::Action, label, msg);
}

/// A pipeline stage completing.
pub fn success(label: &str, msg: &str) {
    emit(Severity::Success, label, msg);
}

/// A fatal error.
pub fn fail(label: &str, msg: &str) {
    emit(Severity::Error, label, msg);
}

/// A recoverable problem the pipeline continues past.
pub fn warn(msg: &str) {
    emit(Severity::Warning, "Warning", msg);
}

/// Supplementary dimmed detail line.
pub fn detail(msg: &str) {
    detail_with_tty(&mut io::stderr(), msg, stderr_is_tty());
}
